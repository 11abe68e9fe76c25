//! Bug triage analytics over a contribution log.
//!
//! Loads a CSV log of (contributor, bug category, weight) records and derives
//! three views from it: a contributor × category contribution matrix, a
//! threshold-filtered bipartite graph with visual scaling, and a per-contributor
//! Gini-Simpson diversity table. Derived views are memoized per session and
//! parsed logs are cached by content hash.

pub mod cache;
pub mod diversity;
pub mod graph;
pub mod output;
pub mod records;
pub mod session;
pub mod tally;

use serde::{Deserialize, Serialize};
use triage_core::AggregationPolicy;

use crate::diversity::{rank_by_diversity, DiversityRecord};
use crate::graph::{GraphFilter, GraphSummary};
use crate::session::AnalysisSession;

/// Headline figures across all views of one session.
///
/// # Examples
///
/// ```
/// use triage_model::Report;
///
/// let report = Report::default();
/// assert_eq!(report.records, 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Rows in the contribution log.
    pub records: usize,
    /// Distinct contributors.
    pub contributors: usize,
    /// Distinct bug categories.
    pub categories: usize,
    /// Sum of the contribution matrix.
    pub total_contributions: u64,
    /// How duplicate pairs were combined.
    pub aggregation: AggregationPolicy,
    /// Filter the graph was built with.
    pub filter: GraphFilter,
    /// Node and edge counts of the graph.
    pub graph: GraphSummary,
    /// Highest-diversity contributors, best first.
    pub most_diverse: Vec<DiversityRecord>,
}

/// Build a [`Report`] from `session`, keeping the `top` most diverse
/// contributors.
///
/// # Examples
///
/// ```
/// use triage_core::AggregationPolicy;
/// use triage_model::graph::GraphFilter;
/// use triage_model::records::parse_records;
/// use triage_model::session::AnalysisSession;
/// use triage_model::generate_report;
///
/// let csv = "source,target,weight,start_date,end_date,year\n\
///            alice,Crash,5,2021-01-04,2021-03-30,2021\n\
///            alice,UI,2,2021-01-04,2021-03-30,2021\n";
/// let records = parse_records(csv.as_bytes(), "inline").unwrap();
/// let mut session = AnalysisSession::new(records.into(), AggregationPolicy::default());
/// let report = generate_report(&mut session, GraphFilter::default(), 10);
/// assert_eq!(report.categories, 2);
/// assert_eq!(report.total_contributions, 7);
/// ```
pub fn generate_report(session: &mut AnalysisSession, filter: GraphFilter, top: usize) -> Report {
    let matrix = session.matrix();
    let graph = session.graph(filter);
    let diversity = session.diversity();

    let mut most_diverse = rank_by_diversity(&diversity);
    most_diverse.truncate(top);

    Report {
        records: session.records().len(),
        contributors: matrix.contributors().len(),
        categories: matrix.categories().len(),
        total_contributions: matrix.grand_total(),
        aggregation: session.policy(),
        filter,
        graph: graph.summary(),
        most_diverse,
    }
}
