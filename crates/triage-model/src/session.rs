//! Per-session memoization of derived views.
//!
//! An [`AnalysisSession`] wraps one immutable record set and lazily derives
//! the contribution matrix, the diversity table, and one graph per distinct
//! [`GraphFilter`]. Every derived value is computed at most once and handed
//! out behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use triage_core::{AggregationPolicy, TriageError};

use crate::cache::{RecordCache, SharedRecords};
use crate::diversity::{analyze_diversity, DiversityRecord};
use crate::graph::{build_graph, BipartiteGraph, GraphFilter};
use crate::records::ContributionRecord;
use crate::tally::{tally_with, ContributionMatrix};

/// Lazily derived views over one record set.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use triage_core::AggregationPolicy;
/// use triage_model::graph::GraphFilter;
/// use triage_model::records::parse_records;
/// use triage_model::session::AnalysisSession;
///
/// let csv = "source,target,weight,start_date,end_date,year\n\
///            alice,Crash,5,2021-01-04,2021-03-30,2021\n";
/// let records = parse_records(csv.as_bytes(), "inline").unwrap();
/// let mut session = AnalysisSession::new(records.into(), AggregationPolicy::default());
///
/// let first = session.graph(GraphFilter::default());
/// let second = session.graph(GraphFilter::default());
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct AnalysisSession {
    records: SharedRecords,
    policy: AggregationPolicy,
    matrix: Option<Arc<ContributionMatrix>>,
    diversity: Option<Arc<[DiversityRecord]>>,
    graphs: HashMap<GraphFilter, Arc<BipartiteGraph>>,
}

impl AnalysisSession {
    /// Start a session over `records`.
    pub fn new(records: SharedRecords, policy: AggregationPolicy) -> Self {
        Self {
            records,
            policy,
            matrix: None,
            diversity: None,
            graphs: HashMap::new(),
        }
    }

    /// Load `path` through `cache` and start a session over it.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::DataLoad`] if the log cannot be loaded.
    pub fn open(
        cache: &mut RecordCache,
        path: &Path,
        policy: AggregationPolicy,
    ) -> Result<Self, TriageError> {
        Ok(Self::new(cache.load(path)?, policy))
    }

    /// The underlying records, in source order.
    pub fn records(&self) -> &[ContributionRecord] {
        &self.records
    }

    /// The aggregation policy used for the matrix.
    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// The contribution matrix, tallied on first use.
    pub fn matrix(&mut self) -> Arc<ContributionMatrix> {
        let records = &self.records;
        let policy = self.policy;
        Arc::clone(
            self.matrix
                .get_or_insert_with(|| Arc::new(tally_with(records, policy))),
        )
    }

    /// The graph for `filter`, built on first use of that filter.
    pub fn graph(&mut self, filter: GraphFilter) -> Arc<BipartiteGraph> {
        if let Some(graph) = self.graphs.get(&filter) {
            tracing::debug!(?filter, "graph cache hit");
            return Arc::clone(graph);
        }
        let matrix = self.matrix();
        let graph = Arc::new(build_graph(&self.records, &matrix, &filter));
        self.graphs.insert(filter, Arc::clone(&graph));
        graph
    }

    /// Diversity records in matrix row order, computed on first use.
    pub fn diversity(&mut self) -> Arc<[DiversityRecord]> {
        if let Some(diversity) = &self.diversity {
            return Arc::clone(diversity);
        }
        let matrix = self.matrix();
        let diversity: Arc<[DiversityRecord]> = analyze_diversity(&matrix).into();
        self.diversity = Some(Arc::clone(&diversity));
        diversity
    }
}
