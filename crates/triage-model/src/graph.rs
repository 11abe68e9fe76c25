//! Contributor ↔ bug-category bipartite graph.
//!
//! Filters contribution records by edge-weight bounds and contributor totals,
//! then lays out the surviving relationships as nodes and edges with visual
//! scaling attributes for an external graph renderer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::records::ContributionRecord;
use crate::tally::ContributionMatrix;

/// Multiplier applied to the logarithmic contributor size.
pub const NODE_SCALE: f64 = 10.0;
/// Size of every bug-category node.
pub const CATEGORY_NODE_SIZE: f64 = 10.0;
/// Smallest size a contributor node is ever given.
pub const MIN_NODE_SIZE: f64 = 1.0;

/// Thresholds deciding which records become edges.
///
/// A record passes when its contributor's matrix total is at least
/// `min_total_contribs` and its weight lies within
/// `[min_edge_weight, max_edge_weight]`. A `None` upper bound is unbounded.
///
/// # Examples
///
/// ```
/// use triage_model::graph::GraphFilter;
///
/// // The legacy encoding: min > max means "no upper bound".
/// let filter = GraphFilter::from_thresholds(5, 0, 0);
/// assert_eq!(filter.max_edge_weight, None);
///
/// let filter = GraphFilter::from_thresholds(3, 100, 0);
/// assert_eq!(filter.max_edge_weight, Some(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFilter {
    /// Minimum record weight.
    pub min_edge_weight: u64,
    /// Maximum record weight, if bounded.
    pub max_edge_weight: Option<u64>,
    /// Minimum contributor total.
    pub min_total_contribs: u64,
}

/// Weights from 1 upwards, no upper bound, every contributor.
///
/// Zero-weight records are left out unless `min_edge_weight` is lowered to 0.
impl Default for GraphFilter {
    fn default() -> Self {
        Self::new(1, None, 0)
    }
}

impl GraphFilter {
    /// Build a filter from an optional upper bound. A bound below
    /// `min_edge_weight` is dropped, leaving the range open.
    pub fn new(min_edge_weight: u64, max_edge_weight: Option<u64>, min_total_contribs: u64) -> Self {
        Self {
            min_edge_weight,
            max_edge_weight: max_edge_weight.filter(|max| *max >= min_edge_weight),
            min_total_contribs,
        }
    }

    /// Build a filter from three plain thresholds where
    /// `min_edge_weight > max_edge_weight` means "no upper bound".
    pub fn from_thresholds(min_edge_weight: u64, max_edge_weight: u64, min_total_contribs: u64) -> Self {
        Self::new(min_edge_weight, Some(max_edge_weight), min_total_contribs)
    }

    /// Whether a record with `weight`, by a contributor totalling
    /// `contributor_total`, becomes an edge.
    pub fn passes(&self, weight: u64, contributor_total: u64) -> bool {
        contributor_total >= self.min_total_contribs
            && weight >= self.min_edge_weight
            && self.max_edge_weight.map_or(true, |max| weight <= max)
    }
}

/// Which side of the bipartite graph a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// A person who fixed bugs.
    Contributor,
    /// A category of bug.
    BugCategory,
}

/// A graph node ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Sequential id starting at 1.
    pub id: u32,
    /// Contributor or category name.
    pub label: String,
    /// Node side.
    pub kind: NodeKind,
    /// Display size.
    pub size: f64,
    /// Human-readable total shown on hover.
    pub annotation: String,
}

/// A contributor → category edge ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Contributor node id.
    pub from: u32,
    /// Category node id.
    pub to: u32,
    /// Log-scaled display weight, always finite and at least 1.
    pub weight: f64,
    /// Raw record weight.
    pub contributions: u64,
    /// Human-readable weight shown on hover.
    pub annotation: String,
}

/// Node and edge counts of a built graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    /// Contributor nodes.
    pub contributors: usize,
    /// Bug-category nodes.
    pub categories: usize,
    /// Edges.
    pub edges: usize,
}

/// A filtered contributor ↔ bug-category graph.
///
/// Contributor ids come first, then category ids, each group in
/// lexicographic label order, so identical inputs give identical graphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BipartiteGraph {
    /// All nodes, ordered by id.
    pub nodes: Vec<GraphNode>,
    /// One edge per passing record, in record order.
    pub edges: Vec<GraphEdge>,
}

impl BipartiteGraph {
    /// Look up a node by id.
    pub fn node(&self, id: u32) -> Option<&GraphNode> {
        // ids are dense and start at 1
        self.nodes.get(id.checked_sub(1)? as usize).filter(|n| n.id == id)
    }

    /// Look up a node by kind and label.
    pub fn find(&self, kind: NodeKind, label: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.kind == kind && n.label == label)
    }

    /// Count nodes by kind, and edges.
    pub fn summary(&self) -> GraphSummary {
        let contributors = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Contributor)
            .count();
        GraphSummary {
            contributors,
            categories: self.nodes.len() - contributors,
            edges: self.edges.len(),
        }
    }
}

/// Build the bipartite graph for `records` under `filter`.
///
/// Contributor totals come from `matrix` row sums. Scaling:
/// - contributor size `10 × (1 + log10(total / max(1, min_edge_weight)))`,
///   never below [`MIN_NODE_SIZE`]; a zero total is treated as 1
/// - category size [`CATEGORY_NODE_SIZE`]
/// - edge weight `1 + log10(weight)`, with a zero weight treated as 1
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use triage_model::graph::{build_graph, GraphFilter};
/// use triage_model::records::ContributionRecord;
/// use triage_model::tally::tally;
///
/// let day = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
/// let record = |c: &str, k: &str, w: u64| ContributionRecord {
///     contributor: c.into(),
///     bug_category: k.into(),
///     weight: w,
///     start_date: day,
///     end_date: day,
///     year: 2021,
/// };
/// let records = vec![record("A", "Crash", 5), record("A", "UI", 2), record("B", "Crash", 10)];
/// let matrix = tally(&records);
/// let graph = build_graph(&records, &matrix, &GraphFilter::from_thresholds(3, 100, 0));
/// assert_eq!(graph.edges.len(), 2);
/// ```
pub fn build_graph(
    records: &[ContributionRecord],
    matrix: &ContributionMatrix,
    filter: &GraphFilter,
) -> BipartiteGraph {
    let passing: Vec<&ContributionRecord> = records
        .iter()
        .filter(|r| filter.passes(r.weight, matrix.row_total(&r.contributor)))
        .collect();

    let contributors: BTreeSet<&str> = passing.iter().map(|r| r.contributor.as_str()).collect();
    let categories: BTreeSet<&str> = passing.iter().map(|r| r.bug_category.as_str()).collect();

    let mut nodes = Vec::with_capacity(contributors.len() + categories.len());
    let mut contributor_ids: BTreeMap<&str, u32> = BTreeMap::new();
    let mut category_ids: BTreeMap<&str, u32> = BTreeMap::new();
    let mut next_id = 1u32;

    for contributor in &contributors {
        let total = matrix.row_total(contributor);
        nodes.push(GraphNode {
            id: next_id,
            label: (*contributor).to_string(),
            kind: NodeKind::Contributor,
            size: contributor_size(total, filter.min_edge_weight),
            annotation: contributions_label(total),
        });
        contributor_ids.insert(*contributor, next_id);
        next_id += 1;
    }

    for category in &categories {
        nodes.push(GraphNode {
            id: next_id,
            label: (*category).to_string(),
            kind: NodeKind::BugCategory,
            size: CATEGORY_NODE_SIZE,
            annotation: contributions_label(matrix.column_total(category)),
        });
        category_ids.insert(*category, next_id);
        next_id += 1;
    }

    let edges: Vec<GraphEdge> = passing
        .iter()
        .map(|r| GraphEdge {
            from: contributor_ids[r.contributor.as_str()],
            to: category_ids[r.bug_category.as_str()],
            weight: edge_weight(r.weight),
            contributions: r.weight,
            annotation: contributions_label(r.weight),
        })
        .collect();

    tracing::debug!(
        ?filter,
        passing = passing.len(),
        rejected = records.len() - passing.len(),
        nodes = nodes.len(),
        "built contributor graph"
    );

    BipartiteGraph { nodes, edges }
}

/// Display size of a contributor node.
pub fn contributor_size(total: u64, min_edge_weight: u64) -> f64 {
    let divisor = min_edge_weight.max(1) as f64;
    let ratio = total.max(1) as f64 / divisor;
    (NODE_SCALE * (1.0 + ratio.log10())).max(MIN_NODE_SIZE)
}

/// Display weight of an edge.
pub fn edge_weight(weight: u64) -> f64 {
    1.0 + (weight.max(1) as f64).log10()
}

fn contributions_label(count: u64) -> String {
    if count == 1 {
        "1 contribution".to_string()
    } else {
        format!("{count} contributions")
    }
}
