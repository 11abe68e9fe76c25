//! Integration test: load → tally → graph → diversity on a small log.

use std::sync::Arc;

use triage_core::{AggregationPolicy, OutputFormat};
use triage_model::cache::RecordCache;
use triage_model::graph::{GraphFilter, NodeKind};
use triage_model::session::AnalysisSession;

const LOG: &str = "\
source,target,weight,start_date,end_date,year
alice,Crash,5,2021-01-04,2021-03-30,2021
alice,UI,2,2021-01-04,2021-03-30,2021
bob,Crash,10,2021-02-01,2021-02-28,2021
carol,Perf,1,2021-05-01,2021-05-02,2021
carol,Crash,3,2021-05-01,2021-05-02,2021
bob,Crash,12,2021-06-01,2021-06-30,2021
";

fn write_log(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("commits.csv");
    std::fs::write(&path, LOG).unwrap();
    path
}

#[test]
fn end_to_end_on_small_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    let mut cache = RecordCache::new();
    let mut session =
        AnalysisSession::open(&mut cache, &path, AggregationPolicy::LastWriteWins).unwrap();
    assert_eq!(session.records().len(), 6);

    // Step 1: tally, with bob's later Crash record overwriting the earlier one
    let matrix = session.matrix();
    assert_eq!(matrix.contributors(), ["alice", "bob", "carol"]);
    assert_eq!(matrix.categories(), ["Crash", "Perf", "UI"]);
    assert_eq!(matrix.get("bob", "Crash"), 12);
    assert_eq!(matrix.row_total("carol"), 4);

    // Step 2: graph
    let filter = GraphFilter::from_thresholds(3, 11, 0);
    let graph = session.graph(filter);
    let edges: Vec<(String, String, u64)> = graph
        .edges
        .iter()
        .map(|e| {
            (
                graph.node(e.from).unwrap().label.clone(),
                graph.node(e.to).unwrap().label.clone(),
                e.contributions,
            )
        })
        .collect();
    assert_eq!(
        edges,
        vec![
            ("alice".to_string(), "Crash".to_string(), 5),
            ("bob".to_string(), "Crash".to_string(), 10),
            ("carol".to_string(), "Crash".to_string(), 3),
        ]
    );
    assert!(graph.find(NodeKind::BugCategory, "Perf").is_none());
    for edge in &graph.edges {
        assert_eq!(graph.node(edge.from).unwrap().kind, NodeKind::Contributor);
        assert_eq!(graph.node(edge.to).unwrap().kind, NodeKind::BugCategory);
    }

    // Step 3: diversity agrees with matrix totals
    let diversity = session.diversity();
    for record in diversity.iter() {
        assert_eq!(record.frequency, matrix.row_total(&record.contributor));
        assert!((0.0..1.0).contains(&record.diversity_index));
    }
    let bob = diversity.iter().find(|r| r.contributor == "bob").unwrap();
    assert_eq!(bob.diversity_index, 0.0);

    // Step 4: every view renders as valid JSON
    let json = triage_model::output::format_graph(&graph, &filter, OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["summary"]["contributors"], 3);
}

#[test]
fn reloading_unchanged_log_shares_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    let mut cache = RecordCache::new();
    let first = cache.load(&path).unwrap();
    let second = cache.load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn sum_policy_changes_totals_downstream() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    let mut cache = RecordCache::new();
    let mut session = AnalysisSession::open(&mut cache, &path, AggregationPolicy::Sum).unwrap();
    assert_eq!(session.matrix().get("bob", "Crash"), 22);

    let report = triage_model::generate_report(&mut session, GraphFilter::default(), 2);
    assert_eq!(report.total_contributions, 5 + 2 + 22 + 1 + 3);
    assert_eq!(report.most_diverse.len(), 2);
    assert_eq!(report.graph.edges, 6);
}
