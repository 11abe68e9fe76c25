//! Text, JSON, and Markdown renderings of every analytic view.
//!
//! These are the feeds consumed by table, graph, and chart renderers. JSON
//! keys are camelCase throughout.

use std::fmt::Write;

use serde::Serialize;
use serde_json::json;
use triage_core::{OutputFormat, TriageError};

use crate::diversity::DiversityRecord;
use crate::graph::{BipartiteGraph, GraphFilter, NodeKind};
use crate::records::ContributionRecord;
use crate::tally::{saturating_sum, CategoryCount, ContributionMatrix};
use crate::Report;

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, TriageError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render the raw record table.
///
/// # Errors
///
/// Returns [`TriageError::Serialization`] if JSON serialization fails.
///
/// # Examples
///
/// ```
/// use triage_core::OutputFormat;
/// use triage_model::output::format_records;
///
/// let out = format_records(&[], OutputFormat::Text).unwrap();
/// assert!(out.contains("0 records"));
/// ```
pub fn format_records(
    records: &[ContributionRecord],
    format: OutputFormat,
) -> Result<String, TriageError> {
    if format == OutputFormat::Json {
        return to_json(records);
    }

    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            let _ = writeln!(out, "# Contribution Records\n");
            let _ = writeln!(
                out,
                "| Contributor | Bug category | Weight | Start | End | Year |"
            );
            let _ = writeln!(
                out,
                "|-------------|--------------|--------|-------|-----|------|"
            );
            for r in records {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} |",
                    r.contributor, r.bug_category, r.weight, r.start_date, r.end_date, r.year
                );
            }
        }
        _ => {
            let width = records
                .iter()
                .map(|r| r.contributor.len())
                .max()
                .unwrap_or(0)
                .max("CONTRIBUTOR".len());
            let cat_width = records
                .iter()
                .map(|r| r.bug_category.len())
                .max()
                .unwrap_or(0)
                .max("CATEGORY".len());
            let _ = writeln!(
                out,
                "{:<width$}  {:<cat_width$}  {:>6}  {:<10}  {:<10}  YEAR",
                "CONTRIBUTOR", "CATEGORY", "WEIGHT", "START", "END"
            );
            for r in records {
                let _ = writeln!(
                    out,
                    "{:<width$}  {:<cat_width$}  {:>6}  {:<10}  {:<10}  {}",
                    r.contributor,
                    r.bug_category,
                    r.weight,
                    r.start_date.to_string(),
                    r.end_date.to_string(),
                    r.year
                );
            }
        }
    }
    let _ = writeln!(out, "\n{} records", records.len());
    Ok(out)
}

/// Render the contributor × category matrix with a row-total column.
///
/// # Errors
///
/// Returns [`TriageError::Serialization`] if JSON serialization fails.
pub fn format_matrix(
    matrix: &ContributionMatrix,
    format: OutputFormat,
) -> Result<String, TriageError> {
    if format == OutputFormat::Json {
        let rows: Vec<_> = matrix
            .rows()
            .map(|(contributor, row)| {
                json!({
                    "contributor": contributor,
                    "counts": row,
                    "total": saturating_sum(row),
                })
            })
            .collect();
        return to_json(&json!({
            "categories": matrix.categories(),
            "rows": rows,
            "grandTotal": matrix.grand_total(),
        }));
    }

    let mut out = String::new();
    if matrix.is_empty() {
        let _ = writeln!(out, "Empty contribution matrix.");
        return Ok(out);
    }

    match format {
        OutputFormat::Markdown => {
            let _ = writeln!(out, "# Contribution Matrix\n");
            let mut header = String::from("| Contributor |");
            let mut rule = String::from("|-------------|");
            for category in matrix.categories() {
                let _ = write!(header, " {category} |");
                rule.push_str("---:|");
            }
            header.push_str(" Total |");
            rule.push_str("---:|");
            let _ = writeln!(out, "{header}\n{rule}");
            for (contributor, row) in matrix.rows() {
                let _ = write!(out, "| {contributor} |");
                for count in row {
                    let _ = write!(out, " {count} |");
                }
                let _ = writeln!(out, " {} |", saturating_sum(row));
            }
        }
        _ => {
            let name_width = matrix
                .contributors()
                .iter()
                .map(String::len)
                .max()
                .unwrap_or(0)
                .max("CONTRIBUTOR".len());
            let widths: Vec<usize> = matrix
                .categories()
                .iter()
                .map(|k| k.len().max(column_width(matrix, k)))
                .collect();

            let _ = write!(out, "{:<name_width$}", "CONTRIBUTOR");
            for (category, w) in matrix.categories().iter().zip(widths.iter().copied()) {
                let _ = write!(out, "  {category:>w$}");
            }
            let _ = writeln!(out, "  TOTAL");
            for (contributor, row) in matrix.rows() {
                let _ = write!(out, "{contributor:<name_width$}");
                for (count, w) in row.iter().zip(widths.iter().copied()) {
                    let _ = write!(out, "  {count:>w$}");
                }
                let _ = writeln!(out, "  {}", saturating_sum(row));
            }
        }
    }
    Ok(out)
}

fn column_width(matrix: &ContributionMatrix, category: &str) -> usize {
    matrix
        .contributors()
        .iter()
        .map(|c| matrix.get(c, category).to_string().len())
        .max()
        .unwrap_or(1)
}

/// Render the node and edge lists of a graph.
///
/// # Errors
///
/// Returns [`TriageError::Serialization`] if JSON serialization fails.
pub fn format_graph(
    graph: &BipartiteGraph,
    filter: &GraphFilter,
    format: OutputFormat,
) -> Result<String, TriageError> {
    if format == OutputFormat::Json {
        return to_json(&json!({
            "filter": filter,
            "summary": graph.summary(),
            "nodes": graph.nodes,
            "edges": graph.edges,
        }));
    }

    let summary = graph.summary();
    let bounds = describe_filter(filter);
    let label_of = |id: u32| graph.node(id).map_or("?", |n| n.label.as_str());

    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            let _ = writeln!(out, "# Contributor / Bug Category Graph\n");
            let _ = writeln!(out, "**Filter:** {bounds}\n");
            let _ = writeln!(
                out,
                "**Nodes:** {} contributors, {} categories. **Edges:** {}\n",
                summary.contributors, summary.categories, summary.edges
            );
            let _ = writeln!(out, "## Nodes\n");
            let _ = writeln!(out, "| Id | Label | Kind | Size | Annotation |");
            let _ = writeln!(out, "|----|-------|------|------|------------|");
            for n in &graph.nodes {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {:.2} | {} |",
                    n.id,
                    n.label,
                    kind_label(n.kind),
                    n.size,
                    n.annotation
                );
            }
            let _ = writeln!(out, "\n## Edges\n");
            let _ = writeln!(out, "| From | To | Weight | Annotation |");
            let _ = writeln!(out, "|------|----|--------|------------|");
            for e in &graph.edges {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:.3} | {} |",
                    label_of(e.from),
                    label_of(e.to),
                    e.weight,
                    e.annotation
                );
            }
        }
        _ => {
            let _ = writeln!(out, "Filter: {bounds}");
            let _ = writeln!(
                out,
                "Nodes: {} contributors, {} categories  Edges: {}",
                summary.contributors, summary.categories, summary.edges
            );
            let _ = writeln!(out, "{:-<72}", "");
            for n in &graph.nodes {
                let _ = writeln!(
                    out,
                    "{:>4}  {:<9} {:<32} size={:.2}  ({})",
                    n.id,
                    kind_label(n.kind),
                    n.label,
                    n.size,
                    n.annotation
                );
            }
            let _ = writeln!(out, "{:-<72}", "");
            for e in &graph.edges {
                let _ = writeln!(
                    out,
                    "  {} -> {} (weight={:.3}, {})",
                    label_of(e.from),
                    label_of(e.to),
                    e.weight,
                    e.annotation
                );
            }
        }
    }
    Ok(out)
}

/// Render the `(contributor, diversityIndex, frequency)` scatter feed.
///
/// # Errors
///
/// Returns [`TriageError::Serialization`] if JSON serialization fails.
pub fn format_diversity(
    records: &[DiversityRecord],
    format: OutputFormat,
) -> Result<String, TriageError> {
    if format == OutputFormat::Json {
        return to_json(records);
    }

    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            let _ = writeln!(out, "# Contributor Diversity\n");
            let _ = writeln!(out, "| Contributor | Diversity | Frequency |");
            let _ = writeln!(out, "|-------------|-----------|-----------|");
            for r in records {
                let _ = writeln!(
                    out,
                    "| {} | {:.3} | {} |",
                    r.contributor, r.diversity_index, r.frequency
                );
            }
        }
        _ => {
            let width = records
                .iter()
                .map(|r| r.contributor.len())
                .max()
                .unwrap_or(0)
                .max("CONTRIBUTOR".len());
            let _ = writeln!(out, "{:<width$}  DIVERSITY  FREQUENCY", "CONTRIBUTOR");
            for r in records {
                let _ = writeln!(
                    out,
                    "{:<width$}  {:>9.3}  {:>9}",
                    r.contributor, r.diversity_index, r.frequency
                );
            }
        }
    }
    Ok(out)
}

/// Render one contributor's `(bugCategory, count)` bar feed.
///
/// # Errors
///
/// Returns [`TriageError::Serialization`] if JSON serialization fails.
pub fn format_breakdown(
    contributor: &str,
    counts: &[CategoryCount],
    format: OutputFormat,
) -> Result<String, TriageError> {
    if format == OutputFormat::Json {
        return to_json(&json!({
            "contributor": contributor,
            "categories": counts,
        }));
    }

    let total = saturating_sum(counts.iter().map(|c| &c.count));
    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            let _ = writeln!(out, "# {contributor}\n");
            let _ = writeln!(out, "| Bug category | Count |");
            let _ = writeln!(out, "|--------------|------:|");
            for c in counts {
                let _ = writeln!(out, "| {} | {} |", c.bug_category, c.count);
            }
            let _ = writeln!(out, "\n**Total:** {total}");
        }
        _ => {
            let _ = writeln!(out, "{contributor} ({total} contributions)");
            let _ = writeln!(out, "{:-<72}", "");
            let width = counts
                .iter()
                .map(|c| c.bug_category.len())
                .max()
                .unwrap_or(0);
            let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
            for c in counts {
                let _ = writeln!(
                    out,
                    "  {:<width$}  {:>6}  {}",
                    c.bug_category,
                    c.count,
                    bar(c.count, max, 40)
                );
            }
        }
    }
    Ok(out)
}

/// Render a combined report.
///
/// # Errors
///
/// Returns [`TriageError::Serialization`] if JSON serialization fails.
pub fn format_report(report: &Report, format: OutputFormat) -> Result<String, TriageError> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            let _ = writeln!(out, "# Bug Triage Report\n");
            let _ = writeln!(out, "- **Records:** {}", report.records);
            let _ = writeln!(out, "- **Contributors:** {}", report.contributors);
            let _ = writeln!(out, "- **Bug categories:** {}", report.categories);
            let _ = writeln!(
                out,
                "- **Total contributions:** {} ({})",
                report.total_contributions, report.aggregation
            );
            let _ = writeln!(
                out,
                "- **Graph:** {} contributors, {} categories, {} edges ({})\n",
                report.graph.contributors,
                report.graph.categories,
                report.graph.edges,
                describe_filter(&report.filter)
            );
            out.push_str(&format_diversity(&report.most_diverse, OutputFormat::Markdown)?);
        }
        _ => {
            let _ = writeln!(out, "Bug Triage Report");
            let _ = writeln!(out, "{:-<72}", "");
            let _ = writeln!(out, "  Records:             {}", report.records);
            let _ = writeln!(out, "  Contributors:        {}", report.contributors);
            let _ = writeln!(out, "  Bug categories:      {}", report.categories);
            let _ = writeln!(
                out,
                "  Total contributions: {} ({})",
                report.total_contributions, report.aggregation
            );
            let _ = writeln!(
                out,
                "  Graph:               {} contributors, {} categories, {} edges",
                report.graph.contributors, report.graph.categories, report.graph.edges
            );
            let _ = writeln!(out, "  Filter:              {}", describe_filter(&report.filter));
            let _ = writeln!(out, "\nMost diverse contributors:");
            out.push_str(&format_diversity(&report.most_diverse, OutputFormat::Text)?);
        }
    }
    Ok(out)
}

/// One-line description of a filter, e.g. `weight 3..=100, contributor total >= 0`.
pub fn describe_filter(filter: &GraphFilter) -> String {
    let upper = filter
        .max_edge_weight
        .map_or_else(String::new, |max| format!("={max}"));
    format!(
        "weight {}..{upper}, contributor total >= {}",
        filter.min_edge_weight, filter.min_total_contribs
    )
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Contributor => "person",
        NodeKind::BugCategory => "category",
    }
}

fn bar(value: u64, max: u64, width: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (u128::from(value) * u128::from(width)).div_ceil(u128::from(max));
    "#".repeat(len.min(u128::from(width)) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::tally::tally;
    use crate::tally::tests::record;

    fn sample() -> Vec<ContributionRecord> {
        vec![
            record("alice", "Crash", 5),
            record("alice", "UI", 2),
            record("bob", "Crash", 10),
        ]
    }

    #[test]
    fn records_text_lists_every_row() {
        let out = format_records(&sample(), OutputFormat::Text).unwrap();
        assert!(out.starts_with("CONTRIBUTOR"));
        assert_eq!(out.matches("alice").count(), 2);
        assert!(out.contains("3 records"));
    }

    #[test]
    fn records_json_is_camel_case() {
        let out = format_records(&sample(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["bugCategory"], "Crash");
        assert_eq!(parsed[0]["startDate"], "2020-06-01");
    }

    #[test]
    fn matrix_json_has_categories_and_totals() {
        let matrix = tally(&sample());
        let out = format_matrix(&matrix, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["categories"], json!(["Crash", "UI"]));
        assert_eq!(parsed["rows"][0]["contributor"], "alice");
        assert_eq!(parsed["rows"][0]["counts"], json!([5, 2]));
        assert_eq!(parsed["rows"][0]["total"], 7);
        assert_eq!(parsed["grandTotal"], 17);
    }

    #[test]
    fn matrix_markdown_has_header_row() {
        let matrix = tally(&sample());
        let out = format_matrix(&matrix, OutputFormat::Markdown).unwrap();
        assert!(out.contains("| Contributor | Crash | UI | Total |"));
        assert!(out.contains("| bob | 10 | 0 | 10 |"));
    }

    #[test]
    fn matrix_text_aligns_columns() {
        let matrix = tally(&sample());
        let out = format_matrix(&matrix, OutputFormat::Text).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("CONTRIBUTOR"));
        assert!(lines[2].starts_with("bob"));
        assert!(lines[2].ends_with("10"));
    }

    #[test]
    fn empty_matrix_text() {
        let out = format_matrix(&ContributionMatrix::default(), OutputFormat::Text).unwrap();
        assert_eq!(out.trim(), "Empty contribution matrix.");
    }

    #[test]
    fn graph_json_exposes_nodes_and_edges() {
        let records = sample();
        let matrix = tally(&records);
        let filter = GraphFilter::from_thresholds(3, 100, 0);
        let graph = build_graph(&records, &matrix, &filter);
        let out = format_graph(&graph, &filter, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed["nodes"][0]["id"], 1);
        assert_eq!(parsed["nodes"][0]["kind"], "contributor");
        assert_eq!(parsed["nodes"][2]["kind"], "bugCategory");
        assert_eq!(parsed["edges"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["filter"]["maxEdgeWeight"], 100);
        assert_eq!(parsed["summary"]["edges"], 2);
    }

    #[test]
    fn graph_text_names_edge_endpoints() {
        let records = sample();
        let matrix = tally(&records);
        let filter = GraphFilter::default();
        let graph = build_graph(&records, &matrix, &filter);
        let out = format_graph(&graph, &filter, OutputFormat::Text).unwrap();
        assert!(out.contains("bob -> Crash"));
        assert!(out.contains("alice -> UI"));
    }

    #[test]
    fn diversity_text_has_three_decimals() {
        let matrix = tally(&sample());
        let diversity = crate::diversity::analyze_diversity(&matrix);
        let out = format_diversity(&diversity, OutputFormat::Text).unwrap();
        assert!(out.contains("0.408"));
    }

    #[test]
    fn breakdown_text_draws_bars() {
        let counts = tally(&sample()).category_breakdown("alice").unwrap();
        let out = format_breakdown("alice", &counts, OutputFormat::Text).unwrap();
        assert!(out.starts_with("alice (7 contributions)"));
        assert!(out.contains(&"#".repeat(40)));
    }

    #[test]
    fn describe_filter_shows_bounds() {
        assert_eq!(
            describe_filter(&GraphFilter::from_thresholds(3, 100, 2)),
            "weight 3..=100, contributor total >= 2"
        );
        assert_eq!(
            describe_filter(&GraphFilter::from_thresholds(3, 0, 0)),
            "weight 3.., contributor total >= 0"
        );
    }

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(10, 10, 40).len(), 40);
        assert_eq!(bar(5, 10, 40).len(), 20);
        assert_eq!(bar(0, 0, 40), "");
        assert_eq!(bar(u64::MAX, u64::MAX, 40).len(), 40);
        assert_eq!(bar(1, u64::MAX, 40).len(), 1);
    }

    #[test]
    fn huge_counts_render_without_overflow() {
        let matrix = tally(&[
            record("A", "Crash", u64::MAX),
            record("A", "UI", 2),
        ]);
        let text = format_matrix(&matrix, OutputFormat::Text).unwrap();
        assert!(text.contains(&u64::MAX.to_string()));

        let counts = matrix.category_breakdown("A").unwrap();
        let out = format_breakdown("A", &counts, OutputFormat::Text).unwrap();
        assert!(out.contains(&format!("({} contributions)", u64::MAX)));
    }
}
