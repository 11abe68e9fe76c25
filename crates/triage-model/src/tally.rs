//! Contributor × bug-category contribution matrix.
//!
//! Aggregates contribution records into a dense count matrix whose rows are
//! contributors and whose columns are bug categories, both in lexicographic
//! order. Row sums are each contributor's total contribution count, the
//! figure the graph builder and the diversity analyzer rely on.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use triage_core::{AggregationPolicy, TriageError};

use crate::records::ContributionRecord;

/// Sum of `counts`, saturating at `u64::MAX`.
///
/// Every total in the crate goes through this so that a log with huge
/// weights never overflows.
///
/// # Examples
///
/// ```
/// use triage_model::tally::saturating_sum;
///
/// assert_eq!(saturating_sum(&[5, 2]), 7);
/// assert_eq!(saturating_sum(&[u64::MAX, 2]), u64::MAX);
/// ```
pub fn saturating_sum<'a>(counts: impl IntoIterator<Item = &'a u64>) -> u64 {
    counts
        .into_iter()
        .fold(0, |total, &count| total.saturating_add(count))
}

/// Aggregated contribution counts per (contributor, bug category).
///
/// Absent pairs count as zero.
///
/// # Examples
///
/// ```
/// use triage_model::tally::ContributionMatrix;
///
/// let matrix = ContributionMatrix::default();
/// assert!(matrix.is_empty());
/// assert_eq!(matrix.row_total("alice"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionMatrix {
    contributors: Vec<String>,
    categories: Vec<String>,
    /// `cells[row][column]`, one row per contributor.
    cells: Vec<Vec<u64>>,
}

/// Count of one contributor's contributions to one bug category.
///
/// # Examples
///
/// ```
/// use triage_model::tally::CategoryCount;
///
/// let count = CategoryCount { bug_category: "Crash".into(), count: 5 };
/// assert_eq!(count.count, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Bug category identifier.
    pub bug_category: String,
    /// Aggregated contribution count.
    pub count: u64,
}

/// Tally records with the default policy, where a later duplicate
/// (contributor, category) record overwrites an earlier one.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
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
/// let matrix = tally(&[record("A", "Crash", 3), record("A", "Crash", 5)]);
/// assert_eq!(matrix.get("A", "Crash"), 5);
/// ```
pub fn tally(records: &[ContributionRecord]) -> ContributionMatrix {
    tally_with(records, AggregationPolicy::LastWriteWins)
}

/// Tally records, combining duplicate pairs according to `policy`.
pub fn tally_with(records: &[ContributionRecord], policy: AggregationPolicy) -> ContributionMatrix {
    let categories: Vec<String> = records
        .iter()
        .map(|r| r.bug_category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let contributors: Vec<String> = records
        .iter()
        .map(|r| r.contributor.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let column_of: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    let row_of: HashMap<&str, usize> = contributors
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut cells = vec![vec![0u64; categories.len()]; contributors.len()];
    let mut duplicates = 0usize;
    let mut seen = vec![vec![false; categories.len()]; contributors.len()];

    for record in records {
        let row = row_of[record.contributor.as_str()];
        let column = column_of[record.bug_category.as_str()];
        if seen[row][column] {
            duplicates += 1;
        }
        seen[row][column] = true;

        let cell = &mut cells[row][column];
        match policy {
            AggregationPolicy::LastWriteWins => *cell = record.weight,
            AggregationPolicy::Sum => *cell = cell.saturating_add(record.weight),
        }
    }

    if duplicates > 0 {
        tracing::warn!(
            duplicates,
            %policy,
            "contribution log repeats (contributor, category) pairs"
        );
    }
    tracing::debug!(
        contributors = contributors.len(),
        categories = categories.len(),
        "tallied contribution matrix"
    );

    ContributionMatrix {
        contributors,
        categories,
        cells,
    }
}

impl ContributionMatrix {
    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// Contributor row labels, sorted.
    pub fn contributors(&self) -> &[String] {
        &self.contributors
    }

    /// Bug category column labels, sorted.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Iterate `(contributor, row)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.contributors
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    /// The cells of `contributor`'s row, in column order.
    pub fn row(&self, contributor: &str) -> Option<&[u64]> {
        self.row_index(contributor).map(|i| self.cells[i].as_slice())
    }

    /// Count for one (contributor, category) pair; zero when absent.
    pub fn get(&self, contributor: &str, category: &str) -> u64 {
        let Some(row) = self.row_index(contributor) else {
            return 0;
        };
        let Some(column) = self.column_index(category) else {
            return 0;
        };
        self.cells[row][column]
    }

    /// Total contributions of `contributor` across all categories.
    ///
    /// Unknown contributors total zero.
    pub fn row_total(&self, contributor: &str) -> u64 {
        self.row(contributor).map_or(0, |row| saturating_sum(row))
    }

    /// Total contributions to `category` across all contributors.
    pub fn column_total(&self, category: &str) -> u64 {
        let Some(column) = self.column_index(category) else {
            return 0;
        };
        saturating_sum(self.cells.iter().map(|row| &row[column]))
    }

    /// Sum of every cell.
    pub fn grand_total(&self) -> u64 {
        saturating_sum(self.cells.iter().flatten())
    }

    /// Non-zero categories of one contributor, largest count first.
    ///
    /// Ties are broken by category name. This is the bar-chart feed.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::UnknownContributor`] if `contributor` has no row.
    pub fn category_breakdown(&self, contributor: &str) -> Result<Vec<CategoryCount>, TriageError> {
        let row = self
            .row(contributor)
            .ok_or_else(|| TriageError::UnknownContributor(contributor.to_string()))?;

        let mut counts: Vec<CategoryCount> = self
            .categories
            .iter()
            .zip(row)
            .filter(|(_, count)| **count > 0)
            .map(|(category, count)| CategoryCount {
                bug_category: category.clone(),
                count: *count,
            })
            .collect();
        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.bug_category.cmp(&b.bug_category))
        });
        Ok(counts)
    }

    fn row_index(&self, contributor: &str) -> Option<usize> {
        self.contributors
            .binary_search_by(|c| c.as_str().cmp(contributor))
            .ok()
    }

    fn column_index(&self, category: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|k| k.as_str().cmp(category))
            .ok()
    }
}
