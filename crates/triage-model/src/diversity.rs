//! Contributor diversity analysis.
//!
//! Computes, per contributor, the Gini-Simpson index of their contributions
//! across bug categories together with their total contribution frequency.
//! An index of 0 means all work sits in one category; values approach 1 as
//! work spreads evenly across many categories.

use serde::{Deserialize, Serialize};

use crate::tally::{saturating_sum, ContributionMatrix};

/// Diversity and frequency for one contributor.
///
/// # Examples
///
/// ```
/// use triage_model::diversity::DiversityRecord;
///
/// let record = DiversityRecord {
///     contributor: "alice".into(),
///     diversity_index: 0.5,
///     frequency: 12,
/// };
/// assert!(record.diversity_index < 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityRecord {
    /// Contributor identifier.
    pub contributor: String,
    /// `1 - Σ (w_i / T)²`, or 0 when the contributor's total is 0.
    pub diversity_index: f64,
    /// Total contributions `T`.
    pub frequency: u64,
}

/// Compute one [`DiversityRecord`] per matrix row, in row order.
///
/// Contributors whose row sums to zero are kept with an index of 0.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use triage_model::diversity::analyze_diversity;
/// use triage_model::records::ContributionRecord;
/// use triage_model::tally::tally;
///
/// let day = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
/// let record = |k: &str, w: u64| ContributionRecord {
///     contributor: "A".into(),
///     bug_category: k.into(),
///     weight: w,
///     start_date: day,
///     end_date: day,
///     year: 2021,
/// };
/// let matrix = tally(&[record("Crash", 5), record("UI", 2)]);
/// let diversity = analyze_diversity(&matrix);
/// assert_eq!(diversity[0].frequency, 7);
/// assert!((diversity[0].diversity_index - 20.0 / 49.0).abs() < 1e-12);
/// ```
pub fn analyze_diversity(matrix: &ContributionMatrix) -> Vec<DiversityRecord> {
    let records: Vec<DiversityRecord> = matrix
        .rows()
        .map(|(contributor, row)| DiversityRecord {
            contributor: contributor.to_string(),
            diversity_index: gini_simpson(row),
            frequency: saturating_sum(row),
        })
        .collect();

    let idle = records.iter().filter(|r| r.frequency == 0).count();
    if idle > 0 {
        tracing::debug!(idle, "contributors with zero total get diversity 0");
    }

    records
}

/// Gini-Simpson index of a row of counts.
///
/// Returns 0 for an all-zero row instead of dividing by zero.
pub fn gini_simpson(counts: &[u64]) -> f64 {
    let total = saturating_sum(counts);
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let concentration: f64 = counts
        .iter()
        .map(|&w| {
            let p = w as f64 / total;
            p * p
        })
        .sum();
    // rounding can leave a tiny negative value for single-category rows
    (1.0 - concentration).max(0.0)
}

/// Sort a copy of `records` by diversity index descending.
///
/// Ties go to the higher frequency, then to the contributor name.
pub fn rank_by_diversity(records: &[DiversityRecord]) -> Vec<DiversityRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| {
        b.diversity_index
            .partial_cmp(&a.diversity_index)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.frequency.cmp(&a.frequency))
            .then_with(|| a.contributor.cmp(&b.contributor))
    });
    ranked
}
