//! Contribution log ingestion.
//!
//! Reads the CSV contribution log into canonical [`ContributionRecord`]s,
//! validating the header and every row. Columns are located by name, so
//! their order does not matter and extra columns are ignored.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use triage_core::TriageError;

/// Column holding the contributor identifier.
pub const COLUMN_SOURCE: &str = "source";
/// Column holding the bug category identifier.
pub const COLUMN_TARGET: &str = "target";
/// Column holding the contribution count.
pub const COLUMN_WEIGHT: &str = "weight";
/// Column holding the start of the contribution period.
pub const COLUMN_START_DATE: &str = "start_date";
/// Column holding the end of the contribution period.
pub const COLUMN_END_DATE: &str = "end_date";
/// Column holding the contribution year.
pub const COLUMN_YEAR: &str = "year";

const REQUIRED_COLUMNS: [&str; 6] = [
    COLUMN_SOURCE,
    COLUMN_TARGET,
    COLUMN_WEIGHT,
    COLUMN_START_DATE,
    COLUMN_END_DATE,
    COLUMN_YEAR,
];

/// One row of the contribution log.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use triage_model::records::ContributionRecord;
///
/// let record = ContributionRecord {
///     contributor: "alice".into(),
///     bug_category: "Crash".into(),
///     weight: 5,
///     start_date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2021, 3, 30).unwrap(),
///     year: 2021,
/// };
/// assert_eq!(record.weight, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRecord {
    /// Contributor identifier (`source` column).
    pub contributor: String,
    /// Bug category identifier (`target` column).
    pub bug_category: String,
    /// Number of contributions by this contributor to this category.
    pub weight: u64,
    /// First day of the contribution period.
    pub start_date: NaiveDate,
    /// Last day of the contribution period.
    pub end_date: NaiveDate,
    /// Year the contributions are attributed to.
    pub year: i32,
}

/// Load and validate the contribution log at `path`.
///
/// Returns records in file order.
///
/// # Errors
///
/// Returns [`TriageError::DataLoad`] if the file cannot be read, a required
/// column is missing, or any row fails validation.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use triage_model::records::load_records;
///
/// let records = load_records(Path::new("data/commits.csv")).unwrap();
/// println!("{} records", records.len());
/// ```
pub fn load_records(path: &Path) -> Result<Vec<ContributionRecord>, TriageError> {
    let input = path.display().to_string();
    let file = std::fs::File::open(path)
        .map_err(|e| TriageError::data_load(&input, format!("cannot open file: {e}")))?;
    parse_records(file, &input)
}

/// Parse a contribution log from any reader.
///
/// `input` names the source in error messages.
///
/// # Errors
///
/// Returns [`TriageError::DataLoad`] on a missing column, malformed CSV, or
/// an invalid field value. Row numbers in messages are 1-based data rows
/// (the header is not counted).
///
/// # Examples
///
/// ```
/// use triage_model::records::parse_records;
///
/// let csv = "source,target,weight,start_date,end_date,year\n\
///            alice,Crash,5,2021-01-04,2021-03-30,2021\n";
/// let records = parse_records(csv.as_bytes(), "inline").unwrap();
/// assert_eq!(records[0].contributor, "alice");
/// assert_eq!(records[0].bug_category, "Crash");
/// ```
pub fn parse_records<R: Read>(
    reader: R,
    input: &str,
) -> Result<Vec<ContributionRecord>, TriageError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| TriageError::data_load(input, format!("cannot read header: {e}")))?
        .clone();

    let columns = ColumnIndex::locate(&headers)
        .map_err(|column| TriageError::data_load(input, format!("missing column `{column}`")))?;

    let mut records = Vec::new();
    for (i, row) in csv_reader.records().enumerate() {
        let row_number = i + 1;
        let row = row
            .map_err(|e| TriageError::data_load(input, format!("row {row_number}: {e}")))?;
        let record = columns
            .extract(&row)
            .map_err(|reason| TriageError::data_load(input, format!("row {row_number}: {reason}")))?;
        records.push(record);
    }

    tracing::debug!(input, records = records.len(), "parsed contribution log");
    Ok(records)
}

/// Positions of the required columns within a header row.
struct ColumnIndex {
    source: usize,
    target: usize,
    weight: usize,
    start_date: usize,
    end_date: usize,
    year: usize,
}

impl ColumnIndex {
    /// Returns the name of the first missing column on failure.
    fn locate(headers: &csv::StringRecord) -> Result<Self, &'static str> {
        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers.iter().position(|h| h == name).ok_or(name)?;
        }
        let [source, target, weight, start_date, end_date, year] = positions;
        Ok(Self {
            source,
            target,
            weight,
            start_date,
            end_date,
            year,
        })
    }

    fn extract(&self, row: &csv::StringRecord) -> Result<ContributionRecord, String> {
        let contributor = field(row, self.source, COLUMN_SOURCE)?;
        if contributor.is_empty() {
            return Err(format!("empty `{COLUMN_SOURCE}`"));
        }
        let bug_category = field(row, self.target, COLUMN_TARGET)?;
        if bug_category.is_empty() {
            return Err(format!("empty `{COLUMN_TARGET}`"));
        }

        Ok(ContributionRecord {
            contributor: contributor.to_string(),
            bug_category: bug_category.to_string(),
            weight: parse_weight(field(row, self.weight, COLUMN_WEIGHT)?)?,
            start_date: parse_date(field(row, self.start_date, COLUMN_START_DATE)?)?,
            end_date: parse_date(field(row, self.end_date, COLUMN_END_DATE)?)?,
            year: parse_year(field(row, self.year, COLUMN_YEAR)?)?,
        })
    }
}

fn field<'r>(row: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, String> {
    row.get(idx)
        .ok_or_else(|| format!("missing value for `{name}`"))
}

/// Parse a non-negative whole number, accepting `5` and `5.0`.
/// Float-encoded weights must stay below 2^53, where every integer is still
/// exactly representable and the cast cannot round.
const MAX_FLOAT_WEIGHT: f64 = 9_007_199_254_740_992.0;

fn parse_weight(raw: &str) -> Result<u64, String> {
    if let Ok(weight) = raw.parse::<u64>() {
        return Ok(weight);
    }
    match raw.parse::<f64>() {
        Ok(value) if value >= 0.0 && value < MAX_FLOAT_WEIGHT && value.fract() == 0.0 => {
            Ok(value as u64)
        }
        Ok(value) if value < 0.0 => Err(format!("negative weight `{raw}`")),
        _ => Err(format!("invalid weight `{raw}`: expected a non-negative integer")),
    }
}

fn parse_year(raw: &str) -> Result<i32, String> {
    if let Ok(year) = raw.parse::<i32>() {
        return Ok(year);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) => {
            Ok(value as i32)
        }
        _ => Err(format!("invalid year `{raw}`")),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.date_naive());
    }
    Err(format!("invalid date `{raw}`"))
}
