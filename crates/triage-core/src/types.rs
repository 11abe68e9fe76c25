use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How duplicate (contributor, category) records combine in the tally.
///
/// The contribution log may list the same pair more than once. The
/// historical behavior keeps only the last record seen; [`Sum`] adds them.
///
/// [`Sum`]: AggregationPolicy::Sum
///
/// # Examples
///
/// ```
/// use triage_core::AggregationPolicy;
///
/// let policy: AggregationPolicy = "sum".parse().unwrap();
/// assert_eq!(policy, AggregationPolicy::Sum);
/// assert_eq!(AggregationPolicy::default(), AggregationPolicy::LastWriteWins);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationPolicy {
    /// A later record overwrites the cell written by an earlier one.
    #[default]
    LastWriteWins,
    /// Duplicate records add up.
    Sum,
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationPolicy::LastWriteWins => write!(f, "last-write-wins"),
            AggregationPolicy::Sum => write!(f, "sum"),
        }
    }
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-write-wins" | "last" | "overwrite" => Ok(AggregationPolicy::LastWriteWins),
            "sum" => Ok(AggregationPolicy::Sum),
            other => Err(format!("unknown aggregation policy: {other}")),
        }
    }
}

/// Output format for CLI commands.
///
/// # Examples
///
/// ```
/// use triage_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
