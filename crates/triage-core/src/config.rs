use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TriageError;
use crate::types::AggregationPolicy;

/// Top-level configuration loaded from `.triage.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use triage_core::TriageConfig;
///
/// let config = TriageConfig::default();
/// assert_eq!(config.graph.min_edge_weight, 1);
/// assert!(config.graph.max_edge_weight.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Input data settings.
    #[serde(default)]
    pub data: DataConfig,
    /// Matrix aggregation settings.
    #[serde(default)]
    pub tally: TallyConfig,
    /// Default graph filter thresholds.
    #[serde(default)]
    pub graph: GraphConfig,
}

impl TriageConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Io`] if the file cannot be read, or
    /// [`TriageError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use triage_core::TriageConfig;
    /// use std::path::Path;
    ///
    /// let config = TriageConfig::from_file(Path::new(".triage.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, TriageError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use triage_core::TriageConfig;
    ///
    /// let toml = r#"
    /// [graph]
    /// min_edge_weight = 3
    /// "#;
    /// let config = TriageConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.graph.min_edge_weight, 3);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, TriageError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Where the contribution log lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the CSV contribution log (default: `data/commits.csv`).
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/commits.csv")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

/// Tally configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyConfig {
    /// How duplicate (contributor, category) records combine.
    #[serde(default)]
    pub aggregation: AggregationPolicy,
}

/// Default thresholds for the contributor/category graph.
///
/// # Examples
///
/// ```
/// use triage_core::GraphConfig;
///
/// let config = GraphConfig::default();
/// assert_eq!(config.min_edge_weight, 1);
/// assert_eq!(config.min_total_contribs, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Minimum per-record weight for an edge (default: 1).
    #[serde(default = "default_min_edge_weight")]
    pub min_edge_weight: u64,
    /// Maximum per-record weight for an edge. Absent means unbounded.
    #[serde(default)]
    pub max_edge_weight: Option<u64>,
    /// Minimum contributor total for any of their edges to appear (default: 0).
    #[serde(default)]
    pub min_total_contribs: u64,
}

fn default_min_edge_weight() -> u64 {
    1
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_edge_weight: default_min_edge_weight(),
            max_edge_weight: None,
            min_total_contribs: 0,
        }
    }
}
