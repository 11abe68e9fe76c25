use miette::Diagnostic;

/// Errors that can occur across the triage workspace.
///
/// Library crates use this type directly; the binary crate converts to
/// `miette::Report` at the boundary.
///
/// Arithmetic degeneracies (zero totals, zero-weight logarithms) are never
/// reported here: the model layer resolves them with fallback values.
///
/// # Examples
///
/// ```
/// use triage_core::TriageError;
///
/// let err = TriageError::data_load("commits.csv", "missing column `weight`");
/// assert!(err.to_string().contains("missing column `weight`"));
/// ```
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum TriageError {
    /// The contribution log could not be read or validated.
    #[error("failed to load {input}: {reason}")]
    #[diagnostic(
        code(triage::data_load),
        help("the input must be a CSV file with columns source, target, weight, start_date, end_date, year")
    )]
    DataLoad {
        /// Name of the input (usually a file path).
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Filesystem I/O failure outside of data loading.
    #[error("IO error: {0}")]
    #[diagnostic(code(triage::io))]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    #[diagnostic(code(triage::config))]
    Config(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(triage::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(triage::toml), help("check the syntax of .triage.toml"))]
    Toml(#[from] toml::de::Error),

    /// A contributor was requested that does not appear in the matrix.
    #[error("unknown contributor: {0}")]
    #[diagnostic(
        code(triage::unknown_contributor),
        help("run `triage matrix` to list known contributors")
    )]
    UnknownContributor(String),
}

impl TriageError {
    /// Build a [`TriageError::DataLoad`] from anything string-like.
    pub fn data_load(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataLoad {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TriageError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = TriageError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn data_load_names_input_and_reason() {
        let err = TriageError::data_load("data/commits.csv", "row 3: negative weight");
        assert_eq!(
            err.to_string(),
            "failed to load data/commits.csv: row 3: negative weight"
        );
    }

    #[test]
    fn unknown_contributor_has_help() {
        let err = TriageError::UnknownContributor("zed".into());
        assert!(err.help().is_some());
        assert!(err.to_string().contains("zed"));
    }
}
