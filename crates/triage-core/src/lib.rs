//! Core types, configuration, and error handling for bug triage analytics.
//!
//! This crate provides the shared foundation used by the model crate and the
//! `triage` binary:
//! - [`TriageError`]: unified error type using `thiserror` and `miette`
//! - [`TriageConfig`]: configuration loaded from `.triage.toml`
//! - Shared types: [`AggregationPolicy`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{DataConfig, GraphConfig, TallyConfig, TriageConfig};
pub use error::TriageError;
pub use types::{AggregationPolicy, OutputFormat};

/// A convenience `Result` type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
