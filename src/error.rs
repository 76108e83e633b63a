//! Error types for the parts of the crate that can fail.
//!
//! The KPI core itself never fails: missing or malformed values degrade to
//! `None` and eventually to a "No data" result. Only loading configuration
//! and export files from disk produce errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a [`crate::config::KpiConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("sprint calendar has no entries")]
    EmptyCalendar,

    #[error("sprint key '{0}' is not an integer")]
    InvalidSprint(String),

    #[error("sprint {sprint} has an invalid end date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { sprint: i64, value: String },

    #[error("sprint length must be a positive number of days, got {0}")]
    InvalidSprintLength(i64),
}

/// Errors raised while reading a work-item export.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read export at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("expected a JSON array of work items")]
    NotAnArray,
}
