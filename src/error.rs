//! Typed failures surfaced by the scoring pipeline

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Rubric problems. Raised at load time; a rubric that fails here never reaches scoring.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rubric {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rubric in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rubric not found: {0}")]
    NotFound(PathBuf),

    #[error("circular extends detected in rubric: {0}")]
    CircularExtends(PathBuf),

    #[error("criterion weights sum to {actual}, expected {expected}")]
    WeightSum { expected: f64, actual: f64 },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Problems with the caller's input, rejected before preprocessing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("transcript is not valid UTF-8 text (invalid byte after offset {valid_up_to})")]
    NotUtf8 { valid_up_to: usize },

    #[error("{field} must be text, found {found}")]
    NotText {
        field: &'static str,
        found: &'static str,
    },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

/// Failure of an external language service. Never fatal to a scoring call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("{0} is unavailable")]
    Unavailable(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Failed(String),
}

/// Failure of a whole scoring call. No partial report accompanies it.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),
}
