//! Reporter module for output formatting

pub mod console;
pub mod json;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

use crate::ScoreReport;
use serde::Serialize;

/// A report together with where its transcript came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTranscript {
    /// File path, or `<stdin>`
    pub source: String,
    #[serde(flatten)]
    pub report: ScoreReport,
}

impl ScoredTranscript {
    pub fn new(source: impl Into<String>, report: ScoreReport) -> Self {
        Self {
            source: source.into(),
            report,
        }
    }
}
