//! JSON reporter for machine-readable output

use super::ScoredTranscript;
use crate::analyzer::engine::AggregateStats;
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Report a single scored transcript as JSON
    pub fn report(&self, scored: &ScoredTranscript) -> String {
        self.to_json(scored, "{}")
    }

    /// Report multiple transcripts as a JSON array
    pub fn report_many(&self, results: &[ScoredTranscript]) -> String {
        self.to_json(&results, "[]")
    }

    /// Report with summary
    pub fn report_with_summary(&self, results: &[ScoredTranscript], stats: &AggregateStats) -> String {
        let output = JsonOutput {
            results,
            summary: JsonSummary {
                transcripts_scored: stats.transcripts_scored,
                average_score: stats.average_score,
                average_grade: stats.average_grade.to_string(),
                min_score: stats.min_score,
                max_score: stats.max_score,
                degraded: stats.degraded,
            },
        };
        self.to_json(&output, "{}")
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        json.unwrap_or_else(|_| fallback.to_string())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    results: &'a [ScoredTranscript],
    summary: JsonSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    transcripts_scored: usize,
    average_score: f64,
    average_grade: String,
    min_score: f64,
    max_score: f64,
    degraded: usize,
}
