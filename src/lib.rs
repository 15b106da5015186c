//! Podium: rubric-driven speech transcript scorer
//!
//! This library scores a speech transcript against a configurable rubric and
//! produces a 0-100 score with per-criterion, human-readable feedback.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod logging;
pub mod nlp;
pub mod reporter;
pub mod server;
pub mod text;

pub use error::{ConfigError, InputError, ScoringError, ServiceError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level rubric criteria, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    ContentAndStructure,
    SpeechRate,
    Grammar,
    Vocabulary,
    Clarity,
    Engagement,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::ContentAndStructure,
        Criterion::SpeechRate,
        Criterion::Grammar,
        Criterion::Vocabulary,
        Criterion::Clarity,
        Criterion::Engagement,
    ];

    /// Key used for this criterion in rubric files
    pub fn key(&self) -> &'static str {
        match self {
            Criterion::ContentAndStructure => "contentAndStructure",
            Criterion::SpeechRate => "speechRate",
            Criterion::Grammar => "grammar",
            Criterion::Vocabulary => "vocabulary",
            Criterion::Clarity => "clarity",
            Criterion::Engagement => "engagement",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criterion::ContentAndStructure => write!(f, "Content & Structure"),
            Criterion::SpeechRate => write!(f, "Speech Rate"),
            Criterion::Grammar => write!(f, "Grammar"),
            Criterion::Vocabulary => write!(f, "Vocabulary"),
            Criterion::Clarity => write!(f, "Clarity"),
            Criterion::Engagement => write!(f, "Engagement"),
        }
    }
}

/// Individual signals computed from a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Salutation,
    Keywords,
    Flow,
    Grammar,
    Vocabulary,
    Clarity,
    Engagement,
    SpeechRate,
}

impl SignalKind {
    /// The top-level criterion this signal contributes to
    pub fn criterion(&self) -> Criterion {
        use SignalKind::*;
        match self {
            Salutation | Keywords | Flow => Criterion::ContentAndStructure,
            Grammar => Criterion::Grammar,
            Vocabulary => Criterion::Vocabulary,
            Clarity => Criterion::Clarity,
            Engagement => Criterion::Engagement,
            SpeechRate => Criterion::SpeechRate,
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Salutation => write!(f, "salutation"),
            SignalKind::Keywords => write!(f, "keywords"),
            SignalKind::Flow => write!(f, "flow"),
            SignalKind::Grammar => write!(f, "grammar"),
            SignalKind::Vocabulary => write!(f, "vocabulary"),
            SignalKind::Clarity => write!(f, "clarity"),
            SignalKind::Engagement => write!(f, "engagement"),
            SignalKind::SpeechRate => write!(f, "speech-rate"),
        }
    }
}

/// How completely a signal (or criterion) was evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalStatus {
    /// Fully evaluated
    Scored,
    /// An external analyzer failed; a documented neutral default was used
    Degraded,
    /// Not applicable for this call (e.g. no duration); excluded from aggregation
    Skipped,
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::Scored => write!(f, "scored"),
            SignalStatus::Degraded => write!(f, "degraded"),
            SignalStatus::Skipped => write!(f, "not applicable"),
        }
    }
}

/// Polarity classification returned by a sentiment analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Negative => write!(f, "negative"),
        }
    }
}

/// Raw measurement behind a signal's sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "metric",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum RawMetric {
    SalutationTier {
        tier: Option<String>,
        position: Option<usize>,
    },
    KeywordCoverage {
        found: usize,
        required: usize,
        matched: Vec<String>,
        missing: Vec<String>,
    },
    FlowOrder {
        follows_expected_flow: bool,
        salutation_at: Option<usize>,
        body_at: Option<usize>,
        closing_at: Option<usize>,
    },
    GrammarIssues {
        issues: Option<usize>,
        per_100_words: Option<f64>,
    },
    TypeTokenRatio {
        ttr: f64,
        distinct: usize,
        total: usize,
    },
    FillerDensity {
        count: usize,
        per_100_words: f64,
        terms: BTreeMap<String, usize>,
    },
    Sentiment {
        polarity: Option<f64>,
        positive: Option<f64>,
        label: Option<SentimentLabel>,
    },
    WordsPerMinute {
        wpm: Option<f64>,
        band: Option<String>,
    },
}

impl RawMetric {
    /// Headline scalar for this metric, if one was measured
    pub fn value(&self) -> Option<f64> {
        match self {
            RawMetric::SalutationTier { position, .. } => position.map(|p| p as f64),
            RawMetric::KeywordCoverage { found, .. } => Some(*found as f64),
            RawMetric::FlowOrder {
                follows_expected_flow,
                ..
            } => Some(if *follows_expected_flow { 1.0 } else { 0.0 }),
            RawMetric::GrammarIssues { issues, .. } => issues.map(|n| n as f64),
            RawMetric::TypeTokenRatio { ttr, .. } => Some(*ttr),
            RawMetric::FillerDensity { count, .. } => Some(*count as f64),
            RawMetric::Sentiment { polarity, .. } => *polarity,
            RawMetric::WordsPerMinute { wpm, .. } => *wpm,
        }
    }
}

/// Result of one signal for one scoring call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResult {
    pub signal: SignalKind,
    pub status: SignalStatus,
    /// Sub-score in [0, max_score]; 0 when skipped
    pub sub_score: f64,
    pub max_score: f64,
    pub raw: RawMetric,
    pub feedback: Vec<String>,
}

/// Per-criterion breakdown entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionReport {
    pub criterion: Criterion,
    pub status: SignalStatus,
    /// Configured weight
    pub weight: f64,
    /// Weight actually used after skip handling
    pub effective_weight: f64,
    /// Sum of the signals' maximum scores
    pub max_weight: f64,
    pub sub_score: f64,
    /// sub_score / max_weight, in [0, 1]
    pub fraction: f64,
    /// Points this criterion adds to the total
    pub contribution: f64,
    pub signals: Vec<SignalResult>,
}

impl CriterionReport {
    /// All feedback lines from this criterion's signals, in signal order
    pub fn feedback(&self) -> Vec<&str> {
        self.signals
            .iter()
            .flat_map(|s| s.feedback.iter().map(String::as_str))
            .collect()
    }
}

/// A signal that was not fully evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub signal: SignalKind,
    pub status: SignalStatus,
    pub message: String,
}

/// The terminal output of a scoring call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    /// Overall score (0-100)
    pub final_score: f64,
    pub grade: Grade,
    pub total_weight: f64,
    pub word_count: usize,
    pub sentence_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub criteria: Vec<CriterionReport>,
    /// Degraded and skipped signals
    pub notices: Vec<Notice>,
    pub recommendations: Vec<String>,
}

impl ScoreReport {
    pub fn criterion(&self, criterion: Criterion) -> Option<&CriterionReport> {
        self.criteria.iter().find(|c| c.criterion == criterion)
    }

    pub fn signal(&self, signal: SignalKind) -> Option<&SignalResult> {
        self.criteria
            .iter()
            .flat_map(|c| c.signals.iter())
            .find(|s| s.signal == signal)
    }

    /// Sum of effective weights over criteria that took part in aggregation
    pub fn applied_weight(&self) -> f64 {
        self.criteria
            .iter()
            .filter(|c| c.status != SignalStatus::Skipped)
            .map(|c| c.effective_weight)
            .sum()
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Letter grade for an unrounded 0-100 score
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
        }
    }
}

/// Input to a scoring call
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub transcript: String,
    pub duration_seconds: Option<f64>,
}

impl ScoreRequest {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            duration_seconds: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Build a request from raw bytes; rejects input that is not UTF-8 text.
    pub fn from_bytes(bytes: &[u8], duration_seconds: Option<f64>) -> Result<Self, InputError> {
        let transcript = std::str::from_utf8(bytes)
            .map_err(|e| InputError::NotUtf8 {
                valid_up_to: e.valid_up_to(),
            })?
            .trim_start_matches('\u{feff}')
            .to_string();
        Ok(Self {
            transcript,
            duration_seconds,
        })
    }

    /// Build a request from a JSON object `{ "transcript": ..., "durationSeconds": ... }`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, InputError> {
        let obj = value.as_object().ok_or(InputError::NotText {
            field: "request",
            found: json_type_name(value),
        })?;
        let transcript = match obj.get("transcript") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(InputError::NotText {
                    field: "transcript",
                    found: json_type_name(other),
                })
            }
            None => return Err(InputError::MissingField("transcript")),
        };
        let duration_seconds = match obj.get("durationSeconds") {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(v.as_f64().ok_or_else(|| {
                InputError::InvalidDuration(format!("expected a number, found {}", json_type_name(v)))
            })?),
        };
        Ok(Self {
            transcript,
            duration_seconds,
        })
    }

    /// Reject durations that are not finite numbers. Zero and negative values are
    /// accepted here and treated as "no duration" by the speech-rate signal.
    pub fn validate(&self) -> Result<(), InputError> {
        if let Some(d) = self.duration_seconds {
            if !d.is_finite() {
                return Err(InputError::InvalidDuration(format!(
                    "duration must be a finite number, got {}",
                    d
                )));
            }
        }
        Ok(())
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Public API: score a single transcript with the built-in language services.
///
/// * `transcript` - the text to evaluate
/// * `duration_seconds` - optional speech duration used for words-per-minute
/// * `rubric` - rubric to score against (validated before use)
pub fn score_transcript(
    transcript: &str,
    duration_seconds: Option<f64>,
    rubric: &config::RubricConfig,
) -> Result<ScoreReport, ScoringError> {
    let engine = analyzer::RubricEngine::new(rubric.clone())?;
    let mut request = ScoreRequest::new(transcript);
    request.duration_seconds = duration_seconds;
    engine.score(&request)
}
