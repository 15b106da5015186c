//! Rubric engine - runs every signal and assembles the report

use crate::config::{self, RubricConfig};
use crate::nlp::LanguageServices;
use crate::text::Transcript;
use crate::{
    ConfigError, Grade, Notice, ScoreReport, ScoreRequest, ScoringError, SignalResult,
    SignalStatus,
};
use std::path::Path;
use std::time::Duration;

use super::signals::SignalSet;
use super::ScoreCalculator;

/// Scores transcripts against one validated rubric.
///
/// Construction validates the rubric, so an engine can never score with a bad one.
/// Scoring takes `&self` and never mutates the rubric, so one engine can be shared
/// across threads.
pub struct RubricEngine {
    rubric: RubricConfig,
    signals: SignalSet,
    services: LanguageServices,
}

impl RubricEngine {
    /// Validate `rubric` and build an engine with the built-in language services
    pub fn new(rubric: RubricConfig) -> Result<Self, ConfigError> {
        rubric.validate()?;
        let signals = SignalSet::from_rubric(&rubric);
        tracing::debug!(
            total_weight = rubric.total_weight,
            skip_policy = %rubric.skip_policy,
            categories = rubric.keywords.len(),
            fillers = rubric.fillers.len(),
            "rubric loaded"
        );
        Ok(Self {
            rubric,
            signals,
            services: LanguageServices::builtin(),
        })
    }

    /// Discover and load a rubric the way the CLI does
    pub fn from_path(work_dir: &Path, custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::new(config::load_rubric(work_dir, custom_path)?)
    }

    /// Use other grammar/sentiment services
    pub fn with_services(mut self, services: LanguageServices) -> Self {
        let timeout = self.services.timeout();
        self.services = match (services.timeout(), timeout) {
            (None, Some(t)) => services.with_timeout(t),
            _ => services,
        };
        self
    }

    /// Bound each language service call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.services = self.services.with_timeout(timeout);
        self
    }

    pub fn rubric(&self) -> &RubricConfig {
        &self.rubric
    }

    pub fn services(&self) -> &LanguageServices {
        &self.services
    }

    /// Replace the rubric. The new one is validated first; on failure the engine keeps
    /// its current rubric.
    pub fn reload(&mut self, rubric: RubricConfig) -> Result<(), ConfigError> {
        rubric.validate()?;
        self.signals = SignalSet::from_rubric(&rubric);
        self.rubric = rubric;
        tracing::debug!("rubric reloaded");
        Ok(())
    }

    /// Score one transcript. Either a complete report or a typed error; never a partial report.
    pub fn score(&self, request: &ScoreRequest) -> Result<ScoreReport, ScoringError> {
        request.validate()?;

        let transcript = Transcript::new(&request.transcript);
        let span = tracing::debug_span!(
            "score_transcript",
            word_count = transcript.word_count(),
            has_duration = request.duration_seconds.is_some()
        );
        let _guard = span.enter();

        let results = self
            .signals
            .evaluate(&transcript, request.duration_seconds, &self.services);
        let notices = notices(&results);

        let criteria = ScoreCalculator::aggregate(&self.rubric, results);
        let final_score = ScoreCalculator::final_score(&criteria, self.rubric.total_weight);
        let recommendations = ScoreCalculator::recommendations(&criteria);

        tracing::debug!(final_score, notices = notices.len(), "scored transcript");

        Ok(ScoreReport {
            final_score,
            grade: Grade::from_score(final_score),
            total_weight: self.rubric.total_weight,
            word_count: transcript.word_count(),
            sentence_count: transcript.sentence_count(),
            duration_seconds: request.duration_seconds,
            criteria,
            notices,
            recommendations,
        })
    }

    /// Score raw text with an optional duration in seconds
    pub fn score_text(
        &self,
        transcript: &str,
        duration_seconds: Option<f64>,
    ) -> Result<ScoreReport, ScoringError> {
        let mut request = ScoreRequest::new(transcript);
        request.duration_seconds = duration_seconds;
        self.score(&request)
    }

    /// Score several transcripts sequentially
    pub fn score_many(&self, requests: &[ScoreRequest]) -> Vec<Result<ScoreReport, ScoringError>> {
        requests.iter().map(|r| self.score(r)).collect()
    }

    /// Score several transcripts in parallel using rayon. Results match `score_many`.
    pub fn score_parallel(
        &self,
        requests: &[ScoreRequest],
    ) -> Vec<Result<ScoreReport, ScoringError>> {
        use rayon::prelude::*;

        requests.par_iter().map(|r| self.score(r)).collect()
    }

    /// Get aggregate stats from multiple reports
    pub fn aggregate_stats(reports: &[ScoreReport]) -> AggregateStats {
        if reports.is_empty() {
            return AggregateStats::default();
        }

        let total: f64 = reports.iter().map(|r| r.final_score).sum();
        let average_score = total / reports.len() as f64;
        let min_score = reports
            .iter()
            .map(|r| r.final_score)
            .fold(f64::INFINITY, f64::min);
        let max_score = reports
            .iter()
            .map(|r| r.final_score)
            .fold(f64::NEG_INFINITY, f64::max);

        AggregateStats {
            transcripts_scored: reports.len(),
            average_score,
            average_grade: Grade::from_score(average_score),
            min_score,
            max_score,
            degraded: reports
                .iter()
                .filter(|r| r.notices.iter().any(|n| n.status == SignalStatus::Degraded))
                .count(),
        }
    }
}

/// Degraded and skipped signals, with the signal's own explanation
fn notices(results: &[SignalResult]) -> Vec<Notice> {
    results
        .iter()
        .filter(|r| r.status != SignalStatus::Scored)
        .map(|r| Notice {
            signal: r.signal,
            status: r.status,
            message: r.feedback.first().cloned().unwrap_or_default(),
        })
        .collect()
}

/// Aggregate statistics over several scored transcripts
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStats {
    pub transcripts_scored: usize,
    pub average_score: f64,
    pub average_grade: Grade,
    pub min_score: f64,
    pub max_score: f64,
    /// Reports with at least one degraded signal
    pub degraded: usize,
}

impl Default for AggregateStats {
    fn default() -> Self {
        Self {
            transcripts_scored: 0,
            average_score: 0.0,
            average_grade: Grade::F,
            min_score: 0.0,
            max_score: 0.0,
            degraded: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::signals::test_support::services;
    use crate::{Criterion, InputError, ServiceError, SignalKind};

    const INTRO: &str = "Good morning everyone. My name is Asha and I am 13 years old. \
        I study in class eight at Green Valley School. I live with my family, my parents \
        and my little brother. My hobby is painting and I love to read. Thank you.";

    fn engine() -> RubricEngine {
        RubricEngine::new(RubricConfig::default())
            .unwrap()
            .with_services(services(Ok(0), Ok(0.7)))
    }

    #[test]
    fn test_new_rejects_invalid_rubric() {
        let mut rubric = RubricConfig::default();
        rubric.criteria.engagement.weight = 50.0;
        assert!(matches!(
            RubricEngine::new(rubric),
            Err(ConfigError::WeightSum { .. })
        ));
    }

    #[test]
    fn test_full_introduction() {
        let report = engine().score_text(INTRO, Some(30.0)).unwrap();
        let content = report.criterion(Criterion::ContentAndStructure).unwrap();
        assert_eq!(content.status, SignalStatus::Scored);
        // good salutation 4, all five categories 30, complete flow 5
        assert!((content.sub_score - 39.0).abs() < 1e-9);
        assert!(report.notices.is_empty());
        assert!(report.final_score > 0.0 && report.final_score <= 100.0);
        assert_eq!(report.word_count, 44);
    }

    #[test]
    fn test_missing_duration_redistributes() {
        let report = engine().score_text(INTRO, None).unwrap();
        let rate = report.criterion(Criterion::SpeechRate).unwrap();
        assert_eq!(rate.status, SignalStatus::Skipped);
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].signal, SignalKind::SpeechRate);
        assert!((report.applied_weight() - 100.0).abs() < 1e-9);
        let content = report.criterion(Criterion::ContentAndStructure).unwrap();
        assert!((content.effective_weight - 400.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_duration_is_input_error() {
        let err = engine().score_text(INTRO, Some(f64::INFINITY)).unwrap_err();
        assert!(matches!(err, ScoringError::Input(InputError::InvalidDuration(_))));
    }

    #[test]
    fn test_degraded_service_still_reports() {
        let engine = RubricEngine::new(RubricConfig::default())
            .unwrap()
            .with_services(services(
                Err(ServiceError::Unavailable("grammar".into())),
                Ok(0.7),
            ));
        let report = engine.score_text(INTRO, Some(30.0)).unwrap();
        let grammar = report.signal(SignalKind::Grammar).unwrap();
        assert_eq!(grammar.status, SignalStatus::Degraded);
        assert_eq!(grammar.sub_score, 5.0);
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].status, SignalStatus::Degraded);
    }

    #[test]
    fn test_reload_keeps_old_rubric_on_failure() {
        let mut engine = engine();
        let mut bad = RubricConfig::default();
        bad.total_weight = 90.0;
        assert!(engine.reload(bad).is_err());
        assert_eq!(engine.rubric().total_weight, 100.0);

        let mut zero = RubricConfig::default();
        zero.skip_policy = crate::config::SkipPolicy::Zero;
        engine.reload(zero).unwrap();
        let report = engine.score_text(INTRO, None).unwrap();
        let content = report.criterion(Criterion::ContentAndStructure).unwrap();
        assert_eq!(content.effective_weight, 40.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let engine = engine();
        let requests: Vec<ScoreRequest> = vec![
            ScoreRequest::new(INTRO).with_duration(30.0),
            ScoreRequest::new("um so like yeah"),
            ScoreRequest::new(""),
            ScoreRequest::new("Hi. Thank you.").with_duration(4.0),
        ];
        let sequential: Vec<ScoreReport> = engine
            .score_many(&requests)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        let parallel: Vec<ScoreReport> = engine
            .score_parallel(&requests)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_aggregate_stats() {
        let engine = engine();
        let reports = vec![
            engine.score_text(INTRO, Some(30.0)).unwrap(),
            engine.score_text("", None).unwrap(),
        ];
        let stats = RubricEngine::aggregate_stats(&reports);
        assert_eq!(stats.transcripts_scored, 2);
        assert!(stats.min_score <= stats.average_score);
        assert!(stats.average_score <= stats.max_score);
        assert_eq!(RubricEngine::aggregate_stats(&[]), AggregateStats::default());
    }
}
