//! Language services consumed by the grammar and engagement signals
//!
//! The engine only sees the [`GrammarChecker`] and [`SentimentAnalyzer`] traits, so real
//! engines and deterministic fakes are interchangeable. Every call goes through
//! [`LanguageServices`], which bounds it by the configured timeout and turns a panicking
//! service into a [`ServiceError::Failed`].

mod grammar;
#[cfg(feature = "languagetool")]
mod languagetool;
mod sentiment;

pub use grammar::HeuristicGrammarChecker;
#[cfg(feature = "languagetool")]
pub use languagetool::LanguageToolClient;
pub use sentiment::LexiconSentimentAnalyzer;

use crate::{SentimentLabel, ServiceError};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Counts grammar issues in a piece of text
pub trait GrammarChecker: Send + Sync {
    /// Name used in logs and degraded-signal notes
    fn name(&self) -> &str;

    fn check(&self, text: &str) -> Result<usize, ServiceError>;
}

/// Measures the polarity of a piece of text
pub trait SentimentAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, text: &str) -> Result<Sentiment, ServiceError>;
}

/// Sentiment of a text: polarity in [-1, 1] plus the positive share of the wording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentiment {
    pub polarity: f64,
    pub positive: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    /// Sentiment assigned to empty text
    pub fn neutral() -> Self {
        Self {
            polarity: 0.0,
            positive: 0.0,
            label: SentimentLabel::Neutral,
        }
    }

    /// Build from a polarity, clamping it and deriving the label
    pub fn from_polarity(polarity: f64, positive: f64) -> Self {
        let polarity = polarity.clamp(-1.0, 1.0);
        Self {
            polarity,
            positive: positive.clamp(0.0, 1.0),
            label: label_for(polarity),
        }
    }

    /// Average of several sentiments; neutral when empty
    pub fn mean(items: &[Sentiment]) -> Self {
        if items.is_empty() {
            return Self::neutral();
        }
        let n = items.len() as f64;
        let polarity = items.iter().map(|s| s.polarity).sum::<f64>() / n;
        let positive = items.iter().map(|s| s.positive).sum::<f64>() / n;
        Self::from_polarity(polarity, positive)
    }
}

/// Polarity cut-off between neutral and positive/negative labels
const LABEL_THRESHOLD: f64 = 0.05;

fn label_for(polarity: f64) -> SentimentLabel {
    if polarity >= LABEL_THRESHOLD {
        SentimentLabel::Positive
    } else if polarity <= -LABEL_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// The grammar checker and sentiment analyzer used by an engine, shared read-only
/// across scoring calls
#[derive(Clone)]
pub struct LanguageServices {
    grammar: Arc<dyn GrammarChecker>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    grammar_gate: CallGate,
    sentiment_gate: CallGate,
    timeout: Option<Duration>,
}

impl LanguageServices {
    pub fn new(grammar: Arc<dyn GrammarChecker>, sentiment: Arc<dyn SentimentAnalyzer>) -> Self {
        Self {
            grammar,
            sentiment,
            grammar_gate: CallGate::default(),
            sentiment_gate: CallGate::default(),
            timeout: None,
        }
    }

    /// Built-in heuristic grammar rules and lexicon sentiment
    pub fn builtin() -> Self {
        Self::new(
            Arc::new(HeuristicGrammarChecker::new()),
            Arc::new(LexiconSentimentAnalyzer::new()),
        )
    }

    /// Bound every service call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_grammar(mut self, grammar: Arc<dyn GrammarChecker>) -> Self {
        self.grammar = grammar;
        self.grammar_gate = CallGate::default();
        self
    }

    pub fn with_sentiment(mut self, sentiment: Arc<dyn SentimentAnalyzer>) -> Self {
        self.sentiment = sentiment;
        self.sentiment_gate = CallGate::default();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn grammar_name(&self) -> &str {
        self.grammar.name()
    }

    pub fn sentiment_name(&self) -> &str {
        self.sentiment.name()
    }

    /// Timed-out grammar and sentiment calls whose workers are still running
    pub fn stranded_calls(&self) -> usize {
        self.grammar_gate.stranded() + self.sentiment_gate.stranded()
    }

    pub fn check_grammar(&self, text: &str) -> Result<usize, ServiceError> {
        let checker = Arc::clone(&self.grammar);
        let text = text.to_string();
        self.grammar_gate
            .call(self.grammar.name(), self.timeout, move || checker.check(&text))
    }

    pub fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, ServiceError> {
        let analyzer = Arc::clone(&self.sentiment);
        let text = text.to_string();
        self.sentiment_gate
            .call(self.sentiment.name(), self.timeout, move || analyzer.analyze(&text))
    }

    /// Analyze each sentence in turn. The timeout covers the whole batch.
    pub fn analyze_sentences(&self, sentences: &[String]) -> Result<Vec<Sentiment>, ServiceError> {
        let analyzer = Arc::clone(&self.sentiment);
        let sentences = sentences.to_vec();
        self.sentiment_gate
            .call(self.sentiment.name(), self.timeout, move || {
                sentences.iter().map(|s| analyzer.analyze(s)).collect()
            })
    }
}

impl Default for LanguageServices {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for LanguageServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageServices")
            .field("grammar", &self.grammar.name())
            .field("sentiment", &self.sentiment.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Grammar checker backed by a LanguageTool server at `url`
#[cfg(feature = "languagetool")]
pub fn languagetool_checker(url: &str) -> Result<Arc<dyn GrammarChecker>, ServiceError> {
    Ok(Arc::new(LanguageToolClient::new(url)?))
}

#[cfg(not(feature = "languagetool"))]
pub fn languagetool_checker(_url: &str) -> Result<Arc<dyn GrammarChecker>, ServiceError> {
    Err(ServiceError::Unavailable(
        "LanguageTool support (rebuild with: cargo build --features languagetool)".to_string(),
    ))
}

/// Check if the LanguageTool client was compiled in
pub fn is_languagetool_available() -> bool {
    cfg!(feature = "languagetool")
}

/// Timed-out calls a service may leave running before further calls are refused
pub const MAX_STRANDED_CALLS: usize = 1;

/// Runs the calls to one service and counts the workers abandoned after a timeout.
///
/// Without a timeout the call runs inline. With one it runs on a worker thread; a call that
/// overruns is abandoned and its result discarded when it eventually finishes. While
/// [`MAX_STRANDED_CALLS`] abandoned workers are still running, new calls fail fast with
/// [`ServiceError::Unavailable`] instead of starting another thread.
#[derive(Clone, Default)]
struct CallGate {
    stranded: Arc<AtomicUsize>,
}

impl CallGate {
    fn stranded(&self) -> usize {
        self.stranded.load(Ordering::Acquire)
    }

    fn call<T, F>(&self, service: &str, timeout: Option<Duration>, call: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    {
        let Some(timeout) = timeout else {
            return catch_panic(call);
        };

        if self.stranded() >= MAX_STRANDED_CALLS {
            tracing::debug!(service, "refusing call while a timed-out call is still running");
            return Err(ServiceError::Unavailable(service.to_string()));
        }

        let (tx, rx) = mpsc::sync_channel(1);
        let finished = Arc::new(AtomicBool::new(false));
        let worker_finished = Arc::clone(&finished);
        let stranded = Arc::clone(&self.stranded);
        thread::Builder::new()
            .name("podium-service".to_string())
            .spawn(move || {
                let _ = tx.send(catch_panic(call));
                // The caller marked the call abandoned first, so this worker was counted
                if worker_finished.swap(true, Ordering::AcqRel) {
                    stranded.fetch_sub(1, Ordering::AcqRel);
                }
            })
            .map_err(|e| ServiceError::Failed(format!("could not start {} worker: {}", service, e)))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.stranded.fetch_add(1, Ordering::AcqRel);
                if finished.swap(true, Ordering::AcqRel) {
                    // Finished between the timeout and the swap
                    self.stranded.fetch_sub(1, Ordering::AcqRel);
                    return rx.try_recv().unwrap_or(Err(ServiceError::Timeout(timeout)));
                }
                Err(ServiceError::Timeout(timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ServiceError::Failed("service worker exited without a result".to_string()))
            }
        }
    }
}

/// Run `call`, reporting a panic as a failed service call
fn catch_panic<T>(call: impl FnOnce() -> Result<T, ServiceError>) -> Result<T, ServiceError> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(ServiceError::Failed(format!("service panicked: {}", message)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    impl GrammarChecker for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn check(&self, _text: &str) -> Result<usize, ServiceError> {
            thread::sleep(Duration::from_millis(500));
            Ok(1)
        }
    }

    struct Hangs;

    impl GrammarChecker for Hangs {
        fn name(&self) -> &str {
            "hangs"
        }

        fn check(&self, _text: &str) -> Result<usize, ServiceError> {
            thread::sleep(Duration::from_secs(3));
            Ok(0)
        }
    }

    struct Panics;

    impl GrammarChecker for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn check(&self, _text: &str) -> Result<usize, ServiceError> {
            panic!("checker crashed")
        }
    }

    #[test]
    fn test_languagetool_checker_follows_feature() {
        let checker = languagetool_checker("http://127.0.0.1:9");
        assert_eq!(checker.is_ok(), is_languagetool_available());
    }

    #[test]
    fn test_call_without_timeout_runs_inline() {
        let caller = thread::current().id();
        let result = CallGate::default().call("inline", None, move || {
            Ok::<_, ServiceError>(thread::current().id() == caller)
        });
        assert_eq!(result, Ok(true));
    }

    #[test]
    fn test_call_times_out() {
        let services = LanguageServices::builtin()
            .with_grammar(Arc::new(Slow))
            .with_timeout(Duration::from_millis(20));
        let err = services.check_grammar("hello").unwrap_err();
        assert_eq!(err, ServiceError::Timeout(Duration::from_millis(20)));
    }

    #[test]
    fn test_panicking_service_is_a_failure() {
        let services = LanguageServices::builtin()
            .with_grammar(Arc::new(Panics))
            .with_timeout(Duration::from_secs(5));
        assert!(matches!(
            services.check_grammar("hello"),
            Err(ServiceError::Failed(_))
        ));
    }

    #[test]
    fn test_panicking_service_without_timeout_is_a_failure() {
        let services = LanguageServices::builtin().with_grammar(Arc::new(Panics));
        let err = services.check_grammar("hello").unwrap_err();
        assert_eq!(
            err,
            ServiceError::Failed("service panicked: checker crashed".to_string())
        );
    }

    #[test]
    fn test_hung_service_keeps_one_stranded_worker() {
        let services = LanguageServices::builtin()
            .with_grammar(Arc::new(Hangs))
            .with_timeout(Duration::from_millis(5));
        assert_eq!(
            services.check_grammar("hello"),
            Err(ServiceError::Timeout(Duration::from_millis(5)))
        );
        for _ in 0..50 {
            assert!(matches!(
                services.check_grammar("hello"),
                Err(ServiceError::Unavailable(_))
            ));
        }
        assert_eq!(services.stranded_calls(), MAX_STRANDED_CALLS);
        // The sentiment analyzer is gated separately
        assert!(services.analyze_sentiment("What a great day!").is_ok());
    }

    #[test]
    fn test_stranded_worker_is_released_when_it_finishes() {
        let services = LanguageServices::builtin()
            .with_grammar(Arc::new(Slow))
            .with_timeout(Duration::from_millis(20));
        assert!(services.check_grammar("hello").is_err());
        assert_eq!(services.stranded_calls(), 1);
        thread::sleep(Duration::from_millis(1_000));
        assert_eq!(services.stranded_calls(), 0);
    }

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(Sentiment::from_polarity(0.5, 0.3).label, SentimentLabel::Positive);
        assert_eq!(Sentiment::from_polarity(0.0, 0.0).label, SentimentLabel::Neutral);
        assert_eq!(Sentiment::from_polarity(-0.4, 0.0).label, SentimentLabel::Negative);
        assert_eq!(Sentiment::from_polarity(3.0, 2.0).polarity, 1.0);
    }

    #[test]
    fn test_sentiment_mean() {
        let mean = Sentiment::mean(&[
            Sentiment::from_polarity(0.8, 0.4),
            Sentiment::from_polarity(-0.2, 0.0),
        ]);
        assert!((mean.polarity - 0.3).abs() < 1e-9);
        assert_eq!(Sentiment::mean(&[]), Sentiment::neutral());
    }
}
