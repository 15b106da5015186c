//! Signals scored for each transcript

pub mod clarity;
pub mod engagement;
pub mod flow;
pub mod grammar;
pub mod keywords;
pub mod salutation;
pub mod speech_rate;
pub mod vocabulary;

pub use clarity::ClaritySignal;
pub use engagement::EngagementSignal;
pub use flow::FlowSignal;
pub use grammar::GrammarSignal;
pub use keywords::{KeywordMatch, KeywordMatches, KeywordSignal};
pub use salutation::{SalutationMatch, SalutationSignal};
pub use speech_rate::SpeechRateSignal;
pub use vocabulary::VocabularySignal;

use crate::config::RubricConfig;
use crate::nlp::LanguageServices;
use crate::text::{Phrase, Transcript};
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};

/// Everything a signal may read while scoring one transcript.
///
/// Signals only see raw matches here, never another signal's sub-score.
pub struct SignalContext<'a> {
    pub transcript: &'a Transcript,
    /// Usable duration in seconds; `None` when missing or not positive
    pub duration_seconds: Option<f64>,
    pub services: &'a LanguageServices,
    pub salutation: Option<&'a SalutationMatch>,
    pub keywords: &'a KeywordMatches,
}

/// Trait for transcript signals
pub trait Signal: Send + Sync {
    fn kind(&self) -> SignalKind;

    /// Upper bound of this signal's sub-score
    fn max_score(&self) -> f64;

    /// Score the transcript. Never fails: unavailable inputs produce a degraded or
    /// skipped result instead.
    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult;
}

/// Every signal, built once from a validated rubric
pub struct SignalSet {
    salutation: SalutationSignal,
    keywords: KeywordSignal,
    flow: FlowSignal,
    grammar: GrammarSignal,
    vocabulary: VocabularySignal,
    clarity: ClaritySignal,
    engagement: EngagementSignal,
    speech_rate: SpeechRateSignal,
}

impl SignalSet {
    pub fn from_rubric(rubric: &RubricConfig) -> Self {
        let criteria = &rubric.criteria;
        let content = &criteria.content_and_structure;
        Self {
            salutation: SalutationSignal::new(&content.salutation),
            keywords: KeywordSignal::new(&content.keywords, &rubric.keywords),
            flow: FlowSignal::new(&content.flow),
            grammar: GrammarSignal::new(&criteria.grammar),
            vocabulary: VocabularySignal::new(&criteria.vocabulary),
            clarity: ClaritySignal::new(&criteria.clarity, &rubric.fillers),
            engagement: EngagementSignal::new(&criteria.engagement),
            speech_rate: SpeechRateSignal::new(&criteria.speech_rate),
        }
    }

    /// Signals in report order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Signal> {
        let all: [&dyn Signal; 8] = [
            &self.salutation,
            &self.keywords,
            &self.flow,
            &self.speech_rate,
            &self.grammar,
            &self.vocabulary,
            &self.clarity,
            &self.engagement,
        ];
        all.into_iter()
    }

    /// Run every signal over one transcript
    pub fn evaluate(
        &self,
        transcript: &Transcript,
        duration_seconds: Option<f64>,
        services: &LanguageServices,
    ) -> Vec<SignalResult> {
        let salutation = self.salutation.detect(transcript.words());
        let keywords = self.keywords.match_words(transcript.words());
        let ctx = SignalContext {
            transcript,
            duration_seconds: duration_seconds.filter(|d| *d > 0.0),
            services,
            salutation: salutation.as_ref(),
            keywords: &keywords,
        };
        self.iter().map(|signal| signal.evaluate(&ctx)).collect()
    }
}

/// Parse rubric phrases, dropping any without word characters
pub(crate) fn compile_phrases(phrases: &[String]) -> Vec<Phrase> {
    phrases.iter().filter_map(|p| Phrase::parse(p)).collect()
}

/// Count per 100 words; 0 for an empty transcript
pub(crate) fn per_100_words(count: usize, words: usize) -> f64 {
    if words == 0 {
        0.0
    } else {
        count as f64 * 100.0 / words as f64
    }
}

/// Build a result whose sub-score is clamped into `[0, max]`
pub(crate) fn scored(
    signal: SignalKind,
    status: SignalStatus,
    sub_score: f64,
    max_score: f64,
    raw: RawMetric,
    feedback: Vec<String>,
) -> SignalResult {
    SignalResult {
        signal,
        status,
        sub_score: sub_score.clamp(0.0, max_score),
        max_score,
        raw,
        feedback,
    }
}
