//! Filler word density

use super::{compile_phrases, per_100_words, scored, Signal, SignalContext};
use crate::config::ClarityRules;
use crate::text::{count_phrases, Phrase};
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};

pub struct ClaritySignal {
    fillers: Vec<Phrase>,
    penalty_per_filler: f64,
    max_score: f64,
}

impl ClaritySignal {
    pub fn new(rules: &ClarityRules, fillers: &[String]) -> Self {
        Self {
            fillers: compile_phrases(fillers),
            penalty_per_filler: rules.penalty_per_filler,
            max_score: rules.max_score,
        }
    }
}

impl Signal for ClaritySignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Clarity
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        let words = ctx.transcript.words();
        let terms = count_phrases(&self.fillers, words);
        let count: usize = terms.values().sum();
        let per_100 = per_100_words(count, words.len());
        let sub_score = (self.max_score - self.penalty_per_filler * per_100).max(0.0);

        let feedback = if count == 0 {
            vec!["No filler words detected.".to_string()]
        } else {
            let listed: Vec<String> = terms
                .iter()
                .map(|(term, n)| format!("\"{}\" ×{}", term, n))
                .collect();
            vec![
                format!(
                    "{} filler word{} detected ({:.1} per 100 words).",
                    count,
                    if count == 1 { "" } else { "s" },
                    per_100
                ),
                format!("Fillers: {}.", listed.join(", ")),
            ]
        };

        scored(
            SignalKind::Clarity,
            SignalStatus::Scored,
            sub_score,
            self.max_score,
            RawMetric::FillerDensity {
                count,
                per_100_words: per_100,
                terms,
            },
            feedback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::signals::KeywordMatches;
    use crate::config::RubricConfig;
    use crate::nlp::LanguageServices;
    use crate::text::Transcript;

    fn evaluate(text: &str) -> SignalResult {
        let rubric = RubricConfig::default();
        let signal = ClaritySignal::new(&rubric.criteria.clarity, &rubric.fillers);
        let transcript = Transcript::new(text);
        let services = LanguageServices::builtin();
        let keywords = KeywordMatches::default();
        let ctx = SignalContext {
            transcript: &transcript,
            duration_seconds: None,
            services: &services,
            salutation: None,
            keywords: &keywords,
        };
        signal.evaluate(&ctx)
    }

    #[test]
    fn test_counts_single_and_multi_word_fillers() {
        let result = evaluate("Um, I mean, you know, it was um fine.");
        let RawMetric::FillerDensity { count, terms, .. } = &result.raw else {
            panic!("unexpected metric {:?}", result.raw);
        };
        assert_eq!(*count, 4);
        assert_eq!(terms["um"], 2);
        assert_eq!(terms["you know"], 1);
        assert_eq!(terms["i mean"], 1);
        assert!(!terms.contains_key("know"));
    }

    #[test]
    fn test_penalty() {
        // 10 words, 1 filler: 10 per 100, 15 - 1.5 * 10 = 0
        let result = evaluate("um one two three four five six seven eight nine");
        assert_eq!(result.sub_score, 0.0);
        let result = evaluate(&format!("um {}", vec!["word"; 99].join(" ")));
        assert!((result.sub_score - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_transcript() {
        let result = evaluate("");
        assert_eq!(result.sub_score, 15.0);
        assert_eq!(result.raw.value(), Some(0.0));
    }

    #[test]
    fn test_feedback_lists_terms() {
        let result = evaluate("Basically I like to um read.");
        assert!(result.feedback[1].contains("\"basically\" ×1"));
        assert!(result.feedback[1].contains("\"um\" ×1"));
    }
}
