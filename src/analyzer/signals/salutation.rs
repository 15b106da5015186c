//! Opening greeting quality

use super::{compile_phrases, scored, Signal, SignalContext};
use crate::config::SalutationRules;
use crate::text::{first_match, Phrase};
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};

/// The greeting found in a transcript
#[derive(Debug, Clone, PartialEq)]
pub struct SalutationMatch {
    /// Label of the best tier with a matching phrase
    pub tier: String,
    pub score: f64,
    /// Word index of the earliest greeting of any tier (the flow position)
    pub position: usize,
    /// Where the best tier's phrase starts, and its length in words
    pub phrase_at: usize,
    pub phrase_len: usize,
}

struct Tier {
    label: String,
    score: f64,
    phrases: Vec<Phrase>,
}

pub struct SalutationSignal {
    tiers: Vec<Tier>,
    none_score: f64,
    max_score: f64,
}

impl SalutationSignal {
    pub fn new(rules: &SalutationRules) -> Self {
        Self {
            tiers: rules
                .tiers
                .iter()
                .map(|t| Tier {
                    label: t.label.clone(),
                    score: t.score,
                    phrases: compile_phrases(&t.phrases),
                })
                .collect(),
            none_score: rules.none_score,
            max_score: rules.max_score,
        }
    }

    /// Tiers are checked in rubric order; the first with any match decides the score
    pub fn detect(&self, words: &[String]) -> Option<SalutationMatch> {
        let position = self
            .tiers
            .iter()
            .filter_map(|t| first_match(&t.phrases, words))
            .map(|(pos, _)| pos)
            .min()?;

        self.tiers.iter().find_map(|tier| {
            first_match(&tier.phrases, words).map(|(at, idx)| SalutationMatch {
                tier: tier.label.clone(),
                score: tier.score,
                position,
                phrase_at: at,
                phrase_len: tier.phrases[idx].len(),
            })
        })
    }
}

impl Signal for SalutationSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Salutation
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        let (sub_score, feedback) = match ctx.salutation {
            Some(m) => {
                let excerpt = ctx
                    .transcript
                    .excerpt(m.phrase_at, m.phrase_len)
                    .unwrap_or(m.tier.as_str());
                (
                    m.score,
                    format!("{} salutation found: \"{}\".", capitalize(&m.tier), excerpt),
                )
            }
            None => (
                self.none_score,
                "No clear salutation detected. Open with a greeting such as \"Good morning everyone\"."
                    .to_string(),
            ),
        };

        scored(
            SignalKind::Salutation,
            SignalStatus::Scored,
            sub_score,
            self.max_score,
            RawMetric::SalutationTier {
                tier: ctx.salutation.map(|m| m.tier.clone()),
                position: ctx.salutation.map(|m| m.position),
            },
            vec![feedback],
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Transcript;

    fn detect(text: &str) -> Option<SalutationMatch> {
        let signal = SalutationSignal::new(&SalutationRules::default());
        signal.detect(Transcript::new(text).words())
    }

    #[test]
    fn test_best_tier_wins() {
        let m = detect("Hello everyone, I am excited to introduce myself.").unwrap();
        assert_eq!(m.tier, "excellent");
        assert_eq!(m.score, 5.0);
        assert_eq!(m.position, 0);
        assert_eq!(m.phrase_at, 4);
    }

    #[test]
    fn test_good_tier() {
        let m = detect("Good morning everyone. My name is Priya.").unwrap();
        assert_eq!(m.tier, "good");
        assert_eq!(m.score, 4.0);
    }

    #[test]
    fn test_normal_tier() {
        let m = detect("Hi, my name is Ravi.").unwrap();
        assert_eq!(m.tier, "normal");
        assert_eq!(m.score, 2.0);
    }

    #[test]
    fn test_whole_word_only() {
        assert!(detect("This is my history project.").is_none());
    }

    #[test]
    fn test_feedback_uses_original_case() {
        let signal = SalutationSignal::new(&SalutationRules::default());
        let transcript = Transcript::new("Good Morning all.");
        let m = signal.detect(transcript.words());
        let keywords = Default::default();
        let services = crate::nlp::LanguageServices::builtin();
        let ctx = SignalContext {
            transcript: &transcript,
            duration_seconds: None,
            services: &services,
            salutation: m.as_ref(),
            keywords: &keywords,
        };
        let result = signal.evaluate(&ctx);
        assert_eq!(result.sub_score, 4.0);
        assert_eq!(result.feedback, vec!["Good salutation found: \"Good Morning\"."]);
    }

    #[test]
    fn test_no_salutation_scores_none_score() {
        let signal = SalutationSignal::new(&SalutationRules::default());
        let transcript = Transcript::new("My name is Sam.");
        let keywords = Default::default();
        let services = crate::nlp::LanguageServices::builtin();
        let ctx = SignalContext {
            transcript: &transcript,
            duration_seconds: None,
            services: &services,
            salutation: None,
            keywords: &keywords,
        };
        let result = signal.evaluate(&ctx);
        assert_eq!(result.sub_score, 0.0);
        assert!(result.feedback[0].starts_with("No clear salutation"));
    }
}
