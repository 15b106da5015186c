//! Grammar issue density

use super::{per_100_words, scored, Signal, SignalContext};
use crate::config::GrammarRules;
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};

pub struct GrammarSignal {
    penalty_per_issue: f64,
    fallback_fraction: f64,
    max_score: f64,
}

impl GrammarSignal {
    pub fn new(rules: &GrammarRules) -> Self {
        Self {
            penalty_per_issue: rules.penalty_per_issue,
            fallback_fraction: rules.fallback_fraction,
            max_score: rules.max_score,
        }
    }

    /// `max - penalty * issues_per_100`, floored at 0
    pub fn score_for(&self, issues_per_100: f64) -> f64 {
        (self.max_score - self.penalty_per_issue * issues_per_100).max(0.0)
    }
}

impl Signal for GrammarSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Grammar
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        let words = ctx.transcript.word_count();
        if words == 0 {
            return scored(
                SignalKind::Grammar,
                SignalStatus::Scored,
                self.max_score,
                self.max_score,
                RawMetric::GrammarIssues {
                    issues: Some(0),
                    per_100_words: Some(0.0),
                },
                vec!["No words to check for grammar.".to_string()],
            );
        }

        match ctx.services.check_grammar(ctx.transcript.raw()) {
            Ok(issues) => {
                let per_100 = per_100_words(issues, words);
                let feedback = if issues == 0 {
                    "No grammar issues found.".to_string()
                } else {
                    format!(
                        "{} grammar issue{} found ({:.1} per 100 words).",
                        issues,
                        if issues == 1 { "" } else { "s" },
                        per_100
                    )
                };
                scored(
                    SignalKind::Grammar,
                    SignalStatus::Scored,
                    self.score_for(per_100),
                    self.max_score,
                    RawMetric::GrammarIssues {
                        issues: Some(issues),
                        per_100_words: Some(per_100),
                    },
                    vec![feedback],
                )
            }
            Err(e) => {
                tracing::warn!(
                    checker = ctx.services.grammar_name(),
                    error = %e,
                    "grammar check failed, using fallback score"
                );
                let fallback = self.fallback_fraction * self.max_score;
                scored(
                    SignalKind::Grammar,
                    SignalStatus::Degraded,
                    fallback,
                    self.max_score,
                    RawMetric::GrammarIssues {
                        issues: None,
                        per_100_words: None,
                    },
                    vec![format!(
                        "Grammar checking was skipped ({} {}); a neutral score of {:.1} was used.",
                        ctx.services.grammar_name(),
                        e,
                        fallback
                    )],
                )
            }
        }
    }
}
