//! Lexical diversity (type-token ratio)

use super::{scored, Signal, SignalContext};
use crate::config::{ScoreCurve, VocabularyRules};
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};
use std::collections::HashSet;

pub struct VocabularySignal {
    curve: ScoreCurve,
    max_score: f64,
}

/// distinct / total over case-normalized words; 0 for no words
pub fn type_token_ratio(words: &[String]) -> (f64, usize) {
    if words.is_empty() {
        return (0.0, 0);
    }
    let distinct = words.iter().collect::<HashSet<_>>().len();
    (distinct as f64 / words.len() as f64, distinct)
}

impl VocabularySignal {
    pub fn new(rules: &VocabularyRules) -> Self {
        Self {
            curve: rules.curve.clone(),
            max_score: rules.max_score,
        }
    }
}

impl Signal for VocabularySignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Vocabulary
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        let words = ctx.transcript.words();
        let (ttr, distinct) = type_token_ratio(words);
        let sub_score = self.curve.score(ttr);

        let mut feedback = vec![format!(
            "Type-token ratio {:.2} ({} distinct of {} words).",
            ttr,
            distinct,
            words.len()
        )];
        if !words.is_empty() && sub_score < self.max_score * 0.6 {
            feedback.push("Vocabulary is repetitive; try varying your word choice.".to_string());
        }

        scored(
            SignalKind::Vocabulary,
            SignalStatus::Scored,
            sub_score,
            self.max_score,
            RawMetric::TypeTokenRatio {
                ttr,
                distinct,
                total: words.len(),
            },
            feedback,
        )
    }
}
