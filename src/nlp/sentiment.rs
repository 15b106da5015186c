//! Lexicon-based sentiment analyzer used when no external analyzer is configured

use super::{Sentiment, SentimentAnalyzer};
use crate::text::{normalize_word, tokenize};
use crate::ServiceError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Normalization constant for mapping the valence sum into (-1, 1)
const ALPHA: f64 = 15.0;
/// Valence scale applied to a word that follows a negation
const NEGATION_SCALAR: f64 = -0.74;
/// Valence added (in the word's direction) by a preceding intensifier
const BOOST: f64 = 0.293;
/// Valence added per exclamation mark, up to `MAX_EXCLAMATIONS`
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
/// How many preceding words a negation reaches
const NEGATION_WINDOW: usize = 3;

const LEXICON: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("brilliant", 2.8),
    ("cheerful", 2.5),
    ("confident", 2.2),
    ("creative", 1.9),
    ("curious", 1.3),
    ("delighted", 2.9),
    ("eager", 1.5),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("enjoying", 2.4),
    ("enthusiastic", 2.9),
    ("excellent", 3.2),
    ("excited", 2.3),
    ("exciting", 2.2),
    ("fantastic", 2.6),
    ("favorite", 2.0),
    ("favourite", 2.0),
    ("friendly", 2.2),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("grateful", 2.0),
    ("great", 3.1),
    ("happy", 2.7),
    ("helpful", 1.8),
    ("hope", 1.9),
    ("inspired", 2.2),
    ("interesting", 1.7),
    ("kind", 2.4),
    ("love", 3.2),
    ("loved", 2.9),
    ("lovely", 2.8),
    ("lucky", 1.8),
    ("nice", 1.8),
    ("passion", 2.0),
    ("passionate", 2.4),
    ("pleasure", 2.7),
    ("pleased", 2.2),
    ("proud", 2.1),
    ("support", 1.7),
    ("supportive", 2.0),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("thrilled", 2.9),
    ("wonderful", 2.7),
    ("afraid", -2.2),
    ("angry", -2.3),
    ("anxious", -1.0),
    ("awful", -2.0),
    ("bad", -2.5),
    ("bored", -1.1),
    ("boring", -1.3),
    ("difficult", -1.5),
    ("disappointed", -2.3),
    ("dislike", -1.6),
    ("fail", -2.5),
    ("failed", -2.3),
    ("hate", -2.7),
    ("hard", -0.4),
    ("horrible", -2.5),
    ("lonely", -1.5),
    ("nervous", -1.1),
    ("poor", -2.1),
    ("problem", -1.7),
    ("sad", -2.1),
    ("scared", -1.9),
    ("sorry", -0.3),
    ("stressed", -1.4),
    ("terrible", -2.1),
    ("tired", -1.9),
    ("unfortunately", -1.4),
    ("upset", -1.6),
    ("worried", -1.2),
    ("worst", -3.1),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "hardly", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "can't", "cannot", "won't", "wouldn't", "shouldn't", "couldn't",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", BOOST),
    ("really", BOOST),
    ("very", BOOST),
    ("extremely", BOOST),
    ("incredibly", BOOST),
    ("super", BOOST),
    ("truly", BOOST),
    ("so", BOOST),
    ("slightly", -BOOST),
    ("somewhat", -BOOST),
    ("barely", -BOOST),
];

fn lexicon() -> &'static HashMap<&'static str, f64> {
    static MAP: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    MAP.get_or_init(|| LEXICON.iter().copied().collect())
}

fn intensity(word: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, b)| *b)
}

/// Valence-lexicon sentiment with negation, intensifier and exclamation handling.
/// Polarity is the normalized valence sum `s / sqrt(s² + 15)`.
#[derive(Debug, Clone, Default)]
pub struct LexiconSentimentAnalyzer;

impl LexiconSentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn polarity_of(&self, text: &str) -> Sentiment {
        let words: Vec<String> = tokenize(text)
            .iter()
            .map(|t| normalize_word(&t.text))
            .collect();
        if words.is_empty() {
            return Sentiment::neutral();
        }

        let mut valences = Vec::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            let Some(&base) = lexicon().get(word.as_str()) else {
                valences.push(0.0);
                continue;
            };
            let mut valence = base;
            if let Some(boost) = i.checked_sub(1).and_then(|p| intensity(&words[p])) {
                valence += boost * valence.signum();
            }
            let window = &words[i.saturating_sub(NEGATION_WINDOW)..i];
            if window.iter().any(|w| NEGATIONS.contains(&w.as_str())) {
                valence *= NEGATION_SCALAR;
            }
            valences.push(valence);
        }

        let mut sum: f64 = valences.iter().sum();
        let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS) as f64;
        if sum > 0.0 {
            sum += exclamations * EXCLAMATION_BOOST;
        } else if sum < 0.0 {
            sum -= exclamations * EXCLAMATION_BOOST;
        }
        let polarity = sum / (sum * sum + ALPHA).sqrt();

        let positive_sum: f64 = valences.iter().filter(|v| **v > 0.0).map(|v| v + 1.0).sum();
        let negative_sum: f64 = valences.iter().filter(|v| **v < 0.0).map(|v| v.abs() + 1.0).sum();
        let neutral_count = valences.iter().filter(|v| **v == 0.0).count() as f64;
        let total = positive_sum + negative_sum + neutral_count;
        let positive = if total > 0.0 { positive_sum / total } else { 0.0 };

        Sentiment::from_polarity(polarity, positive)
    }
}

impl SentimentAnalyzer for LexiconSentimentAnalyzer {
    fn name(&self) -> &str {
        "lexicon sentiment"
    }

    fn analyze(&self, text: &str) -> Result<Sentiment, ServiceError> {
        Ok(self.polarity_of(text))
    }
}
