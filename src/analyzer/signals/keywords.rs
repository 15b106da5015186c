//! Required topic coverage

use super::{compile_phrases, scored, Signal, SignalContext};
use crate::config::KeywordRules;
use crate::text::{first_match, Phrase};
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};
use std::collections::BTreeMap;

/// Whether one category was mentioned, and where first
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub category: String,
    /// Word index of the earliest synonym match
    pub first_at: Option<usize>,
    /// The synonym that matched there, as written in the rubric
    pub synonym: Option<String>,
}

/// Per-category matches in rubric (alphabetical) order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordMatches {
    pub categories: Vec<KeywordMatch>,
}

impl KeywordMatches {
    pub fn required(&self) -> usize {
        self.categories.len()
    }

    pub fn found(&self) -> usize {
        self.categories.iter().filter(|c| c.first_at.is_some()).count()
    }

    pub fn matched(&self) -> Vec<String> {
        self.categories
            .iter()
            .filter(|c| c.first_at.is_some())
            .map(|c| c.category.clone())
            .collect()
    }

    pub fn missing(&self) -> Vec<String> {
        self.categories
            .iter()
            .filter(|c| c.first_at.is_none())
            .map(|c| c.category.clone())
            .collect()
    }

    /// Earliest word index of any matched category (start of the body)
    pub fn first_position(&self) -> Option<usize> {
        self.categories.iter().filter_map(|c| c.first_at).min()
    }
}

pub struct KeywordSignal {
    categories: Vec<(String, Vec<Phrase>)>,
    min_matches: usize,
    max_score: f64,
}

impl KeywordSignal {
    pub fn new(rules: &KeywordRules, keywords: &BTreeMap<String, Vec<String>>) -> Self {
        Self {
            categories: keywords
                .iter()
                .map(|(name, synonyms)| (name.clone(), compile_phrases(synonyms)))
                .collect(),
            min_matches: rules.min_matches,
            max_score: rules.max_score,
        }
    }

    /// Whole-word, case-insensitive match of every category's synonyms
    pub fn match_words(&self, words: &[String]) -> KeywordMatches {
        KeywordMatches {
            categories: self
                .categories
                .iter()
                .map(|(name, phrases)| {
                    let hit = first_match(phrases, words);
                    KeywordMatch {
                        category: name.clone(),
                        first_at: hit.map(|(pos, _)| pos),
                        synonym: hit.map(|(_, idx)| phrases[idx].as_str().to_string()),
                    }
                })
                .collect(),
        }
    }
}

impl Signal for KeywordSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Keywords
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        let matches = ctx.keywords;
        let found = matches.found();
        let required = matches.required();
        let matched = matches.matched();
        let missing = matches.missing();

        let sub_score = if required == 0 {
            0.0
        } else {
            found as f64 / required as f64 * self.max_score
        };

        let mut feedback = Vec::new();
        if matched.is_empty() {
            feedback.push(format!("Matched 0 of {} keyword categories.", required));
        } else {
            feedback.push(format!(
                "Matched {} of {} keyword categories: {}.",
                found,
                required,
                matched.join(", ")
            ));
        }
        if !missing.is_empty() {
            feedback.push(format!("Not mentioned: {}.", missing.join(", ")));
        }
        if found < self.min_matches {
            feedback.push(format!(
                "Insufficient keyword matches ({} found, at least {} expected).",
                found, self.min_matches
            ));
        }

        scored(
            SignalKind::Keywords,
            SignalStatus::Scored,
            sub_score,
            self.max_score,
            RawMetric::KeywordCoverage {
                found,
                required,
                matched,
                missing,
            },
            feedback,
        )
    }
}
