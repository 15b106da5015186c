//! Whole-word phrase matching over normalized word sequences

use super::{normalize_word, tokenize};
use std::collections::BTreeMap;

/// A word or fixed multi-word phrase, stored as normalized tokens.
/// Matching is exact per token, so "class" never matches inside "classic".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    source: String,
    words: Vec<String>,
}

impl Phrase {
    /// Returns None when the text contains no word characters
    pub fn parse(text: &str) -> Option<Self> {
        let words: Vec<String> = tokenize(text)
            .iter()
            .map(|t| normalize_word(&t.text))
            .collect();
        if words.is_empty() {
            return None;
        }
        Some(Self {
            source: text.trim().to_string(),
            words,
        })
    }

    /// The phrase as written in the rubric
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// True if the phrase occurs at word index `at`
    pub fn matches_at(&self, words: &[String], at: usize) -> bool {
        words
            .get(at..at + self.words.len())
            .map(|window| window == self.words.as_slice())
            .unwrap_or(false)
    }

    /// Word index of the first occurrence
    pub fn find_first(&self, words: &[String]) -> Option<usize> {
        if words.len() < self.words.len() {
            return None;
        }
        (0..=words.len() - self.words.len()).find(|&i| self.matches_at(words, i))
    }
}

/// Earliest position at which any of the phrases occurs
pub fn first_match(phrases: &[Phrase], words: &[String]) -> Option<(usize, usize)> {
    phrases
        .iter()
        .enumerate()
        .filter_map(|(idx, p)| p.find_first(words).map(|pos| (pos, idx)))
        .min()
}

/// Count non-overlapping occurrences of each phrase, preferring the longest phrase
/// at every position (so "you know" is counted once, not also as "know").
/// Keys are the phrases as written; phrases that never occur are omitted.
pub fn count_phrases(phrases: &[Phrase], words: &[String]) -> BTreeMap<String, usize> {
    let mut ordered: Vec<&Phrase> = phrases.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.source.cmp(&b.source)));

    let mut counts = BTreeMap::new();
    let mut i = 0;
    while i < words.len() {
        match ordered.iter().find(|p| p.matches_at(words, i)) {
            Some(p) => {
                *counts.entry(p.source.to_lowercase()).or_insert(0) += 1;
                i += p.len();
            }
            None => i += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        tokenize(text)
            .iter()
            .map(|t| normalize_word(&t.text))
            .collect()
    }

    #[test]
    fn test_whole_word_only() {
        let p = Phrase::parse("class").unwrap();
        assert_eq!(p.find_first(&words("I love classic music")), None);
        assert_eq!(p.find_first(&words("I am in class seven")), Some(3));
    }

    #[test]
    fn test_multi_word_phrase() {
        let p = Phrase::parse("My name is").unwrap();
        assert_eq!(p.find_first(&words("Hello, my name is Asha")), Some(1));
        assert_eq!(p.find_first(&words("my name")), None);
    }

    #[test]
    fn test_blank_phrase_rejected() {
        assert!(Phrase::parse("  ").is_none());
        assert!(Phrase::parse("--").is_none());
    }

    #[test]
    fn test_first_match_picks_earliest() {
        let phrases = vec![
            Phrase::parse("thank you").unwrap(),
            Phrase::parse("bye").unwrap(),
        ];
        let w = words("bye for now and thank you");
        assert_eq!(first_match(&phrases, &w), Some((0, 1)));
    }

    #[test]
    fn test_count_prefers_longest_phrase() {
        let phrases = vec![
            Phrase::parse("know").unwrap(),
            Phrase::parse("you know").unwrap(),
            Phrase::parse("um").unwrap(),
        ];
        let counts = count_phrases(&phrases, &words("Um, you know, I know it. Um um"));
        assert_eq!(counts.get("um"), Some(&3));
        assert_eq!(counts.get("you know"), Some(&1));
        assert_eq!(counts.get("know"), Some(&1));
    }

    #[test]
    fn test_count_empty_words() {
        let phrases = vec![Phrase::parse("um").unwrap()];
        assert!(count_phrases(&phrases, &[]).is_empty());
    }
}
