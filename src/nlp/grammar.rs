//! Rule-based grammar checker used when no external checker is configured

use super::GrammarChecker;
use crate::text::{split_sentences, tokenize, Token};
use crate::ServiceError;

/// One flagged problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarIssue {
    pub rule: &'static str,
    /// Byte offset in the checked text
    pub offset: usize,
    pub excerpt: String,
}

/// A small set of deterministic rules that catch common transcription-level mistakes:
/// doubled words, a lowercase pronoun "i", sentences starting in lowercase, and
/// a/an agreement.
#[derive(Debug, Clone, Default)]
pub struct HeuristicGrammarChecker;

impl HeuristicGrammarChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn issues(&self, text: &str) -> Vec<GrammarIssue> {
        let tokens = tokenize(text);
        let mut issues = Vec::new();
        repeated_words(&tokens, &mut issues);
        lowercase_pronoun(&tokens, &mut issues);
        article_agreement(&tokens, &mut issues);
        lowercase_sentence_start(text, &mut issues);
        issues.sort_by_key(|i| i.offset);
        issues
    }
}

impl GrammarChecker for HeuristicGrammarChecker {
    fn name(&self) -> &str {
        "heuristic grammar rules"
    }

    fn check(&self, text: &str) -> Result<usize, ServiceError> {
        Ok(self.issues(text).len())
    }
}

fn repeated_words(tokens: &[Token], issues: &mut Vec<GrammarIssue>) {
    for pair in tokens.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let is_word = a.text.chars().any(char::is_alphabetic);
        if is_word && a.text.eq_ignore_ascii_case(&b.text) {
            issues.push(GrammarIssue {
                rule: "repeated-word",
                offset: a.offset,
                excerpt: format!("{} {}", a.text, b.text),
            });
        }
    }
}

fn lowercase_pronoun(tokens: &[Token], issues: &mut Vec<GrammarIssue>) {
    for token in tokens {
        let is_pronoun = token.text == "i"
            || token
                .text
                .strip_prefix("i'")
                .or_else(|| token.text.strip_prefix("i\u{2019}"))
                .is_some_and(|rest| matches!(rest, "m" | "ve" | "ll" | "d"));
        if is_pronoun {
            issues.push(GrammarIssue {
                rule: "lowercase-i",
                offset: token.offset,
                excerpt: token.text.clone(),
            });
        }
    }
}

/// Words where the spelling and the sound disagree about the first letter
const VOWEL_SOUND_EXCEPTIONS: &[&str] = &["hour", "hours", "honest", "honour", "honor", "heir"];
const CONSONANT_SOUND_PREFIXES: &[&str] = &["uni", "use", "usu", "eu", "one", "once", "ur"];

fn starts_with_vowel_sound(word: &str) -> bool {
    let lower = word.to_lowercase();
    if VOWEL_SOUND_EXCEPTIONS.contains(&lower.as_str()) {
        return true;
    }
    if CONSONANT_SOUND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return false;
    }
    lower.starts_with(['a', 'e', 'i', 'o', 'u'])
}

fn article_agreement(tokens: &[Token], issues: &mut Vec<GrammarIssue>) {
    for pair in tokens.windows(2) {
        let (article, next) = (&pair[0], &pair[1]);
        if !next.text.starts_with(|c: char| c.is_alphabetic()) {
            continue;
        }
        let wrong = match article.text.to_lowercase().as_str() {
            "a" => starts_with_vowel_sound(&next.text),
            "an" => !starts_with_vowel_sound(&next.text),
            _ => false,
        };
        if wrong {
            issues.push(GrammarIssue {
                rule: "article-agreement",
                offset: article.offset,
                excerpt: format!("{} {}", article.text, next.text),
            });
        }
    }
}

fn lowercase_sentence_start(text: &str, issues: &mut Vec<GrammarIssue>) {
    let mut search_from = 0;
    for sentence in split_sentences(text) {
        let offset = text[search_from..]
            .find(sentence.as_str())
            .map(|i| i + search_from)
            .unwrap_or(search_from);
        search_from = offset + sentence.len();

        let Some(first) = tokenize(&sentence).into_iter().next() else {
            continue;
        };
        if first.text.starts_with(char::is_lowercase) {
            issues.push(GrammarIssue {
                rule: "sentence-start",
                offset: offset + first.offset,
                excerpt: first.text,
            });
        }
    }
}
