//! Word and sentence segmentation

use super::Token;
use regex::Regex;
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}]+(?:['\u{2019}][\p{L}\p{N}]+)*").expect("word pattern compiles")
    })
}

fn sentence_end() -> &'static Regex {
    static END: OnceLock<Regex> = OnceLock::new();
    END.get_or_init(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("sentence pattern compiles"))
}

/// Split text into word tokens on word boundaries. Punctuation is dropped;
/// internal apostrophes ("I'm", "that's") stay part of the word.
pub fn tokenize(text: &str) -> Vec<Token> {
    word_pattern()
        .find_iter(text)
        .map(|m| Token {
            text: m.as_str().to_string(),
            offset: m.start(),
        })
        .collect()
}

/// Split text into sentences at runs of `.`, `!` or `?` followed by whitespace or
/// end of input. Trailing text without terminal punctuation is its own sentence.
/// Fragments with no word characters are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in sentence_end().find_iter(text) {
        push_sentence(&mut sentences, &text[start..m.end()]);
        start = m.end();
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(out: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if word_pattern().is_match(trimmed) {
        out.push(trimmed.to_string());
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn tokens_point_back_into_the_text(ref input in "\\PC{0,300}") {
            for token in tokenize(input) {
                prop_assert_eq!(&input[token.offset..token.offset + token.text.len()], token.text.as_str());
            }
        }

        #[test]
        fn sentences_never_panic_and_are_trimmed(ref input in "[a-z .!?\n]{0,200}") {
            for sentence in split_sentences(input) {
                prop_assert!(!sentence.is_empty());
                prop_assert_eq!(sentence.trim(), sentence.as_str());
            }
        }
    }
}
