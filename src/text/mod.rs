//! Transcript preprocessing: tokens, sentences, and phrase matching

mod phrase;
mod tokenize;

pub use phrase::{count_phrases, first_match, Phrase};
pub use tokenize::{split_sentences, tokenize};

/// A word token with its original spelling and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Text as it appeared in the transcript
    pub text: String,
    /// Byte offset of the token in the raw transcript
    pub offset: usize,
}

/// Immutable, preprocessed view of a transcript
#[derive(Debug, Clone)]
pub struct Transcript {
    raw: String,
    tokens: Vec<Token>,
    /// Case-normalized words, parallel to `tokens`
    words: Vec<String>,
    sentences: Vec<String>,
}

impl Transcript {
    /// Preprocess raw text. Empty or whitespace-only input is valid and yields no words.
    pub fn new(raw: &str) -> Self {
        let tokens = tokenize(raw);
        let words = tokens.iter().map(|t| normalize_word(&t.text)).collect();
        let sentences = split_sentences(raw);
        Self {
            raw: raw.to_string(),
            tokens,
            words,
            sentences,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Lowercased words in order
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Original-case text covering `len` tokens starting at token `start`
    pub fn excerpt(&self, start: usize, len: usize) -> Option<&str> {
        let first = self.tokens.get(start)?;
        let last = self.tokens.get(start + len.max(1) - 1)?;
        self.raw.get(first.offset..last.offset + last.text.len())
    }
}

/// Lowercase a word and fold typographic apostrophes
pub fn normalize_word(word: &str) -> String {
    word.to_lowercase().replace('\u{2019}', "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_transcript() {
        let t = Transcript::new("");
        assert_eq!(t.word_count(), 0);
        assert_eq!(t.sentence_count(), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn test_whitespace_only_transcript() {
        let t = Transcript::new("   \n\t  ");
        assert_eq!(t.word_count(), 0);
        assert!(t.sentences().is_empty());
    }

    #[test]
    fn test_words_are_lowercased() {
        let t = Transcript::new("Hello Everyone, I'm Priya.");
        assert_eq!(t.words(), &["hello", "everyone", "i'm", "priya"]);
        assert_eq!(t.tokens()[0].text, "Hello");
    }

    #[test]
    fn test_curly_apostrophe_folds() {
        let t = Transcript::new("That\u{2019}s all");
        assert_eq!(t.words()[0], "that's");
        assert_eq!(t.tokens()[0].text, "That\u{2019}s");
    }

    #[test]
    fn test_excerpt_preserves_case() {
        let t = Transcript::new("Good Morning, everyone. My Name is Ravi.");
        assert_eq!(t.excerpt(0, 2), Some("Good Morning"));
        assert_eq!(t.excerpt(3, 3), Some("My Name is"));
        assert_eq!(t.excerpt(40, 1), None);
    }

    #[test]
    fn test_sentence_count() {
        let t = Transcript::new("Hi. I am ten years old! Do you like cricket?");
        assert_eq!(t.sentence_count(), 3);
        assert_eq!(t.word_count(), 10);
    }
}
