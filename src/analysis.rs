//! Splitting raw text into positioned tokens.
//!
//! The index only needs a stream of normalized tokens with their positions.
//! [`SimpleTokenizer`] segments on Unicode word boundaries and lowercases;
//! anything smarter plugs in through the [`Tokenizer`] trait.

use unicode_segmentation::UnicodeSegmentation;

/// A normalized token and its position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Zero-based token position.
    pub position: u32,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }
}

pub trait Tokenizer: Send + Sync {
    /// Tokens of `text`, positions strictly increasing.
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Unicode word segmentation with optional lowercasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleTokenizer {
    lowercase: bool,
}

impl SimpleTokenizer {
    pub fn new() -> Self {
        SimpleTokenizer { lowercase: true }
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }
}

impl Default for SimpleTokenizer {
    fn default() -> Self {
        SimpleTokenizer::new()
    }
}

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.unicode_words()
            .enumerate()
            .map(|(position, word)| {
                let text = if self.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                };
                Token::new(text, position as u32)
            })
            .collect()
    }
}
