//! Whitespace tokenization.
//!
//! Splits on Unicode's definition of whitespace (space, tab, newline,
//! carriage return, NBSP, ...). Punctuation stays attached to its word.

use crate::normalize::prepare;
use crate::Tokenizer;

/// Splits text on any run of Unicode whitespace.
///
/// ```rust
/// use tokenize::{Tokenizer, WhitespaceTokenizer};
///
/// let tokenizer = WhitespaceTokenizer::default();
/// assert_eq!(tokenizer.tokenize("  the  quick\tfox\n"), vec!["the", "quick", "fox"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WhitespaceTokenizer {
    pub normalize_unicode: bool,
    pub lowercase: bool,
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let prepared = prepare(text, self.normalize_unicode, self.lowercase);
        prepared.split_whitespace().map(str::to_owned).collect()
    }
}
