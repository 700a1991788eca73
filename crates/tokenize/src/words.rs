use unicode_segmentation::UnicodeSegmentation;

use crate::normalize::prepare;
use crate::Tokenizer;

/// UAX #29 word segmentation.
///
/// Only segments containing an alphanumeric character are kept, so
/// punctuation and symbols vanish. Ideographic scripts have no word
/// boundaries in UAX #29 and come out one character per token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeWordTokenizer {
    pub normalize_unicode: bool,
    pub lowercase: bool,
}

impl Default for UnicodeWordTokenizer {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            lowercase: true,
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let prepared = prepare(text, self.normalize_unicode, self.lowercase);
        prepared.unicode_words().map(str::to_owned).collect()
    }
}
