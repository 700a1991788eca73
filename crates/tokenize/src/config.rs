//! Tokenizer selection.
//!
//! [`TokenizerConfig`] is what encoder configs embed, so it has to survive a
//! round-trip through YAML and bincode alike. Keep it plain data: no
//! `skip_serializing_if`, every field always present.

use serde::{Deserialize, Serialize};

use crate::{Tokenizer, UnicodeWordTokenizer, WhitespaceTokenizer};

/// Which segmentation strategy to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// Split on Unicode whitespace only.
    Whitespace,
    /// UAX #29 word boundaries; punctuation dropped, CJK split per ideograph.
    #[default]
    UnicodeWords,
}

/// Configuration for building a [`Tokenizer`].
///
/// # Example
///
/// ```rust
/// use tokenize::{TokenizerConfig, TokenizerKind};
///
/// let cfg = TokenizerConfig::default();
/// assert_eq!(cfg.kind, TokenizerKind::UnicodeWords);
/// assert!(cfg.normalize_unicode);
/// assert!(cfg.lowercase);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Segmentation strategy.
    #[serde(default)]
    pub kind: TokenizerKind,
    /// Apply NFKC normalization before splitting. Full-width Latin and
    /// compatibility forms collapse onto their canonical spelling, which is
    /// what most pretrained vocabularies were built from.
    #[serde(default = "true_value")]
    pub normalize_unicode: bool,
    /// Lowercase before splitting (locale-free Unicode mapping).
    #[serde(default = "true_value")]
    pub lowercase: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: TokenizerKind::default(),
            normalize_unicode: true,
            lowercase: true,
        }
    }
}

impl TokenizerConfig {
    /// Instantiate the configured tokenizer.
    pub fn build(&self) -> Box<dyn Tokenizer> {
        match self.kind {
            TokenizerKind::Whitespace => Box::new(WhitespaceTokenizer {
                normalize_unicode: self.normalize_unicode,
                lowercase: self.lowercase,
            }),
            TokenizerKind::UnicodeWords => Box::new(UnicodeWordTokenizer {
                normalize_unicode: self.normalize_unicode,
                lowercase: self.lowercase,
            }),
        }
    }
}

fn true_value() -> bool {
    true
}
