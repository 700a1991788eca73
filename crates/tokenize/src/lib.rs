//! vecpipe tokenization layer.
//!
//! Encoders never segment text themselves. They hold a [`Tokenizer`] and ask
//! it for an ordered list of tokens, then look those tokens up in whatever
//! table they carry. This crate ships the two tokenizers we actually use and
//! the config that picks between them.
//!
//! ## What we ship
//!
//! - [`WhitespaceTokenizer`] - splits on Unicode whitespace, nothing else.
//!   Right choice for pre-segmented corpora (one space between words).
//! - [`UnicodeWordTokenizer`] - UAX #29 word boundaries. Punctuation is
//!   dropped and CJK ideographs come out one per token, so Chinese text is
//!   usable without an external segmenter.
//!
//! Both can run NFKC normalization and lowercasing first (see
//! [`TokenizerConfig`]).
//!
//! ## Pure function guarantee
//!
//! No I/O, no locale dependence. Same text + same config = same tokens.
//!
//! ```rust
//! use tokenize::{Tokenizer, TokenizerConfig, TokenizerKind};
//!
//! let cfg = TokenizerConfig {
//!     kind: TokenizerKind::UnicodeWords,
//!     ..Default::default()
//! };
//! let tokenizer = cfg.build();
//! assert_eq!(tokenizer.tokenize("Hello, world!"), vec!["hello", "world"]);
//! ```

mod config;
mod normalize;
mod whitespace;
mod words;

pub use crate::config::{TokenizerConfig, TokenizerKind};
pub use crate::whitespace::WhitespaceTokenizer;
pub use crate::words::UnicodeWordTokenizer;

use std::fmt;

/// Maps a string to an ordered sequence of tokens.
///
/// Implementations must be deterministic. An empty or whitespace-only input
/// yields an empty vector, never an error.
pub trait Tokenizer: fmt::Debug + Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn tokenize(&self, text: &str) -> Vec<String> {
        (**self).tokenize(text)
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for std::sync::Arc<T> {
    fn tokenize(&self, text: &str) -> Vec<String> {
        (**self).tokenize(text)
    }
}
