//! vecpipe text encoders.
//!
//! Turns strings into dense `f32` vectors. The only encoder today is
//! [`Word2VecEncoder`]: tokenize, look every token up in a pretrained vector
//! table (unknown tokens map to zeros), and mean-pool per input.
//!
//! Encoders are [`component::Component`]s, so they dump/load in binary and
//! structured YAML form and can be driven through a
//! [`component::ComponentRegistry`]. Call [`register`] to add every encoder
//! kind to a registry.
//!
//! ```no_run
//! use component::{Component, RawArgs};
//! use encoder::{Word2VecConfig, Word2VecEncoder};
//!
//! let cfg = Word2VecConfig {
//!     dimension: 100,
//!     ..Word2VecConfig::new("models/zh.vec")
//! };
//! let enc = Word2VecEncoder::build(cfg, RawArgs::default()).unwrap();
//! let vectors = enc.encode(&["我爱北京", "hello world"]).unwrap();
//! assert_eq!(vectors.len(), 2);
//! ```

mod pooling;
mod table;
mod word2vec;

pub use crate::pooling::PoolingStrategy;
pub use crate::table::VectorTable;
pub use crate::word2vec::{Word2VecConfig, Word2VecEncoder};

use component::ComponentRegistry;

/// Register every encoder kind this crate defines.
pub fn register(registry: &mut ComponentRegistry) -> &mut ComponentRegistry {
    registry.register::<Word2VecEncoder>()
}
