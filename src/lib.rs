//! Workspace umbrella crate for vecpipe.
//!
//! Re-exports the component lifecycle, the encoders and the tokenizers, and
//! adds the process-level glue the `vecpipe` binary needs: runtime config,
//! tracing setup, a registry with every built-in kind, and line-oriented
//! encoding.

pub mod config;

pub use component::{
    Component, ComponentBase, ComponentError, ComponentRegistry, DiskCache, DynComponent,
    HandleSettings, InitArgs, Properties, RawArgs, Scope, Trainable, trained_only, with_scope,
};
pub use config::{ConfigLoadError, RuntimeConfig};
pub use encoder::{PoolingStrategy, VectorTable, Word2VecConfig, Word2VecEncoder};
pub use tokenize::{
    Tokenizer, TokenizerConfig, TokenizerKind, UnicodeWordTokenizer, WhitespaceTokenizer,
};

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Errors surfaced by the pipeline glue in this crate.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error("io failure: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write vector: {0}")]
    Output(#[from] serde_json::Error),
    #[error("`{0}` is not an encoder")]
    NotAnEncoder(&'static str),
    #[error("failed to install tracing subscriber: {0}")]
    Logging(String),
}

/// A registry with every component kind this workspace ships.
pub fn default_registry(settings: HandleSettings) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new(settings);
    encoder::register(&mut registry);
    registry
}

/// Install the global tracing subscriber. `RUST_LOG` overrides
/// `config.log_level`. Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing(config: &RuntimeConfig) -> Result<(), PipelineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| PipelineError::Logging(e.to_string()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| PipelineError::Logging(e.to_string()))
}

/// Load an encoder from a binary (`.bin`) or structured (anything else) file.
pub fn load_encoder(
    registry: &ComponentRegistry,
    path: &Path,
) -> Result<Box<Word2VecEncoder>, PipelineError> {
    let component = match path.extension().and_then(|ext| ext.to_str()) {
        Some("bin") => registry.load_binary(path)?,
        _ => registry.load_structured(path)?,
    };
    let kind = component.kind();
    component
        .downcast::<Word2VecEncoder>()
        .ok_or(PipelineError::NotAnEncoder(kind))
}

/// Encode every line of `input` and write one JSON array per line to
/// `output`. Lines are encoded in chunks of the encoder's batch size.
/// Returns the number of lines written.
pub fn encode_lines<R: BufRead, W: Write>(
    encoder: &Word2VecEncoder,
    input: R,
    mut output: W,
) -> Result<usize, PipelineError> {
    let start = Instant::now();
    let chunk = encoder
        .base()
        .properties()
        .batch_size
        .unwrap_or(encoder.config().batch_size)
        .max(1);
    let mut pending = Vec::with_capacity(chunk);
    let mut written = 0usize;

    for line in input.lines() {
        pending.push(line?);
        if pending.len() == chunk {
            written += write_vectors(encoder, &pending, &mut output)?;
            pending.clear();
        }
    }
    if !pending.is_empty() {
        written += write_vectors(encoder, &pending, &mut output)?;
    }
    output.flush()?;

    info!(
        lines = written,
        elapsed_micros = start.elapsed().as_micros(),
        "encode_lines"
    );
    Ok(written)
}

fn write_vectors<W: Write>(
    encoder: &Word2VecEncoder,
    lines: &[String],
    output: &mut W,
) -> Result<usize, PipelineError> {
    let vectors = encoder.encode(lines)?;
    for vector in &vectors {
        serde_json::to_writer(&mut *output, vector)?;
        output.write_all(b"\n")?;
    }
    Ok(vectors.len())
}
