use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use component::{Component, ComponentBase, ComponentError, RawArgs, Trainable};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokenize::{Tokenizer, TokenizerConfig};
use tracing::{debug, info};

use crate::pooling::PoolingStrategy;
use crate::table::VectorTable;

fn default_skip_rows() -> usize {
    1
}

fn default_batch_size() -> usize {
    64
}

fn default_dimension() -> usize {
    300
}

fn default_pooling_strategy() -> String {
    "REDUCE_MEAN".into()
}

/// Construction parameters for [`Word2VecEncoder`].
///
/// Only `model_path` is required in a structured file; everything else has
/// a default.
///
/// ```rust
/// use encoder::Word2VecConfig;
///
/// let cfg = Word2VecConfig::new("vectors.txt");
/// assert_eq!(cfg.skip_rows, 1);
/// assert_eq!(cfg.dimension, 300);
/// assert_eq!(cfg.pooling_strategy, "REDUCE_MEAN");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word2VecConfig {
    /// Plain-text vector table, one `token v1 ... vD` row per line.
    pub model_path: PathBuf,
    /// Leading rows to ignore (the usual `count dim` header).
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    /// Inputs tokenized and pooled per chunk in [`Word2VecEncoder::encode`].
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Vector length `D`.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Checked when encoding, not at construction.
    #[serde(default = "default_pooling_strategy")]
    pub pooling_strategy: String,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

impl Word2VecConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            skip_rows: default_skip_rows(),
            batch_size: default_batch_size(),
            dimension: default_dimension(),
            pooling_strategy: default_pooling_strategy(),
            tokenizer: TokenizerConfig::default(),
        }
    }

    fn validate(&self) -> Result<(), ComponentError> {
        if self.dimension == 0 {
            return Err(ComponentError::Configuration(
                "`dimension` must be greater than zero".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ComponentError::Configuration(
                "`batch_size` must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Mean-pooled pretrained word vectors.
///
/// Pretrained, so it counts as trained from construction. The vector table
/// is never persisted; it is read from `model_path` the first time it is
/// needed and dropped again by [`Component::close`].
#[derive(Debug)]
pub struct Word2VecEncoder {
    base: ComponentBase,
    config: Word2VecConfig,
    tokenizer: Arc<dyn Tokenizer>,
    table: OnceCell<VectorTable>,
}

impl Word2VecEncoder {
    /// Replace the configured tokenizer. The replacement lives only as long
    /// as this instance; loading rebuilds the one named in the config.
    pub fn with_tokenizer<T: Tokenizer + 'static>(mut self, tokenizer: T) -> Self {
        self.tokenizer = Arc::new(tokenizer);
        self
    }

    /// Construct again on a live instance. Captured arguments merge with
    /// the earlier ones; the table reloads on next use.
    pub fn reconfigure(&mut self, config: Word2VecConfig) -> Result<(), ComponentError> {
        config.validate()?;
        self.base.recapture::<Self>(&config, &RawArgs::default())?;
        self.base.properties_mut().batch_size = Some(config.batch_size);
        self.tokenizer = Arc::from(config.tokenizer.build());
        self.config = config;
        self.table = OnceCell::new();
        Ok(())
    }

    pub fn config(&self) -> &Word2VecConfig {
        &self.config
    }

    pub fn model_path(&self) -> &Path {
        &self.config.model_path
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// The vector table, loading it on first call.
    pub fn table(&self) -> Result<&VectorTable, ComponentError> {
        self.table.get_or_try_init(|| {
            let start = Instant::now();
            let table = VectorTable::load(
                &self.config.model_path,
                self.config.skip_rows,
                self.config.dimension,
            )?;
            let _enter = self.base.span().enter();
            info!(
                path = %self.config.model_path.display(),
                tokens = table.len(),
                dimension = table.dimension(),
                elapsed_micros = start.elapsed().as_micros(),
                "vector_table_loaded"
            );
            Ok(table)
        })
    }

    /// One `dimension`-length vector per input, in input order.
    ///
    /// Unknown tokens contribute the zero vector to the mean. An input with
    /// no tokens at all encodes to the zero vector.
    pub fn encode<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vec<f32>>, ComponentError> {
        self.require_trained("encode")?;
        let pooling: PoolingStrategy = self.config.pooling_strategy.parse()?;
        let table = self.table()?;

        let _enter = self.base.span().enter();
        let verbose = self.base.verbose();
        let batch_size = self
            .base
            .properties()
            .batch_size
            .unwrap_or(self.config.batch_size)
            .max(1);
        let start = Instant::now();
        let mut encoded = Vec::with_capacity(texts.len());

        for (batch, chunk) in texts.chunks(batch_size).enumerate() {
            let phase = Instant::now();
            let tokens: Vec<Vec<String>> = chunk
                .iter()
                .map(|text| self.tokenizer.tokenize(text.as_ref()))
                .collect();
            let tokenize_micros = phase.elapsed().as_micros();

            let phase = Instant::now();
            let looked_up: Vec<Vec<&[f32]>> = tokens
                .iter()
                .map(|row| row.iter().map(|token| table.lookup(token)).collect())
                .collect();
            let lookup_micros = phase.elapsed().as_micros();

            let phase = Instant::now();
            encoded.extend(
                looked_up
                    .into_iter()
                    .map(|vectors| pooling.pool(vectors, table.dimension())),
            );
            let pool_micros = phase.elapsed().as_micros();

            if verbose {
                debug!(
                    batch,
                    inputs = chunk.len(),
                    tokens = tokens.iter().map(Vec::len).sum::<usize>(),
                    tokenize_micros,
                    lookup_micros,
                    pool_micros,
                    "encode_batch"
                );
            }
        }

        debug!(
            inputs = texts.len(),
            batch_size,
            elapsed_micros = start.elapsed().as_micros(),
            "encode_complete"
        );
        Ok(encoded)
    }
}

impl Component for Word2VecEncoder {
    const KIND: &'static str = "Word2VecEncoder";
    type Config = Word2VecConfig;
    type State = Word2VecConfig;

    fn build(config: Word2VecConfig, raw: RawArgs) -> Result<Self, ComponentError> {
        let mut base = ComponentBase::new::<Self>(&config, &raw)?;
        config.validate()?;
        base.properties_mut().is_trained = true;
        base.properties_mut().batch_size = Some(config.batch_size);
        Ok(Self {
            base,
            tokenizer: Arc::from(config.tokenizer.build()),
            config,
            table: OnceCell::new(),
        })
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn snapshot(&self) -> Word2VecConfig {
        self.config.clone()
    }

    fn restore(base: ComponentBase, config: Word2VecConfig) -> Result<Self, ComponentError> {
        config.validate()?;
        Ok(Self {
            base,
            tokenizer: Arc::from(config.tokenizer.build()),
            config,
            table: OnceCell::new(),
        })
    }

    fn close(&mut self) -> Result<(), ComponentError> {
        if let Some(table) = self.table.take() {
            let _enter = self.base.span().enter();
            debug!(tokens = table.len(), "vector_table_released");
        }
        Ok(())
    }
}

/// Training re-reads the vector table from `model_path`.
impl Trainable for Word2VecEncoder {
    type Data = ();

    fn fit(&mut self, _data: &()) -> Result<(), ComponentError> {
        let table = VectorTable::load(
            &self.config.model_path,
            self.config.skip_rows,
            self.config.dimension,
        )?;
        self.table = OnceCell::with_value(table);
        Ok(())
    }
}
