use std::fmt;
use std::str::FromStr;

use component::ComponentError;

/// How per-token vectors collapse into one vector per input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingStrategy {
    /// Elementwise arithmetic mean.
    Mean,
}

impl FromStr for PoolingStrategy {
    type Err = ComponentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reduce_mean" | "mean" => Ok(Self::Mean),
            _ => Err(ComponentError::UnsupportedConfiguration(format!(
                "pooling strategy {raw:?} (supported: \"REDUCE_MEAN\", \"mean\")"
            ))),
        }
    }
}

impl fmt::Display for PoolingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => f.write_str("REDUCE_MEAN"),
        }
    }
}

impl PoolingStrategy {
    /// Pool `vectors` into a single `dimension`-length vector. No vectors
    /// pools to the zero vector.
    pub fn pool<'a, I>(&self, vectors: I, dimension: usize) -> Vec<f32>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        match self {
            Self::Mean => {
                let mut pooled = vec![0.0f32; dimension];
                let mut count = 0usize;
                for vector in vectors {
                    for (acc, &val) in pooled.iter_mut().zip(vector) {
                        *acc += val;
                    }
                    count += 1;
                }
                if count > 0 {
                    let n = count as f32;
                    for val in &mut pooled {
                        *val /= n;
                    }
                }
                pooled
            }
        }
    }
}
