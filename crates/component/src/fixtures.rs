use serde::{Deserialize, Serialize};

use crate::{trained_only, Component, ComponentBase, ComponentError, InitArgs, RawArgs, Trainable};

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidConfig {
    pub dims: usize,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl CentroidConfig {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            label: None,
            scale: default_scale(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidState {
    pub config: CentroidConfig,
    pub centroid: Vec<f64>,
}

/// Learns the (scaled) mean of its training rows.
#[derive(Debug)]
pub struct Centroid {
    pub base: ComponentBase,
    pub config: CentroidConfig,
    pub centroid: Vec<f64>,
    pub closes: usize,
    pub fail_close: bool,
}

impl Component for Centroid {
    const KIND: &'static str = "Centroid";
    type Config = CentroidConfig;
    type State = CentroidState;

    fn build(config: CentroidConfig, raw: RawArgs) -> Result<Self, ComponentError> {
        let base = ComponentBase::new::<Self>(&config, &raw)?;
        if config.dims == 0 {
            return Err(ComponentError::Configuration("dims must be positive".into()));
        }
        Ok(Self {
            base,
            centroid: vec![0.0; config.dims],
            config,
            closes: 0,
            fail_close: false,
        })
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn snapshot(&self) -> CentroidState {
        CentroidState {
            config: self.config.clone(),
            centroid: self.centroid.clone(),
        }
    }

    fn restore(base: ComponentBase, state: CentroidState) -> Result<Self, ComponentError> {
        Ok(Self {
            base,
            config: state.config,
            centroid: state.centroid,
            closes: 0,
            fail_close: false,
        })
    }

    fn close(&mut self) -> Result<(), ComponentError> {
        self.closes += 1;
        if self.fail_close {
            return Err(ComponentError::Io(std::io::Error::other("close failed")));
        }
        Ok(())
    }
}

impl Trainable for Centroid {
    type Data = [Vec<f64>];

    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<(), ComponentError> {
        if rows.is_empty() {
            return Err(ComponentError::Configuration("no training rows".into()));
        }
        let mut sum = vec![0.0; self.config.dims];
        for row in rows {
            if row.len() != self.config.dims {
                return Err(ComponentError::Configuration(format!(
                    "row has {} values, expected {}",
                    row.len(),
                    self.config.dims
                )));
            }
            for (acc, v) in sum.iter_mut().zip(row) {
                *acc += v;
            }
        }
        let n = rows.len() as f64;
        self.centroid = sum
            .into_iter()
            .map(|v| v / n * self.config.scale)
            .collect();
        Ok(())
    }
}

impl Centroid {
    pub fn distance(&self, point: &[f64]) -> Result<f64, ComponentError> {
        trained_only(self, "distance", |c| {
            Ok(c.centroid
                .iter()
                .zip(point)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplatConfig {
    pub name: String,
}

/// Keeps its raw positional and keyword arguments.
#[derive(Debug)]
pub struct Splat {
    pub base: ComponentBase,
    pub config: SplatConfig,
    pub raw: RawArgs,
}

impl Component for Splat {
    const KIND: &'static str = "Splat";
    const STORE_RAW_ARGS: bool = true;
    type Config = SplatConfig;
    type State = SplatConfig;

    fn build(config: SplatConfig, raw: RawArgs) -> Result<Self, ComponentError> {
        let base = ComponentBase::new::<Self>(&config, &raw)?;
        Ok(Self { base, config, raw })
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn snapshot(&self) -> SplatConfig {
        self.config.clone()
    }

    fn restore(base: ComponentBase, config: SplatConfig) -> Result<Self, ComponentError> {
        let (_, raw) = InitArgs::split_raw(base.init_args().as_mapping().clone())?;
        Ok(Self { base, config, raw })
    }
}
