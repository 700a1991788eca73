use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::ComponentError;

/// Lifecycle properties every component carries.
///
/// Structured dumps only write the ones that differ from [`Properties::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    /// Set once `train` completes; gates trained-only operations.
    pub is_trained: bool,
    /// Preferred processing batch size, if the component batches at all.
    pub batch_size: Option<usize>,
}

impl Properties {
    pub const NAMES: [&'static str; 2] = ["is_trained", "batch_size"];

    /// Non-default properties as an ordered mapping.
    pub fn overrides(&self) -> Result<Mapping, ComponentError> {
        let defaults = Properties::default();
        let mut out = Mapping::new();
        if self.is_trained != defaults.is_trained {
            out.insert("is_trained".into(), Value::Bool(self.is_trained));
        }
        if self.batch_size != defaults.batch_size {
            let value = serde_yaml::to_value(self.batch_size)
                .map_err(|e| ComponentError::Serialization(e.to_string()))?;
            out.insert("batch_size".into(), value);
        }
        Ok(out)
    }

    /// Apply stored overrides. Unknown names are a configuration error rather
    /// than silently ignored.
    pub fn apply(&mut self, overrides: &Mapping) -> Result<(), ComponentError> {
        for (key, value) in overrides {
            match key.as_str() {
                Some("is_trained") => {
                    self.is_trained = serde_yaml::from_value(value.clone()).map_err(|e| {
                        ComponentError::Configuration(format!("property `is_trained`: {e}"))
                    })?;
                }
                Some("batch_size") => {
                    self.batch_size = serde_yaml::from_value(value.clone()).map_err(|e| {
                        ComponentError::Configuration(format!("property `batch_size`: {e}"))
                    })?;
                }
                _ => {
                    return Err(ComponentError::Configuration(format!(
                        "unknown property {key:?}, expected one of {:?}",
                        Self::NAMES
                    )))
                }
            }
        }
        Ok(())
    }
}
