//! Construction-argument capture.
//!
//! Every component records the arguments it was built with as an ordered
//! YAML mapping ([`InitArgs`]). That mapping is the whole `parameter` section
//! of a structured dump, so rebuilding from it must give back an equivalent
//! component.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::ComponentError;

/// Key under which raw positional arguments are stored.
pub const ARGS_KEY: &str = "args";
/// Key under which raw keyword arguments are stored.
pub const KWARGS_KEY: &str = "kwargs";

/// Arguments a component accepts beyond its typed config.
///
/// Only retained when the component sets
/// [`Component::STORE_RAW_ARGS`](crate::Component::STORE_RAW_ARGS).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArgs {
    pub args: Vec<Value>,
    pub kwargs: Mapping,
}

impl RawArgs {
    pub fn new(args: Vec<Value>, kwargs: Mapping) -> Self {
        Self { args, kwargs }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

/// Ordered parameter name -> effective value mapping captured at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitArgs(Mapping);

impl InitArgs {
    /// Capture a typed config, plus the raw collections when `store_raw` is set.
    ///
    /// The config must serialize to a mapping (a struct with named fields).
    pub fn capture<C: Serialize>(
        config: &C,
        raw: &RawArgs,
        store_raw: bool,
    ) -> Result<Self, ComponentError> {
        let value = serde_yaml::to_value(config).map_err(ComponentError::configuration)?;
        let mut captured = match value {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            other => {
                return Err(ComponentError::Configuration(format!(
                    "component config must serialize to a mapping, got {}",
                    value_kind(&other)
                )))
            }
        };

        if store_raw {
            if !raw.args.is_empty() {
                captured.insert(ARGS_KEY.into(), Value::Sequence(raw.args.clone()));
            }
            if !raw.kwargs.is_empty() {
                captured.insert(KWARGS_KEY.into(), Value::Mapping(raw.kwargs.clone()));
            }
        }

        Ok(Self(captured))
    }

    /// Fold a later capture into this one. Keys present in `other` win; keys
    /// only present here survive.
    pub fn merge(&mut self, other: InitArgs) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    /// Split a stored `parameter` mapping back into named parameters and raw
    /// collections. Stored `kwargs` are folded under the named parameters, so
    /// a name present in both resolves to the named value.
    pub fn split_raw(parameter: Mapping) -> Result<(Mapping, RawArgs), ComponentError> {
        let mut named = Mapping::new();
        let mut raw = RawArgs::default();

        for (key, value) in parameter {
            match key.as_str() {
                Some(ARGS_KEY) => {
                    raw.args = match value {
                        Value::Sequence(seq) => seq,
                        Value::Null => Vec::new(),
                        other => vec![other],
                    }
                }
                Some(KWARGS_KEY) => {
                    raw.kwargs = match value {
                        Value::Mapping(map) => map,
                        Value::Null => Mapping::new(),
                        other => {
                            return Err(ComponentError::Configuration(format!(
                                "`kwargs` must be a mapping, got {}",
                                value_kind(&other)
                            )))
                        }
                    }
                }
                _ => {
                    named.insert(key, value);
                }
            }
        }

        let mut merged = raw.kwargs.clone();
        for (key, value) in named {
            merged.insert(key, value);
        }
        Ok((merged, raw))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().filter_map(Value::as_str)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    pub(crate) fn to_yaml(&self) -> Result<String, ComponentError> {
        serde_yaml::to_string(&self.0).map_err(|e| ComponentError::Serialization(e.to_string()))
    }

    pub(crate) fn from_yaml(text: &str) -> Result<Self, ComponentError> {
        let map: Mapping = serde_yaml::from_str(text).map_err(ComponentError::deserialization)?;
        Ok(Self(map))
    }
}

impl From<Mapping> for InitArgs {
    fn from(map: Mapping) -> Self {
        Self(map)
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
