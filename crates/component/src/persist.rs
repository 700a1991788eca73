//! Binary and structured persistence.
//!
//! ## Binary
//!
//! ```text
//! zstd( bincode( BinaryEnvelope { schema_version, kind, component_version,
//!                                 base: BaseSnapshot, state: bincode(C::State) } ) )
//! ```
//!
//! The state is encoded separately so a registry can read the envelope,
//! look at `kind`, and only then pick the concrete type to decode into.
//! Runtime handles are not part of the envelope and are re-attached on load.
//!
//! ## Structured
//!
//! ```yaml
//! !Word2VecEncoder
//! parameter:
//!   model_path: vectors.txt
//!   dimension: 300
//! property:
//!   is_trained: true
//! ```
//!
//! Only construction arguments and non-default properties are written.
//! Loading calls the constructor again, so anything the constructor derives
//! is derived afresh.

use std::fs;
use std::path::Path;
use std::time::Instant;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::args::{value_kind, InitArgs};
use crate::base::{BaseSnapshot, ComponentBase};
use crate::handles::HandleSettings;
use crate::{Component, ComponentError};

/// Bump whenever the envelope layout changes.
pub const BINARY_SCHEMA_VERSION: u16 = 1;
/// Top-level key holding captured construction arguments.
pub const PARAMETER_KEY: &str = "parameter";
/// Top-level key holding non-default properties.
pub const PROPERTY_KEY: &str = "property";

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BinaryEnvelope {
    pub(crate) schema_version: u16,
    pub(crate) kind: String,
    pub(crate) component_version: u16,
    pub(crate) base: BaseSnapshot,
    pub(crate) state: Vec<u8>,
}

pub(crate) fn encode_binary<C: Component>(component: &C) -> Result<Vec<u8>, ComponentError> {
    let state = encode_to_vec(component.snapshot(), standard())?;
    let envelope = BinaryEnvelope {
        schema_version: BINARY_SCHEMA_VERSION,
        kind: C::KIND.to_string(),
        component_version: C::VERSION,
        base: component.base().snapshot()?,
        state,
    };
    let raw = encode_to_vec(&envelope, standard())?;
    zstd::encode_all(raw.as_slice(), ZSTD_LEVEL)
        .map_err(|e| ComponentError::Serialization(e.to_string()))
}

pub(crate) fn decode_envelope(bytes: &[u8]) -> Result<BinaryEnvelope, ComponentError> {
    let raw = zstd::decode_all(bytes).map_err(ComponentError::deserialization)?;
    let (envelope, _): (BinaryEnvelope, usize) = decode_from_slice(&raw, standard())?;
    if envelope.schema_version != BINARY_SCHEMA_VERSION {
        return Err(ComponentError::Deserialization(format!(
            "unsupported binary schema version {} (expected {BINARY_SCHEMA_VERSION})",
            envelope.schema_version
        )));
    }
    Ok(envelope)
}

pub(crate) fn restore_from_envelope<C: Component>(
    envelope: BinaryEnvelope,
    settings: &HandleSettings,
) -> Result<C, ComponentError> {
    if envelope.kind != C::KIND {
        return Err(ComponentError::Deserialization(format!(
            "file holds a `{}`, not a `{}`",
            envelope.kind,
            C::KIND
        )));
    }
    if envelope.component_version != C::VERSION {
        return Err(ComponentError::Deserialization(format!(
            "`{}` version {} is incompatible with version {}",
            C::KIND,
            envelope.component_version,
            C::VERSION
        )));
    }
    let (state, _): (C::State, usize) = decode_from_slice(&envelope.state, standard())?;
    let base = ComponentBase::from_snapshot(C::KIND, envelope.base, settings)?;
    C::restore(base, state)
}

/// Absent or unreadable files count as undecodable, not as I/O failures.
pub(crate) fn read_binary(path: &Path) -> Result<BinaryEnvelope, ComponentError> {
    let bytes = fs::read(path).map_err(|e| {
        ComponentError::Deserialization(format!("cannot read {}: {e}", path.display()))
    })?;
    decode_envelope(&bytes)
}

pub(crate) fn dump_binary<C: Component>(component: &C, path: &Path) -> Result<(), ComponentError> {
    let start = Instant::now();
    let bytes = encode_binary(component)?;
    fs::write(path, &bytes)?;
    let _enter = component.base().span().enter();
    info!(
        kind = C::KIND,
        path = %path.display(),
        bytes = bytes.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "dump_binary"
    );
    Ok(())
}

pub(crate) fn load_binary<C: Component>(
    path: &Path,
    settings: &HandleSettings,
) -> Result<C, ComponentError> {
    let start = Instant::now();
    let component = restore_from_envelope::<C>(read_binary(path)?, settings)?;
    component.base().span().in_scope(|| {
        info!(
            kind = C::KIND,
            path = %path.display(),
            elapsed_micros = start.elapsed().as_micros(),
            "load_binary"
        )
    });
    Ok(component)
}

/// Build the tagged structured document for `component`.
pub fn structured_document<C: Component>(component: &C) -> Result<Value, ComponentError> {
    let base = component.base();
    let mut doc = Mapping::new();
    if !base.init_args().is_empty() {
        doc.insert(
            PARAMETER_KEY.into(),
            Value::Mapping(base.init_args().as_mapping().clone()),
        );
    }
    let overrides = base.properties().overrides()?;
    if !overrides.is_empty() {
        doc.insert(PROPERTY_KEY.into(), Value::Mapping(overrides));
    }
    Ok(Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(C::KIND),
        value: Value::Mapping(doc),
    })))
}

pub(crate) fn dump_structured<C: Component>(
    component: &C,
    path: &Path,
) -> Result<(), ComponentError> {
    let doc = structured_document(component)?;
    let text =
        serde_yaml::to_string(&doc).map_err(|e| ComponentError::Serialization(e.to_string()))?;
    fs::write(path, text)?;
    let _enter = component.base().span().enter();
    info!(kind = C::KIND, path = %path.display(), "dump_structured");
    Ok(())
}

/// Parse a structured file into its tag (if any) and body mapping.
pub(crate) fn read_structured(path: &Path) -> Result<(Option<String>, Mapping), ComponentError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&text).map_err(ComponentError::deserialization)?;
    let (tag, body) = match value {
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            (Some(tag.to_string().trim_start_matches('!').to_string()), value)
        }
        other => (None, other),
    };
    match body {
        Value::Mapping(map) => Ok((tag, map)),
        Value::Null => Ok((tag, Mapping::new())),
        other => Err(ComponentError::Deserialization(format!(
            "structured component must be a mapping, got {}",
            value_kind(&other)
        ))),
    }
}

/// Construct `C` from a structured body: constructor first, then properties.
pub(crate) fn from_structured_body<C: Component>(
    body: Mapping,
    settings: &HandleSettings,
) -> Result<C, ComponentError> {
    let parameter = match body.get(PARAMETER_KEY) {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Mapping(map)) => map.clone(),
        Some(other) => {
            return Err(ComponentError::Configuration(format!(
                "`{PARAMETER_KEY}` must be a mapping, got {}",
                value_kind(other)
            )))
        }
    };
    let property = match body.get(PROPERTY_KEY) {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Mapping(map)) => map.clone(),
        Some(other) => {
            return Err(ComponentError::Configuration(format!(
                "`{PROPERTY_KEY}` must be a mapping, got {}",
                value_kind(other)
            )))
        }
    };

    let (named, raw) = if C::STORE_RAW_ARGS {
        InitArgs::split_raw(parameter)?
    } else {
        (parameter, Default::default())
    };
    let config: C::Config = serde_yaml::from_value(Value::Mapping(named))
        .map_err(|e| ComponentError::Configuration(format!("`{}`: {e}", C::KIND)))?;

    let mut component = C::build(config, raw)?;
    component.base_mut().attach_handles(settings);
    component.base_mut().properties_mut().apply(&property)?;
    Ok(component)
}

pub(crate) fn load_structured<C: Component>(
    path: &Path,
    settings: &HandleSettings,
) -> Result<C, ComponentError> {
    let (tag, body) = read_structured(path)?;
    if let Some(tag) = tag {
        if tag != C::KIND {
            return Err(ComponentError::Deserialization(format!(
                "file holds a `{tag}`, not a `{}`",
                C::KIND
            )));
        }
    }
    let component = from_structured_body::<C>(body, settings)?;
    component
        .base()
        .span()
        .in_scope(|| info!(kind = C::KIND, path = %path.display(), "load_structured"));
    Ok(component)
}
