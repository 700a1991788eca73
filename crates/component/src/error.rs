use std::io;
use thiserror::Error;

/// Errors surfaced by component construction, guards and persistence.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// Reading a model file or writing a dump failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A trained-only operation ran on an untrained component.
    #[error("training is required before calling \"{0}\"")]
    Precondition(String),
    /// A persisted file is absent, corrupt, or written by an incompatible version.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
    /// The component state could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Stored or supplied parameters do not form a valid configuration.
    #[error("invalid component configuration: {0}")]
    Configuration(String),
    /// The configuration names an option the component does not implement.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    /// A registry was asked for a kind nobody registered.
    #[error("unknown component kind: {0}")]
    UnknownKind(String),
}

impl From<bincode::error::EncodeError> for ComponentError {
    fn from(e: bincode::error::EncodeError) -> Self {
        ComponentError::Serialization(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for ComponentError {
    fn from(e: bincode::error::DecodeError) -> Self {
        ComponentError::Deserialization(e.to_string())
    }
}

impl ComponentError {
    pub fn configuration<E: std::fmt::Display>(err: E) -> Self {
        Self::Configuration(err.to_string())
    }

    pub fn deserialization<E: std::fmt::Display>(err: E) -> Self {
        Self::Deserialization(err.to_string())
    }
}
