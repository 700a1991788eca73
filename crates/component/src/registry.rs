use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use serde_yaml::Mapping;
use tracing::info;

use crate::handles::HandleSettings;
use crate::persist::{self, BinaryEnvelope};
use crate::{Component, ComponentError, DynComponent};

type StructuredLoader =
    fn(Mapping, &HandleSettings) -> Result<Box<dyn DynComponent>, ComponentError>;
type BinaryLoader =
    fn(BinaryEnvelope, &HandleSettings) -> Result<Box<dyn DynComponent>, ComponentError>;

#[derive(Clone, Copy)]
struct Loaders {
    structured: StructuredLoader,
    binary: BinaryLoader,
}

/// Kind -> loader table for loading components whose type is only known
/// from the file.
///
/// Build one at startup, register every component type, then pass it by
/// reference to whatever loads persisted components. The registry also
/// carries the [`HandleSettings`] used to re-attach runtime handles.
pub struct ComponentRegistry {
    settings: HandleSettings,
    loaders: BTreeMap<&'static str, Loaders>,
}

impl ComponentRegistry {
    pub fn new(settings: HandleSettings) -> Self {
        Self {
            settings,
            loaders: BTreeMap::new(),
        }
    }

    /// Register `C` under [`Component::KIND`]. Registering twice is harmless.
    pub fn register<C: Component + 'static>(&mut self) -> &mut Self {
        self.loaders.insert(
            C::KIND,
            Loaders {
                structured: structured_loader::<C>,
                binary: binary_loader::<C>,
            },
        );
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.loaders.contains_key(kind)
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.loaders.keys().copied()
    }

    pub fn settings(&self) -> &HandleSettings {
        &self.settings
    }

    fn loaders_for(&self, kind: &str) -> Result<Loaders, ComponentError> {
        self.loaders
            .get(kind)
            .copied()
            .ok_or_else(|| ComponentError::UnknownKind(kind.to_string()))
    }

    /// Load a binary dump of any registered kind.
    pub fn load_binary(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Box<dyn DynComponent>, ComponentError> {
        let path = path.as_ref();
        let start = Instant::now();
        let envelope = persist::read_binary(path)?;
        let loaders = self.loaders_for(&envelope.kind)?;
        let component = (loaders.binary)(envelope, &self.settings)?;
        info!(
            kind = component.kind(),
            path = %path.display(),
            elapsed_micros = start.elapsed().as_micros(),
            "registry_load_binary"
        );
        Ok(component)
    }

    /// Load a structured file. The document must carry a `!Kind` tag.
    pub fn load_structured(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Box<dyn DynComponent>, ComponentError> {
        let path = path.as_ref();
        let (tag, body) = persist::read_structured(path)?;
        let kind = tag.ok_or_else(|| {
            ComponentError::Deserialization(format!(
                "{} has no component tag (expected `!Kind` at the top)",
                path.display()
            ))
        })?;
        let loaders = self.loaders_for(&kind)?;
        let component = (loaders.structured)(body, &self.settings)?;
        info!(kind = component.kind(), path = %path.display(), "registry_load_structured");
        Ok(component)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new(HandleSettings::from_env())
    }
}

fn structured_loader<C: Component + 'static>(
    body: Mapping,
    settings: &HandleSettings,
) -> Result<Box<dyn DynComponent>, ComponentError> {
    Ok(Box::new(persist::from_structured_body::<C>(body, settings)?))
}

fn binary_loader<C: Component + 'static>(
    envelope: BinaryEnvelope,
    settings: &HandleSettings,
) -> Result<Box<dyn DynComponent>, ComponentError> {
    Ok(Box::new(persist::restore_from_envelope::<C>(envelope, settings)?))
}
