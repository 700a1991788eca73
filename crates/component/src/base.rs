use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::args::{InitArgs, RawArgs};
use crate::cache::DiskCache;
use crate::handles::{HandleSettings, RuntimeHandles};
use crate::properties::Properties;
use crate::{Component, ComponentError};

/// Shared lifecycle state embedded in every component.
///
/// Holds the captured construction arguments, the lifecycle properties and
/// the runtime handles. Components build one with [`ComponentBase::new`] as
/// the first step of their constructor.
#[derive(Debug)]
pub struct ComponentBase {
    kind: &'static str,
    init_args: InitArgs,
    properties: Properties,
    handles: RuntimeHandles,
}

/// The persisted part of a [`ComponentBase`]. Handles are not in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BaseSnapshot {
    pub(crate) init_args: String,
    pub(crate) properties: Properties,
}

impl ComponentBase {
    /// Capture `config` (and `raw`, when `C` stores raw arguments) and attach
    /// fresh handles from [`HandleSettings::from_env`].
    pub fn new<C: Component>(config: &C::Config, raw: &RawArgs) -> Result<Self, ComponentError> {
        let init_args = InitArgs::capture(config, raw, C::STORE_RAW_ARGS)?;
        Ok(Self {
            kind: C::KIND,
            init_args,
            properties: Properties::default(),
            handles: RuntimeHandles::attach(C::KIND, &HandleSettings::from_env()),
        })
    }

    /// Re-run construction capture on a live instance. The new arguments are
    /// merged into the stored ones; properties and handles are untouched.
    pub fn recapture<C: Component>(
        &mut self,
        config: &C::Config,
        raw: &RawArgs,
    ) -> Result<(), ComponentError> {
        let captured = InitArgs::capture(config, raw, C::STORE_RAW_ARGS)?;
        self.init_args.merge(captured);
        Ok(())
    }

    /// Replace both runtime handles. Cheap and idempotent.
    pub fn attach_handles(&mut self, settings: &HandleSettings) {
        self.handles = RuntimeHandles::attach(self.kind, settings);
    }

    pub(crate) fn snapshot(&self) -> Result<BaseSnapshot, ComponentError> {
        Ok(BaseSnapshot {
            init_args: self.init_args.to_yaml()?,
            properties: self.properties,
        })
    }

    pub(crate) fn from_snapshot(
        kind: &'static str,
        snapshot: BaseSnapshot,
        settings: &HandleSettings,
    ) -> Result<Self, ComponentError> {
        Ok(Self {
            kind,
            init_args: InitArgs::from_yaml(&snapshot.init_args)?,
            properties: snapshot.properties,
            handles: RuntimeHandles::attach(kind, settings),
        })
    }

    /// Fails with [`ComponentError::Precondition`] until the component is trained.
    pub fn require_trained(&self, operation: &str) -> Result<(), ComponentError> {
        if self.properties.is_trained {
            Ok(())
        } else {
            Err(ComponentError::Precondition(operation.to_string()))
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn init_args(&self) -> &InitArgs {
        &self.init_args
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn is_trained(&self) -> bool {
        self.properties.is_trained
    }

    pub fn span(&self) -> &Span {
        self.handles.span()
    }

    pub fn cache(&self) -> &DiskCache {
        self.handles.cache()
    }

    pub fn verbose(&self) -> bool {
        self.handles.verbose()
    }
}

/// Run `op` only when `component` is trained.
///
/// ```rust,ignore
/// trained_only(self, "transform", |c| c.transform_inner(input))
/// ```
pub fn trained_only<C, T, F>(component: &C, operation: &str, op: F) -> Result<T, ComponentError>
where
    C: Component,
    F: FnOnce(&C) -> Result<T, ComponentError>,
{
    component.base().require_trained(operation)?;
    op(component)
}
