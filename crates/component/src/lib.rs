//! vecpipe component lifecycle.
//!
//! Every trainable pipeline stage (encoders today, indexers later) is a
//! [`Component`]. This crate gives them one shared lifecycle:
//!
//! - **Argument capture** - the constructor calls [`ComponentBase::new`] with
//!   its typed config, which records the effective parameters as an ordered
//!   mapping. Calling [`ComponentBase::recapture`] later merges rather than
//!   replaces.
//! - **Trained state** - [`Trainable::train`] wraps the component's `fit`,
//!   warns when it overrides an earlier training, and flips `is_trained`.
//!   [`ComponentBase::require_trained`] guards trained-only operations.
//! - **Binary persistence** - [`Component::dump_binary`] /
//!   [`Component::load_binary`] round-trip the full persisted state through
//!   the explicit [`Component::snapshot`] / [`Component::restore`] projection.
//! - **Structured persistence** - [`Component::dump_structured`] /
//!   [`Component::load_structured`] write a YAML document holding only the
//!   captured parameters and non-default properties. Meant for humans to read
//!   and edit.
//! - **Scoped use** - [`Component::scope`] returns a guard that calls
//!   [`Component::close`] when dropped.
//!
//! A [`ComponentRegistry`] loads files whose concrete type is only known from
//! the stored kind.
//!
//! ## Runtime handles
//!
//! Each component owns a tracing span and a [`DiskCache`]. Neither is ever
//! persisted. Both are rebuilt from [`HandleSettings`] on construction and on
//! every load; `VECPIPE_CACHE_DIR` and `VECPIPE_VERBOSE` override the defaults.
//!
//! ## Writing a component
//!
//! ```rust
//! use component::{Component, ComponentBase, ComponentError, RawArgs};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct ScalerConfig {
//!     factor: f32,
//! }
//!
//! struct Scaler {
//!     base: ComponentBase,
//!     config: ScalerConfig,
//! }
//!
//! impl Component for Scaler {
//!     const KIND: &'static str = "Scaler";
//!     type Config = ScalerConfig;
//!     type State = ScalerConfig;
//!
//!     fn build(config: ScalerConfig, raw: RawArgs) -> Result<Self, ComponentError> {
//!         let base = ComponentBase::new::<Self>(&config, &raw)?;
//!         Ok(Self { base, config })
//!     }
//!     fn base(&self) -> &ComponentBase { &self.base }
//!     fn base_mut(&mut self) -> &mut ComponentBase { &mut self.base }
//!     fn snapshot(&self) -> ScalerConfig { self.config.clone() }
//!     fn restore(base: ComponentBase, config: ScalerConfig) -> Result<Self, ComponentError> {
//!         Ok(Self { base, config })
//!     }
//! }
//!
//! let scaler = Scaler::build(ScalerConfig { factor: 2.0 }, RawArgs::default()).unwrap();
//! assert_eq!(scaler.base().init_args().keys().collect::<Vec<_>>(), vec!["factor"]);
//! ```

pub mod args;
pub mod error;
pub mod handles;
pub mod persist;
pub mod properties;

mod base;
mod cache;
mod registry;
mod scope;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod tests;

pub use crate::args::{InitArgs, RawArgs};
pub use crate::base::{trained_only, ComponentBase};
pub use crate::cache::DiskCache;
pub use crate::error::ComponentError;
pub use crate::handles::{HandleSettings, RuntimeHandles};
pub use crate::persist::{structured_document, BINARY_SCHEMA_VERSION};
pub use crate::properties::Properties;
pub use crate::registry::ComponentRegistry;
pub use crate::scope::{with_scope, Scope};

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

/// A pipeline stage with captured construction arguments and persistence.
pub trait Component: Sized {
    /// Stable type name; written into every persisted file.
    const KIND: &'static str;
    /// Bump when [`Self::State`] changes shape. Binary files with another
    /// version are refused.
    const VERSION: u16 = 1;
    /// Keep raw positional/keyword arguments alongside the typed config.
    const STORE_RAW_ARGS: bool = false;

    /// Typed constructor parameters. Must serialize to a mapping.
    type Config: Serialize + DeserializeOwned;
    /// Everything a binary dump persists beyond the base. Must not contain
    /// anything that is rebuilt at runtime.
    type State: Serialize + DeserializeOwned;

    /// Constructor. Implementations call [`ComponentBase::new`] first.
    fn build(config: Self::Config, raw: RawArgs) -> Result<Self, ComponentError>;

    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Project the persisted state out of the live component.
    fn snapshot(&self) -> Self::State;

    /// Inverse of [`Self::snapshot`]; `base` arrives with fresh handles.
    fn restore(base: ComponentBase, state: Self::State) -> Result<Self, ComponentError>;

    /// Release held resources. Called when a [`Scope`] ends.
    fn close(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.base().is_trained()
    }

    fn require_trained(&self, operation: &str) -> Result<(), ComponentError> {
        self.base().require_trained(operation)
    }

    fn scope(&mut self) -> Scope<'_, Self> {
        Scope::new(self)
    }

    fn dump_binary<P: AsRef<Path>>(&self, path: P) -> Result<(), ComponentError> {
        persist::dump_binary(self, path.as_ref())
    }

    fn load_binary<P: AsRef<Path>>(path: P) -> Result<Self, ComponentError> {
        Self::load_binary_with(path, &HandleSettings::from_env())
    }

    fn load_binary_with<P: AsRef<Path>>(
        path: P,
        settings: &HandleSettings,
    ) -> Result<Self, ComponentError> {
        persist::load_binary(path.as_ref(), settings)
    }

    fn dump_structured<P: AsRef<Path>>(&self, path: P) -> Result<(), ComponentError> {
        persist::dump_structured(self, path.as_ref())
    }

    fn load_structured<P: AsRef<Path>>(path: P) -> Result<Self, ComponentError> {
        Self::load_structured_with(path, &HandleSettings::from_env())
    }

    fn load_structured_with<P: AsRef<Path>>(
        path: P,
        settings: &HandleSettings,
    ) -> Result<Self, ComponentError> {
        persist::load_structured(path.as_ref(), settings)
    }
}

/// A component with a training step.
pub trait Trainable: Component {
    type Data: ?Sized;

    /// The component-specific training work. Call [`Trainable::train`]
    /// instead; it maintains the trained flag.
    fn fit(&mut self, data: &Self::Data) -> Result<(), ComponentError>;

    /// Run [`Trainable::fit`] and mark the component trained.
    ///
    /// Re-training is allowed; it emits a `retrain_override` warning first.
    /// A failing `fit` leaves the trained flag as it was.
    fn train(&mut self, data: &Self::Data) -> Result<(), ComponentError> {
        let span = self.base().span().clone();
        let _enter = span.enter();
        if self.is_trained() {
            warn!(
                kind = Self::KIND,
                "retrain_override: already trained, training again overrides the previous training"
            );
        }
        let start = Instant::now();
        self.fit(data)?;
        self.base_mut().properties_mut().is_trained = true;
        info!(
            kind = Self::KIND,
            elapsed_micros = start.elapsed().as_micros(),
            "train_success"
        );
        Ok(())
    }
}

/// Object-safe view of any [`Component`], as returned by [`ComponentRegistry`].
pub trait DynComponent: Any {
    fn kind(&self) -> &'static str;
    fn lifecycle(&self) -> &ComponentBase;
    fn erased_dump_binary(&self, path: &Path) -> Result<(), ComponentError>;
    fn erased_dump_structured(&self, path: &Path) -> Result<(), ComponentError>;
    fn erased_close(&mut self) -> Result<(), ComponentError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Component + 'static> DynComponent for T {
    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn lifecycle(&self) -> &ComponentBase {
        self.base()
    }

    fn erased_dump_binary(&self, path: &Path) -> Result<(), ComponentError> {
        persist::dump_binary(self, path)
    }

    fn erased_dump_structured(&self, path: &Path) -> Result<(), ComponentError> {
        persist::dump_structured(self, path)
    }

    fn erased_close(&mut self) -> Result<(), ComponentError> {
        self.close()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn DynComponent {
    pub fn downcast_ref<T: Component + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn downcast<T: Component + 'static>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl fmt::Debug for dyn DynComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynComponent")
            .field("kind", &self.kind())
            .field("is_trained", &self.lifecycle().is_trained())
            .finish()
    }
}
