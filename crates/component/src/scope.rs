use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::{Component, ComponentError};

/// Scoped use of a component. Dereferences to the component and calls
/// [`Component::close`] exactly once when the scope ends, whether it ends
/// normally, through an early `?` return, or by unwinding.
///
/// A close error during drop can only be logged; call [`Scope::finish`] to
/// observe it.
#[must_use = "the component is closed as soon as the scope is dropped"]
pub struct Scope<'a, C: Component> {
    component: &'a mut C,
    closed: bool,
}

impl<'a, C: Component> Scope<'a, C> {
    pub fn new(component: &'a mut C) -> Self {
        Self {
            component,
            closed: false,
        }
    }

    /// Close now and report the result.
    pub fn finish(mut self) -> Result<(), ComponentError> {
        self.closed = true;
        self.component.close()
    }
}

impl<C: Component> Deref for Scope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.component
    }
}

impl<C: Component> DerefMut for Scope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.component
    }
}

impl<C: Component> Drop for Scope<'_, C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.component.close() {
            let _enter = self.component.base().span().enter();
            warn!(kind = C::KIND, error = %err, "close_failure");
        }
    }
}

/// Run `op` inside a scope. `op`'s error takes precedence over a close error.
pub fn with_scope<C, T, F>(component: &mut C, op: F) -> Result<T, ComponentError>
where
    C: Component,
    F: FnOnce(&mut C) -> Result<T, ComponentError>,
{
    let mut scope = Scope::new(component);
    let result = op(&mut *scope);
    let closed = scope.finish();
    let value = result?;
    closed?;
    Ok(value)
}
