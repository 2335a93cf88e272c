//! Explicit carrier threading a registry through an application

use crate::registry::Registry;

/// Carrier handing a [`Registry`] to the code paths that need one.
///
/// A context starts empty; [`with_registry`](Context::with_registry) derives
/// a context carrying a registry and [`registry`](Context::registry) hands
/// it back. Contexts are plain values, cheap to clone and pass around;
/// derived contexts share the bound registry.
#[derive(Clone, Default)]
pub struct Context {
    registry: Option<Registry>,
}

impl Context {
    /// Empty context with no registry bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived context carrying `registry`
    pub fn with_registry(&self, registry: Registry) -> Context {
        Context {
            registry: Some(registry),
        }
    }

    /// Whether a registry has been bound
    pub fn has_registry(&self) -> bool {
        self.registry.is_some()
    }

    /// The bound registry.
    ///
    /// # Panics
    ///
    /// Panics if no registry was bound with
    /// [`with_registry`](Context::with_registry); asking for a registry
    /// that was never attached is a programming error, not a recoverable
    /// condition.
    pub fn registry(&self) -> &Registry {
        self.registry
            .as_ref()
            .expect("no registry bound to this context")
    }
}
