// vireo-core/src/lifecycle.rs
use std::fmt;
use std::rc::Rc;

use crate::value::Object;

type Hook = Rc<dyn Fn(&Object)>;

/// Per-controller lifecycle hooks. Both default to no-ops.
#[derive(Clone, Default)]
pub struct Hooks {
    mounted: Option<Hook>,
    changed: Option<Hook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook to run once, after the first full render.
    pub fn on_mounted(mut self, f: impl Fn(&Object) + 'static) -> Self {
        self.mounted = Some(Rc::new(f));
        self
    }

    /// Register a hook to run after every render pass.
    pub fn on_changed(mut self, f: impl Fn(&Object) + 'static) -> Self {
        self.changed = Some(Rc::new(f));
        self
    }

    pub fn run_mounted(&self, state: &Object) {
        if let Some(hook) = &self.mounted {
            hook(state);
        }
    }

    pub fn run_changed(&self, state: &Object) {
        if let Some(hook) = &self.changed {
            hook(state);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("mounted", &self.mounted.is_some())
            .field("changed", &self.changed.is_some())
            .finish()
    }
}
