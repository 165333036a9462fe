use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use vireo_core::{Hooks, Object};

use crate::capabilities::Capabilities;
use crate::error::ConstructError;

/// What a factory hands back: the state to observe, its markup and hooks.
#[derive(Debug, Clone)]
pub struct Controller {
    pub state: Object,
    pub template: String,
    pub hooks: Hooks,
}

impl Controller {
    pub fn new(state: Object, template: impl Into<String>) -> Self {
        Self {
            state,
            template: template.into(),
            hooks: Hooks::new(),
        }
    }

    pub fn on_mounted(mut self, f: impl Fn(&Object) + 'static) -> Self {
        self.hooks = self.hooks.on_mounted(f);
        self
    }

    pub fn on_changed(mut self, f: impl Fn(&Object) + 'static) -> Self {
        self.hooks = self.hooks.on_changed(f);
        self
    }
}

pub type Factory = Rc<dyn Fn(&Capabilities) -> Result<Controller, ConstructError>>;

/// Controller name -> factory, filled in at startup.
#[derive(Clone, Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Capabilities) -> Result<Controller, ConstructError> + 'static,
    {
        self.factories.insert(name.into(), Rc::new(factory));
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Capabilities) -> Result<Controller, ConstructError> + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn get(&self, name: &str) -> Option<Factory> {
        self.factories.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("names", &names).finish()
    }
}

/// `todo-item` -> `TodoItem`.
pub fn to_pascal_case(tag: &str) -> String {
    tag.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// The marker attribute's value wins over the tag-derived name.
pub fn controller_name(tag: &str, marker: Option<&str>) -> String {
    match marker.map(str::trim).filter(|m| !m.is_empty()) {
        Some(name) => name.to_string(),
        None => to_pascal_case(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_tags_become_pascal_names() {
        assert_eq!(to_pascal_case("todo-item"), "TodoItem");
        assert_eq!(to_pascal_case("x-app-shell"), "XAppShell");
        assert_eq!(to_pascal_case("div"), "Div");
    }

    #[test]
    fn marker_overrides_tag() {
        assert_eq!(controller_name("div", Some("App")), "App");
        assert_eq!(controller_name("todo-list", Some(" ")), "TodoList");
        assert_eq!(controller_name("todo-list", None), "TodoList");
    }
}
