use serde::{Deserialize, Serialize};

/// Static framework configuration: attribute namespaces, the reserved event
/// key, the global allow-list and the re-render bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of directive attributes (`data-x.if`, `data-x.for`, inputs).
    pub directive_prefix: String,
    /// Prefix of event-binding attributes (`data-x:click`).
    pub event_prefix: String,
    /// Marker attribute naming a component's controller.
    pub component_attr: String,
    /// Context key the firing event is injected under.
    pub event_key: String,
    /// Names expressions may resolve from the globals store.
    pub allowed_globals: Vec<String>,
    /// Upper bound on back-to-back passes caused by writes during a render.
    pub max_render_passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directive_prefix: "data-x.".to_string(),
            event_prefix: "data-x:".to_string(),
            component_attr: "data-x-component".to_string(),
            event_key: "$event".to_string(),
            allowed_globals: Vec::new(),
            max_render_passes: 16,
        }
    }
}

impl Config {
    /// `data-x.if` -> `Some("if")`.
    pub fn directive_name<'a>(&self, attr: &'a str) -> Option<&'a str> {
        attr.strip_prefix(self.directive_prefix.as_str())
            .filter(|rest| !rest.is_empty())
    }

    /// `data-x:click` -> `Some("click")`.
    pub fn event_name<'a>(&self, attr: &'a str) -> Option<&'a str> {
        attr.strip_prefix(self.event_prefix.as_str())
            .filter(|rest| !rest.is_empty())
    }

    pub fn is_directive(&self, attr: &str) -> bool {
        self.directive_name(attr).is_some()
    }

    pub fn is_event(&self, attr: &str) -> bool {
        self.event_name(attr).is_some()
    }

    pub fn is_global_allowed(&self, name: &str) -> bool {
        self.allowed_globals.iter().any(|g| g == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_split_names() {
        let c = Config::default();
        assert_eq!(c.directive_name("data-x.for"), Some("for"));
        assert_eq!(c.event_name("data-x:click"), Some("click"));
        assert_eq!(c.directive_name("data-x."), None);
        assert!(!c.is_directive("data-x-component"));
        assert!(!c.is_event("class"));
    }
}
