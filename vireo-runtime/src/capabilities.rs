//! Handles injected into every controller factory.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Component, PathBuf};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use vireo_core::Value;
use vireo_dom::{Document, NodeId};

use crate::error::{LoadError, RuntimeError};
use crate::runtime::{Runtime, RuntimeInner};

/// Read-only view of a component's host element.
#[derive(Clone)]
pub struct ElementRef {
    node: NodeId,
    doc: Weak<RefCell<Document>>,
}

impl ElementRef {
    pub(crate) fn new(node: NodeId, doc: &Rc<RefCell<Document>>) -> Self {
        Self {
            node,
            doc: Rc::downgrade(doc),
        }
    }

    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn tag(&self) -> Option<String> {
        let doc = self.doc.upgrade()?;
        let doc = doc.borrow();
        doc.tag(self.node).map(str::to_string)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        let doc = self.doc.upgrade()?;
        let doc = doc.borrow();
        doc.attribute(self.node, name).map(str::to_string)
    }

    pub fn text_content(&self) -> String {
        match self.doc.upgrade() {
            Some(doc) => doc.borrow().text_content(self.node),
            None => String::new(),
        }
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.node).finish()
    }
}

pub trait TemplateLoader {
    fn load(&self, url: &str) -> Result<String, LoadError>;
}

/// In-memory templates keyed by url.
#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    templates: HashMap<String, String>,
}

impl MapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.templates.insert(url.into(), markup.into());
        self
    }
}

impl TemplateLoader for MapLoader {
    fn load(&self, url: &str) -> Result<String, LoadError> {
        self.templates
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                url: url.to_string(),
            })
    }
}

/// Reads templates from files below a root directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateLoader for FsLoader {
    fn load(&self, url: &str) -> Result<String, LoadError> {
        let relative = PathBuf::from(url.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(LoadError::Forbidden {
                url: url.to_string(),
            });
        }
        let path = self.root.join(relative);
        debug!(path = %path.display(), "loading template");
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                url: url.to_string(),
            },
            _ => LoadError::Io {
                url: url.to_string(),
                message: e.to_string(),
            },
        })
    }
}

/// Manual re-render trigger for state the observer cannot see.
#[derive(Clone)]
pub struct ChangeDetector {
    runtime: Weak<RuntimeInner>,
    host: NodeId,
}

impl ChangeDetector {
    pub(crate) fn new(runtime: Weak<RuntimeInner>, host: NodeId) -> Self {
        Self { runtime, host }
    }

    /// Re-render the component now. A no-op before the component resolves
    /// or after its host is gone.
    pub fn component_should_change(&self) -> Result<(), RuntimeError> {
        warn!(
            host = ?self.host,
            "manual change detection requested; prefer writing observed state"
        );
        let Some(inner) = self.runtime.upgrade() else {
            return Ok(());
        };
        let runtime = Runtime::from_inner(inner);
        match runtime.instance(self.host) {
            Some(inst) => runtime.render(&inst),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetector").field("host", &self.host).finish()
    }
}

/// Raises custom events from the component's host element. The parent's
/// `<events-prefix><event>` binding on that host handles them, with the
/// payload under `<event key>.detail`.
#[derive(Clone)]
pub struct EventEmitter {
    runtime: Weak<RuntimeInner>,
    host: NodeId,
}

impl EventEmitter {
    pub(crate) fn new(runtime: Weak<RuntimeInner>, host: NodeId) -> Self {
        Self { runtime, host }
    }

    /// Returns how many parent listeners ran; 0 once the runtime is gone.
    pub fn dispatch(&self, event: &str, detail: impl Into<Value>) -> Result<usize, RuntimeError> {
        let Some(inner) = self.runtime.upgrade() else {
            return Ok(0);
        };
        Runtime::from_inner(inner).dispatch(self.host, event, detail.into())
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter").field("host", &self.host).finish()
    }
}

#[derive(Clone)]
pub struct Capabilities {
    pub element: ElementRef,
    pub loader: Rc<dyn TemplateLoader>,
    pub detector: ChangeDetector,
    pub events: EventEmitter,
}

impl Capabilities {
    /// Fetch a template through the runtime's loader.
    pub fn load_template(&self, url: &str) -> Result<String, LoadError> {
        self.loader.load(url)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("element", &self.element)
            .field("detector", &self.detector)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_loader_reports_missing_urls() {
        let loader = MapLoader::new().with("a.html", "<p>a</p>");
        assert_eq!(loader.load("a.html").unwrap(), "<p>a</p>");
        assert_eq!(
            loader.load("b.html"),
            Err(LoadError::NotFound {
                url: "b.html".into()
            })
        );
    }

    #[test]
    fn fs_loader_stays_below_its_root() {
        let loader = FsLoader::new(std::env::temp_dir());
        assert!(matches!(
            loader.load("../etc/passwd"),
            Err(LoadError::Forbidden { .. })
        ));
        assert!(matches!(
            loader.load("definitely-missing-vireo-template.html"),
            Err(LoadError::NotFound { .. })
        ));
    }
}
