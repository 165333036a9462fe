//! Component runtime: discovers hosts in a live document, builds their
//! controllers and keeps the document in step with controller state.

pub mod capabilities;
pub mod error;
pub mod page;
pub mod registry;
pub mod runtime;

pub use capabilities::{
    Capabilities, ChangeDetector, ElementRef, EventEmitter, FsLoader, MapLoader, TemplateLoader,
};
pub use error::{ConstructError, LoadError, RuntimeError};
pub use page::parse_page;
pub use registry::{Controller, Factory, Registry, controller_name, to_pascal_case};
pub use runtime::{Instance, Runtime};
