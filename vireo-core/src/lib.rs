//! Dynamic value model and change observation for vireo components.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod methods;
pub mod observe;
pub mod value;

pub use config::Config;
pub use error::ValueError;
pub use lifecycle::Hooks;
pub use observe::{ContainerKind, Notifier, observe};
pub use value::{Function, List, Map, NativeFn, Object, Set, Value};
