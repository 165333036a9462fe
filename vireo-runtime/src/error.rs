use thiserror::Error;
use vireo_dom::{DomError, NodeId};
use vireo_template::{MarkupError, ResolveError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("template `{url}` not found")]
    NotFound { url: String },

    #[error("template `{url}` is outside the loader root")]
    Forbidden { url: String },

    #[error("reading template `{url}` failed: {message}")]
    Io { url: String, message: String },
}

/// Raised by a controller factory.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstructError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ConstructError {
    pub fn failed(message: impl Into<String>) -> Self {
        ConstructError::Failed(message.into())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("no controller registered as `{name}`")]
    Unregistered { name: String },

    #[error("controller `{name}` could not be constructed: {source}")]
    Construction {
        name: String,
        source: ConstructError,
    },

    #[error("template of `{name}` is malformed: {source}")]
    Markup { name: String, source: MarkupError },

    #[error("node {0:?} is not a resolved component host")]
    NotAComponent(NodeId),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Dom(#[from] DomError),
}
