use thiserror::Error;

/// Errors raised by native methods and container operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("`{method}` expects {expected}")]
    BadArgument {
        method: String,
        expected: &'static str,
    },

    #[error("`{method}` is not a method of {receiver}")]
    UnknownMethod {
        method: String,
        receiver: &'static str,
    },

    #[error("index {index} is past the end of a list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0}")]
    Custom(String),
}

impl ValueError {
    pub fn custom(message: impl Into<String>) -> Self {
        ValueError::Custom(message.into())
    }
}
