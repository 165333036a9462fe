use thiserror::Error;
use vireo_core::ValueError;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("cannot parse `{expression}`: {message}")]
pub struct ParseError {
    pub expression: String,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("`{0}` is not defined")]
    Unresolved(String),

    #[error("cannot access `{property}` of {target}")]
    NullishAccess {
        property: String,
        target: &'static str,
    },

    #[error("`{0}` is not a function")]
    NotCallable(String),

    #[error("invalid assignment target")]
    InvalidTarget,

    #[error("cannot iterate over a {0}")]
    NotIterable(&'static str),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Fatal errors of a render pass.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("malformed repetition `{expression}`: expected `<name> in <iterable>`")]
    DirectiveSyntax { expression: String },

    #[error(transparent)]
    Expression(#[from] ParseError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarkupError {
    #[error("unexpected closing tag `</{tag}>` at byte {offset}")]
    UnexpectedClose { tag: String, offset: usize },

    #[error("element `<{tag}>` is never closed")]
    Unclosed { tag: String },

    #[error("unterminated {what} starting at byte {offset}")]
    Unterminated { what: &'static str, offset: usize },
}
