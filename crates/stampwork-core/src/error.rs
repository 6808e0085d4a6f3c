//! # Error Types
//!
//! `StampError` covers composition, construction and dispatch failures.
//! `MethodError` is what a method body or initializer reports; the factory
//! and the instance wrap it with the name of the capability or method that
//! raised it.

use thiserror::Error;

/// Errors raised by the capability composer and instance factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampError {
    /// A capability descriptor has a malformed entry.
    #[error("invalid capability `{capability}`: {reason}")]
    InvalidCapability { capability: String, reason: String },

    /// An initializer failed; no instance was produced.
    #[error("initializer #{index} of `{capability}` failed: {source}")]
    Initialization {
        capability: String,
        index: usize,
        #[source]
        source: MethodError,
    },

    /// The instance does not respond to the requested method.
    #[error("instance does not respond to `{0}`")]
    UnknownMethod(String),

    /// A method body failed.
    #[error("method `{method}` failed: {source}")]
    Method {
        method: String,
        #[source]
        source: MethodError,
    },

    /// A fluent call returned a plain value instead of the instance.
    #[error("method `{0}` does not return the instance and cannot be chained")]
    NotChainable(String),

    /// A dispatch table has no handler for the action.
    #[error("no handler registered for action `{0}`")]
    UnknownAction(String),

    /// A capability name could not be resolved.
    #[error("unknown capability `{0}`")]
    UnknownCapability(String),
}

impl StampError {
    /// Shorthand for [`StampError::InvalidCapability`].
    pub fn invalid(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCapability {
            capability: capability.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised from inside method bodies and initializers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    /// A positional argument is missing or has the wrong kind.
    #[error("argument {index}: expected {expected}")]
    BadArgument { index: usize, expected: &'static str },

    /// A state field the method depends on is absent or has the wrong kind.
    #[error("state field `{0}` is missing or malformed")]
    MissingField(String),

    /// Interface method with no provider.
    #[error("`{0}` is not implemented")]
    NotImplemented(String),

    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, StampError>;
