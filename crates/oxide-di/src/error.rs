//! Error types for binding resolution and method invocation.

use thiserror::Error;

/// Container-specific errors.
#[derive(Debug, Error)]
pub enum DiError {
    /// No binding is registered under this name.
    #[error("unknown binding: {0}")]
    UnknownBinding(String),

    /// A binding's argument chain leads back to itself.
    #[error("circular binding: {chain}")]
    CircularBinding {
        /// The resolution chain, e.g. `a -> b -> a`.
        chain: String,
    },

    /// No constructor is registered for this descriptor.
    #[error("unknown class descriptor: {0}")]
    UnknownDescriptor(String),

    /// Malformed arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A method call lacks a required named parameter.
    #[error("missing required parameter '{param}' for {method}")]
    MissingRequiredParameter {
        /// `Type::method` being invoked.
        method: String,
        /// The missing parameter.
        param: String,
    },

    /// The target type has no method with this name.
    #[error("unknown method '{method}' on {type_name}")]
    UnknownMethod {
        /// Concrete type of the target.
        type_name: String,
        /// Requested method name.
        method: String,
    },

    /// A binding resolved to something other than the requested type.
    #[error("binding '{name}' is not a {expected}")]
    TypeMismatch {
        /// Binding name.
        name: String,
        /// Requested type.
        expected: &'static str,
    },

    /// A constructor or method reported a failure.
    #[error("{0}")]
    Failed(String),
}

impl DiError {
    /// Creates a [`DiError::Failed`] from any message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, DiError>;
