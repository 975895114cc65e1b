//! Error types for routing.

use thiserror::Error;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No route matched the request.
    #[error("no route matched: {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// A named route was registered twice.
    #[error("route name already registered: {0}")]
    DuplicateRouteName(String),

    /// Reverse routing lacks a required parameter.
    #[error("missing parameter '{param}' for route '{route}'")]
    MissingRouteParameter { route: String, param: String },

    /// Invalid path pattern.
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Unknown HTTP method in a route declaration.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Route name not found.
    #[error("route not found: {0}")]
    UnknownRoute(String),

    /// The access predicate rejected a named route.
    #[error("access denied to route: {0}")]
    AccessDenied(String),
}

impl RouterError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
