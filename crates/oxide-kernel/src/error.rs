//! Error types for the kernel.

use oxide_di::DiError;
use oxide_router::RouterError;

use crate::lifecycle::Stage;

/// Errors that can occur while booting apps or dispatching requests.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// Routing failed.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Binding resolution or method invocation failed.
    #[error(transparent)]
    Di(#[from] DiError),

    /// A bootstrap stage failed; the stage stays pending.
    #[error("bootstrap of '{app}' failed at {stage}: {source}")]
    Bootstrap {
        /// Application name.
        app: String,
        /// The failing stage.
        stage: Stage,
        /// The collaborator's error.
        source: Box<KernelError>,
    },

    /// The matched route does not name a required role.
    #[error("route target has no '{0}' role")]
    IncompleteTarget(&'static str),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error (reading configuration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A bootstrap collaborator reported a failure.
    #[error("{0}")]
    Collaborator(String),
}

impl KernelError {
    /// Creates a [`KernelError::Collaborator`] from any message.
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator(message.into())
    }
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
