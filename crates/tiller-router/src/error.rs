//! Error types for navigation.

use thiserror::Error;
use tiller_pattern::PatternError;

/// Navigation errors.
///
/// Every variant is `Clone` because errors travel inside `route-error`
/// events rather than through return values; the facade's navigation calls
/// are fire-and-forget and failures are observable only on the event bus.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// No registered route matched the resolved path.
    #[error("no route matched: {path}")]
    NotFound { path: String },

    /// The matched controller failed.
    #[error("controller failed for {path}: {message}")]
    Controller { path: String, message: String },

    /// The navigation was superseded by a newer one.
    #[error("navigation to {path} aborted: {reason}")]
    Aborted { path: String, reason: String },

    /// A forward chain exceeded the configured hop limit.
    #[error("forward limit of {limit} hops exceeded at {path}")]
    ForwardLimit { path: String, limit: usize },

    /// A route was registered with an invalid path template.
    #[error("invalid route template {template}")]
    InvalidPattern {
        template: String,
        #[source]
        source: PatternError,
    },
}

impl RouterError {
    /// Returns whether this error reports a superseded navigation.
    ///
    /// Lets `route-error` subscribers filter aborts from real failures.
    #[must_use]
    pub const fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
