//! Route controllers and their results.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::record::NavigationContext;

/// A boxed future for async controller invocations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed async route controller.
///
/// Controllers receive the pending navigation context plus a cooperative
/// [`CancelToken`]; the token is advisory and may be ignored, in which case a
/// superseded controller keeps running but its result is discarded by the
/// resolver.
pub type Controller = Arc<
    dyn Fn(NavigationContext, CancelToken) -> BoxFuture<'static, ControllerResult> + Send + Sync,
>;

/// What a controller resolves to.
pub type ControllerResult = std::result::Result<ControllerOutcome, ControllerError>;

/// A controller failure.
///
/// Surfaces as a `route-error` event; it never escapes the resolver.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ControllerError {
    message: String,
}

impl ControllerError {
    /// Creates a controller error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ControllerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ControllerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// The value a controller completes with.
///
/// A plain outcome completes the navigation; setting `forward` instead asks
/// the resolver to chain into another registered path. `data` fields are
/// merged over the navigation context and published with the `route` event,
/// so unrelated extra fields are fine and simply travel along.
#[derive(Debug, Clone, Default)]
pub struct ControllerOutcome {
    /// Internal redirect target, if this hop forwards.
    pub forward: Option<String>,
    /// Payload fields merged into the published context.
    pub data: Map<String, Value>,
}

impl ControllerOutcome {
    /// Creates an empty completing outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an outcome that forwards to another registered path.
    #[must_use]
    pub fn forward(path: impl Into<String>) -> Self {
        Self {
            forward: Some(path.into()),
            data: Map::new(),
        }
    }

    /// Adds a payload field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Boxes a controller closure into the [`Controller`] shape.
pub(crate) fn box_controller<F, Fut>(f: F) -> Controller
where
    F: Fn(NavigationContext, CancelToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ControllerResult> + Send + 'static,
{
    Arc::new(move |ctx, token| Box::pin(f(ctx, token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_builder() {
        let outcome = ControllerOutcome::new()
            .with("message", serde_json::json!("hello"))
            .with("count", serde_json::json!(3));
        assert!(outcome.forward.is_none());
        assert_eq!(outcome.data.len(), 2);
        assert_eq!(outcome.data["message"], serde_json::json!("hello"));
    }

    #[test]
    fn test_forward_outcome() {
        let outcome = ControllerOutcome::forward("/hi/World");
        assert_eq!(outcome.forward.as_deref(), Some("/hi/World"));
        assert!(outcome.data.is_empty());
    }

    #[test]
    fn test_controller_error_message() {
        let err = ControllerError::from("boom");
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom");
    }
}
