//! The router facade.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::events::{EventKind, RouterEvent, Subscription};
use crate::history::{MemoryHistory, NavigationHistory};
use crate::record::{InboundContext, RouteRecord};
use crate::resolver::Resolver;
use crate::table::{CompiledRoute, RouteDefinition};

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// The path [`Router::route_default`] navigates to. Default `"/"`.
    pub default_route: String,
    /// The path resolved when the history reports an empty path.
    /// Default `"/~error"`.
    pub error_route: String,
    /// Forward chains longer than this terminate with a `route-error`
    /// instead of looping. Default `32`.
    pub max_forward_hops: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_route: "/".to_string(),
            error_route: "/~error".to_string(),
            max_forward_hops: 32,
        }
    }
}

/// Options for [`Router::route_with`].
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
    /// State attached to the completed navigation's record.
    pub state: Option<Value>,
}

/// A client-side router: route table, event bus, resolver and navigation
/// history composed behind one facade.
///
/// Navigation calls are fire-and-forget: they push onto the history, whose
/// notification spawns the resolve task, and every outcome - completion,
/// not-found, controller failure, supersession - surfaces as an event.
/// `route`/`back`/`start` therefore need a tokio runtime in scope.
pub struct Router {
    resolver: Arc<Resolver>,
    started: AtomicBool,
}

impl Router {
    /// Creates a router backed by an in-memory history.
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self::with_history(config, Arc::new(MemoryHistory::new()))
    }

    /// Creates a router backed by the given history.
    #[must_use]
    pub fn with_history(config: RouterConfig, history: Arc<dyn NavigationHistory>) -> Self {
        Self {
            resolver: Arc::new(Resolver::new(history, config)),
            started: AtomicBool::new(false),
        }
    }

    /// Registers a route.
    ///
    /// Re-adding a path template replaces the prior registration in place.
    /// Exact literal paths should be registered before parameterized ones;
    /// the first matching entry wins.
    ///
    /// # Errors
    ///
    /// Returns an error when the path template does not compile.
    pub fn add_route(&self, defn: RouteDefinition) -> Result<()> {
        self.resolver
            .table
            .lock()
            .expect("route table lock poisoned")
            .add(defn)
    }

    /// Registers routes in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first invalid template.
    pub fn add_routes(&self, defns: Vec<RouteDefinition>) -> Result<()> {
        self.resolver
            .table
            .lock()
            .expect("route table lock poisoned")
            .add_all(defns)
    }

    /// Subscribes a handler for `kind` events.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&RouterEvent) + Send + Sync + 'static,
    {
        self.resolver.bus.subscribe(kind, handler)
    }

    /// Subscribes a handler that self-removes after its first invocation.
    pub fn once<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&RouterEvent) + Send + Sync + 'static,
    {
        self.resolver.bus.subscribe_once(kind, handler)
    }

    /// Returns whether any registered route matches the path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.resolver
            .table
            .lock()
            .expect("route table lock poisoned")
            .matches(path)
    }

    /// Returns the first registered route matching the path.
    #[must_use]
    pub fn match_route(&self, path: &str) -> Option<CompiledRoute> {
        self.resolver
            .table
            .lock()
            .expect("route table lock poisoned")
            .find_match(path)
            .map(|m| m.route)
    }

    /// Matches a path into a route record without resolving it: no events,
    /// no controller, no state change.
    #[must_use]
    pub fn get_route(&self, path: &str) -> Option<RouteRecord> {
        let matched = self
            .resolver
            .table
            .lock()
            .expect("route table lock poisoned")
            .find_match(path)?;
        Some(RouteRecord {
            path: matched.route.path,
            runtime_path: path.to_string(),
            params: matched.params,
            action: None,
            from: None,
            forwarded: false,
            state: Value::Null,
        })
    }

    /// Requests navigation to `path`. Fire-and-forget; subscribe to
    /// [`EventKind::Route`] / [`EventKind::RouteError`] for the outcome.
    pub fn route(&self, path: &str) {
        self.route_with(path, NavigateOptions::default());
    }

    /// Requests navigation with options.
    pub fn route_with(&self, path: &str, opts: NavigateOptions) {
        if let Some(state) = opts.state {
            self.resolver.set_pending_state(state);
        }
        if opts.replace {
            self.resolver.history.replace(path);
        } else {
            self.resolver.history.push(path);
        }
    }

    /// Navigates to the configured default route.
    pub fn route_default(&self) {
        let path = self.resolver.config.default_route.clone();
        self.route(&path);
    }

    /// Navigates backwards, optionally unwinding to a specific path.
    pub fn back(&self, to_path: Option<&str>) {
        self.resolver.history.pop(to_path);
    }

    /// Sets the current path silently: no listener, no resolution.
    pub fn set(&self, path: &str) {
        self.resolver.history.set(path, false);
    }

    /// Returns the active route record, reflecting a pending navigation
    /// optimistically while its controller runs.
    #[must_use]
    pub fn current_route(&self) -> Option<RouteRecord> {
        self.resolver.current_route()
    }

    /// Returns the number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.resolver.history.len()
    }

    /// Returns the navigation history.
    #[must_use]
    pub fn history(&self) -> Arc<dyn NavigationHistory> {
        Arc::clone(&self.resolver.history)
    }

    /// Attaches the history listener and begins resolving path changes.
    ///
    /// Calling `start` while started detaches the previous listener first.
    pub fn start(&self) {
        self.stop();
        debug!("starting router");
        let weak: Weak<Resolver> = Arc::downgrade(&self.resolver);
        let error_route = self.resolver.config.error_route.clone();
        self.resolver.history.listen(Arc::new(move |path, action| {
            let Some(resolver) = weak.upgrade() else {
                return;
            };
            let path = if path.is_empty() {
                error_route.clone()
            } else {
                path.to_string()
            };
            let intent = resolver.next_intent();
            let task = resolver.resolve(path, Some(action), InboundContext::default(), intent, 0);
            tokio::spawn(task);
        }));
        self.started.store(true, Ordering::SeqCst);
    }

    /// Detaches the history listener. Idempotent.
    pub fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            debug!("stopping router");
            self.resolver.history.unlisten();
        }
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.default_route, "/");
        assert_eq!(config.error_route, "/~error");
        assert_eq!(config.max_forward_hops, 32);
    }

    #[test]
    fn test_matches_and_match_route() {
        let router = Router::new(RouterConfig::default());
        router.add_route(RouteDefinition::new("/hello")).unwrap();
        router.add_route(RouteDefinition::new("/hi/:name")).unwrap();

        assert!(router.matches("/hello"));
        assert!(router.matches("/hello/"));
        assert!(!router.matches("/hello/w"));

        let route = router.match_route("/hi/World").unwrap();
        assert_eq!(route.path, "/hi/:name");
        assert!(router.match_route("/nope").is_none());
    }

    #[test]
    fn test_get_route_is_pure() {
        let router = Router::new(RouterConfig::default());
        router.add_route(RouteDefinition::new("/hi/:name")).unwrap();

        let record = router.get_route("/hi/World").unwrap();
        assert_eq!(record.path, "/hi/:name");
        assert_eq!(record.runtime_path, "/hi/World");
        assert_eq!(record.params["name"], "World");
        assert!(record.from.is_none());
        assert!(record.action.is_none());

        // No events, no current route.
        assert!(router.current_route().is_none());
    }

    #[test]
    fn test_invalid_template_is_rejected_at_registration() {
        let router = Router::new(RouterConfig::default());
        assert!(router.add_route(RouteDefinition::new("/bad/:")).is_err());
    }
}
