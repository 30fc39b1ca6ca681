//! Route registration and lookup.

use std::collections::HashMap;
use std::future::Future;

use tiller_pattern::PathPattern;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::controller::{box_controller, Controller, ControllerResult};
use crate::error::{Result, RouterError};
use crate::record::NavigationContext;

/// A route registration: a path template plus an optional controller.
///
/// A route without a controller is an identity route: resolving it passes
/// the navigation context straight through to the `route` event.
#[derive(Clone)]
pub struct RouteDefinition {
    /// The path template.
    pub path: String,
    /// The controller to run on match.
    pub controller: Option<Controller>,
}

impl RouteDefinition {
    /// Creates a controller-less (identity) route.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            controller: None,
        }
    }

    /// Attaches an async controller.
    #[must_use]
    pub fn controller<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(NavigationContext, CancelToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ControllerResult> + Send + 'static,
    {
        self.controller = Some(box_controller(f));
        self
    }
}

impl std::fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("path", &self.path)
            .field("controller", &self.controller.is_some())
            .finish()
    }
}

/// A registered route with its compiled pattern.
#[derive(Clone)]
pub struct CompiledRoute {
    /// The path template this route was registered under.
    pub path: String,
    /// The compiled matcher.
    pub pattern: PathPattern,
    /// The controller to run on match.
    pub controller: Option<Controller>,
}

impl std::fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("path", &self.path)
            .field("pattern", &self.pattern)
            .field("controller", &self.controller.is_some())
            .finish()
    }
}

/// The result of a successful table lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route.
    pub route: CompiledRoute,
    /// Parameter values extracted from the runtime path, keyed by the
    /// template's parameter names. Required parameters are always present;
    /// unmatched optional parameters are absent.
    pub params: HashMap<String, String>,
}

/// An ordered, mutable collection of compiled routes.
///
/// Insertion order is the matching tie-break: the first structurally
/// matching entry wins, so callers should register exact literal paths
/// before parameterized or wildcard ones. The table itself never reorders.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and stores a route.
    ///
    /// Re-adding a template that is already registered replaces the prior
    /// entry in place, preserving its matching position; new templates
    /// append.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] when the template does not
    /// compile.
    pub fn add(&mut self, defn: RouteDefinition) -> Result<()> {
        let pattern =
            PathPattern::compile(&defn.path).map_err(|source| RouterError::InvalidPattern {
                template: defn.path.clone(),
                source,
            })?;
        let compiled = CompiledRoute {
            path: defn.path,
            pattern,
            controller: defn.controller,
        };

        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == compiled.path) {
            debug!(path = %compiled.path, "replacing route");
            *existing = compiled;
        } else {
            debug!(path = %compiled.path, "adding route");
            self.entries.push(compiled);
        }
        Ok(())
    }

    /// Adds each definition in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first invalid template.
    pub fn add_all(&mut self, defns: Vec<RouteDefinition>) -> Result<()> {
        for defn in defns {
            self.add(defn)?;
        }
        Ok(())
    }

    /// Returns the first entry whose matcher accepts `runtime_path`, with
    /// its extracted parameters. Read-only.
    #[must_use]
    pub fn find_match(&self, runtime_path: &str) -> Option<RouteMatch> {
        for entry in &self.entries {
            if let Some(captures) = entry.pattern.exec(runtime_path) {
                let params = entry
                    .pattern
                    .param_names()
                    .iter()
                    .zip(captures)
                    .filter_map(|(name, value)| value.map(|v| (name.clone(), v)))
                    .collect();
                return Some(RouteMatch {
                    route: entry.clone(),
                    params,
                });
            }
        }
        None
    }

    /// Returns whether any entry matches the path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.pattern.test(path))
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let mut table = RouteTable::new();
        table.add(RouteDefinition::new("/users/me")).unwrap();
        table.add(RouteDefinition::new("/users/:id")).unwrap();

        let m = table.find_match("/users/me").unwrap();
        assert_eq!(m.route.path, "/users/me");
        assert!(m.params.is_empty());

        let m = table.find_match("/users/42").unwrap();
        assert_eq!(m.route.path, "/users/:id");
        assert_eq!(m.params["id"], "42");
    }

    #[test]
    fn test_replacement_preserves_position() {
        let mut table = RouteTable::new();
        table.add(RouteDefinition::new("/a/:x")).unwrap();
        table.add(RouteDefinition::new("/:anything")).unwrap();
        assert_eq!(table.len(), 2);

        // Re-adding "/a/:x" must keep it ahead of the catch-all.
        table
            .add(RouteDefinition::new("/a/:x").controller(|ctx, _| async move {
                Ok(crate::controller::ControllerOutcome::new()
                    .with("replaced", serde_json::json!(true))
                    .with("x", serde_json::json!(ctx.param("x"))))
            }))
            .unwrap();
        assert_eq!(table.len(), 2);

        let m = table.find_match("/a/1").unwrap();
        assert_eq!(m.route.path, "/a/:x");
        assert!(m.route.controller.is_some());
    }

    #[test]
    fn test_params_in_declaration_order() {
        let mut table = RouteTable::new();
        table
            .add(RouteDefinition::new("/params-test/:name/:value"))
            .unwrap();
        let m = table.find_match("/params-test/bar/baz").unwrap();
        assert_eq!(m.params["name"], "bar");
        assert_eq!(m.params["value"], "baz");
        assert_eq!(m.params.len(), 2);
    }

    #[test]
    fn test_optional_param_key_absent_when_unmatched() {
        let mut table = RouteTable::new();
        table.add(RouteDefinition::new("/users/:id?")).unwrap();

        let m = table.find_match("/users").unwrap();
        assert!(!m.params.contains_key("id"));
        let m = table.find_match("/users/7").unwrap();
        assert_eq!(m.params["id"], "7");
    }

    #[test]
    fn test_no_match() {
        let mut table = RouteTable::new();
        table.add(RouteDefinition::new("/hello")).unwrap();
        assert!(table.find_match("/foo/bar").is_none());
        assert!(!table.matches("/foo/bar"));
        assert!(table.matches("/hello/"));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let mut table = RouteTable::new();
        let err = table.add(RouteDefinition::new("/bad/:")).unwrap_err();
        assert!(matches!(err, RouterError::InvalidPattern { .. }));
        assert!(table.is_empty());
    }
}
