//! Per-navigation route records and contexts.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// How a path change entered the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryAction {
    /// A new entry was pushed onto the history stack.
    Push,
    /// The back/forward mechanism revisited an existing entry.
    Pop,
}

impl HistoryAction {
    /// Returns the action as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::Pop => "POP",
        }
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The record produced for one resolved navigation.
///
/// Created fresh per navigation. `from` links to the record the user actually
/// navigated from; it is a value copy, so later mutations of the old record
/// never show through, and it carries only one level of provenance (its own
/// `from` is stripped).
#[derive(Debug, Clone, Serialize)]
pub struct RouteRecord {
    /// The registered path template (e.g. `/hi/:name`).
    pub path: String,
    /// The actual matched path (e.g. `/hi/World`).
    pub runtime_path: String,
    /// Extracted parameter values, one entry per matched template parameter.
    pub params: HashMap<String, String>,
    /// The history action that triggered this navigation, if any.
    pub action: Option<HistoryAction>,
    /// The previously active record, provenance only.
    pub from: Option<Box<RouteRecord>>,
    /// Whether this record requested a forward to another route.
    pub forwarded: bool,
    /// Caller-supplied navigation state, attached on completion.
    pub state: Value,
}

impl RouteRecord {
    /// Returns a provenance copy of this record, suitable for the `from`
    /// field of a successor: same identity fields, no further chain.
    #[must_use]
    pub fn provenance(&self) -> Self {
        Self {
            path: self.path.clone(),
            runtime_path: self.runtime_path.clone(),
            params: self.params.clone(),
            action: self.action,
            from: None,
            forwarded: self.forwarded,
            state: Value::Null,
        }
    }
}

/// The envelope passed to a controller and published with the `route` event.
///
/// `data` starts as whatever the caller or a forward hop carried in and is
/// merged with the controller's returned fields; `forward` is populated only
/// on the intermediate `route` event of a forwarding hop.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationContext {
    /// The record for this navigation.
    pub route: RouteRecord,
    /// The forward target, present only on an intermediate hop payload.
    pub forward: Option<String>,
    /// Free-form payload fields.
    pub data: Map<String, Value>,
}

impl NavigationContext {
    /// Creates a context for a pending navigation.
    #[must_use]
    pub fn new(route: RouteRecord, data: Map<String, Value>) -> Self {
        Self {
            route,
            forward: None,
            data,
        }
    }

    /// Returns the parameter value captured under `name`, if any.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.route.params.get(name).map(String::as_str)
    }

    /// Returns the payload value stored under `key`, if any.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Inbound envelope threaded through forward recursion.
#[derive(Debug, Clone, Default)]
pub(crate) struct InboundContext {
    /// A route carried from a forward hop, used as `from` fallback.
    pub(crate) route: Option<RouteRecord>,
    /// Payload fields accumulated along the chain.
    pub(crate) data: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, runtime: &str) -> RouteRecord {
        RouteRecord {
            path: path.to_string(),
            runtime_path: runtime.to_string(),
            params: HashMap::new(),
            action: Some(HistoryAction::Push),
            from: None,
            forwarded: false,
            state: Value::Null,
        }
    }

    #[test]
    fn test_provenance_strips_chain() {
        let mut first = record("/a", "/a");
        first.from = Some(Box::new(record("/zero", "/zero")));
        first.state = serde_json::json!({"k": 1});

        let prov = first.provenance();
        assert_eq!(prov.path, "/a");
        assert!(prov.from.is_none());
        assert_eq!(prov.state, Value::Null);
    }

    #[test]
    fn test_provenance_is_a_value_copy() {
        let original = record("/a", "/a");
        let mut successor = record("/b", "/b");
        successor.from = Some(Box::new(original.provenance()));

        // Mutating the old record must not show through the link.
        let mut original = original;
        original.runtime_path = "/changed".to_string();
        assert_eq!(
            successor.from.as_ref().unwrap().runtime_path,
            "/a"
        );
    }

    #[test]
    fn test_context_accessors() {
        let mut rec = record("/hi/:name", "/hi/World");
        rec.params.insert("name".to_string(), "World".to_string());
        let mut data = Map::new();
        data.insert("message".to_string(), serde_json::json!("hello"));

        let ctx = NavigationContext::new(rec, data);
        assert_eq!(ctx.param("name"), Some("World"));
        assert_eq!(ctx.value("message"), Some(&serde_json::json!("hello")));
        assert!(ctx.param("missing").is_none());
    }
}
