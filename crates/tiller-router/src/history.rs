//! Navigation history capability.
//!
//! The router never touches a browser or global state directly; it talks to
//! a [`NavigationHistory`] it was handed at construction. Production
//! embeddings wrap their hash/history mechanism behind this trait, and
//! [`MemoryHistory`] provides the in-memory stack used in tests and headless
//! hosts.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::record::HistoryAction;

/// Callback invoked when the current path changes with notification.
pub type HistoryListener = Arc<dyn Fn(&str, HistoryAction) + Send + Sync>;

/// A source of path-change notifications plus an imperative API to change
/// the current path, with or without notifying.
///
/// Exactly one listener is attached at a time; attaching a new one replaces
/// the previous.
pub trait NavigationHistory: Send + Sync {
    /// Attaches the path-change listener.
    fn listen(&self, listener: HistoryListener);

    /// Detaches the current listener, if any.
    fn unlisten(&self);

    /// Pushes a new path and notifies the listener with `Push`.
    fn push(&self, path: &str);

    /// Replaces the current path and notifies the listener with `Push`.
    fn replace(&self, path: &str);

    /// Changes the current path **without** notifying the listener.
    ///
    /// With `push_onto_stack` the path becomes a new stack entry; otherwise
    /// it replaces the current one. Used after a forward chain so the stored
    /// path reflects the forward target without re-entering the resolver.
    fn set(&self, path: &str, push_onto_stack: bool);

    /// Navigates backwards. With a target path, unwinds the stack to that
    /// entry; without, pops one entry. Notifies the listener with `Pop`.
    fn pop(&self, to_path: Option<&str>);

    /// Returns the number of stack entries.
    fn len(&self) -> usize;

    /// Returns whether the stack is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current path, if any.
    fn current(&self) -> Option<String>;
}

#[derive(Default)]
struct MemoryState {
    stack: Vec<String>,
    listener: Option<HistoryListener>,
}

/// An in-memory [`NavigationHistory`] backed by a plain stack.
#[derive(Default)]
pub struct MemoryHistory {
    state: Mutex<MemoryState>,
}

impl MemoryHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the stack, bottom first. Test hook.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.locked().stack.clone()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("history lock poisoned")
    }

    /// Invokes the listener outside the state lock.
    fn notify(&self, path: &str, action: HistoryAction) {
        let listener = self.locked().listener.clone();
        if let Some(listener) = listener {
            listener(path, action);
        }
    }
}

impl NavigationHistory for MemoryHistory {
    fn listen(&self, listener: HistoryListener) {
        self.locked().listener = Some(listener);
    }

    fn unlisten(&self) {
        self.locked().listener = None;
    }

    fn push(&self, path: &str) {
        {
            let mut state = self.locked();
            // Re-pushing the current path notifies without growing the stack;
            // the resolver's idempotence check absorbs the duplicate.
            if state.stack.last().map(String::as_str) != Some(path) {
                state.stack.push(path.to_string());
            }
        }
        self.notify(path, HistoryAction::Push);
    }

    fn replace(&self, path: &str) {
        {
            let mut state = self.locked();
            match state.stack.last_mut() {
                Some(top) => *top = path.to_string(),
                None => state.stack.push(path.to_string()),
            }
        }
        self.notify(path, HistoryAction::Push);
    }

    fn set(&self, path: &str, push_onto_stack: bool) {
        debug!(path, push_onto_stack, "silent path set");
        let mut state = self.locked();
        if push_onto_stack {
            state.stack.push(path.to_string());
        } else {
            match state.stack.last_mut() {
                Some(top) => *top = path.to_string(),
                None => state.stack.push(path.to_string()),
            }
        }
    }

    fn pop(&self, to_path: Option<&str>) {
        let target = {
            let mut state = self.locked();
            match to_path {
                Some(to) => match state.stack.iter().rposition(|p| p == to) {
                    Some(idx) => {
                        state.stack.truncate(idx + 1);
                        Some(to.to_string())
                    }
                    // Unknown target: nothing to unwind to.
                    None => None,
                },
                None => {
                    if state.stack.len() < 2 {
                        None
                    } else {
                        state.stack.pop();
                        state.stack.last().cloned()
                    }
                }
            }
        };
        if let Some(path) = target {
            self.notify(&path, HistoryAction::Pop);
        }
    }

    fn len(&self) -> usize {
        self.locked().stack.len()
    }

    fn current(&self) -> Option<String> {
        self.locked().stack.last().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(history: &MemoryHistory) -> Arc<Mutex<Vec<(String, HistoryAction)>>> {
        let log: Arc<Mutex<Vec<(String, HistoryAction)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        history.listen(Arc::new(move |path, action| {
            sink.lock().unwrap().push((path.to_string(), action));
        }));
        log
    }

    #[test]
    fn test_push_notifies_and_stacks() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.push("/b");
        assert_eq!(history.entries(), ["/a", "/b"]);
        assert_eq!(history.current().as_deref(), Some("/b"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("/a".to_string(), HistoryAction::Push),
                ("/b".to_string(), HistoryAction::Push)
            ]
        );
    }

    #[test]
    fn test_push_same_path_does_not_grow_stack() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.push("/a");
        assert_eq!(history.len(), 1);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_replace_swaps_top() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.replace("/b");
        assert_eq!(history.entries(), ["/b"]);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_set_is_silent() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.set("/b", false);
        assert_eq!(history.entries(), ["/b"]);
        history.set("/c", true);
        assert_eq!(history.entries(), ["/b", "/c"]);
        // Only the push notified.
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_pop_one_entry() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.push("/b");
        history.pop(None);
        assert_eq!(history.entries(), ["/a"]);
        assert_eq!(
            log.lock().unwrap().last().cloned(),
            Some(("/a".to_string(), HistoryAction::Pop))
        );
    }

    #[test]
    fn test_pop_to_path_unwinds() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.push("/b");
        history.push("/c");
        history.pop(Some("/a"));
        assert_eq!(history.entries(), ["/a"]);
        assert_eq!(
            log.lock().unwrap().last().cloned(),
            Some(("/a".to_string(), HistoryAction::Pop))
        );
    }

    #[test]
    fn test_pop_bottom_is_noop() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.pop(None);
        assert_eq!(history.entries(), ["/a"]);
        assert_eq!(log.lock().unwrap().len(), 1);

        history.pop(Some("/missing"));
        assert_eq!(history.entries(), ["/a"]);
    }

    #[test]
    fn test_unlisten_stops_notifications() {
        let history = MemoryHistory::new();
        let log = recording(&history);

        history.push("/a");
        history.unlisten();
        history.push("/b");
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
