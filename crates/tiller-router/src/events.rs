//! Typed publish/subscribe for router lifecycle events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;

use crate::error::RouterError;
use crate::record::NavigationContext;

/// The closed set of router lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// A navigation is about to run its controller.
    BeforeRoute,
    /// A navigation completed; the payload is the merged context.
    Route,
    /// A navigation terminated without completing.
    RouteError,
}

/// A published lifecycle event.
#[derive(Debug, Clone)]
pub enum RouterEvent {
    /// Published before the matched controller runs.
    BeforeRoute {
        /// The runtime path being resolved.
        path: String,
    },
    /// Published when a navigation (or one hop of a forward chain) resolves.
    Route(NavigationContext),
    /// Published when a navigation fails, is not found, or is superseded.
    RouteError {
        /// The runtime path that was being resolved.
        path: String,
        /// What went wrong; aborts are distinguishable via
        /// [`RouterError::is_abort`].
        error: RouterError,
    },
}

impl RouterEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::BeforeRoute { .. } => EventKind::BeforeRoute,
            Self::Route(_) => EventKind::Route,
            Self::RouteError { .. } => EventKind::RouteError,
        }
    }
}

/// A subscribed event handler.
pub type EventHandler = Arc<dyn Fn(&RouterEvent) + Send + Sync>;

struct Entry {
    id: u64,
    once: bool,
    handler: EventHandler,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<Entry>>,
}

/// A handle to one subscription.
///
/// Disposal is explicit and idempotent; dropping the handle leaves the
/// subscription alive.
pub struct Subscription {
    bus: Weak<Mutex<BusInner>>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    /// Removes the subscription from the bus. Calling this twice, or after a
    /// once-handler already fired, is a no-op.
    pub fn dispose(&self) {
        if let Some(bus) = self.bus.upgrade() {
            if let Ok(mut inner) = bus.lock() {
                if let Some(entries) = inner.handlers.get_mut(&self.kind) {
                    entries.retain(|e| e.id != self.id);
                }
            }
        }
    }
}

/// A minimal synchronous publish/subscribe bus.
///
/// Handlers for an event run in subscription order. A publish cycle operates
/// on a snapshot: handlers subscribed during the cycle are not invoked until
/// the next publish, and handlers disposed mid-cycle are skipped if they have
/// not run yet. The bus lock is never held across a handler invocation, so
/// handlers may freely subscribe, dispose, or trigger further publishes.
///
/// Handler panics propagate to the publisher (fail-fast); the bus performs no
/// isolation.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a handler for `kind`. Returns a disposal handle.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&RouterEvent) + Send + Sync + 'static,
    {
        self.add(kind, Arc::new(handler), false)
    }

    /// Subscribes a handler that self-removes after its first invocation.
    pub fn subscribe_once<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&RouterEvent) + Send + Sync + 'static,
    {
        self.add(kind, Arc::new(handler), true)
    }

    fn add(&self, kind: EventKind, handler: EventHandler, once: bool) -> Subscription {
        let id = {
            let mut inner = self.inner.lock().expect("event bus lock poisoned");
            inner.next_id += 1;
            let id = inner.next_id;
            inner
                .handlers
                .entry(kind)
                .or_default()
                .push(Entry { id, once, handler });
            id
        };
        Subscription {
            bus: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Publishes an event to all currently-subscribed handlers of its kind.
    pub fn publish(&self, event: &RouterEvent) {
        let kind = event.kind();
        let snapshot: Vec<u64> = {
            let inner = self.inner.lock().expect("event bus lock poisoned");
            inner
                .handlers
                .get(&kind)
                .map(|entries| entries.iter().map(|e| e.id).collect())
                .unwrap_or_default()
        };

        for id in snapshot {
            // Re-check per handler: a previous handler may have disposed it.
            let handler = {
                let mut inner = self.inner.lock().expect("event bus lock poisoned");
                let Some(entries) = inner.handlers.get_mut(&kind) else {
                    break;
                };
                let Some(pos) = entries.iter().position(|e| e.id == id) else {
                    continue;
                };
                if entries[pos].once {
                    // Removed before invocation so it can never fire twice.
                    entries.remove(pos).handler
                } else {
                    Arc::clone(&entries[pos].handler)
                }
            };
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn before(path: &str) -> RouterEvent {
        RouterEvent::BeforeRoute {
            path: path.to_string(),
        }
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            bus.subscribe(EventKind::BeforeRoute, move |_| {
                log.lock().unwrap().push(tag);
            });
        }

        bus.publish(&before("/x"));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_once_fires_once() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let subs = bus.subscribe_once(EventKind::BeforeRoute, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&before("/x"));
        bus.publish(&before("/y"));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Disposing after the handler already fired is a no-op.
        subs.dispose();
        subs.dispose();
    }

    #[test]
    fn test_dispose_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let subs = bus.subscribe(EventKind::BeforeRoute, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&before("/x"));
        subs.dispose();
        bus.publish(&before("/y"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_added_during_publish_waits_for_next_cycle() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let inner_count = Arc::clone(&count);
        bus.subscribe(EventKind::BeforeRoute, move |_| {
            let counter = Arc::clone(&inner_count);
            inner_bus.subscribe(EventKind::BeforeRoute, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        bus.publish(&before("/x"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        bus.publish(&before("/y"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_disposed_during_publish_is_skipped() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        // The first handler disposes the second mid-cycle; the second was in
        // the snapshot but must not be invoked.
        let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&victim_slot);
        bus.subscribe(EventKind::BeforeRoute, move |_| {
            if let Some(v) = slot.lock().unwrap().take() {
                v.dispose();
            }
        });

        let counter = Arc::clone(&count);
        let victim = bus.subscribe(EventKind::BeforeRoute, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        *victim_slot.lock().unwrap() = Some(victim);

        bus.publish(&before("/x"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_kinds_are_independent() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.subscribe(EventKind::Route, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&before("/x"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
