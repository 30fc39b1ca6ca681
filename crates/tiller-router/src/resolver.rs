//! The navigation state machine.
//!
//! One `resolve` call is one navigation attempt: match the path, build the
//! route record, run the controller, then complete, forward, or terminate
//! with an error event. Per navigation the bus sees `before-route` followed
//! by exactly one of `route` / `route-error`; a superseded navigation's
//! terminal event is always `route-error` with an abort reason.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::controller::{BoxFuture, ControllerOutcome};
use crate::error::RouterError;
use crate::events::{EventBus, RouterEvent};
use crate::history::NavigationHistory;
use crate::record::{HistoryAction, InboundContext, NavigationContext, RouteRecord};
use crate::router::RouterConfig;
use crate::table::RouteTable;

/// The navigation currently running its controller.
struct InFlight {
    token: CancelToken,
    path: String,
}

/// Shared navigation state behind the router facade.
pub(crate) struct Resolver {
    pub(crate) table: Mutex<RouteTable>,
    pub(crate) bus: EventBus,
    pub(crate) history: Arc<dyn NavigationHistory>,
    pub(crate) config: RouterConfig,
    /// The active (or optimistically pending) navigation.
    current: Mutex<Option<NavigationContext>>,
    /// The last navigation that completed with a `route` event. Provenance
    /// comes from here, never from the optimistic slot: a superseded
    /// navigation must not show up as anyone's origin.
    completed: Mutex<Option<RouteRecord>>,
    /// The navigation whose controller is still running, if any.
    in_flight: Mutex<Option<InFlight>>,
    /// Hands out request-ordered intent numbers; newer intents supersede.
    intent_counter: AtomicU64,
    /// Highest intent that has started resolving.
    latest_intent: AtomicU64,
    /// State attached to the next completed record, then cleared.
    pending_state: Mutex<Value>,
}

impl Resolver {
    pub(crate) fn new(history: Arc<dyn NavigationHistory>, config: RouterConfig) -> Self {
        Self {
            table: Mutex::new(RouteTable::new()),
            bus: EventBus::new(),
            history,
            config,
            current: Mutex::new(None),
            completed: Mutex::new(None),
            in_flight: Mutex::new(None),
            intent_counter: AtomicU64::new(0),
            latest_intent: AtomicU64::new(0),
            pending_state: Mutex::new(Value::Null),
        }
    }

    /// Assigns the next intent number. Called at request time (facade or
    /// history listener) so request order decides which navigation is newest.
    pub(crate) fn next_intent(&self) -> u64 {
        self.intent_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn current_route(&self) -> Option<RouteRecord> {
        self.lock_current().as_ref().map(|ctx| ctx.route.clone())
    }

    pub(crate) fn set_pending_state(&self, state: Value) {
        *self.pending_state.lock().expect("state lock poisoned") = state;
    }

    fn take_pending_state(&self) -> Value {
        let mut slot = self.pending_state.lock().expect("state lock poisoned");
        std::mem::replace(&mut *slot, Value::Null)
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<NavigationContext>> {
        self.current.lock().expect("current route lock poisoned")
    }

    fn lock_completed(&self) -> MutexGuard<'_, Option<RouteRecord>> {
        self.completed.lock().expect("completed route lock poisoned")
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().expect("in-flight lock poisoned")
    }

    /// Resolves one navigation. All outcomes surface as bus events; the
    /// future yields the runtime path of the terminal `route` event, or
    /// `None` when the navigation ended in a `route-error` or was dropped.
    pub(crate) fn resolve(
        self: &Arc<Self>,
        path: String,
        action: Option<HistoryAction>,
        inbound: InboundContext,
        intent: u64,
        depth: usize,
    ) -> BoxFuture<'static, Option<String>> {
        let this = Arc::clone(self);
        async move {
            // Duplicate notifications for the active path are a no-op.
            let active = this
                .lock_current()
                .as_ref()
                .map(|ctx| ctx.route.runtime_path.clone());
            if active.as_deref() == Some(path.as_str()) {
                debug!(%path, "path already active");
                return None;
            }

            // MATCHING. A miss never reaches the abort step: a navigation
            // that cannot match does not supersede a running one.
            let Some(matched) = this
                .table
                .lock()
                .expect("route table lock poisoned")
                .find_match(&path)
            else {
                debug!(%path, "no route matched");
                this.bus.publish(&RouterEvent::RouteError {
                    path: path.clone(),
                    error: RouterError::NotFound { path },
                });
                return None;
            };

            // Staleness gate: if a newer intent already started resolving,
            // this navigation lost the race before it began.
            let previous = this.latest_intent.fetch_max(intent, Ordering::SeqCst);
            if previous > intent {
                debug!(%path, intent, "navigation superseded before start");
                this.bus.publish(&RouterEvent::RouteError {
                    path: path.clone(),
                    error: RouterError::Aborted {
                        path,
                        reason: "superseded before start".to_string(),
                    },
                });
                return None;
            }

            // Abort-in-flight: at most one navigation runs at a time. The
            // cancellation is cooperative; a controller that ignores the
            // token keeps running but its result is discarded below.
            let token = CancelToken::new();
            let aborted = {
                let mut slot = this.lock_in_flight();
                let aborted = slot.take();
                *slot = Some(InFlight {
                    token: token.clone(),
                    path: path.clone(),
                });
                aborted
            };
            if let Some(old) = aborted {
                let reason = format!("superseded by {path}");
                debug!(aborted = %old.path, %reason, "aborting in-flight navigation");
                old.token.cancel(reason.clone());
                if old.token.claim_report() {
                    this.bus.publish(&RouterEvent::RouteError {
                        path: old.path.clone(),
                        error: RouterError::Aborted {
                            path: old.path,
                            reason,
                        },
                    });
                }
            }

            // The record links back to where the user actually navigated
            // from: the route a forward hop carried, or the last completed
            // navigation. The optimistic slot is deliberately not consulted;
            // it may hold a navigation that never completes.
            let from = inbound
                .route
                .as_ref()
                .map(RouteRecord::provenance)
                .or_else(|| this.lock_completed().as_ref().map(RouteRecord::provenance))
                .map(Box::new);
            let record = RouteRecord {
                path: matched.route.path.clone(),
                runtime_path: path.clone(),
                params: matched.params,
                action,
                from,
                forwarded: false,
                state: Value::Null,
            };

            this.bus.publish(&RouterEvent::BeforeRoute { path: path.clone() });

            // Current reflects the pending navigation optimistically.
            let context = NavigationContext::new(record.clone(), inbound.data);
            let displaced = this.lock_current().replace(context.clone());

            // RUNNING. A route without a controller is identity: the context
            // passes through unchanged.
            let result = match &matched.route.controller {
                Some(controller) => controller(context.clone(), token.clone()).await,
                None => Ok(ControllerOutcome {
                    forward: None,
                    data: context.data.clone(),
                }),
            };

            // A stale result is discarded no matter what the controller did.
            if token.is_cancelled() || this.latest_intent.load(Ordering::SeqCst) > intent {
                let reason = token
                    .reason()
                    .unwrap_or_else(|| "superseded".to_string());
                debug!(%path, %reason, "discarding stale navigation result");
                if token.claim_report() {
                    this.bus.publish(&RouterEvent::RouteError {
                        path: path.clone(),
                        error: RouterError::Aborted { path, reason },
                    });
                }
                this.restore_current(&record, displaced);
                this.release(&token);
                return None;
            }

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(%path, error = %err, "controller failed");
                    this.bus.publish(&RouterEvent::RouteError {
                        path: path.clone(),
                        error: RouterError::Controller {
                            path,
                            message: err.to_string(),
                        },
                    });
                    this.restore_current(&record, displaced);
                    this.release(&token);
                    return None;
                }
            };

            // Controller fields merge over the inbound context fields.
            let mut merged = context.data;
            merged.extend(outcome.data);

            if let Some(forward) = outcome.forward {
                if depth + 1 > this.config.max_forward_hops {
                    warn!(%path, limit = this.config.max_forward_hops, "forward limit exceeded");
                    this.bus.publish(&RouterEvent::RouteError {
                        path: path.clone(),
                        error: RouterError::ForwardLimit {
                            path,
                            limit: this.config.max_forward_hops,
                        },
                    });
                    this.restore_current(&record, displaced);
                    this.release(&token);
                    return None;
                }

                debug!(from = %record.path, to = %forward, "forwarding");
                let mut hop = record;
                hop.forwarded = true;

                // Observers see the forwarding step: one route event per
                // hop, the hop payload carrying the forward target.
                let hop_context = NavigationContext {
                    route: hop.clone(),
                    forward: Some(forward.clone()),
                    data: merged.clone(),
                };
                *this.lock_current() = Some(hop_context.clone());
                this.bus.publish(&RouterEvent::Route(hop_context));

                this.release(&token);
                let terminal = this
                    .resolve(
                        forward,
                        action,
                        InboundContext {
                            route: Some(hop),
                            data: merged,
                        },
                        intent,
                        depth + 1,
                    )
                    .await;

                // Once the whole chain lands on a route, reflect its
                // terminal path in the stored path without re-entering the
                // history listener. A chain that ends in a route-error
                // leaves the history where the user's own navigation put it.
                if depth == 0 {
                    if let Some(target) = terminal.as_deref() {
                        this.history.set(target, true);
                    }
                }
                return terminal;
            }

            // COMPLETING.
            let mut completed = record;
            completed.state = this.take_pending_state();
            let final_context = NavigationContext {
                route: completed,
                forward: None,
                data: merged,
            };
            *this.lock_completed() = Some(final_context.route.clone());
            *this.lock_current() = Some(final_context.clone());
            this.release(&token);
            this.bus.publish(&RouterEvent::Route(final_context));
            Some(path)
        }
        .boxed()
    }

    /// Clears this navigation's in-flight entry without clobbering a
    /// superseding navigation's.
    fn release(&self, token: &CancelToken) {
        let mut slot = self.lock_in_flight();
        if slot
            .as_ref()
            .is_some_and(|entry| entry.token.same_token(token))
        {
            *slot = None;
        }
    }

    /// Rolls back the optimistic current slot after a failed or discarded
    /// navigation, unless a newer navigation already owns the slot.
    fn restore_current(&self, ours: &RouteRecord, displaced: Option<NavigationContext>) {
        let mut current = self.lock_current();
        if current
            .as_ref()
            .is_some_and(|ctx| ctx.route.runtime_path == ours.runtime_path)
        {
            *current = displaced;
        }
    }
}
