//! # tiller-router
//!
//! A client-side route resolver for single-page applications: it maps a URL
//! path to a registered route, runs the route's controller, and emits
//! lifecycle events (`before-route`, `route`, `route-error`).
//!
//! This crate provides:
//! - Single-level path matching with named parameters (first match wins)
//! - An async navigation state machine with cooperative cancellation:
//!   a newer navigation supersedes an older still-running one
//! - Controller-driven forward (internal redirect) chaining with correct
//!   `from` provenance on each hop
//! - A typed publish/subscribe event bus
//! - An injectable [`NavigationHistory`] capability, with an in-memory
//!   implementation for tests and headless hosts
//!
//! ## Quick Start
//!
//! ```no_run
//! use tiller_router::{
//!     ControllerOutcome, EventKind, RouteDefinition, Router, RouterConfig, RouterEvent,
//! };
//!
//! # async fn example() {
//! let router = Router::new(RouterConfig::default());
//! router
//!     .add_routes(vec![
//!         RouteDefinition::new("/hello").controller(|_ctx, _token| async {
//!             Ok(ControllerOutcome::new().with("message", serde_json::json!("hello")))
//!         }),
//!         RouteDefinition::new("/hi/:name").controller(|ctx, _token| async move {
//!             let name = ctx.param("name").unwrap_or("stranger").to_string();
//!             Ok(ControllerOutcome::new().with("greeting", serde_json::json!(name)))
//!         }),
//!     ])
//!     .unwrap();
//!
//! router.on(EventKind::Route, |event| {
//!     if let RouterEvent::Route(ctx) = event {
//!         println!("now at {}", ctx.route.runtime_path);
//!     }
//! });
//!
//! router.start();
//! router.route("/hi/World");
//! # }
//! ```
//!
//! ## Forwarding
//!
//! A controller can hand the navigation off to another registered path:
//!
//! ```no_run
//! use tiller_router::{ControllerOutcome, RouteDefinition};
//!
//! let route = RouteDefinition::new("/hola/:name").controller(|ctx, _token| async move {
//!     let name = ctx.param("name").unwrap_or_default().to_string();
//!     Ok(ControllerOutcome::forward(format!("/hi/{name}")))
//! });
//! assert_eq!(route.path, "/hola/:name");
//! ```
//!
//! Each hop publishes its own `route` event (the hop payload carries the
//! forward target) and the terminal record's `from` points at the
//! immediately preceding hop.

mod cancel;
mod controller;
mod error;
mod events;
mod history;
mod record;
mod resolver;
mod router;
mod table;

pub use cancel::CancelToken;
pub use controller::{BoxFuture, Controller, ControllerError, ControllerOutcome, ControllerResult};
pub use error::{Result, RouterError};
pub use events::{EventBus, EventHandler, EventKind, RouterEvent, Subscription};
pub use history::{HistoryListener, MemoryHistory, NavigationHistory};
pub use record::{HistoryAction, NavigationContext, RouteRecord};
pub use router::{NavigateOptions, Router, RouterConfig};
pub use table::{CompiledRoute, RouteDefinition, RouteMatch, RouteTable};
