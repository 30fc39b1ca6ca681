//! # tiller-pattern
//!
//! Path template compilation for the tiller router.
//!
//! A template string is compiled once into a [`PathPattern`] holding a
//! matcher and the declared parameter names in order. The router never looks
//! inside the template syntax; it only consumes `test`/`exec`/`param_names`.
//!
//! ## Quick Start
//!
//! ```
//! use tiller_pattern::PathPattern;
//!
//! let pattern = PathPattern::compile("/hi/:name").unwrap();
//! assert!(pattern.test("/hi/World"));
//!
//! let captures = pattern.exec("/hi/World").unwrap();
//! assert_eq!(captures, vec![Some("World".to_string())]);
//! ```
//!
//! Both colon (`/hi/:name`) and brace (`/hi/{name}`, `/hi/{:name}`) parameter
//! syntax are accepted, along with optional (`:id?`) and wildcard (`{*rest}`)
//! parameters.

mod error;
mod pattern;

pub use error::{PatternError, Result};
pub use pattern::PathPattern;
