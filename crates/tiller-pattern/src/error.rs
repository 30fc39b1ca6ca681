//! Error types for pattern compilation.

use thiserror::Error;

/// Errors raised while compiling a path template.
///
/// The error is `Clone` so that callers embedding it in event payloads can
/// pass it around by value; the regex failure case therefore carries the
/// rendered message rather than the source error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A parameter segment had no name (e.g. `/users/:`).
    #[error("empty parameter name in template: {template}")]
    EmptyParamName { template: String },

    /// The same parameter name appeared twice in one template.
    #[error("duplicate parameter {name:?} in template: {template}")]
    DuplicateParamName { template: String, name: String },

    /// The generated regex failed to compile.
    #[error("invalid pattern {template}: {message}")]
    Regex { template: String, message: String },
}

/// Result type alias for pattern operations.
pub type Result<T> = std::result::Result<T, PatternError>;
