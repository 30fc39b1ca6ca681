//! Path template compilation.

use regex::Regex;

use crate::error::{PatternError, Result};

/// A segment in a path template.
#[derive(Debug, Clone)]
enum Segment {
    /// A literal string segment.
    Literal(String),
    /// A named parameter matching one path segment.
    Param { name: String, optional: bool },
    /// A named parameter matching the remainder of the path.
    Wildcard { name: String, optional: bool },
}

/// A compiled path template.
///
/// Templates are made of `/`-separated segments. A segment is either a
/// literal or a named parameter; parameters are written in colon or brace
/// syntax, interchangeably:
///
/// - `/hi/:name` or `/hi/{name}` (or `/hi/{:name}`) - one segment
/// - `/users/:id?` - optional segment
/// - `/files/{*path}` or `/files/:*path` - wildcard, matches the rest of
///   the path
///
/// Matching tolerates a single trailing slash: `/hello` accepts both
/// `/hello` and `/hello/`.
///
/// # Example
///
/// ```
/// use tiller_pattern::PathPattern;
///
/// let pattern = PathPattern::compile("/posts/:id/comments/:comment_id").unwrap();
/// assert!(pattern.test("/posts/123/comments/456"));
/// assert_eq!(pattern.param_names(), ["id", "comment_id"]);
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original template string.
    template: String,
    /// Parsed segments.
    segments: Vec<Segment>,
    /// Compiled regex for matching.
    regex: Regex,
    /// Parameter names in declaration order.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a path template.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or duplicated parameter name, or if the
    /// generated regex does not compile.
    pub fn compile(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        let mut regex_str = String::from("^");

        for part in template.split('/').filter(|s| !s.is_empty()) {
            let segment = parse_segment(template, part)?;
            match &segment {
                Segment::Literal(lit) => {
                    regex_str.push('/');
                    regex_str.push_str(&regex::escape(lit));
                }
                Segment::Param { name, optional } => {
                    register_param(template, &mut param_names, name)?;
                    if *optional {
                        regex_str.push_str("(?:/([^/]+))?");
                    } else {
                        regex_str.push_str("/([^/]+)");
                    }
                }
                Segment::Wildcard { name, optional } => {
                    register_param(template, &mut param_names, name)?;
                    if *optional {
                        regex_str.push_str("(?:/(.+))?");
                    } else {
                        regex_str.push_str("/(.+)");
                    }
                }
            }
            segments.push(segment);
        }

        regex_str.push_str("/?$");

        let regex = Regex::new(&regex_str).map_err(|e| PatternError::Regex {
            template: template.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            segments,
            regex,
            param_names,
        })
    }

    /// Returns whether the path matches this template.
    #[must_use]
    pub fn test(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches a path and returns the captured parameter values in
    /// declaration order.
    ///
    /// An unmatched optional parameter produces `None` at its position, so
    /// the returned vector always has one slot per name in
    /// [`param_names`](Self::param_names).
    #[must_use]
    pub fn exec(&self, path: &str) -> Option<Vec<Option<String>>> {
        let caps = self.regex.captures(path)?;
        let values = (1..=self.param_names.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        Some(values)
    }

    /// Returns the original template string.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the parameter names in declaration order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Returns whether this template declares any parameters.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.param_names.is_empty()
    }

    /// Returns the number of segments in the template.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// Parses one `/`-separated piece of a template.
fn parse_segment(template: &str, part: &str) -> Result<Segment> {
    let (inner, is_param) = match part.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(braced) => (braced.strip_prefix(':').unwrap_or(braced), true),
        None => match part.strip_prefix(':') {
            Some(colon) => (colon, true),
            None => (part, false),
        },
    };

    if !is_param {
        return Ok(Segment::Literal(part.to_string()));
    }

    let (inner, optional) = match inner.strip_suffix('?') {
        Some(stripped) => (stripped, true),
        None => (inner, false),
    };

    let (name, wildcard) = match inner.strip_prefix('*') {
        Some(stripped) => (stripped, true),
        None => (inner, false),
    };

    if name.is_empty() {
        return Err(PatternError::EmptyParamName {
            template: template.to_string(),
        });
    }

    let name = name.to_string();
    if wildcard {
        Ok(Segment::Wildcard { name, optional })
    } else {
        Ok(Segment::Param { name, optional })
    }
}

/// Records a parameter name, rejecting duplicates.
fn register_param(template: &str, names: &mut Vec<String>, name: &str) -> Result<()> {
    if names.iter().any(|n| n == name) {
        return Err(PatternError::DuplicateParamName {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    names.push(name.to_string());
    Ok(())
}
