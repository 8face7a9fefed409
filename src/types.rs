use std::collections::HashMap;
use std::fmt;

/// Regex used for a parameter without an explicit constraint (one path component)
pub const DEFAULT_PARAMETER_REGEX: &str = "[^/]+";

/// Named parameter segment, optionally constrained by a regex
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Capture name
    pub name: String,
    /// Custom regex (e.g., `\d+`); `None` uses [`DEFAULT_PARAMETER_REGEX`]
    pub constraint: Option<String>,
}

impl Parameter {
    /// Create an unconstrained parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    /// Create a parameter matching `constraint`
    pub fn with_constraint(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: Some(constraint.into()),
        }
    }

    /// The regex this parameter matches, without the capture group
    pub fn regex(&self) -> &str {
        self.constraint.as_deref().unwrap_or(DEFAULT_PARAMETER_REGEX)
    }

    /// Render as a named-capture regex fragment, e.g. `(?P<id>[^/]+)`
    pub fn regex_fragment(&self) -> String {
        format!("(?P<{}>{})", self.name, self.regex())
    }
}

/// One parsed unit of a route pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Fixed text, matched exactly
    Literal(String),
    /// Matched via its regex fragment
    Parameter(Parameter),
}

impl Segment {
    /// Create a literal segment
    pub fn literal(text: impl Into<String>) -> Self {
        Segment::Literal(text.into())
    }

    /// Create an unconstrained parameter segment
    pub fn parameter(name: impl Into<String>) -> Self {
        Segment::Parameter(Parameter::new(name))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Parameter(p) => match &p.constraint {
                Some(constraint) => write!(f, "{{{}:{}}}", p.name, constraint),
                None => write!(f, "{{{}}}", p.name),
            },
        }
    }
}

/// Borrowed match produced by walking a compiled tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The payload registered for the matched pattern
    pub payload: &'a T,
    /// Captured parameter values, keyed by parameter name
    pub params: HashMap<String, String>,
}

/// Owned match result returned by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<T> {
    /// The matched payload
    pub payload: T,
    /// Captured parameter values, keyed by parameter name
    pub params: HashMap<String, String>,
}

impl<T: Clone> From<RouteMatch<'_, T>> for MatchResult<T> {
    fn from(m: RouteMatch<'_, T>) -> Self {
        Self {
            payload: m.payload.clone(),
            params: m.params,
        }
    }
}
