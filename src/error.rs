use thiserror::Error;

/// Route compilation error types
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Duplicate route for key {key:?}: {}", .patterns.join(", "))]
    DuplicateRoute { key: String, patterns: Vec<String> },

    #[error(
        "Degenerate prefix grouping: zero-length key among [{}] from patterns [{}]",
        .keys.join(", "),
        .patterns.join(", ")
    )]
    DegenerateGrouping {
        keys: Vec<String>,
        patterns: Vec<String>,
    },

    #[error("Empty pattern: {pattern:?}")]
    EmptyPattern { pattern: String },

    #[error("Parse error in pattern {pattern:?} at offset {position}: {message}")]
    ParseError {
        pattern: String,
        position: usize,
        message: String,
    },

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Serialize error: {0}")]
    SerializeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RouteError>;
