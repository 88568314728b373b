use crate::scanner::Location;
use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Anything recoverable is logged as a warning instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The annotation stream for an API is inconsistent and cannot produce a document.
    #[error("{}API '{alias}': {kind}", fmt_location(.location))]
    Structural {
        alias: String,
        location: Option<Location>,
        kind: StructuralErrorKind,
    },

    /// Schema closure did not settle within the configured number of passes.
    #[error("schema resolution for API '{alias}' exceeded {limit} iterations (too many iterations)")]
    ResolverOverflow { alias: String, limit: usize },

    #[error("failed to read {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    SourceParse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Ways a command stream can violate the handler state machine or arity contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralErrorKind {
    #[error("'begin {id}' while handler '{open}' is still open")]
    NestedBegin { id: String, open: String },

    #[error("'end' without an open handler")]
    UnmatchedEnd,

    #[error("'end {found}' does not close the open handler '{open}'")]
    EndMismatch { open: String, found: String },

    #[error("invalid number of arguments for '{kind}': expected {expected}, found {found}")]
    InvalidArity {
        kind: String,
        expected: &'static str,
        found: usize,
    },

    #[error("'{kind}' outside of a begin/end block")]
    NoOpenHandler { kind: String },

    #[error("'{kind}' is not allowed inside handler '{open}'")]
    NotAllowedInHandler { kind: String, open: String },

    #[error("'urlvar' before any 'url'")]
    NoServer,

    #[error("handler '{id}' is never closed with 'end'")]
    UnclosedHandler { id: String },

    #[error("'{kind}' names no type in '{token}'")]
    EmptyTypeReference { kind: String, token: String },
}

fn fmt_location(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!("{}: ", location),
        None => String::new(),
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}
