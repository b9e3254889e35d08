//! Error types for command dispatch and manifest loading.

use cmdroute_core::{ParseError, SchemaError};
use thiserror::Error;

/// Errors that can occur while executing a token vector.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered path validates against the input. Carries the full
    /// original token sequence.
    #[error("unknown command: {}", .0.join(" "))]
    CommandNotFound(Vec<String>),

    /// The matched command's option schema rejected its argument vector.
    #[error("error parsing flags for '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    /// The command ran and returned an error.
    #[error("command '{path}' failed: {source}")]
    Command {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Writing help or completion output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading, saving or applying a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("manifest has no program name")]
    EmptyName,

    /// A command declaration with an empty or whitespace-only path.
    #[error("command #{index} has an empty path")]
    EmptyPath { index: usize },

    /// Two declarations normalize to the same command path.
    #[error("duplicate command path: {0}")]
    DuplicatePath(String),

    /// A command's option schema is malformed.
    #[error("invalid schema for '{path}': {source}")]
    Schema {
        path: String,
        #[source]
        source: SchemaError,
    },
}

/// Convenience alias for results with [`DispatchError`].
pub type Result<T> = std::result::Result<T, DispatchError>;
