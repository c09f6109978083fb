//! Error types for vivarium
//!
//! Errors are cloneable because a failed load is shared with every importer
//! waiting on the same cache slot.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loader error type
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// A resolved path did not exist on disk
    #[error("module not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Reading a resolved path failed for a reason other than not-found
    #[error("failed to read '{}': {message}", .path.display())]
    Io { path: PathBuf, message: String },

    /// The engine rejected a module's source text
    #[error("compile error in '{identifier}': {message}")]
    Compile { identifier: String, message: String },

    /// Linking failed (bad identifier, unresolvable binding, abandoned load)
    #[error("link error: {0}")]
    Link(String),

    /// The engine raised while evaluating the module graph
    #[error("evaluation error: {0}")]
    Evaluate(String),

    /// The host engine lacks the module-graph primitives this crate depends on
    #[error("unsupported host: {0}")]
    UnsupportedHost(String),
}

/// Stable classification of a [`LoaderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Io,
    Compile,
    Link,
    Evaluate,
    UnsupportedHost,
}

impl LoaderError {
    /// Create a compile error for a module identifier
    pub fn compile(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create a link error
    pub fn link(message: impl Into<String>) -> Self {
        Self::Link(message.into())
    }

    /// Create an evaluation error
    pub fn evaluate(message: impl Into<String>) -> Self {
        Self::Evaluate(message.into())
    }

    /// Error classification, stable across formatting changes
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Io { .. } => ErrorKind::Io,
            Self::Compile { .. } => ErrorKind::Compile,
            Self::Link(_) => ErrorKind::Link,
            Self::Evaluate(_) => ErrorKind::Evaluate,
            Self::UnsupportedHost(_) => ErrorKind::UnsupportedHost,
        }
    }

    /// The offending filesystem path, for read failures
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path } | Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type using LoaderError
pub type LoaderResult<T> = Result<T, LoaderError>;
