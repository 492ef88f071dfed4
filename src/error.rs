//! Error types for loading, indexing and internalizing documents.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading or (de)serializing a document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize document: {message}")]
    Emit { message: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Traversal failures.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("unsupported node kind: {kind}")]
    UnsupportedNodeKind { kind: &'static str },
}

/// A dot-path did not have the expected shape.
///
/// Never fatal on its own: the orchestrator uses it to skip references
/// that do not point into the component registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path must start with {prefix} got {path}")]
    MissingPrefix { prefix: &'static str, path: String },

    #[error("not a component path: {path}")]
    NotAComponentPath { path: String },
}

/// Errors while building a reference catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot load {location}: {source}")]
    Load {
        location: String,
        #[source]
        source: LoadError,
    },

    #[error("root node must be a document, got {kind}")]
    NotADocument { kind: &'static str },

    #[error(transparent)]
    Walk(#[from] WalkError),
}

impl CatalogError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CatalogError::Load { source, .. } => source.exit_code(),
            _ => 2,
        }
    }
}

/// Errors during the internalization pass. All of them abort the pass.
#[derive(Debug, Error)]
pub enum InternalizeError {
    #[error("expected 1 node at {path}, got {count}")]
    AmbiguousLookup { path: String, count: usize },

    #[error("expected a mapping at {path}, got {kind}")]
    NotAMapping { path: String, kind: &'static str },

    #[error("unable to find origin for node holding $ref {pointer}")]
    OriginNotFound { pointer: String },

    #[error("unable to add {definition} as new component: {source}")]
    Merge {
        definition: String,
        #[source]
        source: Box<InternalizeError>,
    },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl InternalizeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            InternalizeError::Catalog(e) => e.exit_code(),
            _ => 2,
        }
    }
}
