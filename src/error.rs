//! Error types for resolution, artifact building and emission.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of an emission request.
///
/// All of them are fatal: the request is aborted and no partial fragment is
/// returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error("resource `{name}` has no definition{}", required_by_suffix(.required_by))]
    UndefinedResource {
        name: String,
        required_by: Option<String>,
    },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("resource `{name}` is missing filename or its minified version")]
    MissingSource { name: String },

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("IO error on `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compress `{name}`: {message}")]
    Compress { name: String, message: String },

    #[error("resource `{name}` uses unknown config provider `{provider}`")]
    UnknownProvider { name: String, provider: String },

    #[error("config provider for `{name}` failed: {message}")]
    Provider { name: String, message: String },

    #[error("failed to encode value as JSON")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn required_by_suffix(required_by: &Option<String>) -> String {
    required_by
        .as_ref()
        .map(|parent| format!(" (required by `{parent}`)"))
        .unwrap_or_default()
}
