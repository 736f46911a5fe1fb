//! Error types for templar-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading templates or configuration files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error — includes the file path.
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parse error — includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The file did not exist at the expected path.
    #[error("file not found at {path}")]
    NotFound { path: PathBuf },

    /// The file extension is not one of `.json`, `.yaml`, `.yml`.
    #[error("unsupported file format at {path}; expected .json, .yaml or .yml")]
    UnsupportedFormat { path: PathBuf },

    /// A template reference string could not be parsed.
    #[error("invalid template reference '{0}'; expected <id> or <id>@<version>")]
    InvalidReference(String),
}
