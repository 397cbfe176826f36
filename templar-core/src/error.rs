//! Error types for templar-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse record store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `insert` called for a name that already has a record.
    #[error("template '{name}' already has a record")]
    Duplicate { name: String },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.templar/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Startup configuration failures. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// The layered sources could not be read or deserialized.
    #[error("failed to load config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    /// A required value is empty after file + environment resolution.
    #[error("missing required config value `{field}`")]
    Missing { field: &'static str },

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Failures reported by the repository, controller and notification clients.
///
/// Not-found lookups are not errors; they surface as `Ok(None)`.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network-level failure (DNS, connect, timeout, TLS).
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// The remote answered with a status the call does not accept.
    #[error("{url} returned unexpected status {status}")]
    Status { url: String, status: u16 },

    /// Credentials were rejected.
    #[error("authentication against {url} failed with status {status}")]
    Auth { url: String, status: u16 },

    /// Repository write carried a stale content hash.
    #[error("write conflict on {path}: content hash is stale")]
    Conflict { path: String },

    /// Repository create found an existing file at the path.
    #[error("file already exists: {path}")]
    AlreadyExists { path: String },

    /// A referenced object (project, template, branch) is absent.
    #[error("{what} not found")]
    Missing { what: String },

    /// The response body did not have the expected shape.
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
