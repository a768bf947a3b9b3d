//! Error types for snapwatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from revision parsing and configuration loading.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The daemon's revision string was not `<marker><digits>`.
    #[error("malformed revision {raw:?}: expected one marker character followed by digits")]
    MalformedRevision { raw: String },

    /// Underlying I/O failure, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; serde_yaml supplies the line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested config file did not exist.
    #[error("config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// The config parsed but holds values the watcher cannot run with.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// `dirs::config_dir()` returned `None`.
    #[error("cannot determine config directory; set $HOME or equivalent")]
    HomeNotFound,
}
