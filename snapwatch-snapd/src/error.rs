use std::path::PathBuf;

use thiserror::Error;

use snapwatch_core::CoreError;

/// Error surface for the socket transport and the snapd query client.
#[derive(Debug, Error)]
pub enum SnapdError {
    #[error("snapd is not reachable at {socket}: {reason}")]
    TransportUnavailable { socket: PathBuf, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed HTTP response from snapd: {0}")]
    Http(String),

    #[error("failed to decode snapd response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("snapd rejected the request ({status}): {message}")]
    DaemonRejected { status: u16, message: String },

    #[error("package '{package}' declares {daemon_apps} daemon apps; exactly one is supported")]
    UnsupportedShape { package: String, daemon_apps: usize },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SnapdError {
    /// True for failures caused by a bad revision string in the daemon response.
    pub fn is_malformed_revision(&self) -> bool {
        matches!(self, SnapdError::Core(CoreError::MalformedRevision { .. }))
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SnapdError {
    SnapdError::Io {
        path: path.into(),
        source,
    }
}
