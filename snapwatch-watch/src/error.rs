use std::time::Duration;

use thiserror::Error;

use snapwatch_core::{PackageName, Revision};
use snapwatch_snapd::SnapdError;

/// Terminal reasons a watch session did not succeed.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("daemon query failed: {0}")]
    Snapd(#[from] SnapdError),

    #[error("package '{package}' is not installed")]
    NotFound { package: PackageName },

    #[error("revision went backwards from {before} to {after}")]
    RevisionRegressed { before: Revision, after: Revision },

    #[error("revision jumped from {before} to {after}; expected exactly one step")]
    UnexpectedRevision { before: Revision, after: Revision },

    #[error("revision moved from {before} to {after} but the service is not running")]
    NotRunning { before: Revision, after: Revision },

    #[error("no update observed after {polls} polls in {elapsed:?}")]
    TimedOut { elapsed: Duration, polls: u32 },

    #[error("watch cancelled after {polls} polls")]
    Cancelled { polls: u32 },

    #[error("blocking task failed: {0}")]
    Join(String),
}
