//! Where a session reads package state from.

use snapwatch_core::{PackageName, PackageRecord};
use snapwatch_snapd::{SnapdClient, SnapdError};

/// A blocking, read-only view of installed packages.
///
/// Sessions call this from tokio's blocking pool, one query at a time.
pub trait PackageSource: Send + Sync + 'static {
    /// `Ok(None)` means the package is not installed.
    fn query_installed(&self, name: &PackageName) -> Result<Option<PackageRecord>, SnapdError>;
}

impl PackageSource for SnapdClient {
    fn query_installed(&self, name: &PackageName) -> Result<Option<PackageRecord>, SnapdError> {
        SnapdClient::query_installed(self, name)
    }
}
