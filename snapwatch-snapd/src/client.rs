//! Query client for the daemon's installed-package list.

use snapwatch_core::{PackageName, PackageRecord, WatchConfig};

use crate::error::SnapdError;
use crate::paths::SNAPS_ENDPOINT;
use crate::schema::{ErrorResponse, ResponseEnvelope, SnapEntry, SnapListResponse};
use crate::transport::SocketPool;

/// Reads installed-package state from snapd. Never mutates the daemon.
#[derive(Debug, Clone)]
pub struct SnapdClient {
    pool: SocketPool,
}

impl SnapdClient {
    pub fn new(pool: SocketPool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(SocketPool::new(&config.socket_path).with_io_timeout(config.io_timeout()))
    }

    /// Look up one package by exact name.
    ///
    /// `Ok(None)` means the daemon answered and the package is not installed.
    /// Only the first match is considered; snapd does not report duplicates.
    pub fn query_installed(&self, name: &PackageName) -> Result<Option<PackageRecord>, SnapdError> {
        let entries = self.fetch_snaps()?;
        let Some(entry) = entries.iter().find(|entry| entry.name == name.0) else {
            tracing::debug!(package = %name, listed = entries.len(), "package not installed");
            return Ok(None);
        };
        let record = entry.to_record()?;
        tracing::debug!(
            package = %record.name,
            revision = %record.revision,
            daemon = record.is_daemon(),
            running = record.is_running(),
            "queried package",
        );
        Ok(Some(record))
    }

    /// Every installed package.
    ///
    /// Entries with more than one service or an unreadable revision are
    /// skipped with a warning so one odd snap does not hide the rest.
    pub fn list_installed(&self) -> Result<Vec<PackageRecord>, SnapdError> {
        let mut records = Vec::new();
        for entry in self.fetch_snaps()? {
            match entry.to_record() {
                Ok(record) => records.push(record),
                Err(SnapdError::UnsupportedShape {
                    package,
                    daemon_apps,
                }) => {
                    tracing::warn!(
                        package = %package,
                        daemon_apps,
                        "skipping package with multiple services",
                    );
                }
                Err(err) if err.is_malformed_revision() => {
                    tracing::warn!(
                        package = %entry.name,
                        error = %err,
                        "skipping package with unreadable revision",
                    );
                }
                Err(err) => return Err(err),
            }
        }
        records.sort_by(|a, b| a.name.0.cmp(&b.name.0));
        Ok(records)
    }

    /// True if the package is installed; logs its version when it is.
    pub fn is_installed(&self, name: &PackageName) -> Result<bool, SnapdError> {
        match self.query_installed(name)? {
            Some(record) => {
                tracing::info!(
                    package = %record.name,
                    version = record.version.as_deref().unwrap_or("unknown"),
                    revision = %record.revision,
                    "package is installed",
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn fetch_snaps(&self) -> Result<Vec<SnapEntry>, SnapdError> {
        let response = self.pool.get(SNAPS_ENDPOINT)?;
        if !response.is_success() {
            return Err(rejected(response.status, &response.body));
        }
        let envelope: ResponseEnvelope = serde_json::from_slice(&response.body)?;
        if envelope.is_error() {
            let status = envelope.status_code.unwrap_or(response.status);
            return Err(rejected(status, &response.body));
        }
        let list: SnapListResponse = serde_json::from_slice(&response.body)?;
        Ok(list.result)
    }
}

/// `DaemonRejected` with the envelope message, or the raw body if there is none.
fn rejected(status: u16, body: &[u8]) -> SnapdError {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .map(|error| error.result.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    SnapdError::DaemonRejected { status, message }
}
