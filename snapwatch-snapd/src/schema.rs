//! Typed shape of the snapd responses this crate consumes.
//!
//! Only the fields snapwatch reads are modelled; everything else in the
//! daemon's JSON is ignored. Optional fields are explicit `Option`s.

use serde::Deserialize;

use snapwatch_core::{parse_revision, CoreError, PackageRecord, ServiceState};

use crate::error::SnapdError;

/// Fields common to every snapd response, read before the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "status-code", default)]
    pub status_code: Option<u16>,
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        self.kind.as_deref() == Some("error")
    }
}

/// Successful `GET /v2/snaps` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapListResponse {
    pub result: Vec<SnapEntry>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub result: ErrorResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResult {
    #[serde(default)]
    pub message: String,
}

/// One installed snap.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapEntry {
    pub name: String,
    /// Left undecoded until the entry is actually read, so one odd
    /// neighbour cannot spoil a lookup of another package.
    #[serde(default)]
    pub revision: serde_json::Value,
    #[serde(default)]
    pub version: Option<String>,
    /// Snaps without applications (bases, content snaps) omit the key.
    #[serde(default)]
    pub apps: Vec<AppEntry>,
}

/// One application declared by a snap.
#[derive(Debug, Clone, Deserialize)]
pub struct AppEntry {
    /// Service type (`simple`, `forking`, ...); present only for services.
    #[serde(default)]
    pub daemon: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl AppEntry {
    pub fn is_daemon(&self) -> bool {
        self.daemon.is_some()
    }
}

impl SnapEntry {
    /// Classify the snap's service shape.
    ///
    /// Zero daemon apps is a plain package. Exactly one is a service whose
    /// `active` flag (absent means inactive) decides whether it runs. More
    /// than one is refused as [`SnapdError::UnsupportedShape`].
    pub fn service_state(&self) -> Result<ServiceState, SnapdError> {
        let mut daemons = self.apps.iter().filter(|app| app.is_daemon());
        match (daemons.next(), daemons.next()) {
            (None, _) => Ok(ServiceState::NotService),
            (Some(app), None) => Ok(ServiceState::Service {
                active: app.active.unwrap_or(false),
            }),
            (Some(_), Some(_)) => Err(SnapdError::UnsupportedShape {
                package: self.name.clone(),
                daemon_apps: self.apps.iter().filter(|app| app.is_daemon()).count(),
            }),
        }
    }

    pub fn to_record(&self) -> Result<PackageRecord, SnapdError> {
        let revision = match &self.revision {
            serde_json::Value::String(raw) => parse_revision(raw)?,
            other => {
                return Err(CoreError::MalformedRevision {
                    raw: other.to_string(),
                }
                .into())
            }
        };
        let mut record = PackageRecord::new(self.name.as_str(), revision, self.service_state()?);
        record.version = self.version.clone();
        Ok(record)
    }
}
