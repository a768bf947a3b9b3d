pub mod info;
pub mod installed;
pub mod list;
pub mod watch;

use snapwatch_core::{PackageName, PackageRecord, WatchConfig};
use snapwatch_snapd::SnapdClient;

use serde::Serialize;

/// Package given on the command line, else the configured one.
pub fn package_or_default(package: Option<String>, config: &WatchConfig) -> PackageName {
    package.map(PackageName::from).unwrap_or_else(|| config.package.clone())
}

pub fn client(config: &WatchConfig) -> SnapdClient {
    SnapdClient::from_config(config)
}

/// Flat JSON view of a record, with both derived flags spelled out.
#[derive(Debug, Serialize)]
pub struct RecordJson {
    pub name: String,
    pub version: Option<String>,
    pub revision: u64,
    pub is_daemon: bool,
    pub is_running: bool,
}

impl From<&PackageRecord> for RecordJson {
    fn from(record: &PackageRecord) -> Self {
        Self {
            name: record.name.0.clone(),
            version: record.version.clone(),
            revision: record.revision.0,
            is_daemon: record.is_daemon(),
            is_running: record.is_running(),
        }
    }
}

pub fn service_label(record: &PackageRecord) -> &'static str {
    match (record.is_daemon(), record.is_running()) {
        (false, _) => "-",
        (true, true) => "active",
        (true, false) => "inactive",
    }
}
