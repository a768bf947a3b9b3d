//! Domain types for observing installed packages.
//!
//! A [`PackageRecord`] is a point-in-time snapshot built from one daemon
//! round-trip. It is compared and dropped; nothing here is cached.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed package (snap) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageName(pub String);

impl PackageName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Integer install counter assigned by the package manager to each build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Revision(pub u64);

impl Revision {
    /// The revision a single successful refresh is expected to produce.
    pub fn next(self) -> Revision {
        Revision(self.0.saturating_add(1))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Service state
// ---------------------------------------------------------------------------

/// Whether the package runs as a service, and if so whether it is active.
///
/// Modelling "running" inside the service variant makes a running
/// non-service unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ServiceState {
    #[default]
    NotService,
    Service {
        active: bool,
    },
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One installed package as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: PackageName,
    pub revision: Revision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub service: ServiceState,
}

impl PackageRecord {
    pub fn new(name: impl Into<PackageName>, revision: Revision, service: ServiceState) -> Self {
        Self {
            name: name.into(),
            revision,
            version: None,
            service,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// True if the package declares exactly one daemon app.
    pub fn is_daemon(&self) -> bool {
        matches!(self.service, ServiceState::Service { .. })
    }

    /// True only for a daemon package whose service is active.
    pub fn is_running(&self) -> bool {
        matches!(self.service, ServiceState::Service { active: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_implies_daemon_for_every_state() {
        for service in [
            ServiceState::NotService,
            ServiceState::Service { active: false },
            ServiceState::Service { active: true },
        ] {
            let record = PackageRecord::new("phantom-agent", Revision(1), service);
            assert!(
                !record.is_running() || record.is_daemon(),
                "running without daemon for {service:?}"
            );
        }
    }

    #[test]
    fn next_revision_is_one_higher() {
        assert_eq!(Revision(42).next(), Revision(43));
        assert_eq!(Revision(u64::MAX).next(), Revision(u64::MAX));
    }

    #[test]
    fn serialized_record_carries_service_kind() {
        let record = PackageRecord::new(
            "phantom-agent",
            Revision(7),
            ServiceState::Service { active: true },
        )
        .with_version("0.6.14");
        let yaml = serde_yaml::to_string(&record).expect("serialize record");
        assert!(yaml.contains("kind: service"), "got: {yaml}");
        assert!(yaml.contains("active: true"), "got: {yaml}");
        assert!(yaml.contains("0.6.14"), "got: {yaml}");
    }
}
