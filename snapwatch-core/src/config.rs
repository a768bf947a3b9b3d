//! YAML watch configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.config/snapwatch/
//!   config.yaml   (optional; every field has a default)
//! ```
//!
//! # API pattern
//!
//! - `load_at(path)` — explicit file; the file must exist
//! - `load_or_default(path)` — explicit file if given, otherwise the default
//!   location if present, otherwise built-in defaults
//!
//! Tests must use `load_at` or pass an explicit path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::PackageName;

/// snapd's control socket.
pub const DEFAULT_SOCKET_PATH: &str = "/run/snapd.socket";
/// The update agent under test.
pub const DEFAULT_PACKAGE: &str = "phantom-agent";
/// The agent's local "update now" control endpoint.
pub const DEFAULT_TRIGGER_URL: &str = "http://localhost:30000/update_version_force";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// 1. Config type
// ---------------------------------------------------------------------------

/// Everything a watch session needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Unix socket of the package-manager daemon.
    pub socket_path: PathBuf,
    /// Package whose revision is observed.
    pub package: PackageName,
    /// URL fired once to ask the agent to update itself.
    pub trigger_url: String,
    pub poll_interval_secs: u64,
    /// Upper bound on the whole session, trigger included.
    pub timeout_secs: u64,
    /// Optional cap on post-trigger queries, applied on top of the timeout.
    pub max_polls: Option<u32>,
    /// Read/write timeout for a single daemon or trigger round-trip.
    pub io_timeout_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            package: PackageName::from(DEFAULT_PACKAGE),
            trigger_url: DEFAULT_TRIGGER_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_polls: None,
            io_timeout_secs: DEFAULT_IO_TIMEOUT_SECS,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    /// Reject values that would make the watcher spin or never start.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.package.as_str().trim().is_empty() {
            return Err(CoreError::InvalidConfig("package must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        if self.io_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "io_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.max_polls == Some(0) {
            return Err(CoreError::InvalidConfig(
                "max_polls must be greater than zero when set".into(),
            ));
        }
        if !self.trigger_url.starts_with("http://") {
            return Err(CoreError::InvalidConfig(format!(
                "trigger_url must be a local http:// URL, got '{}'",
                self.trigger_url
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 2. Paths
// ---------------------------------------------------------------------------

/// `<config_dir>/snapwatch/config.yaml`. Pure, no I/O.
pub fn config_path_at(config_dir: &Path) -> PathBuf {
    config_dir.join("snapwatch").join("config.yaml")
}

/// `config_path_at` using `dirs::config_dir()`.
pub fn default_path() -> Result<PathBuf, CoreError> {
    dirs::config_dir()
        .map(|dir| config_path_at(&dir))
        .ok_or(CoreError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load and validate a config file.
///
/// Returns `CoreError::ConfigNotFound` if absent,
/// `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<WatchConfig, CoreError> {
    if !path.exists() {
        return Err(CoreError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty file is a valid "all defaults" config.
    let config: WatchConfig = if contents.trim().is_empty() {
        WatchConfig::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded watch config");
    Ok(config)
}

/// Resolve the effective config.
///
/// An explicit path must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
pub fn load_or_default(explicit: Option<&Path>) -> Result<WatchConfig, CoreError> {
    if let Some(path) = explicit {
        return load_at(path);
    }
    match default_path() {
        Ok(path) if path.exists() => load_at(&path),
        Ok(_) | Err(CoreError::HomeNotFound) => Ok(WatchConfig::default()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        WatchConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn default_durations_match_reference_cadence() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.timeout(), Duration::from_secs(600));
        assert_eq!(config.max_polls, None);
    }

    #[test]
    fn config_path_is_nested_under_app_dir() {
        let path = config_path_at(Path::new("/home/u/.config"));
        assert_eq!(path, PathBuf::from("/home/u/.config/snapwatch/config.yaml"));
    }
}
