use std::time::Duration;

use snapwatch_core::config::DEFAULT_IO_TIMEOUT_SECS;

/// Virtual host written into the `Host` header. Never resolved or dialed.
pub const PLACEHOLDER_HOST: &str = "snapd";

/// Lists every installed snap. snapd offers `?snaps=` filtering, but the
/// full list is fetched so a missing package is seen as absent, not as an error.
pub const SNAPS_ENDPOINT: &str = "/v2/snaps";

pub const USER_AGENT: &str = concat!("snapwatch/", env!("CARGO_PKG_VERSION"));

/// Fallback per-connection read/write timeout, shared with the config default.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(DEFAULT_IO_TIMEOUT_SECS);

/// Upper bound on one daemon response, headers included.
pub const MAX_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;
