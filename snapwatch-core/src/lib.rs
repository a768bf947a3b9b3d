//! snapwatch core library — domain types, revision parsing, configuration, errors.
//!
//! - [`types`] — newtypes and the [`PackageRecord`] snapshot
//! - [`revision`] — marker-stripping revision parser
//! - [`config`] — YAML watch configuration
//! - [`error`] — [`CoreError`]

pub mod config;
pub mod error;
pub mod revision;
pub mod types;

pub use config::WatchConfig;
pub use error::CoreError;
pub use revision::parse_revision;
pub use types::{PackageName, PackageRecord, Revision, ServiceState};
