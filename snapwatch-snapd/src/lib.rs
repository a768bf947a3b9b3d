//! snapd access over its Unix control socket.
//!
//! The transport speaks plain HTTP/1.1 to a fixed socket path; the client
//! decodes the typed `/v2/snaps` response into [`PackageRecord`]s.
//!
//! [`PackageRecord`]: snapwatch_core::PackageRecord

pub mod client;
mod error;
pub mod http;
pub mod paths;
pub mod schema;
pub mod transport;

pub use client::SnapdClient;
pub use error::SnapdError;
pub use http::HttpResponse;
pub use transport::{SocketConnection, SocketPool};
