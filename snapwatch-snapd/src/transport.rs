//! Unix-socket connection factory.
//!
//! A [`SocketPool`] stands for one placeholder host. Every checkout dials a
//! fresh [`SocketConnection`] to the same fixed path; nothing is multiplexed
//! or kept alive between requests. A connection is shut down when it is
//! dropped, so every exit path releases the socket.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{io_err, SnapdError};
use crate::http::{decode_response, encode_get, HttpResponse};
use crate::paths::{DEFAULT_IO_TIMEOUT, MAX_RESPONSE_BYTES, PLACEHOLDER_HOST};

/// Connection factory for one placeholder host bound to one socket path.
#[derive(Debug, Clone)]
pub struct SocketPool {
    socket: PathBuf,
    host: String,
    io_timeout: Duration,
    max_response_bytes: u64,
}

impl SocketPool {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
            host: PLACEHOLDER_HOST.to_string(),
            io_timeout: DEFAULT_IO_TIMEOUT,
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: u64) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Open a new stream socket to the fixed path.
    ///
    /// A missing path or a refused connection is `TransportUnavailable`;
    /// anything else is an annotated I/O error.
    pub fn dial(&self) -> Result<SocketConnection, SnapdError> {
        if !self.socket.exists() {
            return Err(SnapdError::TransportUnavailable {
                socket: self.socket.clone(),
                reason: "socket path does not exist".to_string(),
            });
        }

        let stream = UnixStream::connect(&self.socket).map_err(|err| {
            if matches!(
                err.kind(),
                std::io::ErrorKind::NotFound
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
            ) {
                SnapdError::TransportUnavailable {
                    socket: self.socket.clone(),
                    reason: err.to_string(),
                }
            } else {
                io_err(&self.socket, err)
            }
        })?;

        stream
            .set_read_timeout(Some(self.io_timeout))
            .map_err(|e| io_err(&self.socket, e))?;
        stream
            .set_write_timeout(Some(self.io_timeout))
            .map_err(|e| io_err(&self.socket, e))?;

        tracing::trace!(socket = %self.socket.display(), "dialed daemon socket");
        Ok(SocketConnection {
            stream,
            socket: self.socket.clone(),
            max_response_bytes: self.max_response_bytes,
        })
    }

    /// Dial, issue one GET, and release the connection.
    pub fn get(&self, path: &str) -> Result<HttpResponse, SnapdError> {
        let mut connection = self.dial()?;
        connection.get(&self.host, path)
    }
}

/// One single-use connection to the daemon socket.
#[derive(Debug)]
pub struct SocketConnection {
    stream: UnixStream,
    socket: PathBuf,
    max_response_bytes: u64,
}

impl SocketConnection {
    /// Send a GET and read the response to EOF, refusing oversized replies.
    pub fn get(&mut self, host: &str, path: &str) -> Result<HttpResponse, SnapdError> {
        let request = encode_get(host, path);
        self.stream
            .write_all(request.as_bytes())
            .map_err(|e| io_err(&self.socket, e))?;
        self.stream.flush().map_err(|e| io_err(&self.socket, e))?;

        let mut raw = Vec::new();
        (&self.stream)
            .take(self.max_response_bytes + 1)
            .read_to_end(&mut raw)
            .map_err(|e| io_err(&self.socket, e))?;
        if raw.len() as u64 > self.max_response_bytes {
            return Err(SnapdError::Http(format!(
                "response exceeds {} bytes",
                self.max_response_bytes
            )));
        }
        if raw.is_empty() {
            return Err(SnapdError::Http(
                "daemon closed connection before responding".to_string(),
            ));
        }

        let response = decode_response(&raw)?;
        tracing::debug!(
            socket = %self.socket.display(),
            path,
            status = response.status,
            bytes = response.body.len(),
            "daemon request completed",
        );
        Ok(response)
    }
}

impl Drop for SocketConnection {
    fn drop(&mut self) {
        // NotConnected is expected when the daemon already closed its side.
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
