//! Minimal HTTP/1.1 framing for one request per connection.
//!
//! Requests always carry `Connection: close`, so a response is complete at
//! EOF. The body is framed by `Transfer-Encoding: chunked` when present,
//! else `Content-Length`, else everything up to EOF.

use crate::error::SnapdError;
use crate::paths::USER_AGENT;

/// A fully-read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Serialize a body-less GET for `path` addressed to `host`.
pub fn encode_get(host: &str, path: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\nHost: {host}\r\nUser-Agent: {USER_AGENT}\r\nAccept: application/json\r\nConnection: close\r\n\r\n"
    )
}

/// Parse a complete raw response as read up to EOF.
pub fn decode_response(raw: &[u8]) -> Result<HttpResponse, SnapdError> {
    let split = find(raw, b"\r\n\r\n")
        .ok_or_else(|| SnapdError::Http("response missing header delimiter".to_string()))?;
    let header_text = std::str::from_utf8(&raw[..split])
        .map_err(|_| SnapdError::Http("response headers are not UTF-8".to_string()))?;
    let rest = &raw[split + 4..];

    let mut lines = header_text.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| SnapdError::Http("response missing status line".to_string()))?;
    let status = parse_status_line(status_line)?;

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let mut response = HttpResponse {
        status,
        headers,
        body: Vec::new(),
    };

    let chunked = response
        .header("transfer-encoding")
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);

    response.body = if chunked {
        decode_chunked(rest)?
    } else if let Some(length) = response.header("content-length") {
        let length: usize = length
            .parse()
            .map_err(|_| SnapdError::Http(format!("invalid content-length '{length}'")))?;
        if rest.len() < length {
            return Err(SnapdError::Http(format!(
                "truncated body: expected {length} bytes, got {}",
                rest.len()
            )));
        }
        rest[..length].to_vec()
    } else {
        rest.to_vec()
    };

    Ok(response)
}

fn parse_status_line(line: &str) -> Result<u16, SnapdError> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(SnapdError::Http(format!("unexpected status line '{line}'")));
    }
    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| SnapdError::Http(format!("invalid status in '{line}'")))
}

fn decode_chunked(mut body: &[u8]) -> Result<Vec<u8>, SnapdError> {
    let mut out = Vec::new();
    loop {
        let line_end = find(body, b"\r\n")
            .ok_or_else(|| SnapdError::Http("truncated chunk size line".to_string()))?;
        let size_line = std::str::from_utf8(&body[..line_end])
            .map_err(|_| SnapdError::Http("chunk size is not UTF-8".to_string()))?;
        // Chunk extensions follow ';'.
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| SnapdError::Http(format!("invalid chunk size '{size_hex}'")))?;
        body = &body[line_end + 2..];

        if size == 0 {
            return Ok(out);
        }
        if body.len() < size + 2 {
            return Err(SnapdError::Http("truncated chunk".to_string()));
        }
        out.extend_from_slice(&body[..size]);
        if &body[size..size + 2] != b"\r\n" {
            return Err(SnapdError::Http("chunk not terminated by CRLF".to_string()));
        }
        body = &body[size + 2..];
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_request_carries_placeholder_host_and_close() {
        let request = encode_get("snapd", "/v2/snaps");
        assert!(request.starts_with("GET /v2/snaps HTTP/1.1\r\n"));
        assert!(request.contains("\r\nHost: snapd\r\n"));
        assert!(request.contains("\r\nConnection: close\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn content_length_bounds_the_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}trailing";
        let response = decode_response(raw).expect("decode");
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.body, b"{}");
    }

    #[test]
    fn chunked_body_is_reassembled() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n{\"a\"\r\n3;ext=1\r\n:1}\r\n0\r\n\r\n";
        let response = decode_response(raw).expect("decode");
        assert_eq!(response.body, b"{\"a\":1}");
    }

    #[test]
    fn missing_length_reads_to_eof() {
        let raw = b"HTTP/1.0 404 Not Found\r\n\r\nnope";
        let response = decode_response(raw).expect("decode");
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert_eq!(response.body, b"nope");
    }

    #[test]
    fn truncated_body_is_an_http_error() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n{}";
        let err = decode_response(raw).unwrap_err();
        assert!(matches!(err, SnapdError::Http(_)), "got: {err}");
    }

    #[test]
    fn garbage_is_an_http_error() {
        let err = decode_response(b"not http at all").unwrap_err();
        assert!(matches!(err, SnapdError::Http(_)), "got: {err}");

        let err = decode_response(b"SSH-2.0-OpenSSH\r\n\r\n").unwrap_err();
        assert!(err.to_string().contains("unexpected status line"), "got: {err}");
    }
}
