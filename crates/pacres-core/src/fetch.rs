//! Minimal HTTP/1.0 fetch client for PAC retrieval
//!
//! PAC files are small administrative payloads served over plain HTTP; this
//! client deliberately implements nothing beyond a single GET with
//! `Connection: close` — no redirects, no TLS, no chunked transfer, no
//! retries. What it does implement is careful: the response headers are
//! untrusted text, so every buffer is growable but explicitly capped.
//!
//! Cancellation is observed before each suspension point (address
//! resolution, connect, send, each receive).

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};
use tracing::debug;
use url::Url;

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};

/// Cap on the response head (status line + headers + first body bytes)
const MAX_HEADER_BYTES: usize = 16 * 1024;

/// Cap on the declared body size; PAC files larger than this are hostile
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Fetch the body of `url` over HTTP/1.0
///
/// The URL must use the `http://` scheme; `https://` (and anything else)
/// is rejected with [`Error::Unsupported`] before any socket is opened.
/// The response must carry a positive `Content-Length`; the body is read
/// until exactly that many bytes have arrived, or the peer's early close
/// yields [`Error::Truncated`]. Fetch is all-or-nothing — no partial body
/// is ever returned.
pub async fn fetch(url: &str, cancel: &CancelFlag) -> Result<Vec<u8>> {
    let parsed =
        Url::parse(url).map_err(|e| Error::address_resolution(format!("bad URL {url}: {e}")))?;

    if parsed.scheme() != "http" {
        return Err(Error::unsupported(format!(
            "{} retrieval not supported",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| Error::address_resolution(format!("no host in {url}")))?
        .to_string();
    let port = parsed.port().unwrap_or(80);
    let path = match parsed.query() {
        Some(query) => format!("{}?{}", parsed.path(), query),
        None => parsed.path().to_string(),
    };

    cancel.check()?;
    let addr = lookup_host((host.as_str(), port))
        .await
        .map_err(|e| Error::address_resolution(format!("{host}: {e}")))?
        .next()
        .ok_or_else(|| Error::address_resolution(format!("{host}: no addresses")))?;

    cancel.check()?;
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::connect(format!("{addr}: {e}")))?;

    let request = format!(
        "GET {path} HTTP/1.0\r\nHost: {host}\r\nConnection: close\r\n\r\n"
    );

    cancel.check()?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| Error::send(e.to_string()))?;

    // Accumulate the response head until the header/body delimiter shows up.
    let mut head: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let body_start = loop {
        if let Some(pos) = find(&head, b"\r\n\r\n") {
            break pos + 4;
        }
        if head.len() >= MAX_HEADER_BYTES {
            return Err(Error::protocol("no header delimiter within cap"));
        }
        cancel.check()?;
        let count = stream
            .read(&mut chunk)
            .await
            .map_err(|e| Error::protocol(format!("recv failed: {e}")))?;
        if count == 0 {
            return Err(Error::protocol("connection closed before header delimiter"));
        }
        head.extend_from_slice(&chunk[..count]);
    };

    let content_length = content_length(&head[..body_start])?;
    if content_length > MAX_BODY_BYTES {
        return Err(Error::OutOfMemory(content_length));
    }

    debug!(
        "Fetching {} bytes from http://{}:{}{}",
        content_length, host, port, path
    );

    let mut body: Vec<u8> = Vec::with_capacity(content_length);
    let already = std::cmp::min(head.len() - body_start, content_length);
    body.extend_from_slice(&head[body_start..body_start + already]);

    while body.len() < content_length {
        cancel.check()?;
        let count = stream
            .read(&mut chunk)
            .await
            .map_err(|e| Error::protocol(format!("recv failed: {e}")))?;
        if count == 0 {
            return Err(Error::Truncated {
                expected: content_length,
                received: body.len(),
            });
        }
        let wanted = std::cmp::min(count, content_length - body.len());
        body.extend_from_slice(&chunk[..wanted]);
    }

    Ok(body)
}

/// Locate the Content-Length header in the response head
///
/// The key match is case-insensitive; absence or a non-positive value is a
/// hard failure — without a declared length this client cannot tell a
/// complete body from a truncated one.
fn content_length(head: &[u8]) -> Result<usize> {
    let text = String::from_utf8_lossy(head);
    for line in text.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let length: i64 = value
                .trim()
                .parse()
                .map_err(|_| Error::protocol(format!("bad Content-Length: {}", value.trim())))?;
            if length <= 0 {
                return Err(Error::protocol(format!("non-positive Content-Length: {length}")));
            }
            return Ok(length as usize);
        }
    }
    Err(Error::protocol("missing Content-Length header"))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn https_is_rejected_before_any_socket() {
        let err = fetch("https://wpad.example.com/wpad.dat", &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let err = fetch("ftp://wpad.example.com/wpad.dat", &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn cancelled_flag_stops_before_resolution() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = fetch("http://wpad.example.com/wpad.dat", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
    }

    #[test]
    fn content_length_is_case_insensitive() {
        let head = b"HTTP/1.0 200 OK\r\ncontent-LENGTH: 42\r\n\r\n";
        assert_eq!(content_length(head).unwrap(), 42);
    }

    #[test]
    fn missing_content_length_is_protocol_error() {
        let head = b"HTTP/1.0 200 OK\r\nServer: x\r\n\r\n";
        assert!(matches!(content_length(head), Err(Error::Protocol(_))));
    }

    #[test]
    fn non_positive_content_length_is_protocol_error() {
        let head = b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n";
        assert!(matches!(content_length(head), Err(Error::Protocol(_))));
        let head = b"HTTP/1.0 200 OK\r\nContent-Length: -5\r\n\r\n";
        assert!(matches!(content_length(head), Err(Error::Protocol(_))));
    }
}
