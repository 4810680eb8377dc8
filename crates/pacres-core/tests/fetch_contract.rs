//! Contract tests for the minimal PAC fetch client
//!
//! Each test stands up a real TCP listener serving a canned HTTP/1.0
//! response and verifies the client's framing behavior against it:
//! exact-length bodies, fragmented delivery, missing or malformed
//! Content-Length, and truncated transfers.

use std::time::Duration;

use pacres_core::cancel::CancelFlag;
use pacres_core::error::Error;
use pacres_core::fetch::fetch;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one connection, writing `chunks` in order with a short pause
/// between them, then close
async fn serve_chunks(chunks: Vec<Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            // Drain the request line and headers before answering.
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;

            for chunk in chunks {
                if socket.write_all(&chunk).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            let _ = socket.shutdown().await;
        }
    });

    format!("http://127.0.0.1:{}/wpad.dat", addr.port())
}

async fn serve_once(response: &[u8]) -> String {
    serve_chunks(vec![response.to_vec()]).await
}

#[tokio::test]
async fn fetch_returns_exact_declared_body() {
    let url = serve_once(
        b"HTTP/1.0 200 OK\r\n\
          Content-Type: application/x-ns-proxy-autoconfig\r\n\
          Content-Length: 11\r\n\
          \r\n\
          hello world",
    )
    .await;

    let body = fetch(&url, &CancelFlag::new()).await.unwrap();
    assert_eq!(body, b"hello world");
}

#[tokio::test]
async fn fetch_reassembles_fragmented_delivery() {
    // Headers split mid-line, body split mid-way, terminator split from
    // the headers it ends.
    let url = serve_chunks(vec![
        b"HTTP/1.0 200 OK\r\nContent-Le".to_vec(),
        b"ngth: 11\r\n".to_vec(),
        b"\r\n".to_vec(),
        b"hello ".to_vec(),
        b"world".to_vec(),
    ])
    .await;

    let body = fetch(&url, &CancelFlag::new()).await.unwrap();
    assert_eq!(body, b"hello world");
}

#[tokio::test]
async fn content_length_header_is_case_insensitive_on_the_wire() {
    let url = serve_once(b"HTTP/1.0 200 OK\r\ncontent-LENGTH: 5\r\n\r\nhello").await;

    let body = fetch(&url, &CancelFlag::new()).await.unwrap();
    assert_eq!(body, b"hello");
}

#[tokio::test]
async fn bytes_past_the_declared_length_are_dropped() {
    let url = serve_once(b"HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhelloEXTRA").await;

    let body = fetch(&url, &CancelFlag::new()).await.unwrap();
    assert_eq!(body, b"hello");
}

#[tokio::test]
async fn missing_content_length_is_a_protocol_error() {
    let url = serve_once(b"HTTP/1.0 200 OK\r\nServer: test\r\n\r\nbody").await;

    let err = fetch(&url, &CancelFlag::new()).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn non_positive_content_length_is_a_protocol_error() {
    let url = serve_once(b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n").await;

    let err = fetch(&url, &CancelFlag::new()).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn early_close_reports_expected_and_received() {
    let url = serve_once(b"HTTP/1.0 200 OK\r\nContent-Length: 100\r\n\r\nshort").await;

    let err = fetch(&url, &CancelFlag::new()).await.unwrap_err();
    assert_eq!(
        err,
        Error::Truncated {
            expected: 100,
            received: 5
        }
    );
}

#[tokio::test]
async fn connection_refused_maps_to_connect_error() {
    // Bind then drop to find a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = format!("http://127.0.0.1:{port}/wpad.dat");
    let err = fetch(&url, &CancelFlag::new()).await.unwrap_err();
    assert!(matches!(err, Error::Connect(_)), "got {err:?}");
}

#[tokio::test]
async fn cancelled_flag_wins_over_a_ready_server() {
    let url = serve_once(b"HTTP/1.0 200 OK\r\nContent-Length: 2\r\n\r\nok").await;

    let cancel = CancelFlag::new();
    cancel.cancel();
    let err = fetch(&url, &cancel).await.unwrap_err();
    assert_eq!(err, Error::Cancelled);
}
