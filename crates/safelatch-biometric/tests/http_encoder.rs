//! HTTP face encoder against a local one-shot server.

use safelatch_biometric::{BiometricError, FaceEncoder, HttpFaceEncoder};
use safelatch_core::Frame;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one request with `status` and a JSON `body`, returning the
/// raw request bytes.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/encode", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);

        let Some(header_end) = find(&request, b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if request.len() >= header_end + 4 + content_length {
            break;
        }
    }

    request
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn frame() -> Frame {
    Frame::new(vec![0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9], 640, 480)
}

#[tokio::test]
async fn test_encode_parses_faces_in_order() {
    let body = serde_json::json!({ "faces": [[0.1, 0.2, 0.3], [1.0, 1.0, 1.0]] }).to_string();
    let (url, server) = serve_once("200 OK", body).await;

    let encoder = HttpFaceEncoder::new(url, 3, Duration::from_secs(5)).unwrap();
    let faces = encoder.encode(&frame()).await.unwrap();

    assert_eq!(faces.len(), 2);
    assert_eq!(faces[0].features(), &[0.1, 0.2, 0.3]);

    let request = server.await.unwrap();
    let text = String::from_utf8_lossy(&request).to_lowercase();
    assert!(text.starts_with("post /encode"));
    assert!(text.contains("content-type: image/jpeg"));
    assert!(request.ends_with(&[0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9]));
}

#[tokio::test]
async fn test_encode_no_faces() {
    let (url, server) = serve_once("200 OK", r#"{"faces": []}"#.to_string()).await;

    let encoder = HttpFaceEncoder::new(url, 128, Duration::from_secs(5)).unwrap();
    assert!(encoder.encode(&frame()).await.unwrap().is_empty());
    server.await.unwrap();
}

#[tokio::test]
async fn test_encode_rejects_wrong_dimension() {
    let (url, server) = serve_once("200 OK", r#"{"faces": [[0.1, 0.2]]}"#.to_string()).await;

    let encoder = HttpFaceEncoder::new(url, 128, Duration::from_secs(5)).unwrap();
    let err = encoder.encode(&frame()).await.unwrap_err();
    assert!(matches!(err, BiometricError::InvalidResponse { .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_encode_reports_error_status() {
    let (url, server) =
        serve_once("503 Service Unavailable", r#"{"error": "busy"}"#.to_string()).await;

    let encoder = HttpFaceEncoder::new(url, 128, Duration::from_secs(5)).unwrap();
    let err = encoder.encode(&frame()).await.unwrap_err();
    assert!(matches!(err, BiometricError::EncoderStatus { status: 503, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_encode_connection_refused() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/encode", listener.local_addr().unwrap());
    drop(listener);

    let encoder = HttpFaceEncoder::new(url, 128, Duration::from_secs(5)).unwrap();
    let err = encoder.encode(&frame()).await.unwrap_err();
    assert!(matches!(err, BiometricError::Http(_)));
}
