//! End-to-end tests for the remote structured path.
//!
//! Each test starts a one-shot HTTP endpoint on localhost that records the
//! request and answers with a canned chat-completion response.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use orderscan::{recognize, Method, RecognitionOutput, RecognizeConfig, RecognizeError};
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

// ── Stub endpoint ────────────────────────────────────────────────────────────

struct CapturedRequest {
    head: String,
    body: String,
}

/// Serve exactly one request, answering with `status_line` and `body`.
async fn stub_endpoint(status_line: &'static str, body: String) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}/v1/chat/completions"), handle)
}

async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 16 * 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        head,
        body: String::from_utf8_lossy(&buf[header_end..header_end + content_length]).into_owned(),
    }
}

fn envelope(content: &str) -> String {
    serde_json::json!({
        "id": "cmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

const INVOICE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nstub image bytes";

fn invoice(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("invoice.png");
    std::fs::write(&path, INVOICE_BYTES).unwrap();
    path
}

fn config(endpoint: &str) -> RecognizeConfig {
    RecognizeConfig::builder()
        .endpoint(endpoint)
        .api_token("abc123")
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fenced_reply_becomes_order_record() {
    let body = r##"{"choices":[{"message":{"content":"```json\n{\"customer_name\":\"Jane\",\"order_date\":\"2025-01-01\",\"items\":[],\"status\":1}\n```"}}]}"##;
    let (url, server) = stub_endpoint("200 OK", body.to_string()).await;
    let dir = tempfile::tempdir().unwrap();

    let output = recognize(invoice(&dir), Some(Method::RemoteStructured), &config(&url))
        .await
        .expect("remote extraction should succeed");

    let order = output.as_order().expect("order output");
    assert_eq!(order.customer_name, "Jane");
    assert_eq!(order.order_date, "2025-01-01");
    assert!(order.items.is_empty());
    assert_eq!(order.status, 1);

    let request = server.await.unwrap();
    let head = request.head.to_ascii_lowercase();
    assert!(head.starts_with("post /v1/chat/completions"), "got: {head}");
    assert!(head.contains("authorization: bearer abc123"), "got: {head}");

    let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    let image = &sent["messages"][1]["content"][1]["image_url"];
    let payload = image["url"]
        .as_str()
        .unwrap()
        .strip_prefix("data:image/png;base64,")
        .expect("png data-URI");
    assert_eq!(STANDARD.decode(payload).unwrap(), INVOICE_BYTES);
    assert_eq!(image["detail"], "low");
    assert_eq!(sent["top_k"], 50);
}

#[tokio::test]
async fn missing_method_on_image_uses_remote_path() {
    let reply = r#"{"customer_name":"Li","order_date":"2025-02-02","items":[{"product_id":"P001","matched_name":"Apple MacBook Air M2","original_input":"mac air","quantity":2,"match_score":0.9}],"status":"completed"}"#;
    let (url, _server) = stub_endpoint("200 OK", envelope(reply)).await;
    let dir = tempfile::tempdir().unwrap();

    let output = recognize(invoice(&dir), None, &config(&url)).await.unwrap();
    match output {
        RecognitionOutput::Order(order) => {
            assert_eq!(order.items.len(), 1);
            assert_eq!(order.items[0].quantity, 2);
            assert_eq!(order.status, 1);
        }
        other => panic!("expected order, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_auth_error() {
    let (url, _server) =
        stub_endpoint("401 Unauthorized", r#"{"message":"Invalid token"}"#.to_string()).await;
    let dir = tempfile::tempdir().unwrap();

    let err = recognize(invoice(&dir), Some(Method::RemoteStructured), &config(&url))
        .await
        .unwrap_err();
    assert!(matches!(err, RecognizeError::Auth { status: Some(401), .. }), "got: {err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_error_is_retryable_network_error() {
    let (url, _server) =
        stub_endpoint("503 Service Unavailable", "overloaded".to_string()).await;
    let dir = tempfile::tempdir().unwrap();

    let err = recognize(invoice(&dir), Some(Method::RemoteStructured), &config(&url))
        .await
        .unwrap_err();
    assert!(matches!(err, RecognizeError::Network { .. }), "got: {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn non_json_reply_is_malformed_json() {
    let (url, _server) = stub_endpoint("200 OK", envelope("Sorry, I cannot read this image.")).await;
    let dir = tempfile::tempdir().unwrap();

    let err = recognize(invoice(&dir), Some(Method::RemoteStructured), &config(&url))
        .await
        .unwrap_err();
    assert!(matches!(err, RecognizeError::MalformedJson { .. }), "got: {err:?}");
}

#[tokio::test]
async fn wrong_envelope_is_malformed_response() {
    let (url, _server) = stub_endpoint("200 OK", r#"{"error":"no choices"}"#.to_string()).await;
    let dir = tempfile::tempdir().unwrap();

    let err = recognize(invoice(&dir), Some(Method::RemoteStructured), &config(&url))
        .await
        .unwrap_err();
    assert!(matches!(err, RecognizeError::MalformedResponse { .. }), "got: {err:?}");
}

#[tokio::test]
async fn schema_mismatch_is_schema_validation_error() {
    let reply = "```json\n{\"customer_name\":\"Jane\",\"order_date\":\"2025-01-01\",\"items\":[],\"status\":\"teleported\"}\n```";
    let (url, _server) = stub_endpoint("200 OK", envelope(reply)).await;
    let dir = tempfile::tempdir().unwrap();

    let err = recognize(invoice(&dir), Some(Method::RemoteStructured), &config(&url))
        .await
        .unwrap_err();
    assert!(matches!(err, RecognizeError::SchemaValidation { .. }), "got: {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = tempfile::tempdir().unwrap();

    let err = recognize(
        invoice(&dir),
        Some(Method::RemoteStructured),
        &config(&format!("http://{addr}/v1/chat/completions")),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RecognizeError::Network { .. }), "got: {err:?}");
}

#[tokio::test]
async fn silent_endpoint_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        drop(socket);
    });
    let dir = tempfile::tempdir().unwrap();

    let config = RecognizeConfig::builder()
        .endpoint(format!("http://{addr}/v1/chat/completions"))
        .api_token("abc123")
        .api_timeout_secs(1)
        .build()
        .unwrap();

    let err = recognize(invoice(&dir), Some(Method::RemoteStructured), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, RecognizeError::Timeout { secs: 1 }), "got: {err:?}");
}

#[tokio::test]
async fn missing_image_is_file_read_error() {
    let err = recognize(
        "/no/such/invoice.png",
        Some(Method::RemoteStructured),
        &config("http://127.0.0.1:9/unused"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RecognizeError::FileRead { .. }), "got: {err:?}");
}
