use std::sync::{Arc, Mutex};

use aws_sdk_s3::config::{retry::RetryConfig, BehaviorVersion, Credentials, Region};
use billing_notifier::{
    domain::{error::BillingError, ports::FileFetcher},
    infrastructure::storage::s3_adapter::S3Adapter,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone, Copy)]
enum Reply {
    /// 200 with a chunked transfer-encoded body made of these parts.
    Chunked(&'static [&'static str]),
    /// 404 with an S3 `NoSuchKey` error document.
    NoSuchKey,
    /// 200 that promises more bytes than it sends, then hangs up.
    Truncated,
}

/// Stands in for an S3 endpoint: answers every request with `reply` and
/// records the request lines it saw.
async fn fake_s3(reply: Reply) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let log = log.clone();
            tokio::spawn(async move { serve(socket, reply, log).await });
        }
    });

    (endpoint, seen)
}

async fn serve(mut socket: TcpStream, reply: Reply, log: Arc<Mutex<Vec<String>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let head = String::from_utf8_lossy(&buf).to_string();
    log.lock().unwrap().push(head.lines().next().unwrap_or_default().to_string());

    match reply {
        Reply::Chunked(parts) => {
            let headers = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                           transfer-encoding: chunked\r\nconnection: close\r\n\r\n";
            socket.write_all(headers.as_bytes()).await.unwrap();
            for part in parts {
                let frame = format!("{:x}\r\n{}\r\n", part.len(), part);
                socket.write_all(frame.as_bytes()).await.unwrap();
                socket.flush().await.unwrap();
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
        },
        Reply::NoSuchKey => {
            let body = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                        <Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message>\
                        <Key>billing-missing.json</Key><RequestId>4442587FB7D0A2F9</RequestId></Error>";
            let response = format!(
                "HTTP/1.1 404 Not Found\r\ncontent-type: application/xml\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        },
        Reply::Truncated => {
            let response = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                            content-length: 64\r\nconnection: close\r\n\r\n[{\"projec";
            socket.write_all(response.as_bytes()).await.unwrap();
        },
    }
    socket.shutdown().await.ok();
}

fn adapter(endpoint: &str) -> S3Adapter {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .retry_config(RetryConfig::disabled())
        .endpoint_url(endpoint)
        .force_path_style(true)
        .build();
    S3Adapter::new(aws_sdk_s3::Client::from_conf(config))
}

#[tokio::test]
async fn test_chunked_body_is_assembled() {
    let parts: &'static [&'static str] = &[
        r#"[{"projectId":"p1","#,
        r#""description":"compute","#,
        r#""cost":{"amount":0.0}}]"#,
    ];
    let (endpoint, seen) = fake_s3(Reply::Chunked(parts)).await;

    let bytes = adapter(&endpoint).fetch_file("b1", "billing-2024-01.json").await.unwrap();

    assert_eq!(String::from_utf8(bytes).unwrap(), parts.concat());
    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].starts_with("GET /b1/billing-2024-01.json"),
        "expected a path-style GetObject, got {}",
        requests[0]
    );
}

#[tokio::test]
async fn test_no_such_key_is_fetch_error() {
    let (endpoint, _) = fake_s3(Reply::NoSuchKey).await;

    let result = adapter(&endpoint).fetch_file("b1", "billing-missing.json").await;

    match result {
        Err(BillingError::Fetch(msg)) => assert!(msg.contains("not found"), "unexpected message: {}", msg),
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_broken_stream_is_fetch_error() {
    let (endpoint, _) = fake_s3(Reply::Truncated).await;

    let result = adapter(&endpoint).fetch_file("b1", "billing-2024-01.json").await;

    assert!(matches!(result, Err(BillingError::Fetch(_))), "got {:?}", result);
}
