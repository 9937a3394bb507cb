//! End-to-end test over a real TCP listener.

use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use regress_serve_api::serve;
use regress_serve_core::fixtures;
use regress_serve_core::ServiceState;

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_health_and_predict_over_tcp() {
    let dir = TempDir::new().unwrap();
    let path =
        fixtures::write_artifact(dir.path(), "model.json", &fixtures::ev_linear_predictor())
            .unwrap();
    let state = ServiceState::initialize(path).into_shared();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve(listener, state));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let health = raw_request(
        addr,
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(health.starts_with("HTTP/1.1 200"), "{}", health);
    assert!(health.contains(r#""status":"ok""#));

    let body = serde_json::Value::Object(fixtures::ev_request()).to_string();
    let predict = raw_request(
        addr,
        &format!(
            "POST /predict HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
    )
    .await;
    assert!(predict.starts_with("HTTP/1.1 200"), "{}", predict);
    assert!(predict.contains(r#""prediction":"#));

    server.abort();
}
