//! Exercises a real server over loopback sockets.

use std::net::SocketAddr;
use std::time::Duration;

use cachet_protocol::Reply;
use cachet_server::{CacheServer, ServerConfig};
use cachet_store::{LifecycleState, StoreConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

fn local_config() -> ServerConfig {
    ServerConfig {
        http_addr: "127.0.0.1:0".parse().unwrap(),
        udp_addr: "127.0.0.1:0".parse().unwrap(),
        shutdown_timeout: Duration::from_secs(2),
        store: StoreConfig::default().with_cleanup_interval(Duration::from_millis(50)),
        ..ServerConfig::default()
    }
}

/// Minimal HTTP/1.1 exchange; returns status code and parsed JSON body.
async fn http(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, Value) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap()
    };
    (status, json)
}

async fn udp(addr: SocketAddr, request: Value) -> Reply {
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(&serde_json::to_vec(&request).unwrap(), addr)
        .await
        .unwrap();
    let mut buf = vec![0u8; 8192];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    Reply::from_slice(&buf[..len]).unwrap()
}

#[tokio::test]
async fn http_and_udp_share_one_store() {
    let server = CacheServer::bind(local_config()).await.unwrap();
    let http_addr = server.http_addr().unwrap();
    let udp_addr = server.udp_addr().unwrap();
    let store = server.store().clone();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run(async move {
        let _ = stop_rx.await;
    }));

    // Write over HTTP, read over UDP.
    let (status, body) = http(http_addr, "POST", "/api/v1/set/user?ttl=1m", r#"{"name":"ada"}"#).await;
    assert_eq!(status, 201);
    assert_eq!(body, json!({"message": "success"}));

    let reply = udp(udp_addr, json!({"cmd": "GET", "key": "user"})).await;
    assert!(reply.success);
    assert_eq!(reply.value.unwrap()["data"], json!({"name": "ada"}));

    // Write over UDP, read over HTTP.
    let reply = udp(udp_addr, json!({"cmd": "set", "key": "n", "value": 7, "ttl": "1m"})).await;
    assert!(reply.success);
    let (status, body) = http(http_addr, "GET", "/api/v1/get/n", "").await;
    assert_eq!(status, 200);
    assert_eq!(body["value"], 7);
    assert_eq!(body["meta"]["createdAt"], body["meta"]["modifiedAt"]);

    // Expiry is visible on both transports.
    let (status, _) = http(http_addr, "POST", "/api/v1/set/brief?ttl=10ms", "\"x\"").await;
    assert_eq!(status, 201);
    tokio::time::sleep(Duration::from_millis(60)).await;
    let (status, body) = http(http_addr, "GET", "/api/v1/get/brief", "").await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "not found"}));
    let reply = udp(udp_addr, json!({"cmd": "HAS", "key": "brief"})).await;
    assert_eq!(reply.value, Some(json!(false)));

    let (status, body) = http(http_addr, "DELETE", "/api/v1/delete/user", "").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"message": "success"}));
    let (_, body) = http(http_addr, "GET", "/api/v1/has/user", "").await;
    assert_eq!(body, json!({"exists": false}));

    let (status, body) = http(http_addr, "GET", "/api/v1/health", "").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(store.state(), LifecycleState::Closed);
}

#[tokio::test]
async fn malformed_datagram_gets_error_reply() {
    let server = CacheServer::bind(local_config()).await.unwrap();
    let udp_addr = server.udp_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run(async move {
        let _ = stop_rx.await;
    }));

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"{oops", udp_addr).await.unwrap();
    let mut buf = [0u8; 1024];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let reply = Reply::from_slice(&buf[..len]).unwrap();
    assert_eq!(reply.cmd, "");
    assert!(!reply.success);

    stop_tx.send(()).unwrap();
    running.await.unwrap().unwrap();
}
