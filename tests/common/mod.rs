//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use http_traffic_log::{HttpServer, ServerConfig, Shutdown, TrafficLogConfig, TrafficLogger};

/// Traffic log config writing `access_%s.log` into `dir` with everything on.
pub fn traffic_config(dir: &tempfile::TempDir) -> TrafficLogConfig {
    TrafficLogConfig {
        enabled: true,
        include_body: true,
        file_name: dir.path().join("access_%s.log").display().to_string(),
        ..TrafficLogConfig::default()
    }
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub logger: Arc<TrafficLogger>,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn log_path(&self) -> PathBuf {
        self.logger.sink_path().expect("sink configured").to_path_buf()
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        self.handle.await.expect("server task panicked")
    }
}

/// Start the server with `config` on 127.0.0.1 and an ephemeral port.
pub async fn start_server(config: ServerConfig) -> TestServer {
    let logger = Arc::new(TrafficLogger::new(config.traffic_log.clone()).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, logger.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        logger,
        shutdown,
        handle,
    }
}

/// Client that does not keep idle connections, so shutdown is not held up.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a simple mock backend that returns a fixed response.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response_str = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.len(),
                    response
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Mock backend that waits `delay` before answering with `response`.
pub async fn start_slow_backend(response: &'static str, delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let response_str = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.len(),
                    response
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
            });
        }
    });

    addr
}

/// Send a raw HTTP/1.1 request and read until the server closes.
/// The request should carry `Connection: close`.
pub async fn send_raw(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

/// Raw chunked `POST` of `chunks` to `path`.
pub fn chunked_post(path: &str, chunks: &[&str]) -> String {
    let mut req = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n"
    );
    for chunk in chunks {
        req.push_str(&format!("{:x}\r\n{chunk}\r\n", chunk.len()));
    }
    req.push_str("0\r\n\r\n");
    req
}

/// One BEGIN..END unit read back from a traffic log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// e.g. "In Request"
    pub label: String,
    pub id: u64,
    pub content: String,
}

/// `(label, id, word)` if `line` is a framing line.
fn marker(line: &str) -> Option<(String, u64, String)> {
    let rest = line.strip_prefix('\'')?;
    let close = rest.find('\'')?;
    let tokens: Vec<&str> = rest[close + 1..].split_whitespace().collect();
    if tokens.len() != 5 || !tokens[4].starts_with("====") {
        return None;
    }
    let id = tokens[2].trim_matches('\'').parse().ok()?;
    Some((format!("{} {}", tokens[0], tokens[1]), id, tokens[3].to_string()))
}

/// Split a traffic log into blocks, panicking on any interleaving.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open: Option<(String, u64, Vec<&str>)> = None;

    for line in text.lines() {
        match marker(line) {
            Some((label, id, word)) if word == "BEGIN" => {
                assert!(open.is_none(), "block opened inside another: {line}");
                open = Some((label, id, Vec::new()));
            }
            Some((label, id, word)) => {
                assert!(word == "END" || word == "End", "unexpected marker: {line}");
                let (open_label, open_id, content) = open.take().expect("END without BEGIN");
                assert_eq!((open_label.as_str(), open_id), (label.as_str(), id), "mismatched END: {line}");
                blocks.push(Block {
                    label,
                    id,
                    content: content.join("\n"),
                });
            }
            None => {
                let (_, _, content) = open.as_mut().expect("content outside a block");
                content.push(line);
            }
        }
    }
    assert!(open.is_none(), "unterminated block");
    blocks
}

/// Read and parse the log at `path`.
pub fn read_blocks(path: &std::path::Path) -> Vec<Block> {
    parse_blocks(&std::fs::read_to_string(path).unwrap())
}
