//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta un servidor real en un puerto efímero, con un document
//! root temporal, y le habla HTTP/1.1 crudo por `TcpStream`.

use flate2::read::GzDecoder;
use http11_server::config::Config;
use http11_server::router::FileResponder;
use http11_server::server::{Server, ShutdownHandle};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;

/// Servidor corriendo en background; se detiene al soltarlo
struct TestServer {
    addr: SocketAddr,
    handle: ShutdownHandle,
    runner: Option<JoinHandle<std::io::Result<()>>>,
    _root: TempDir,
}

impl TestServer {
    fn start() -> Self {
        Self::start_with(|_| {})
    }

    fn start_with(tweak: impl FnOnce(&mut Config)) -> Self {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("index.html"), "hi").unwrap();
        fs::write(root.path().join("big.txt"), "lorem ipsum dolor ".repeat(500)).unwrap();
        fs::create_dir(root.path().join("docs")).unwrap();
        fs::write(root.path().join("docs").join("notes.txt"), "notes").unwrap();

        let mut config = Config::default();
        config.port = 0;
        config.workers = 4;
        config.timeout_ms = 5_000;
        config.root = root.path().to_string_lossy().into_owned();
        tweak(&mut config);

        let responder = FileResponder::from_config(&config).unwrap();
        let server = Server::bind(&config, responder).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = server.shutdown_handle().unwrap();
        let runner = thread::spawn(move || server.run());

        Self {
            addr,
            handle,
            runner: Some(runner),
            _root: root,
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.shutdown();
        if let Some(runner) = self.runner.take() {
            runner.join().unwrap().unwrap();
        }
    }
}

/// Respuesta leída del socket
struct Reply {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Lee exactamente una respuesta (Content-Length o chunked)
fn read_reply<R: BufRead>(reader: &mut R, head_only: bool) -> Reply {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let status: u16 = line.split(' ').nth(1).unwrap().parse().unwrap();

    let mut headers = HashMap::new();
    loop {
        line.clear();
        reader.read_line(&mut line).unwrap();
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        let (name, value) = trimmed.split_once(':').unwrap();
        headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
    }

    let mut body = Vec::new();
    if head_only {
        // sin body
    } else if let Some(len) = headers.get("content-length") {
        body.resize(len.parse().unwrap(), 0);
        reader.read_exact(&mut body).unwrap();
    } else if headers.get("transfer-encoding").map(String::as_str) == Some("chunked") {
        loop {
            line.clear();
            reader.read_line(&mut line).unwrap();
            let size = usize::from_str_radix(line.trim_end(), 16).unwrap();
            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk).unwrap();
            if size == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..size]);
        }
    }

    Reply {
        status,
        headers,
        body,
    }
}

fn request(server: &TestServer, raw: &str) -> Reply {
    let mut stream = server.connect();
    stream.write_all(raw.as_bytes()).unwrap();
    read_reply(&mut BufReader::new(stream), raw.starts_with("HEAD"))
}

#[test]
fn test_serves_index_html() {
    let server = TestServer::start();
    let reply = request(&server, "GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Length"), Some("2"));
    assert_eq!(reply.body, b"hi");
}

#[test]
fn test_keep_alive_two_requests_same_socket() {
    let server = TestServer::start();
    let stream = server.connect();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    for _ in 0..2 {
        writer.write_all(b"GET /index.html HTTP/1.1\r\n\r\n").unwrap();
        let reply = read_reply(&mut reader, false);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("Connection"), Some("keep-alive"));
        assert_eq!(reply.body, b"hi");
    }
}

#[test]
fn test_pipelined_requests_are_not_interleaved() {
    let server = TestServer::start();
    let stream = server.connect();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    writer
        .write_all(b"GET /index.html HTTP/1.1\r\n\r\nGET /docs/notes.txt HTTP/1.1\r\n\r\n")
        .unwrap();

    assert_eq!(read_reply(&mut reader, false).body, b"hi");
    assert_eq!(read_reply(&mut reader, false).body, b"notes");
}

#[test]
fn test_connection_close_ignores_trailing_bytes() {
    let server = TestServer::start();
    let mut stream = server.connect();
    stream
        .write_all(b"GET /index.html HTTP/1.1\r\nConnection: close\r\n\r\nGET /index.html HTTP/1.1\r\n\r\n")
        .unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();

    assert_eq!(raw.matches("HTTP/1.1 200 OK").count(), 1);
    assert!(raw.contains("Connection: close\r\n"));
}

#[test]
fn test_unsupported_version_closes() {
    let server = TestServer::start();
    let mut stream = server.connect();
    stream.write_all(b"GET /index.html HTTP/1.0\r\n\r\n").unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();
    assert!(raw.starts_with("HTTP/1.1 505 HTTP Version Not Supported\r\n"));
}

#[test]
fn test_bad_request_line() {
    let server = TestServer::start();
    let reply = request(&server, "GET /index.html\r\n\r\n");
    assert_eq!(reply.status, 400);
}

#[test]
fn test_traversal_is_forbidden() {
    let server = TestServer::start();
    let reply = request(&server, "GET /../../etc/passwd HTTP/1.1\r\n\r\n");

    assert_eq!(reply.status, 403);
    assert_eq!(reply.header("Content-Type"), Some("application/json"));
}

#[test]
fn test_missing_file_is_not_found() {
    let server = TestServer::start();
    let reply = request(&server, "GET /nope.html HTTP/1.1\r\n\r\n");
    assert_eq!(reply.status, 404);
}

#[test]
fn test_method_not_allowed() {
    let server = TestServer::start();
    let reply = request(&server, "DELETE /index.html HTTP/1.1\r\n\r\n");

    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD"));
}

#[test]
fn test_head_has_headers_only() {
    let server = TestServer::start();
    let reply = request(&server, "HEAD /index.html HTTP/1.1\r\n\r\n");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Length"), Some("2"));
    assert!(reply.body.is_empty());
}

#[test]
fn test_gzip_round_trip() {
    let server = TestServer::start();
    let reply = request(
        &server,
        "GET /big.txt HTTP/1.1\r\nAccept-Encoding: gzip, deflate\r\n\r\n",
    );

    assert_eq!(reply.header("Content-Encoding"), Some("gzip"));
    assert_eq!(
        reply.header("Content-Length"),
        Some(reply.body.len().to_string().as_str())
    );

    let mut decoded = String::new();
    GzDecoder::new(&reply.body[..]).read_to_string(&mut decoded).unwrap();
    assert_eq!(decoded, "lorem ipsum dolor ".repeat(500));
}

#[test]
fn test_directory_index() {
    let server = TestServer::start();
    let reply = request(&server, "GET /docs/ HTTP/1.1\r\n\r\n");

    assert_eq!(reply.status, 200);
    assert!(reply.header("Content-Type").unwrap().starts_with("text/html"));
    assert!(String::from_utf8_lossy(&reply.body).contains("notes.txt"));
}

#[test]
fn test_chunked_mode() {
    let server = TestServer::start_with(|config| {
        config.chunked = true;
        config.chunk_size = 100;
    });
    let reply = request(&server, "GET /big.txt HTTP/1.1\r\n\r\n");

    assert_eq!(reply.header("Transfer-Encoding"), Some("chunked"));
    assert_eq!(reply.header("Content-Length"), None);
    assert_eq!(reply.body, "lorem ipsum dolor ".repeat(500).as_bytes());
}

#[test]
fn test_concurrent_clients() {
    let server = TestServer::start();
    let addr = server.addr;

    let clients: Vec<_> = (0..16)
        .map(|_| {
            thread::spawn(move || {
                let stream = TcpStream::connect(addr).unwrap();
                stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
                let mut writer = stream.try_clone().unwrap();
                writer
                    .write_all(b"GET /index.html HTTP/1.1\r\nConnection: close\r\n\r\n")
                    .unwrap();
                read_reply(&mut BufReader::new(stream), false)
            })
        })
        .collect();

    for client in clients {
        let reply = client.join().unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, b"hi");
    }
}
