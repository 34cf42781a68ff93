//! Minimal HTTP/1.1 server for integration tests.
//!
//! Listens on every local address so one port serves 127.0.0.1 and the rest of
//! the loopback range. Answers each connection with one response from a
//! status sequence, optionally over TLS, and records what it received.

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::io::{Read, Write};
use std::net::{IpAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Status for the n-th request; the last one repeats.
    pub statuses: Vec<u16>,
    pub body: Vec<u8>,
    pub extra_headers: Vec<(String, String)>,
    /// Announced `Content-Length` when it should differ from `body.len()`;
    /// the connection closes after `body` either way.
    pub content_length: Option<usize>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            statuses: vec![200],
            body: b"hello".to_vec(),
            extra_headers: Vec::new(),
            content_length: None,
        }
    }
}

/// One request as received.
#[derive(Debug, Clone)]
pub struct Captured {
    /// Local address the client connected to.
    pub local_ip: IpAddr,
    /// Request line and headers, as sent.
    pub head: String,
    pub body: Vec<u8>,
}

impl Captured {
    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_string())
        })
    }

    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }
}

pub struct TestServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl TestServer {
    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }
}

/// Plain HTTP server.
pub fn start(opts: ServerOptions) -> TestServer {
    start_inner(opts, None)
}

/// TLS server presenting `cert` (DER) with `key` (PKCS#8 DER).
pub fn start_tls(opts: ServerOptions, cert: CertificateDer<'static>, key: Vec<u8>) -> TestServer {
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(
        vec![cert],
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key)),
    )
    .expect("server cert");
    start_inner(opts, Some(Arc::new(config)))
}

/// A port nothing listens on (bound then released).
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap().port()
}

fn start_inner(opts: ServerOptions, tls: Option<Arc<rustls::ServerConfig>>) -> TestServer {
    let listener = TcpListener::bind("0.0.0.0:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for (n, stream) in listener.incoming().flatten().enumerate() {
            let opts = Arc::clone(&opts);
            let seen = Arc::clone(&seen);
            let tls = tls.clone();
            thread::spawn(move || {
                let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
                let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
                let local_ip = match stream.local_addr() {
                    Ok(a) => a.ip(),
                    Err(_) => return,
                };
                let status = opts.statuses[n.min(opts.statuses.len() - 1)];
                match tls {
                    None => handle(stream, local_ip, status, &opts, &seen),
                    Some(config) => {
                        let Ok(conn) = rustls::ServerConnection::new(config) else {
                            return;
                        };
                        let mut tls_stream = rustls::StreamOwned::new(conn, stream);
                        handle(&mut tls_stream, local_ip, status, &opts, &seen);
                        tls_stream.conn.send_close_notify();
                        let _ = tls_stream.flush();
                    }
                }
            });
        }
    });
    TestServer { port, requests }
}

fn handle<S: Read + Write>(
    mut stream: S,
    local_ip: IpAddr,
    status: u16,
    opts: &ServerOptions,
    seen: &Mutex<Vec<Captured>>,
) {
    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };
    seen.lock().unwrap().push(Captured {
        local_ip,
        head,
        body,
    });
    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        reason(status),
        opts.content_length.unwrap_or(opts.body.len())
    );
    for (k, v) in &opts.extra_headers {
        response.push_str(&format!("{}: {}\r\n", k, v));
    }
    response.push_str("\r\n");
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(&opts.body);
    let _ = stream.flush();
}

/// Reads the head up to the blank line, then a Content-Length body.
fn read_request<S: Read>(stream: &mut S) -> Option<(String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    };
    let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = data[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    Some((head, body))
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Whatever",
    }
}
