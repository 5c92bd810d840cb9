//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of routes, one response per connection, and records
//! every request it receives so tests can count connections and inspect
//! request headers. Routes can cut the body short or stall mid-body to
//! simulate broken transfers.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: &'static str,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
    pub set_cookies: Vec<String>,
    pub location: Option<String>,
    /// Send only this many body bytes (Content-Length still announces the full body), then close.
    pub truncate_after: Option<usize>,
    /// Send this many body bytes, then sleep before sending the rest.
    pub stall_after: Option<(usize, Duration)>,
}

impl Route {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK",
            content_type: Some(content_type),
            body: body.into(),
            set_cookies: Vec::new(),
            location: None,
            truncate_after: None,
            stall_after: None,
        }
    }

    pub fn status(status: &'static str) -> Self {
        Self {
            status,
            content_type: Some("text/html"),
            body: b"<html>error</html>".to_vec(),
            set_cookies: Vec::new(),
            location: None,
            truncate_after: None,
            stall_after: None,
        }
    }

    /// `302 Found` pointing at `location` (absolute or relative).
    pub fn redirect(location: &str) -> Self {
        Self {
            status: "302 Found",
            content_type: Some("text/html"),
            body: b"<html>moved</html>".to_vec(),
            set_cookies: Vec::new(),
            location: Some(location.to_string()),
            truncate_after: None,
            stall_after: None,
        }
    }

    pub fn with_cookie(mut self, set_cookie: &str) -> Self {
        self.set_cookies.push(set_cookie.to_string());
        self
    }

    pub fn truncated(mut self, after: usize) -> Self {
        self.truncate_after = Some(after);
        self
    }

    pub fn stalled(mut self, after: usize, pause: Duration) -> Self {
        self.stall_after = Some((after, pause));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct TestServer {
    base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    /// Full URL for `path` (must start with `/`).
    pub fn url(&self, path: &str) -> url::Url {
        url::Url::parse(&format!("{}{}", self.base, path)).unwrap()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

/// Starts a server in a background thread serving `routes`. Unknown paths get 404.
/// The server runs until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(p, r)| (p.to_string(), r))
            .collect(),
    );
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &routes, &log));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

/// A port with nothing listening on it.
pub fn closed_port_url() -> url::Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    url::Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap()
}

fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8(data).ok()
}

fn parse_request(request: &str) -> RecordedRequest {
    let mut lines = request.lines();
    let path = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let headers = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    RecordedRequest { path, headers }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, log: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    let request = parse_request(&request);
    let route = routes
        .get(&request.path)
        .cloned()
        .unwrap_or_else(|| Route::status("404 Not Found"));
    log.lock().unwrap().push(request);

    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        route.status,
        route.body.len()
    );
    if let Some(ct) = route.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    if let Some(loc) = &route.location {
        head.push_str(&format!("Location: {}\r\n", loc));
    }
    for c in &route.set_cookies {
        head.push_str(&format!("Set-Cookie: {}\r\n", c));
    }
    head.push_str("\r\n");
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }

    let body = &route.body;
    if let Some(n) = route.truncate_after {
        let _ = stream.write_all(&body[..n.min(body.len())]);
        let _ = stream.flush();
        let _ = stream.shutdown(Shutdown::Both);
        return;
    }
    if let Some((n, pause)) = route.stall_after {
        let n = n.min(body.len());
        let _ = stream.write_all(&body[..n]);
        let _ = stream.flush();
        thread::sleep(pause);
        let _ = stream.write_all(&body[n..]);
        return;
    }
    let _ = stream.write_all(body);
}
