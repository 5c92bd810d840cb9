//! Easy2 handler: collects response headers and buffers body bytes until the
//! reader pulls them.

use std::collections::VecDeque;
use std::str;
use url::Url;

/// Header state of the response being received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code of the most recent status line (None for non-HTTP schemes).
    pub status: Option<u32>,
    /// Header lines of the most recent block as (name, value).
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    /// True if this header block belongs to the response the body will come from.
    fn is_final(&self, following_redirects: bool) -> bool {
        match self.status {
            None => true,
            Some(code) if (100..200).contains(&code) => false,
            Some(code) if (300..400).contains(&code) => {
                !(following_redirects && self.header("location").is_some())
            }
            Some(_) => true,
        }
    }
}

/// Parses `HTTP/1.1 200 OK` (or `HTTP/2 200`) into the status code.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

pub struct ResponseHandler {
    following_redirects: bool,
    /// URL the current header block was sent from; advances along the redirect chain.
    pub(super) current_url: Url,
    pub(super) head: ResponseHead,
    /// Set once the final header block has ended (or body data arrived).
    pub(super) head_complete: bool,
    /// `Set-Cookie` values from every header block, paired with the URL that sent them,
    /// not yet handed to the cookie handler.
    pub(super) set_cookies: Vec<(Url, String)>,
    pub(super) body: VecDeque<u8>,
}

impl ResponseHandler {
    pub(super) fn new(url: Url, following_redirects: bool) -> Self {
        Self {
            following_redirects,
            current_url: url,
            head: ResponseHead::default(),
            head_complete: false,
            set_cookies: Vec::new(),
            body: VecDeque::new(),
        }
    }

    /// Moves `current_url` to the target of the redirect block that just ended.
    fn follow_location(&mut self) {
        let next = self
            .head
            .header("location")
            .and_then(|loc| self.current_url.join(loc).ok());
        match next {
            Some(url) => self.current_url = url,
            None => tracing::debug!("unparsable redirect location from {}", self.current_url),
        }
    }

    /// Moves buffered body bytes into `buf`. Returns how many were moved.
    pub(super) fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.body.len());
        for (dst, src) in buf.iter_mut().zip(self.body.drain(..n)) {
            *dst = src;
        }
        n
    }
}

impl curl::easy::Handler for ResponseHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        let line = match str::from_utf8(data) {
            Ok(s) => s.trim_end(),
            Err(_) => return true,
        };
        if let Some(code) = parse_status_line(line) {
            self.head = ResponseHead {
                status: Some(code),
                headers: Vec::new(),
            };
            self.head_complete = false;
        } else if line.is_empty() {
            if self.head.is_final(self.following_redirects) {
                self.head_complete = true;
            } else if self.head.status.is_some_and(|c| (300..400).contains(&c)) {
                self.follow_location();
            }
        } else if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("set-cookie") {
                self.set_cookies
                    .push((self.current_url.clone(), value.to_string()));
            }
            self.head.headers.push((name.to_string(), value.to_string()));
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.head_complete = true;
        self.body.extend(data);
        Ok(data.len())
    }
}
