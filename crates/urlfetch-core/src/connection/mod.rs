//! Connection to a single URL, backed by libcurl.
//!
//! The transfer runs on a curl multi handle that is driven on the caller's
//! thread: opening pumps it until the response headers are in, and the body
//! reader pumps it again whenever its buffer runs dry. No background thread
//! is involved, so reads block exactly like a socket read would.

mod abort;
mod handler;

pub use abort::{AbortHandle, ConnectionAborted};
pub use handler::ResponseHead;

use curl::easy::Easy2;
use curl::multi::{Easy2Handle, Multi};
use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::ConnectionConfig;
use crate::cookies::CookieHandler;
use crate::error::{ConnectError, DownloadError, Result};
use handler::ResponseHandler;

/// Value of the `User-Agent` request header.
pub const CLIENT_ID: &str = "Jabref";

/// Longest single wait on the multi handle; bounds how late an abort is noticed.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Connection layer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub follow_redirects: bool,
    pub max_redirections: u32,
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::from(&ConnectionConfig::default())
    }
}

impl From<&ConnectionConfig> for ConnectionOptions {
    fn from(cfg: &ConnectionConfig) -> Self {
        Self {
            follow_redirects: cfg.follow_redirects,
            max_redirections: cfg.max_redirections,
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.timeout(),
        }
    }
}

/// An open connection: response headers received, body not yet read.
pub struct Connection {
    url: Url,
    multi: Multi,
    /// None once the transfer handle has been released.
    handle: Option<Easy2Handle<ResponseHandler>>,
    /// Set when curl reports the transfer finished.
    outcome: Option<std::result::Result<(), curl::Error>>,
    head: ResponseHead,
    body_taken: bool,
    abort: AbortHandle,
    cookies: Option<Arc<dyn CookieHandler>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url.as_str())
            .field("head", &self.head)
            .field("open", &self.handle.is_some())
            .field("body_taken", &self.body_taken)
            .finish()
    }
}

fn configure(
    url: &Url,
    options: &ConnectionOptions,
    cookies: Option<&dyn CookieHandler>,
) -> std::result::Result<Easy2<ResponseHandler>, curl::Error> {
    let mut easy = Easy2::new(ResponseHandler::new(url.clone(), options.follow_redirects));
    easy.url(url.as_str())?;
    easy.useragent(CLIENT_ID)?;
    easy.follow_location(options.follow_redirects)?;
    if options.follow_redirects {
        easy.max_redirections(options.max_redirections)?;
    }
    if let Some(t) = options.connect_timeout {
        easy.connect_timeout(t)?;
    }
    if let Some(t) = options.timeout {
        easy.timeout(t)?;
    }
    if let Some(header) = cookies.and_then(|c| c.cookie_header(url)) {
        easy.cookie(&header)?;
    }
    Ok(easy)
}

/// Maps a curl transfer failure onto the closest I/O error kind.
fn io_error(e: &curl::Error) -> io::Error {
    let kind = if e.is_partial_file() || e.is_recv_error() {
        io::ErrorKind::UnexpectedEof
    } else if e.is_operation_timedout() {
        io::ErrorKind::TimedOut
    } else if e.is_write_error() {
        io::ErrorKind::WriteZero
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, e.to_string())
}

impl Connection {
    /// Connects to `url` and waits for the response headers.
    ///
    /// Cookies from `cookies` are attached to the request and any `Set-Cookie`
    /// values received are handed back to it.
    pub fn open(
        url: &Url,
        options: &ConnectionOptions,
        cookies: Option<Arc<dyn CookieHandler>>,
    ) -> Result<Connection> {
        Self::open_abortable(url, options, cookies, AbortHandle::new())
    }

    /// Like [`open`](Self::open), but `abort` can cancel the connection while
    /// it is still waiting for the response headers.
    pub fn open_abortable(
        url: &Url,
        options: &ConnectionOptions,
        cookies: Option<Arc<dyn CookieHandler>>,
        abort: AbortHandle,
    ) -> Result<Connection> {
        let easy = configure(url, options, cookies.as_deref())
            .map_err(|e| DownloadError::connection(url.as_str(), e))?;
        let multi = Multi::new();
        let handle = multi
            .add2(easy)
            .map_err(|e| DownloadError::connection(url.as_str(), e))?;

        tracing::debug!("opening connection to {}", url);
        let mut conn = Connection {
            url: url.clone(),
            multi,
            handle: Some(handle),
            outcome: None,
            head: ResponseHead::default(),
            body_taken: false,
            abort,
            cookies,
        };
        conn.await_head()?;
        tracing::debug!(
            "connected to {} (status {:?}, content type {:?})",
            conn.url,
            conn.head.status,
            conn.content_type()
        );
        Ok(conn)
    }

    fn await_head(&mut self) -> Result<()> {
        loop {
            let complete = self
                .handle
                .as_ref()
                .map(|h| h.get_ref().head_complete)
                .unwrap_or(true);
            if complete {
                break;
            }
            match self.outcome.take() {
                Some(Err(e)) => return Err(DownloadError::connection(self.url.as_str(), e)),
                Some(Ok(())) => {
                    self.outcome = Some(Ok(()));
                    break;
                }
                None => {}
            }
            if self.abort.is_aborted() {
                self.release();
                return Err(DownloadError::connection(self.url.as_str(), ConnectError::Aborted));
            }
            self.pump(|h| h.head_complete)
                .map_err(|e| DownloadError::connection(self.url.as_str(), e))?;
        }

        if let Some(handle) = self.handle.as_mut() {
            let handler = handle.get_mut();
            self.head = handler.head.clone();
            let set_cookies = std::mem::take(&mut handler.set_cookies);
            if let Some(jar) = self.cookies.as_ref() {
                // Each hop of a redirect chain owns the cookies it set.
                for (origin, line) in set_cookies {
                    jar.store(&origin, std::slice::from_ref(&line));
                }
            }
        }
        Ok(())
    }

    /// Runs one perform step; waits for socket activity unless `ready` already holds.
    fn pump(&mut self, ready: fn(&ResponseHandler) -> bool) -> std::result::Result<(), curl::MultiError> {
        let running = self.multi.perform()?;
        let handle = match self.handle.as_ref() {
            Some(h) => h,
            None => return Ok(()),
        };
        let mut finished = None;
        self.multi.messages(|msg| {
            if let Some(res) = msg.result_for2(handle) {
                finished = Some(res);
            }
        });
        if finished.is_some() {
            self.outcome = finished;
        } else if running == 0 {
            self.outcome = Some(Ok(()));
        }
        if self.outcome.is_none() && !ready(handle.get_ref()) {
            self.multi.wait(&mut [], WAIT_SLICE)?;
        }
        Ok(())
    }

    /// Returns the response body reader.
    ///
    /// Fails with a connection error if the server answered with an HTTP
    /// error status, and with a transfer error if the body was already read.
    pub fn body(&mut self) -> Result<BodyReader<'_>> {
        if let Some(code) = self.head.status {
            if code >= 400 {
                return Err(DownloadError::connection(self.url.as_str(), ConnectError::Status(code)));
            }
        }
        if self.body_taken {
            return Err(DownloadError::transfer(
                self.url.as_str(),
                io::Error::other("response body already consumed"),
            ));
        }
        self.body_taken = true;
        Ok(BodyReader { conn: self })
    }

    fn read_body(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let handle = match self.handle.as_mut() {
                Some(h) => h,
                None => return Err(io::Error::new(io::ErrorKind::ConnectionAborted, ConnectionAborted)),
            };
            let n = handle.get_mut().drain_into(buf);
            if n > 0 {
                return Ok(n);
            }
            match &self.outcome {
                Some(Ok(())) => return Ok(0),
                Some(Err(e)) => return Err(io_error(e)),
                None => {}
            }
            if self.abort.is_aborted() {
                tracing::debug!("connection to {} aborted", self.url);
                self.release();
                return Err(io::Error::new(io::ErrorKind::ConnectionAborted, ConnectionAborted));
            }
            self.pump(|h| !h.body.is_empty()).map_err(io::Error::other)?;
        }
    }

    /// Removes the transfer from the multi handle, closing it. Failures are logged and dropped.
    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.multi.remove2(handle) {
                tracing::debug!("closing connection to {} failed: {}", self.url, e);
            }
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// HTTP status of the final response (None for non-HTTP schemes).
    pub fn response_code(&self) -> Option<u32> {
        self.head.status
    }

    /// Declared `Content-Type` of the response.
    pub fn content_type(&self) -> Option<&str> {
        self.head.header("content-type")
    }

    pub fn content_length(&self) -> Option<u64> {
        self.head.content_length()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }

    /// Handle that aborts this connection from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// True while the transfer is attached (not yet released).
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

/// Reader over the response body. Dropping it closes the transfer.
pub struct BodyReader<'a> {
    conn: &'a mut Connection,
}

impl BodyReader<'_> {
    pub fn content_length(&self) -> Option<u64> {
        self.conn.content_length()
    }
}

impl Read for BodyReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.conn.read_body(buf)
    }
}

impl Drop for BodyReader<'_> {
    fn drop(&mut self) {
        self.conn.release();
    }
}
