//! Download session: one URL, downloaded either into memory as text or onto
//! disk as raw bytes.
//!
//! ```no_run
//! use urlfetch_core::session::DownloadSession;
//! use url::Url;
//!
//! let url = Url::parse("https://example.org/refs.bib")?;
//! let mut session = DownloadSession::text(url);
//! session.set_encoding("UTF-8");
//! session.download()?;
//! println!("{}", session.string_content().unwrap_or_default());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::config::UrlfetchConfig;
use crate::connection::{AbortHandle, Connection, ConnectionOptions};
use crate::cookies;
use crate::copier::{self, COPY_BUFFER_SIZE};
use crate::encoding::EncodingResolver;
use crate::error::{DownloadError, Result};
use crate::progress::{progress_label, NoProgress, ProgressObserver, ProgressReader};

/// Settings shared by sessions; usually built from [`UrlfetchConfig`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub connection: ConnectionOptions,
    /// Copy chunk size in bytes.
    pub buffer_size: usize,
    pub encoding: EncodingResolver,
    /// Use the process-wide cookie handler for requests.
    pub cookies: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connection: ConnectionOptions::default(),
            buffer_size: COPY_BUFFER_SIZE,
            encoding: EncodingResolver::default(),
            cookies: true,
        }
    }
}

impl From<&UrlfetchConfig> for SessionOptions {
    fn from(cfg: &UrlfetchConfig) -> Self {
        Self {
            connection: ConnectionOptions::from(&cfg.connection),
            buffer_size: cfg.buffer_size,
            encoding: EncodingResolver::from(cfg),
            cookies: cfg.cookies.enabled,
        }
    }
}

/// Downloads one URL.
///
/// Created either for text ([`text`](Self::text)) or for a file
/// ([`file`](Self::file)); the mode never changes afterwards. The connection
/// is opened lazily and reused by every later call on the same session.
pub struct DownloadSession {
    source: Url,
    destination: Option<PathBuf>,
    connection: Option<Connection>,
    mime_type: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
    progress: Option<Arc<dyn ProgressObserver>>,
    abort: AbortHandle,
    options: SessionOptions,
}

impl DownloadSession {
    /// Session that downloads `source` into memory; read the result with
    /// [`string_content`](Self::string_content) after [`download`](Self::download).
    pub fn text(source: Url) -> Self {
        Self::new(source, None, None)
    }

    /// Session that downloads `source` into `destination` (created or truncated).
    /// `progress` only observes the transfer.
    pub fn file(
        source: Url,
        destination: impl Into<PathBuf>,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Self {
        Self::new(source, Some(destination.into()), progress)
    }

    fn new(
        source: Url,
        destination: Option<PathBuf>,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Self {
        cookies::ensure_installed();
        Self {
            source,
            destination,
            connection: None,
            mime_type: None,
            content: None,
            encoding: None,
            progress,
            abort: AbortHandle::new(),
            options: SessionOptions::default(),
        }
    }

    /// Replaces the default options.
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the text encoding for a to-string download. Ignored in file mode
    /// and once the download has completed.
    pub fn set_encoding(&mut self, name: impl Into<String>) {
        self.encoding = Some(name.into());
    }

    /// Opens the connection without reading the body. Records the MIME type.
    /// Does nothing if the connection is already open.
    pub fn open_connection_only(&mut self) -> Result<()> {
        self.ensure_connection().map(|_| ())
    }

    fn ensure_connection(&mut self) -> Result<&mut Connection> {
        let conn = match self.connection.take() {
            Some(conn) => conn,
            None => {
                let handler = if self.options.cookies {
                    cookies::installed()
                } else {
                    None
                };
                let conn = Connection::open_abortable(
                    &self.source,
                    &self.options.connection,
                    handler,
                    self.abort.clone(),
                )?;
                self.mime_type = conn.content_type().map(str::to_string);
                conn
            }
        };
        Ok(self.connection.insert(conn))
    }

    /// Downloads the body: raw bytes to the destination file in file mode,
    /// decoded text into memory otherwise.
    ///
    /// On failure a destination file keeps whatever was written before the
    /// error; it is not removed.
    pub fn download(&mut self) -> Result<()> {
        self.ensure_connection()?;
        match self.destination.clone() {
            Some(dest) => self.download_to_file(&dest),
            None => self.download_to_string(),
        }
    }

    fn observer(&self) -> Arc<dyn ProgressObserver> {
        self.progress
            .clone()
            .unwrap_or_else(|| Arc::new(NoProgress))
    }

    fn download_to_file(&mut self, dest: &Path) -> Result<()> {
        let url = self.source.to_string();
        let observer = self.observer();
        let buffer_size = self.options.buffer_size;
        let conn = self.ensure_connection()?;
        let body = conn.body()?;
        let total = body.content_length();

        let file = File::create(dest).map_err(|e| DownloadError::transfer(url.as_str(), e))?;
        let sink = BufWriter::new(file);
        let source = ProgressReader::new(body, observer, &progress_label(&url), total);

        let copied = copier::copy_bytes(source, sink, buffer_size)
            .map_err(|e| DownloadError::transfer(url.as_str(), e))?;
        tracing::info!("downloaded {} bytes from {} to {}", copied, url, dest.display());
        Ok(())
    }

    fn download_to_string(&mut self) -> Result<()> {
        let url = self.source.to_string();
        let encoding = self.options.encoding.resolve(self.encoding.as_deref())?;
        let observer = self.observer();
        let buffer_size = self.options.buffer_size;
        let conn = self.ensure_connection()?;
        let body = conn.body()?;
        let total = body.content_length();

        let mut text = String::new();
        let source = ProgressReader::new(body, observer, &progress_label(&url), total);
        let copied = copier::copy_text(source, &mut text, encoding, buffer_size)
            .map_err(|e| DownloadError::transfer(url.as_str(), e))?;
        tracing::info!(
            "downloaded {} bytes from {} as {} text",
            copied,
            url,
            encoding.name()
        );
        self.content = Some(text);
        Ok(())
    }

    /// MIME type declared by the server; None until the connection is open.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// The open connection, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Downloaded text; None until a successful to-string download.
    pub fn string_content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Consumes the session and returns the downloaded text.
    pub fn into_string_content(self) -> Option<String> {
        self.content
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Handle that aborts this session's connection from another thread.
    /// A blocked [`download`](Self::download) then fails with a transfer error.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }
}
