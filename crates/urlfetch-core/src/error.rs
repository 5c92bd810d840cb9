//! Error taxonomy for downloads.
//!
//! Connection failures, body transfer failures and unknown text encodings are
//! reported separately so callers can tell "never reached the server" apart
//! from "broke halfway". Cookie installation and close failures never show up
//! here; they are logged and absorbed where they happen.

use std::io;

/// Result alias used by the download API.
pub type Result<T, E = DownloadError> = std::result::Result<T, E>;

/// Error returned by [`DownloadSession`](crate::session::DownloadSession) operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The URL could not be opened: resolution, connect or protocol failure,
    /// or an HTTP error status reported by the server.
    #[error("cannot open {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: ConnectError,
    },

    /// Reading the response body or writing the destination failed.
    #[error("transfer of {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: io::Error,
    },

    /// The requested text encoding is not known.
    #[error("unsupported encoding: {label}")]
    Encoding { label: String },
}

impl DownloadError {
    pub(crate) fn connection(url: impl Into<String>, source: impl Into<ConnectError>) -> Self {
        DownloadError::Connection {
            url: url.into(),
            source: source.into(),
        }
    }

    pub(crate) fn transfer(url: impl Into<String>, source: io::Error) -> Self {
        DownloadError::Transfer {
            url: url.into(),
            source,
        }
    }

    /// True for errors raised before any body byte was requested.
    pub fn is_connection(&self) -> bool {
        matches!(self, DownloadError::Connection { .. })
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, DownloadError::Transfer { .. })
    }

    pub fn is_encoding(&self) -> bool {
        matches!(self, DownloadError::Encoding { .. })
    }
}

/// Why a connection could not be established.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// libcurl reported an error (DNS, connect, TLS, protocol, ...).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// The curl multi handle failed while driving the transfer.
    #[error(transparent)]
    Multi(#[from] curl::MultiError),
    /// The server answered with an error status.
    #[error("HTTP {0}")]
    Status(u32),
    /// The connection was aborted before the response arrived.
    #[error("connection aborted")]
    Aborted,
}
