pub mod config;
pub mod logging;

pub mod connection;
pub mod cookies;
pub mod copier;
pub mod encoding;
pub mod error;
pub mod progress;
pub mod session;

pub use connection::{AbortHandle, Connection};
pub use error::{ConnectError, DownloadError};
pub use progress::{NoProgress, ProgressObserver};
pub use session::{DownloadSession, SessionOptions};
