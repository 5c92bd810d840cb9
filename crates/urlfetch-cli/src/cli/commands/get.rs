//! Get command: download a URL to a file or print it as text.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;
use urlfetch_core::progress::ProgressObserver;
use urlfetch_core::session::{DownloadSession, SessionOptions};

use super::super::progress::BarProgress;

pub fn run_get(
    url: Url,
    output: Option<PathBuf>,
    encoding: Option<String>,
    quiet: bool,
    options: SessionOptions,
) -> Result<()> {
    match output {
        Some(path) => {
            let progress: Option<Arc<dyn ProgressObserver>> = if quiet {
                None
            } else {
                Some(Arc::new(BarProgress::new()))
            };
            let mut session = DownloadSession::file(url, &path, progress).with_options(options);
            session
                .download()
                .with_context(|| format!("downloading to {}", path.display()))?;
            if let Some(mime) = session.mime_type() {
                tracing::debug!("saved {} ({})", path.display(), mime);
            }
        }
        None => {
            let mut session = DownloadSession::text(url).with_options(options);
            if let Some(enc) = encoding {
                session.set_encoding(enc);
            }
            session.download()?;
            let text = session.into_string_content().unwrap_or_default();
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
