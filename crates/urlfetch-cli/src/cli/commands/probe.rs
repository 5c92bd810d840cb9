//! Probe command: open the connection and print what the server declared.

use anyhow::{Context, Result};
use url::Url;
use urlfetch_core::session::{DownloadSession, SessionOptions};

pub fn run_probe(url: Url, options: SessionOptions) -> Result<()> {
    let mut session = DownloadSession::text(url).with_options(options);
    session.open_connection_only()?;
    let conn = session
        .connection()
        .context("connection missing after open")?;

    println!("url:            {}", conn.url());
    match conn.response_code() {
        Some(code) => println!("status:         {}", code),
        None => println!("status:         -"),
    }
    println!("content-type:   {}", session.mime_type().unwrap_or("-"));
    match conn.content_length() {
        Some(len) => println!("content-length: {}", len),
        None => println!("content-length: -"),
    }
    Ok(())
}
