//! CLI for urlfetch.

mod commands;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;
use urlfetch_core::config;
use urlfetch_core::session::SessionOptions;

use commands::{run_get, run_probe};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "urlfetch")]
#[command(about = "Download a single URL to a file or to stdout", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL. Writes raw bytes to FILE with -o, otherwise prints decoded text.
    Get {
        /// URL to download.
        url: Url,

        /// Save the raw response body to this file.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Text encoding for printed output (default from config).
        #[arg(long, value_name = "ENC", conflicts_with = "output")]
        encoding: Option<String>,

        /// Do not show a progress bar.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Open the connection and print response metadata without downloading the body.
    Probe {
        /// URL to probe.
        url: Url,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let options = SessionOptions::from(&cfg);

        match cli.command {
            CliCommand::Get {
                url,
                output,
                encoding,
                quiet,
            } => run_get(url, output, encoding, quiet, options)?,
            CliCommand::Probe { url } => run_probe(url, options)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
