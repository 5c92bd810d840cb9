//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_get_text() {
    match parse(&["urlfetch", "get", "https://example.com/refs.bib"]) {
        CliCommand::Get {
            url,
            output,
            encoding,
            quiet,
        } => {
            assert_eq!(url.as_str(), "https://example.com/refs.bib");
            assert!(output.is_none());
            assert!(encoding.is_none());
            assert!(!quiet);
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_output_quiet() {
    match parse(&["urlfetch", "get", "https://example.com/a.pdf", "-o", "/tmp/a.pdf", "-q"]) {
        CliCommand::Get { output, quiet, .. } => {
            assert_eq!(output.as_deref(), Some(Path::new("/tmp/a.pdf")));
            assert!(quiet);
        }
        _ => panic!("expected Get with --output"),
    }
}

#[test]
fn cli_parse_get_encoding() {
    match parse(&["urlfetch", "get", "https://example.com/x", "--encoding", "ISO-8859-1"]) {
        CliCommand::Get { encoding, .. } => {
            assert_eq!(encoding.as_deref(), Some("ISO-8859-1"));
        }
        _ => panic!("expected Get with --encoding"),
    }
}

#[test]
fn cli_parse_encoding_conflicts_with_output() {
    let res = Cli::try_parse_from([
        "urlfetch",
        "get",
        "https://example.com/x",
        "-o",
        "x.bin",
        "--encoding",
        "UTF-8",
    ]);
    assert!(res.is_err());
}

#[test]
fn cli_parse_probe() {
    match parse(&["urlfetch", "probe", "http://example.com/"]) {
        CliCommand::Probe { url } => assert_eq!(url.host_str(), Some("example.com")),
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_parse_rejects_invalid_url() {
    assert!(Cli::try_parse_from(["urlfetch", "probe", "not a url"]).is_err());
}
