//! Text encoding selection for to-string downloads.
//!
//! An explicit label set on the session wins; otherwise the application's
//! configured default import encoding is used. Labels follow the WHATWG
//! Encoding Standard (as implemented by `encoding_rs`).

use encoding_rs::Encoding;

use crate::config::UrlfetchConfig;
use crate::error::{DownloadError, Result};

/// Default import encoding when the configuration does not name one.
pub const DEFAULT_IMPORT_ENCODING: &str = "UTF-8";

/// Chooses the decoder for a byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingResolver {
    default_label: String,
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IMPORT_ENCODING)
    }
}

impl From<&UrlfetchConfig> for EncodingResolver {
    fn from(cfg: &UrlfetchConfig) -> Self {
        Self::new(cfg.default_encoding.as_str())
    }
}

impl EncodingResolver {
    pub fn new(default_label: impl Into<String>) -> Self {
        Self {
            default_label: default_label.into(),
        }
    }

    /// Label used when no explicit override is given.
    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Resolves `explicit` if set, else the default label.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<&'static Encoding> {
        let label = explicit.unwrap_or(&self.default_label);
        lookup(label).ok_or_else(|| DownloadError::Encoding {
            label: label.to_string(),
        })
    }
}

/// Looks up a label, also accepting `_` in place of `-` (e.g. `ISO8859_1`).
fn lookup(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    Encoding::for_label(label.as_bytes()).or_else(|| {
        if label.contains('_') {
            Encoding::for_label(label.replace('_', "-").as_bytes())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        let r = EncodingResolver::new("UTF-8");
        let enc = r.resolve(Some("windows-1252")).unwrap();
        assert_eq!(enc, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn falls_back_to_default() {
        let r = EncodingResolver::new("utf-16le");
        assert_eq!(r.resolve(None).unwrap(), encoding_rs::UTF_16LE);
        assert_eq!(EncodingResolver::default().resolve(None).unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn labels_are_case_insensitive_and_trimmed() {
        let r = EncodingResolver::default();
        assert_eq!(r.resolve(Some(" utf-8 ")).unwrap(), encoding_rs::UTF_8);
        assert_eq!(r.resolve(Some("UTF8")).unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn underscore_spelling_accepted() {
        let r = EncodingResolver::default();
        assert_eq!(r.resolve(Some("ISO8859_1")).unwrap(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn unknown_label_is_encoding_error() {
        let r = EncodingResolver::default();
        let err = r.resolve(Some("no-such-charset")).unwrap_err();
        assert!(err.is_encoding());
        assert!(err.to_string().contains("no-such-charset"));
    }

    #[test]
    fn unknown_default_is_encoding_error() {
        let r = EncodingResolver::new("");
        assert!(r.resolve(None).unwrap_err().is_encoding());
    }

    #[test]
    fn from_config_uses_default_encoding() {
        let cfg = UrlfetchConfig {
            default_encoding: "iso-8859-2".to_string(),
            ..UrlfetchConfig::default()
        };
        let r = EncodingResolver::from(&cfg);
        assert_eq!(r.default_label(), "iso-8859-2");
        assert_eq!(r.resolve(None).unwrap(), encoding_rs::ISO_8859_2);
    }
}
