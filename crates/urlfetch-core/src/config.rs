use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::copier::COPY_BUFFER_SIZE;
use crate::encoding::DEFAULT_IMPORT_ENCODING;

/// Connection layer settings (optional `[connection]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Follow HTTP redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirections: u32,
    /// Connect timeout in seconds (None = libcurl default).
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Overall transfer timeout in seconds (None = no limit).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            max_redirections: 10,
            connect_timeout_secs: None,
            timeout_secs: None,
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Cookie settings (optional `[cookies]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Send and store cookies through the process-wide cookie handler.
    pub enabled: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Global configuration loaded from `~/.config/urlfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlfetchConfig {
    /// Text encoding used for to-string downloads when none is set explicitly.
    pub default_encoding: String,
    /// Copy buffer size in bytes.
    pub buffer_size: usize,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub cookies: CookieConfig,
}

impl Default for UrlfetchConfig {
    fn default() -> Self {
        Self {
            default_encoding: DEFAULT_IMPORT_ENCODING.to_string(),
            buffer_size: COPY_BUFFER_SIZE,
            connection: ConnectionConfig::default(),
            cookies: CookieConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("urlfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UrlfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = UrlfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: UrlfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
