//! Configuration loaded from `~/.config/dlverify/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::extract::LinkFilter;
use crate::verify::source::SourceOptions;

/// Limits for hashing files served over HTTP (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Abort a transfer that stays below 1 KiB/s for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            low_speed_time_secs: 60,
        }
    }
}

/// Global configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Only record links to executables, installers and archives.
    pub only_verify_dangerous: bool,
    /// Read size in bytes when hashing local files.
    pub chunk_size: usize,
    /// Extensions (without leading dot) treated as dangerous in addition to the built-in list.
    #[serde(default)]
    pub extra_dangerous_extensions: Vec<String>,
    /// Optional HTTP limits; if missing, built-in defaults are used.
    #[serde(default)]
    pub http: Option<HttpSourceConfig>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            only_verify_dangerous: false,
            chunk_size: 64 * 1024,
            extra_dangerous_extensions: Vec::new(),
            http: None,
        }
    }
}

impl VerifyConfig {
    pub fn link_filter(&self) -> LinkFilter {
        LinkFilter {
            only_dangerous: self.only_verify_dangerous,
            extra_extensions: self
                .extra_dangerous_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn source_options(&self) -> SourceOptions {
        let http = self.http.clone().unwrap_or_default();
        SourceOptions {
            chunk_size: self.chunk_size.max(1),
            connect_timeout: Duration::from_secs(http.connect_timeout_secs),
            low_speed_time: Duration::from_secs(http.low_speed_time_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlverify")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VerifyConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VerifyConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: VerifyConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}
