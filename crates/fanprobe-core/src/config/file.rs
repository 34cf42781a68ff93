use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Optional defaults loaded from `~/.config/fanprobe/config.toml`.
///
/// Command-line flags take precedence over anything set here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDefaults {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: f64,
    /// Whole-run timeout in seconds.
    pub total_timeout_secs: f64,
    /// Delay between repeated passes in seconds.
    pub repeat_delay_secs: f64,
    /// Certificate expiry error threshold in days.
    pub cert_expiry_days: f64,
}

impl Default for FileDefaults {
    fn default() -> Self {
        Self {
            request_timeout_secs: 3.0,
            total_timeout_secs: 30.0,
            repeat_delay_secs: 5.0,
            cert_expiry_days: 7.0,
        }
    }
}

/// Load defaults from the XDG config dir. A missing file yields built-in defaults.
pub fn load_defaults() -> Result<FileDefaults> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fanprobe")?;
    match xdg_dirs.find_config_file("config.toml") {
        Some(path) => load_defaults_from(&path),
        None => Ok(FileDefaults::default()),
    }
}

pub fn load_defaults_from(path: &Path) -> Result<FileDefaults> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FileDefaults =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    tracing::debug!("loaded defaults from {}", path.display());
    Ok(cfg)
}
