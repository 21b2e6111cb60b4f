//! Optional TOML config file.
//!
//! ```toml
//! log_level = "info"
//!
//! [scheduler]
//! tick_interval_ms = 10
//!
//! [board]
//! clock_hz = 4000000
//! rom_size = 0x2000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use cabinet_core::config::SchedulerConfig;
use cabinet_machines::BoardConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub scheduler: SchedulerConfig,
    pub board: BoardConfig,
}

/// `$CONFIG_DIR/cabinet/cabinet.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cabinet").join("cabinet.toml"))
}

impl FileConfig {
    /// Load `explicit` if given (it must exist), else the default location if
    /// present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
