//! Client configuration with persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aimp::{HEADER_LEN, REMOTE_CLASS, REMOTE_MAP_FILE_SIZE};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Config I/O failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("Invalid config file: {0}")]
  Json(#[from] serde_json::Error),
  #[error("{0}")]
  Invalid(String),
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
  /// Window class (and shared memory name) AIMP registers.
  #[serde(default = "default_window_class")]
  pub window_class: String,

  /// Bytes mapped from the track info segment.
  #[serde(default = "default_map_file_size")]
  pub map_file_size: usize,

  /// Custom AIMP executable path or program name (None = ask the running process).
  #[serde(default)]
  pub executable_path: Option<String>,

  /// How long to wait for album art, in milliseconds.
  #[serde(default = "default_album_art_timeout_ms")]
  pub album_art_timeout_ms: u64,
}

fn default_window_class() -> String {
  REMOTE_CLASS.to_string()
}

fn default_map_file_size() -> usize {
  REMOTE_MAP_FILE_SIZE
}

fn default_album_art_timeout_ms() -> u64 {
  5000
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      window_class: default_window_class(),
      map_file_size: default_map_file_size(),
      executable_path: None,
      album_art_timeout_ms: default_album_art_timeout_ms(),
    }
  }
}

impl ClientConfig {
  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), String> {
    if self.window_class.trim().is_empty() {
      return Err("Window class cannot be empty".to_string());
    }
    if self.map_file_size < HEADER_LEN {
      return Err(format!(
        "Map file size must be at least {} bytes",
        HEADER_LEN
      ));
    }
    if self.album_art_timeout_ms < 1 || self.album_art_timeout_ms > 60_000 {
      return Err("Album art timeout must be between 1 and 60000 ms".to_string());
    }
    if matches!(&self.executable_path, Some(p) if p.trim().is_empty()) {
      return Err("Executable path cannot be blank".to_string());
    }
    Ok(())
  }

  pub fn album_art_timeout(&self) -> Duration {
    Duration::from_millis(self.album_art_timeout_ms)
  }

  /// Default location: `<config dir>/aimp-remote/config.json`.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("aimp-remote").join("config.json"))
  }

  /// Load from `path`; a missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let config = match std::fs::read_to_string(path) {
      Ok(text) => serde_json::from_str::<ClientConfig>(&text)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        log::debug!("No config at {:?}, using defaults", path);
        ClientConfig::default()
      }
      Err(e) => return Err(e.into()),
    };
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
  }

  /// Load from [`default_path`](Self::default_path), or defaults if there is none.
  pub fn load_default() -> Result<Self, ConfigError> {
    match Self::default_path() {
      Some(path) => Self::load(&path),
      None => Ok(ClientConfig::default()),
    }
  }

  pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
    self.validate().map_err(ConfigError::Invalid)?;
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(self)?)?;
    log::info!("Saved config to {:?}", path);
    Ok(())
  }
}
