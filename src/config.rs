// src/config.rs

//! Data root layout and on-disk configuration.
//!
//! Layout under the data root:
//!
//! ```text
//! <data>/config.toml     exclude/critical glob configuration
//! <data>/ripple.log      append-only instance log
//! <data>/sessions/<id>/  one directory of backup artifacts per session
//! <data>/.lock           advisory lock taken for the duration of a run
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the data root (mainly for tests).
pub const DATA_DIR_ENV: &str = "RIPPLE_DATA_DIR";

/// Resolve the data root: env override, then the platform data directory,
/// then `./.ripple` as a last resort.
pub fn data_root() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    match dirs::data_dir() {
        Some(base) => base.join("ripple"),
        None => PathBuf::from(".ripple"),
    }
}

pub fn sessions_dir(data_root: &Path) -> PathBuf {
    data_root.join("sessions")
}

pub fn log_path(data_root: &Path) -> PathBuf {
    data_root.join("ripple.log")
}

pub fn config_path(data_root: &Path) -> PathBuf {
    data_root.join("config.toml")
}

pub fn lock_path(data_root: &Path) -> PathBuf {
    data_root.join(".lock")
}

/// Glob policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Paths matching any of these are dropped before the candidate list is
    /// ever shown.
    pub exclude: Vec<String>,
    /// Paths matching any of these require an explicit per-file confirmation
    /// immediately before mutation.
    pub critical: Vec<String>,
    /// Default answer for the "skip binary files" question in whole-file mode.
    pub skip_binaries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: vec![
                "node_modules/**".to_string(),
                "**/node_modules/**".to_string(),
                "vendor/**".to_string(),
                "**/vendor/**".to_string(),
                "target/**".to_string(),
                "storage/**".to_string(),
                "build/**".to_string(),
                "dist/**".to_string(),
                ".git/**".to_string(),
                "**/.git/**".to_string(),
                ".ripple/**".to_string(),
            ],
            critical: vec![
                ".env".to_string(),
                ".env.*".to_string(),
                "config/**".to_string(),
                "**/app.php".to_string(),
                "**/*Provider.php".to_string(),
                "composer.json".to_string(),
                "package.json".to_string(),
            ],
            skip_binaries: true,
        }
    }
}

impl Config {
    /// Load `config.toml` from the data root, writing the compiled-in
    /// defaults on first run so the operator has something to edit.
    pub fn load_or_init(data_root: &Path) -> Result<Self> {
        let path = config_path(data_root);
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            return toml::from_str(&raw)
                .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)));
        }

        debug!("writing default config to {}", path.display());
        let config = Self::default();
        fs::create_dir_all(data_root)?;
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        fs::write(&path, rendered)?;
        Ok(config)
    }
}
