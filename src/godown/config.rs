//! # Configuration
//!
//! Godown configuration is managed by [`confique`], which layers environment variables
//! over a TOML file over compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `GODOWN_API_URL`, `GODOWN_TIMEOUT_SECS`, `GODOWN_DEBOUNCE_MS`.
//! 2. **Config file**: `godown.toml` in the config directory.
//! 3. **Compiled defaults**: see the table below.
//!
//! The CLI's `--api-url` flag overrides all of the above.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `api_url` | `http://localhost:5000/api` | Base URL of the inventory service |
//! | `timeout_secs` | `30` | Per-request timeout |
//! | `debounce_ms` | `300` | Quiet period before a filter change triggers a fetch |
//!
//! ## Directories
//!
//! Config and data (the auth token) live in OS-appropriate directories from the
//! `directories` crate. Setting `GODOWN_HOME` puts both under that single directory.

use crate::error::{GodownError, Result};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "godown.toml";
pub const HOME_ENV: &str = "GODOWN_HOME";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GodownConfig {
    /// Base URL of the inventory REST service
    #[config(env = "GODOWN_API_URL", default = "http://localhost:5000/api")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[config(env = "GODOWN_TIMEOUT_SECS", default = 30)]
    pub timeout_secs: u64,

    /// Quiet period after the last filter edit before items are re-fetched
    #[config(env = "GODOWN_DEBOUNCE_MS", default = 300)]
    pub debounce_ms: u64,
}

impl Default for GodownConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
            debounce_ms: 300,
        }
    }
}

impl GodownConfig {
    /// Loads env + `godown.toml` from `config_dir`. A missing file is not an error.
    pub fn load(config_dir: &Path) -> Result<Self> {
        Self::load_with(GodownConfig::builder().env(), config_dir)
    }

    /// Adds `godown.toml` under whatever sources `builder` already has.
    fn load_with(builder: confique::Builder<Self>, config_dir: &Path) -> Result<Self> {
        builder
            .file(config_dir.join(CONFIG_FILENAME))
            .load()
            .map_err(|e| GodownError::Config(e.to_string()))
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone)]
pub struct GodownPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl GodownPaths {
    /// `GODOWN_HOME` wins; otherwise the platform's config and data directories.
    pub fn resolve() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|h| !h.is_empty()) {
            return Ok(Self::under(PathBuf::from(home)));
        }
        let dirs = ProjectDirs::from("com", "godown", "godown").ok_or_else(|| {
            GodownError::Config("Could not determine a home directory".to_string())
        })?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    pub fn under(root: PathBuf) -> Self {
        Self {
            config_dir: root.clone(),
            data_dir: root,
        }
    }

    pub fn token_file(&self) -> PathBuf {
        self.data_dir.join("token")
    }
}
