//! CLI configuration.
//!
//! Stored as JSON at `<config dir>/motionlab/config.json`. Every field has
//! a default, so partial files are fine; unreadable files are logged and
//! replaced by defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use motionlab_transfer::{DEFAULT_BATCH_SIZE, NetworkHint};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Root URL of the analysis service.
    pub base_url: String,

    /// Files per upload request.
    pub batch_size: usize,

    /// Parallel downloads. `None` picks one from the network hint.
    pub max_concurrency: Option<usize>,

    pub network_hint: Option<NetworkHint>,

    /// Where downloads land when `--out` is not given.
    pub download_dir: Option<PathBuf>,

    /// Send the stored access token with uploads.
    pub upload_requires_auth: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrency: None,
            network_hint: None,
            download_dir: None,
            upload_requires_auth: false,
        }
    }
}

impl CliConfig {
    /// Loads the configuration at `path`, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                return Self::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
            Self::default()
        })
    }

    /// Writes the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    motionlab_api::config_dir()
        .map(|d| d.join("motionlab").join("config.json"))
        .context("cannot determine the config directory")
}
