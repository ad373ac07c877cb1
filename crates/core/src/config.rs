//! Application configuration.
//!
//! Values are layered: built-in defaults, then the optional
//! `~/.config/staybook/config.toml`, then `STAYBOOK_*` environment
//! variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Directory under the user's config dir holding all staybook files.
pub const CONFIG_DIR: &str = "staybook";

const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.json";

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
const DEFAULT_CURRENCY: &str = "$";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# staybook configuration
#
# Every key can also be set through the environment, e.g.
# STAYBOOK_BACKEND_URL=https://api.example.com

# Base URL of the booking backend.
backend_url = "http://localhost:3000"

# Symbol printed in front of prices.
currency = "$"

# Transport timeout for a single request, in seconds.
request_timeout_secs = 30
"#;

/// Runtime configuration for the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Base URL of the booking backend, without a trailing slash.
    pub backend_url: String,
    /// Currency symbol used when rendering prices.
    pub currency: String,
    /// File holding the persisted bearer token.
    pub token_path: PathBuf,
    /// Per-request transport timeout.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            token_path: config_root().join(SESSION_FILE),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_file_path())
    }

    /// Load configuration from an explicit file, still honouring the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("backend_url", defaults.backend_url)?
            .set_default("currency", defaults.currency)?
            .set_default(
                "token_path",
                defaults.token_path.to_string_lossy().into_owned(),
            )?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("STAYBOOK").try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        config.backend_url = config.backend_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Root directory for configuration and session files.
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Location of the user configuration file.
pub fn config_file_path() -> PathBuf {
    config_root().join(CONFIG_FILE)
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_file_path())
}

fn write_default_config(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))
}
