//! Config file loading.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use tome_api::{HttpWorkspace, PacingConfig, RunLog};
use tome_core::ApiUrl;

/// Stored configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// API bearer token.
    pub token: String,

    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Minimum spacing between outbound calls, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_interval_ms: Option<u64>,

    /// Cooldown after a rate-limit response, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_cooldown_ms: Option<u64>,

    /// Cooldown after a network failure, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_cooldown_ms: Option<u64>,

    /// Cap on consecutive network-failure retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Directory for the transport's per-run diagnostic log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    "https://api.notion.com".to_string()
}

/// Get the config file path.
fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "tome").context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.json"))
}

/// Load the configuration from disk.
pub fn load() -> Result<Config> {
    let path = config_path()?;
    let json = fs::read_to_string(&path).with_context(|| {
        format!(
            "Failed to read config file {}. Create it with at least {{\"token\": \"...\"}}",
            path.display()
        )
    })?;
    let config: Config = serde_json::from_str(&json).context("Invalid config file")?;
    if config.token.is_empty() {
        anyhow::bail!("Config file {} has an empty token", path.display());
    }
    tracing::debug!(path = %path.display(), api_url = %config.api_url, "loaded config");
    Ok(config)
}

impl Config {
    /// Pacing configuration, with file overrides applied over the defaults.
    pub fn pacing(&self) -> PacingConfig {
        let mut pacing = PacingConfig::default();
        if let Some(ms) = self.min_interval_ms {
            pacing.min_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.rate_limit_cooldown_ms {
            pacing.rate_limit_cooldown = Duration::from_millis(ms);
        }
        if let Some(ms) = self.error_cooldown_ms {
            pacing.error_cooldown = Duration::from_millis(ms);
        }
        if let Some(n) = self.max_retries {
            pacing.max_retries = n;
        }
        pacing
    }

    /// The transport diagnostic log, if a log directory is configured.
    pub fn run_log(&self) -> Result<RunLog> {
        match &self.log_dir {
            Some(dir) => RunLog::open_in(dir)
                .with_context(|| format!("Failed to open run log in {}", dir.display())),
            None => Ok(RunLog::disabled()),
        }
    }
}

/// Load the config and build a workspace client from it.
pub fn open_workspace() -> Result<HttpWorkspace> {
    let config = load()?;
    let base = ApiUrl::new(&config.api_url).context("Invalid api_url in config")?;
    let log = config.run_log()?;
    Ok(HttpWorkspace::new(base, &config.token, config.pacing(), log))
}
