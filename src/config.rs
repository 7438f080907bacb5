//! Layered configuration for the casegen CLI.
//!
//! Values resolve in order: `casegen.toml` in the working directory →
//! environment (`CASEGEN_*`) → CLI flags. All timings are milliseconds.
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:5000"
//!
//! [http]
//! request_timeout_ms = 2000
//!
//! [polling]
//! poll_interval_ms = 3000
//! error_retry_interval_ms = 5000
//! max_attempts = 240
//! max_error_retries = 30
//! completion_hold_ms = 500
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::poll::{
    DEFAULT_COMPLETION_HOLD_MS, DEFAULT_ERROR_RETRY_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_ERROR_RETRIES, DEFAULT_POLL_INTERVAL_MS, PollConfig,
};

/// Name of the config file searched for in the working directory.
pub const CONFIG_FILE_NAME: &str = "casegen.toml";

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_error_retry_interval_ms() -> u64 {
    DEFAULT_ERROR_RETRY_INTERVAL_MS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_max_error_retries() -> u32 {
    DEFAULT_MAX_ERROR_RETRIES
}

fn default_completion_hold_ms() -> u64 {
    DEFAULT_COMPLETION_HOLD_MS
}

/// `[service]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the generation service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// `[polling]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_error_retry_interval_ms")]
    pub error_retry_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_error_retries")]
    pub max_error_retries: u32,
    #[serde(default = "default_completion_hold_ms")]
    pub completion_hold_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            error_retry_interval_ms: default_error_retry_interval_ms(),
            max_attempts: default_max_attempts(),
            max_error_retries: default_max_error_retries(),
            completion_hold_ms: default_completion_hold_ms(),
        }
    }
}

/// Unified configuration, as read from `casegen.toml` plus overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasegenConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

impl CasegenConfig {
    /// Load from `dir/casegen.toml` if present, then apply environment
    /// overrides. A missing file is not an error; defaults apply.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Environment layer: `CASEGEN_BASE_URL` only. Timings come from the
    /// file or CLI flags.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CASEGEN_BASE_URL")
            && !url.trim().is_empty()
        {
            self.service.base_url = url;
        }
    }

    /// CLI layer, applied last.
    pub fn apply_cli(&mut self, base_url: Option<&str>, max_attempts: Option<u32>) {
        if let Some(url) = base_url {
            self.service.base_url = url.to_string();
        }
        if let Some(attempts) = max_attempts {
            self.polling.max_attempts = attempts;
        }
    }

    /// Cross-field checks. The request timeout must stay under the poll
    /// interval so a slow response can never overlap the next poll.
    pub fn validate(&self) -> Result<()> {
        if self.polling.max_attempts == 0 {
            anyhow::bail!("polling.max_attempts must be at least 1");
        }
        if self.polling.max_error_retries == 0 {
            anyhow::bail!("polling.max_error_retries must be at least 1");
        }
        if self.http.request_timeout_ms >= self.polling.poll_interval_ms {
            anyhow::bail!(
                "http.request_timeout_ms ({}) must be shorter than polling.poll_interval_ms ({})",
                self.http.request_timeout_ms,
                self.polling.poll_interval_ms
            );
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.http.request_timeout_ms)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::default()
            .with_poll_interval(Duration::from_millis(self.polling.poll_interval_ms))
            .with_error_retry_interval(Duration::from_millis(self.polling.error_retry_interval_ms))
            .with_max_attempts(self.polling.max_attempts)
            .with_max_error_retries(self.polling.max_error_retries)
            .with_completion_hold(Duration::from_millis(self.polling.completion_hold_ms))
    }
}
