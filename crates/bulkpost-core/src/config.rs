use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::dispatcher::DispatchConfig;
use crate::retry::RetryPolicy;
use crate::transport::RequestTemplate;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = single attempt).
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds; doubles on every retry.
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
        }
    }
}

/// Request shape (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Extra headers sent with every request (e.g. Authorization).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            headers: BTreeMap::new(),
        }
    }
}

/// Global configuration loaded from `~/.config/bulkpost/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Target URL every item is POSTed to.
    pub endpoint: String,
    /// Maximum simultaneous in-flight requests.
    pub concurrency: usize,
    /// Worker threads executing network calls. Calls on the wire never exceed
    /// `min(workers, concurrency)`; tokens beyond `workers` only queue.
    pub workers: usize,
    /// Items pulled and resolved per chunk; bounds unresolved items in memory.
    pub chunk_size: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional request settings; if missing, built-in defaults are used.
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://httpbin.org/post".to_string(),
            concurrency: 100,
            workers: 100,
            chunk_size: 1000,
            retry: None,
            http: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("concurrency must be greater than zero")]
    ZeroConcurrency,
    #[error("workers must be greater than zero")]
    ZeroWorkers,
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl BulkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        let url = url::Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry.clone().unwrap_or_default();
        RetryPolicy::new(
            retry.max_retries,
            Duration::from_millis(retry.initial_backoff_ms),
        )
    }

    pub fn request_template(&self) -> RequestTemplate {
        let http = self.http.clone().unwrap_or_default();
        let mut template = RequestTemplate::new(&self.endpoint).with_timeouts(
            Duration::from_secs(http.request_timeout_secs),
            Duration::from_secs(http.connect_timeout_secs),
        );
        for (name, value) in http.headers {
            template = template.with_header(name, value);
        }
        template
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::new(self.request_template())
            .with_concurrency(self.concurrency)
            .with_retry(self.retry_policy())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bulkpost")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BulkConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BulkConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<BulkConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: BulkConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
