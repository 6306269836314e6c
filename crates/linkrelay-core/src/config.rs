use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_SHORTENER_URL: &str = "https://viralbox.in";
pub const SHORTEN_TIMEOUT_SECS: u64 = 15;
pub const REPLY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_DEDUP_WINDOW: usize = 1024;

/// Top-level config (linkrelay.toml + LINKRELAY_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkrelayConfig {
    pub gateway: GatewayConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub shortener: ShortenerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path segment the platform posts to: `POST /webhook/{webhook_secret}`.
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Bot API base URL override (self-hosted Bot API server).
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    #[serde(default = "default_shortener_url")]
    pub base_url: String,
    #[serde(default = "default_shorten_timeout")]
    pub timeout_secs: u64,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            base_url: default_shortener_url(),
            timeout_secs: SHORTEN_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Bounds on webhook processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of messages processed at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Deliveries waiting for a worker before ingress answers 503.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How many recent update ids are remembered for redelivery detection.
    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dedup_window: DEFAULT_DEDUP_WINDOW,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_reply_timeout() -> u64 {
    REPLY_TIMEOUT_SECS
}
fn default_shortener_url() -> String {
    DEFAULT_SHORTENER_URL.to_string()
}
fn default_shorten_timeout() -> u64 {
    SHORTEN_TIMEOUT_SECS
}
fn default_db_path() -> String {
    "./linkrelay.db".to_string()
}
fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}
fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
fn default_dedup_window() -> usize {
    DEFAULT_DEDUP_WINDOW
}

impl LinkrelayConfig {
    /// Load config from a TOML file with environment overrides.
    ///
    /// Precedence, lowest first:
    ///   1. TOML file (explicit path, else ./linkrelay.toml; a missing file is skipped)
    ///   2. `PORT` (hosting platforms) → `gateway.port`
    ///   3. `LINKRELAY_*`, nested keys split on `__`
    ///      (e.g. `LINKRELAY_TELEGRAM__BOT_TOKEN`)
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("linkrelay.toml");
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(path))
                .merge(Env::raw().only(&["PORT"]).map(|_| "gateway.port".into()))
                .merge(Env::prefixed("LINKRELAY_").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> crate::error::Result<Self> {
        let config: LinkrelayConfig = figment
            .extract()
            .map_err(|e| crate::error::LinkrelayError::Config(e.to_string()))?;

        if config.gateway.webhook_secret.trim().is_empty() {
            return Err(crate::error::LinkrelayError::Config(
                "gateway.webhook_secret must not be empty".to_string(),
            ));
        }
        if config.workers.max_concurrency == 0 || config.workers.queue_capacity == 0 {
            return Err(crate::error::LinkrelayError::Config(
                "workers.max_concurrency and workers.queue_capacity must be positive".to_string(),
            ));
        }
        Ok(config)
    }
}
