//! Gateway configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use super::loader::ConfigError;
use crate::domain::entities::Secret;
use crate::infrastructure::rentman::RetryPolicy;

pub(super) const APP_NAME: &str = "rentgate";
pub(super) const APP_QUALIFIER: &str = "io";
pub(super) const APP_ORGANIZATION: &str = "rentgate";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Top-level configuration, read from TOML and overridden by CLI/env.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stdout when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream listing API configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Image CDN configuration.
    #[serde(default)]
    pub cdn: CdnConfig,

    /// Cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public base URL of this gateway, used in generated image links.
    /// Relative links are produced when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            public_base_url: None,
        }
    }
}

/// Upstream listing API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// API base URL.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,

    /// Static API token.
    #[serde(default)]
    pub token: Secret,

    /// Retries after the first attempt on network errors and 5xx.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubles per retry.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound for a single retry delay in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Timeout of a single HTTP request in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Bound on the whole image fetch step of a resolution, retries included.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl UpstreamConfig {
    /// Returns the retry schedule.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            token: Secret::default(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Image CDN configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CdnConfig {
    /// Cloud (account) name.
    #[serde(default)]
    pub cloud_name: String,

    /// API key.
    #[serde(default)]
    pub api_key: String,

    /// API secret used for signing and basic auth.
    #[serde(default)]
    pub api_secret: Secret,

    /// Folder every asset is uploaded into.
    #[serde(default = "default_cdn_folder")]
    pub folder: String,

    /// Management API base URL.
    #[serde(default = "default_cdn_api_base_url")]
    pub api_base_url: String,

    /// Delivery base URL.
    #[serde(default = "default_cdn_delivery_base_url")]
    pub delivery_base_url: String,

    /// Timeout of a single CDN request in seconds.
    #[serde(default = "default_cdn_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: Secret::default(),
            folder: default_cdn_folder(),
            api_base_url: default_cdn_api_base_url(),
            delivery_base_url: default_cdn_delivery_base_url(),
            timeout_secs: default_cdn_timeout_secs(),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries per cache.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Lifetime of a resolved image URL in seconds.
    #[serde(default = "default_image_ttl_secs")]
    pub image_ttl_secs: u64,

    /// Lifetime of a cached upstream query result in seconds.
    #[serde(default = "default_response_ttl_secs")]
    pub response_ttl_secs: u64,

    /// Interval of the expired-entry sweep in seconds; 0 disables it.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// Returns the image URL lifetime.
    #[must_use]
    pub const fn image_ttl(&self) -> Duration {
        Duration::from_secs(self.image_ttl_secs)
    }

    /// Returns the response lifetime.
    #[must_use]
    pub const fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }

    /// Returns the sweep interval, or `None` when sweeping is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        match self.sweep_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            image_ttl_secs: default_image_ttl_secs(),
            response_ttl_secs: default_response_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_upstream_base_url() -> String {
    "https://www.rentman.io/api".to_string()
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    250
}

const fn default_retry_max_delay_ms() -> u64 {
    8_000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_cdn_folder() -> String {
    "rentman".to_string()
}

fn default_cdn_api_base_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_cdn_delivery_base_url() -> String {
    "https://res.cloudinary.com".to_string()
}

const fn default_cdn_timeout_secs() -> u64 {
    60
}

const fn default_cache_capacity() -> usize {
    1000
}

const fn default_image_ttl_secs() -> u64 {
    3600
}

const fn default_response_ttl_secs() -> u64 {
    300
}

const fn default_sweep_interval_secs() -> u64 {
    60
}

impl AppConfig {
    /// Merges CLI arguments (and their environment fallbacks) into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(listen) = args.listen {
            self.server.listen_addr = listen;
        }
        if let Some(public_base_url) = args.public_base_url {
            self.server.public_base_url = Some(public_base_url);
        }
        if let Some(base_url) = args.rentman_base_url {
            self.upstream.base_url = base_url;
        }
        if let Some(token) = args.rentman_token {
            self.upstream.token = Secret::new(token);
        }
        if let Some(cloud_name) = args.cloudinary_cloud_name {
            self.cdn.cloud_name = cloud_name;
        }
        if let Some(api_key) = args.cloudinary_api_key {
            self.cdn.api_key = api_key;
        }
        if let Some(api_secret) = args.cloudinary_api_secret {
            self.cdn.api_secret = Secret::new(api_secret);
        }
        if let Some(folder) = args.cloudinary_folder {
            self.cdn.folder = folder;
        }
        if let Some(capacity) = args.cache_capacity {
            self.cache.capacity = capacity;
        }
        if let Some(ttl) = args.image_ttl_secs {
            self.cache.image_ttl_secs = ttl;
        }
    }

    /// Checks that every credential needed at runtime is present.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] naming the first absent setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("upstream.token", self.upstream.token.is_empty()),
            ("cdn.cloud_name", self.cdn.cloud_name.trim().is_empty()),
            ("cdn.api_key", self.cdn.api_key.trim().is_empty()),
            ("cdn.api_secret", self.cdn.api_secret.is_empty()),
        ];

        match required.iter().find(|(_, missing)| *missing) {
            Some((field, _)) => Err(ConfigError::Missing { field: *field }),
            None => Ok(()),
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            cdn: CdnConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}
