//! Configuration types and loading
//!
//! Read once at startup, never re-read. Precedence: CLI args > env vars >
//! config file > defaults. The proxy list path can be overridden with the
//! PROXY_FILE env var so the same file can be reused across hosts.

use marketplace::constants::DEFAULT_SESSION_COOKIE;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub algorithm: AlgorithmConfig,
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub proxies: ProxyConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Polling behavior
#[derive(Debug, Deserialize)]
pub struct AlgorithmConfig {
    /// Item lookups in flight during one poll pass
    pub concurrent_requests: usize,
    /// Drop items whose seller has no rating
    #[serde(default)]
    pub filter_zero_stars_profiles: bool,
}

/// Storefront settings
#[derive(Debug, Deserialize)]
pub struct MarketplaceConfig {
    pub base_url: String,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Egress proxies
#[derive(Debug, Default, Deserialize)]
pub struct ProxyConfig {
    /// One proxy per line; absent means direct egress
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Where the credential refresh actor runs
#[derive(Debug, Default, Deserialize)]
pub struct RefreshConfig {
    #[serde(default)]
    pub mode: RefreshMode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Dedicated thread with its own runtime
    #[default]
    Background,
    /// Task on the main runtime
    Inline,
}

/// Terminal output
#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_separator_width")]
    pub separator_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            separator_width: default_separator_width(),
        }
    }
}

/// Prometheus exposition
#[derive(Debug, Default, Deserialize)]
pub struct MetricsConfig {
    /// Scrape endpoint address; metrics are not exported when absent
    #[serde(default)]
    pub listen_addr: Option<SocketAddr>,
}

fn default_session_cookie() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_separator_width() -> usize {
    80
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.algorithm.concurrent_requests == 0 {
            return Err(Error::invalid(
                "algorithm",
                "concurrent_requests",
                "must be at least 1",
            ));
        }

        if !config.marketplace.base_url.starts_with("http://")
            && !config.marketplace.base_url.starts_with("https://")
        {
            return Err(Error::invalid(
                "marketplace",
                "base_url",
                format!(
                    "must start with http:// or https://, got: {}",
                    config.marketplace.base_url
                ),
            ));
        }

        if config.marketplace.timeout_secs == 0 {
            return Err(Error::invalid(
                "marketplace",
                "timeout_secs",
                "must be greater than 0",
            ));
        }

        if config.marketplace.session_cookie.trim().is_empty() {
            return Err(Error::invalid(
                "marketplace",
                "session_cookie",
                "must not be empty",
            ));
        }

        if config.display.separator_width == 0 {
            return Err(Error::invalid(
                "display",
                "separator_width",
                "must be greater than 0",
            ));
        }

        if let Ok(file) = std::env::var("PROXY_FILE") {
            if !file.trim().is_empty() {
                config.proxies.file = Some(PathBuf::from(file.trim()));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("marketplace-monitor.toml")
    }
}
