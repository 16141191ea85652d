//! Proxy runtime configuration.
//!
//! There is no config file. The binary fills this from flags and environment
//! variables and validates it once at startup.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConfigError;

/// GitHub REST API root.
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Desktop browser UA. Some providers reject requests with a default or
/// missing User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Egress proxy for outbound fetches.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpstreamProxyConfig {
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
}

/// Full proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ProxyConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[validate(range(min = 1_u16))]
    pub port: u16,
    /// Deadline in seconds for outbound calls up to response headers
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Max seconds between body chunks before the relay is aborted
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
    /// Upper bound in seconds on a whole download, headers to last byte
    #[validate(range(min = 1_u64, max = 86400_u64))]
    #[serde(default = "default_max_transfer_secs")]
    pub max_transfer_secs: u64,
    /// TCP/TLS connect timeout in seconds
    #[validate(range(min = 1_u64, max = 300_u64))]
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// GitHub REST API root used for private release resolution
    #[validate(url)]
    #[serde(default = "default_github_api_base")]
    pub github_api_base: String,
    /// User-Agent sent on every outbound request
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Rewrite Drive/Dropbox share links into direct-download links
    #[serde(default)]
    pub normalize_share_links: bool,
    /// Egress proxy
    #[serde(default)]
    #[validate(nested)]
    pub upstream_proxy: UpstreamProxyConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_idle_timeout() -> u64 {
    60
}

fn default_max_transfer_secs() -> u64 {
    1800
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_github_api_base() -> String {
    DEFAULT_GITHUB_API_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 8787,
            request_timeout: default_request_timeout(),
            idle_timeout: default_idle_timeout(),
            max_transfer_secs: default_max_transfer_secs(),
            connect_timeout: default_connect_timeout(),
            github_api_base: default_github_api_base(),
            user_agent: default_user_agent(),
            normalize_share_links: false,
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Run the derived validators and fold the result into a [`ConfigError`].
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|errors| ConfigError::ValidationError {
            field: errors
                .field_errors()
                .keys()
                .next()
                .map(|field| field.to_string())
                .unwrap_or_else(|| "upstream_proxy".to_string()),
            message: errors.to_string(),
        })?;

        if self.upstream_proxy.enabled && self.upstream_proxy.url.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "upstream_proxy.url".to_string(),
                message: "proxy enabled but URL is empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
