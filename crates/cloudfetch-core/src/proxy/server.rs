use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use cloudfetch_types::{ConfigError, ProxyConfig};
use reqwest::Client;
use url::Url;

use super::active_downloads::ActiveDownloads;
use super::handler::handle_proxy_request;
use super::whitelist::DomainWhitelist;
use crate::utils::http::build_http_client;

/// Shared state for every request. Only the download counter mutates.
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config: ProxyConfig,
    pub whitelist: Arc<DomainWhitelist>,
    pub http_client: Client,
    pub github_api_base: Url,
    pub active_downloads: ActiveDownloads,
}

impl AppState {
    /// Validate `config`, build the outbound client and the builtin whitelist.
    pub fn from_config(config: ProxyConfig) -> Result<Self, ConfigError> {
        config.check()?;
        let http_client = build_http_client(&config)?;
        Self::new(config, Arc::new(DomainWhitelist::builtin()), http_client)
    }

    /// Assemble state from pre-built parts.
    pub fn new(
        config: ProxyConfig,
        whitelist: Arc<DomainWhitelist>,
        http_client: Client,
    ) -> Result<Self, ConfigError> {
        let github_api_base = Url::parse(&config.github_api_base)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| ConfigError::ValidationError {
                field: "github_api_base".to_string(),
                message: format!("'{}' is not an http(s) URL", config.github_api_base),
            })?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                whitelist,
                http_client,
                github_api_base,
                active_downloads: ActiveDownloads::new(),
            }),
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    pub fn whitelist(&self) -> &DomainWhitelist {
        &self.inner.whitelist
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.inner.config.request_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.inner.config.idle_timeout)
    }

    pub fn max_transfer(&self) -> Duration {
        Duration::from_secs(self.inner.config.max_transfer_secs)
    }

    /// Relays whose body is still streaming.
    pub fn active_downloads(&self) -> &ActiveDownloads {
        &self.inner.active_downloads
    }
}

/// The proxy surface: every path and method goes to the request router.
pub fn build_proxy_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/", any(handle_proxy_request))
        .fallback(handle_proxy_request)
        .with_state(state)
}
