//! HTTP client utilities: client construction, request deadlines, URL redaction.

use std::future::Future;
use std::time::Duration;

use cloudfetch_types::{ConfigError, ProxyConfig, ProxyError};
use reqwest::{redirect, Client, Proxy, RequestBuilder, Response};
use tokio::time::Instant;
use url::Url;

/// Redirect hops followed per outbound call.
pub const MAX_REDIRECTS: usize = 10;

fn redact_proxy_url(url: &str) -> String {
    Url::parse(url)
        .map(|u| {
            let auth = if u.username().is_empty() && u.password().is_none() { "" } else { "***@" };
            format!(
                "{}://{}{}:{}",
                u.scheme(),
                auth,
                u.host_str().unwrap_or("?"),
                u.port_or_known_default().unwrap_or(0)
            )
        })
        .unwrap_or_else(|_| "<invalid-url>".to_string())
}

/// Render a target URL for logs: no userinfo, no query, no fragment.
///
/// Share links and signed storage URLs carry their secrets in the query.
pub fn redact_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or("?");
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// Shared builder with keepalive settings.
fn base_builder(config: &ProxyConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .tcp_nodelay(true)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .http2_keep_alive_interval(Duration::from_secs(25))
        .http2_keep_alive_timeout(Duration::from_secs(10))
        .http2_keep_alive_while_idle(true)
}

/// Build the process-wide outbound client.
///
/// No total timeout is set on the client: it would cap the size of a streamed
/// download. Deadlines are applied per request with [`Deadline`] instead.
///
/// Returns `Err` if an egress proxy is configured but unusable; it never
/// silently falls back to a direct connection.
pub fn build_http_client(config: &ProxyConfig) -> Result<Client, ConfigError> {
    let mut builder = base_builder(config);

    let upstream = &config.upstream_proxy;
    if upstream.enabled {
        if upstream.url.trim().is_empty() {
            return Err(ConfigError::ClientBuild {
                message: "proxy enabled but URL is empty, refusing to fall back to direct connection"
                    .to_string(),
            });
        }
        let proxy = Proxy::all(&upstream.url)
            .map_err(|e| ConfigError::ClientBuild { message: format!("invalid proxy URL: {e}") })?;
        builder = builder.proxy(proxy);
        tracing::info!(proxy = %redact_proxy_url(&upstream.url), "HTTP client: upstream proxy enabled");
    }

    builder
        .build()
        .map_err(|e| ConfigError::ClientBuild { message: format!("HTTP client builder failed: {e}") })
}

/// Absolute point in time after which a request's outbound work is abandoned.
///
/// Created once when a request enters the router and shared by every
/// sequential outbound call it makes.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self { at: Instant::now() + budget, budget }
    }

    /// Run `fut` until the deadline. Expiry drops (and so cancels) the future.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ProxyError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| ProxyError::Timeout { duration_secs: self.budget.as_secs() })
    }

    /// Send a request, mapping transport failures and deadline expiry to [`ProxyError`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ProxyError> {
        self.run(request.send()).await?.map_err(transport_error)
    }
}

/// Convert a reqwest failure without echoing the URL, which may be signed.
pub fn transport_error(err: reqwest::Error) -> ProxyError {
    ProxyError::Transport { message: err.without_url().to_string() }
}
