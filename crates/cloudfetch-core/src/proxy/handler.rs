//! Per-request routing.
//!
//! ```text
//! RECEIVED ─┬─ OPTIONS ──────────────▶ PREFLIGHT_OK
//!           ├─ not GET ──────────────▶ METHOD_REJECTED
//!           ├─ no url ───────────────▶ USAGE_INFO
//!           └─ DOMAIN_CHECKED ─┬─────▶ REJECTED
//!                              ├─ private release + auth ─▶ API_RESOLUTION ─▶ STREAMED | ERROR
//!                              └─ otherwise ──────────────▶ DIRECT_FETCH  ─▶ STREAMED | ERROR
//! ```

use std::borrow::Cow;

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderName, Method},
    response::Response,
};
use cloudfetch_types::{ErrorCategory, ProxyError, ProxyRequest};
use tracing::Instrument;

use super::classifier::classify_service;
use super::fetcher::fetch_direct;
use super::github::{parse_release_asset, GitHubAssetResolver};
use super::middleware::preflight_response;
use super::response::{error_response, relay_response, usage_response, RelayLimits, RelayMeta};
use super::server::AppState;
use super::share_links::normalize_share_url;
use crate::utils::http::{redact_url, Deadline};

/// Axum entry point for the proxy route.
pub async fn handle_proxy_request(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    route_request(&state, &method, &headers, query.as_deref()).await
}

/// First non-empty `url` value of a query string, form-decoded.
pub fn target_url_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .filter(|(key, _)| key == "url")
        .map(|(_, value)| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Map one inbound request to exactly one response.
pub async fn route_request(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Response {
    if method == Method::OPTIONS {
        return preflight_response();
    }
    if method != Method::GET {
        tracing::debug!(%method, "Rejected method");
        return error_response(&ProxyError::MethodNotAllowed { method: method.to_string() });
    }

    let Some(target) = target_url_param(query) else {
        return usage_response(state.whitelist());
    };

    let request = ProxyRequest::new(
        target,
        header_string(headers, header::AUTHORIZATION),
        header_string(headers, header::ACCEPT),
    );

    let request_id = uuid::Uuid::new_v4().simple().to_string();
    let span = tracing::info_span!("proxy", id = %&request_id[..8]);

    async {
        match proxy(state, &request).await {
            Ok(response) => response,
            Err(err) => {
                match err.category() {
                    ErrorCategory::Transport => tracing::error!(status = err.http_status_code(), "{}", err),
                    _ => tracing::warn!(status = err.http_status_code(), "{}", err),
                }
                error_response(&err)
            },
        }
    }
    .instrument(span)
    .await
}

async fn proxy(state: &AppState, request: &ProxyRequest) -> Result<Response, ProxyError> {
    let raw_target = if state.config().normalize_share_links {
        normalize_share_url(&request.target_url)
    } else {
        Cow::Borrowed(request.target_url.as_str())
    };

    let target = state.whitelist().validate(&raw_target)?;
    let service = classify_service(target.host_str().unwrap_or_default());
    let deadline = Deadline::after(state.request_timeout());
    let limits = RelayLimits::new(state.idle_timeout(), state.max_transfer());
    let inner = &state.inner;

    if let (Some(asset), Some(authorization)) =
        (parse_release_asset(&target), request.auth_header.as_deref())
    {
        tracing::info!(
            service = %service,
            target = %redact_url(&target),
            branch = "api-asset",
            "Resolving private release asset"
        );
        let resolver = GitHubAssetResolver::new(
            &inner.http_client,
            &inner.github_api_base,
            &inner.config.user_agent,
        );
        let upstream = resolver.resolve(&asset, authorization, &deadline).await?;
        tracing::info!(status = upstream.status().as_u16(), "Relaying release asset");
        return Ok(relay_response(
            upstream,
            RelayMeta::api_asset(),
            limits,
            state.active_downloads().track(),
        ));
    }

    tracing::info!(
        service = %service,
        target = %redact_url(&target),
        branch = "direct",
        auth = request.has_auth(),
        "Fetching"
    );
    let fetched = fetch_direct(
        &inner.http_client,
        &target,
        request,
        service,
        &inner.config.user_agent,
        &deadline,
    )
    .await?;
    tracing::info!(
        status = fetched.response.status().as_u16(),
        auth_forwarded = fetched.auth_forwarded,
        "Relaying upstream response"
    );

    Ok(relay_response(
        fetched.response,
        RelayMeta::direct(service, fetched.auth_forwarded),
        limits,
        state.active_downloads().track(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url_param_decodes() {
        let query = "url=https%3A%2F%2Fgithub.com%2Facme%2Fdata%2Fraw%2Fmain%2Fa.csv";
        assert_eq!(
            target_url_param(Some(query)).as_deref(),
            Some("https://github.com/acme/data/raw/main/a.csv")
        );
    }

    #[test]
    fn test_target_url_param_missing_or_empty() {
        assert_eq!(target_url_param(None), None);
        assert_eq!(target_url_param(Some("")), None);
        assert_eq!(target_url_param(Some("url=")), None);
        assert_eq!(target_url_param(Some("uri=https://github.com")), None);
    }

    #[test]
    fn test_target_url_param_skips_empty_values() {
        let query = "url=&url=https%3A%2F%2Fgithub.com%2Facme%2Fdata%2Fraw%2Fmain%2Fa.csv";
        assert_eq!(
            target_url_param(Some(query)).as_deref(),
            Some("https://github.com/acme/data/raw/main/a.csv")
        );
        assert_eq!(target_url_param(Some("url=%20&url=")), None);
    }

    #[test]
    fn test_target_url_param_keeps_inner_query_marker() {
        let query = "url=https://www.dropbox.com/s/abc/a.csv?dl=1";
        assert_eq!(
            target_url_param(Some(query)).as_deref(),
            Some("https://www.dropbox.com/s/abc/a.csv?dl=1")
        );
    }
}
