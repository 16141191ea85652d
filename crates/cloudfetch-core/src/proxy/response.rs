//! Response construction: the JSON error envelope and the streaming relay.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use cloudfetch_types::{ProxyError, ServiceKind};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::time::Instant;

use super::active_downloads::ActiveDownloadGuard;
use super::middleware::apply_cors_headers;
use super::whitelist::DomainWhitelist;

pub const X_PROXY_SERVICE: HeaderName = HeaderName::from_static("x-proxy-service");
pub const X_PROXY_AUTH: HeaderName = HeaderName::from_static("x-proxy-auth");
pub const X_PROXY_METHOD: HeaderName = HeaderName::from_static("x-proxy-method");

/// `X-Proxy-Method` value for the GitHub API resolution path.
pub const METHOD_API_ASSET: &str = "api-asset";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// `{ error, status?, hint? }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&ProxyError> for ErrorBody {
    fn from(err: &ProxyError) -> Self {
        Self {
            error: err.to_string(),
            status: err.upstream_status(),
            hint: err.hint().map(str::to_string),
        }
    }
}

fn no_store(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
}

/// Build the JSON error response for any failure.
pub fn error_response(err: &ProxyError) -> Response {
    let status = StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, Json(ErrorBody::from(err))).into_response();
    if matches!(err, ProxyError::MethodNotAllowed { .. }) {
        response.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET, OPTIONS"));
    }
    no_store(response.headers_mut());
    apply_cors_headers(response.headers_mut());
    response
}

#[derive(Debug, Serialize)]
struct ProviderUsage {
    service: &'static str,
    domains: Vec<String>,
}

#[derive(Debug, Serialize)]
struct UsageBody {
    error: String,
    hint: &'static str,
    usage: &'static str,
    private_github: &'static str,
    providers: Vec<ProviderUsage>,
}

/// 400 for a request without a `url` parameter, describing how to call the proxy.
pub fn usage_response(whitelist: &DomainWhitelist) -> Response {
    let err = ProxyError::MissingUrl;
    let body = UsageBody {
        error: err.to_string(),
        hint: err.hint().unwrap_or_default(),
        usage: "GET /?url=<percent-encoded URL>",
        private_github: "Send 'Authorization: token <PAT>' to download assets of private GitHub releases",
        providers: whitelist
            .groups()
            .iter()
            .map(|group| ProviderUsage {
                service: group.service.label(),
                domains: group.domains.clone(),
            })
            .collect(),
    };

    let mut response = (StatusCode::BAD_REQUEST, Json(body)).into_response();
    no_store(response.headers_mut());
    apply_cors_headers(response.headers_mut());
    response
}

/// Diagnostics attached to a successful relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayMeta {
    pub service: ServiceKind,
    pub auth_forwarded: bool,
    pub api_asset: bool,
}

impl RelayMeta {
    pub fn direct(service: ServiceKind, auth_forwarded: bool) -> Self {
        Self { service, auth_forwarded, api_asset: false }
    }

    pub fn api_asset() -> Self {
        Self { service: ServiceKind::GitHub, auth_forwarded: true, api_asset: true }
    }
}

/// Time bounds applied while a body streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLimits {
    /// Longest gap allowed between two chunks.
    pub idle: Duration,
    /// Instant by which the last byte must have been relayed.
    pub transfer_deadline: Instant,
}

impl RelayLimits {
    pub fn new(idle: Duration, max_transfer: Duration) -> Self {
        Self { idle, transfer_deadline: Instant::now() + max_transfer }
    }
}

/// Stream a successful upstream response to the caller.
///
/// Only Content-Type, Content-Length and Content-Disposition are taken from
/// upstream; the body is passed through chunk by chunk, never buffered.
/// `guard` keeps the relay counted as active until the body stream is dropped.
pub fn relay_response(
    upstream: reqwest::Response,
    meta: RelayMeta,
    limits: RelayLimits,
    guard: ActiveDownloadGuard,
) -> Response {
    let upstream_headers = upstream.headers();
    let content_type = upstream_headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let content_disposition = upstream_headers.get(header::CONTENT_DISPOSITION).cloned();
    let content_length = upstream.content_length();

    let mut response = Response::new(Body::from_stream(relay_body(upstream, limits, guard)));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(length) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    if let Some(disposition) = content_disposition {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    no_store(headers);
    headers.insert(X_PROXY_SERVICE, HeaderValue::from_static(meta.service.label()));
    headers.insert(
        X_PROXY_AUTH,
        HeaderValue::from_static(if meta.auth_forwarded { "yes" } else { "no" }),
    );
    if meta.api_asset {
        headers.insert(X_PROXY_METHOD, HeaderValue::from_static(METHOD_API_ASSET));
    }
    apply_cors_headers(headers);
    response
}

/// Forward upstream chunks as they arrive.
///
/// A gap longer than `limits.idle`, or reaching `limits.transfer_deadline`,
/// ends the body with an error. That aborts the client connection and drops
/// the upstream transfer.
fn relay_body(
    upstream: reqwest::Response,
    limits: RelayLimits,
    guard: ActiveDownloadGuard,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    async_stream::stream! {
        let _guard = guard;
        let started = Instant::now();
        let mut relayed: u64 = 0;
        let mut chunks = Box::pin(upstream.bytes_stream());

        loop {
            let idle_at = Instant::now() + limits.idle;
            let wait_until = idle_at.min(limits.transfer_deadline);

            match tokio::time::timeout_at(wait_until, chunks.next()).await {
                Ok(Some(Ok(chunk))) => {
                    relayed += chunk.len() as u64;
                    yield Ok(chunk);
                },
                Ok(Some(Err(e))) => {
                    let e = e.without_url();
                    tracing::warn!(relayed, "Upstream stream failed: {}", e);
                    yield Err(std::io::Error::other(e));
                    break;
                },
                Ok(None) => {
                    tracing::info!(
                        relayed,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Stream complete"
                    );
                    break;
                },
                Err(_) if wait_until < idle_at => {
                    tracing::warn!(
                        relayed,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Transfer time limit reached, aborting relay"
                    );
                    yield Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "transfer time limit exceeded",
                    ));
                    break;
                },
                Err(_) => {
                    tracing::warn!(relayed, idle_secs = limits.idle.as_secs(), "Upstream stalled, aborting relay");
                    yield Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "upstream stalled",
                    ));
                    break;
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::proxy::active_downloads::ActiveDownloads;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// One-shot HTTP/1.1 upstream that writes its body in delayed pieces.
    async fn paced_upstream(pieces: Vec<(Duration, &'static [u8])>) -> reqwest::Response {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let total: usize = pieces.iter().map(|(_, piece)| piece.len()).sum();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {total}\r\n\r\n"
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            for (delay, piece) in pieces {
                tokio::time::sleep(delay).await;
                if socket.write_all(piece).await.is_err() {
                    return;
                }
            }
        });

        reqwest::get(format!("http://{addr}/data.csv")).await.unwrap()
    }

    fn relay(upstream: reqwest::Response, limits: RelayLimits, active: &ActiveDownloads) -> Response {
        let meta = RelayMeta::direct(ServiceKind::GitHub, false);
        relay_response(upstream, meta, limits, active.track())
    }

    fn limits(idle_secs: u64, max_transfer_secs: u64) -> RelayLimits {
        RelayLimits::new(Duration::from_secs(idle_secs), Duration::from_secs(max_transfer_secs))
    }

    #[tokio::test]
    async fn test_relay_forwards_chunks_before_upstream_finishes() {
        let pieces = vec![(Duration::ZERO, &b"id,name\n"[..]), (Duration::from_secs(3), &b"1,a\n"[..])];
        let upstream = paced_upstream(pieces).await;
        let active = ActiveDownloads::new();
        let response = relay(upstream, limits(10, 60), &active);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "12");

        let mut body = response.into_body().into_data_stream();
        let first = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("first chunk was held until the upstream finished")
            .unwrap()
            .unwrap();
        assert!(!first.is_empty());
        assert!(b"id,name\n".starts_with(&first));
        assert_eq!(active.count(), 1);

        let mut relayed = first.to_vec();
        while let Some(chunk) = body.next().await {
            relayed.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(relayed, b"id,name\n1,a\n");

        drop(body);
        assert_eq!(active.count(), 0);
    }

    #[tokio::test]
    async fn test_relay_aborts_when_upstream_goes_idle() {
        let pieces = vec![(Duration::ZERO, &b"id,name\n"[..]), (Duration::from_secs(10), &b"1,a\n"[..])];
        let upstream = paced_upstream(pieces).await;
        let active = ActiveDownloads::new();
        let response = relay(upstream, limits(1, 60), &active);
        let mut body = response.into_body().into_data_stream();

        let started = Instant::now();
        let first = body.next().await.unwrap();
        assert!(first.is_ok());

        let end = tokio::time::timeout(Duration::from_secs(4), async {
            loop {
                match body.next().await {
                    Some(Ok(_)) => continue,
                    other => return other,
                }
            }
        })
        .await
        .expect("stalled upstream was not aborted");
        assert!(matches!(end, Some(Err(_))));
        assert!(started.elapsed() < Duration::from_secs(4));

        drop(body);
        assert_eq!(active.count(), 0);
    }

    #[tokio::test]
    async fn test_relay_aborts_slow_transfer_at_time_limit() {
        // One byte every 300 ms never trips the idle timeout.
        let pieces = std::iter::repeat((Duration::from_millis(300), &b"x"[..])).take(40).collect();
        let upstream = paced_upstream(pieces).await;
        let active = ActiveDownloads::new();
        let response = relay(upstream, limits(5, 1), &active);
        let mut body = response.into_body().into_data_stream();

        let outcome = tokio::time::timeout(Duration::from_secs(4), async {
            let mut relayed = 0;
            while let Some(chunk) = body.next().await {
                relayed += chunk?.len();
            }
            Ok::<usize, axum::Error>(relayed)
        })
        .await
        .expect("relay outlived its transfer time limit");
        assert!(outcome.is_err());

        drop(body);
        assert_eq!(active.count(), 0);
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope_for_upstream_404() {
        let response = error_response(&ProxyError::Upstream { status: 404 });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let body = body_json(response).await;
        assert_eq!(body["status"], 404);
        assert!(body["hint"].as_str().unwrap().contains("Authorization"));
        assert!(body["error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_input_error_has_no_status_field() {
        let response =
            error_response(&ProxyError::DomainNotAllowed { host: "example.com".to_string() });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body.get("status").is_none());
        assert!(body["error"].as_str().unwrap().contains("example.com"));
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = error_response(&ProxyError::MethodNotAllowed { method: "POST".into() });
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, OPTIONS");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_invalid_upstream_status_becomes_bad_gateway() {
        let response = error_response(&ProxyError::Upstream { status: 1000 });
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_usage_lists_providers() {
        let response = usage_response(&DomainWhitelist::builtin());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let body = body_json(response).await;
        let services: Vec<&str> = body["providers"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["service"].as_str())
            .collect();
        assert_eq!(services, ["GitHub", "Google Drive", "Dropbox"]);
        assert!(body["usage"].as_str().unwrap().contains("url="));
    }
}
