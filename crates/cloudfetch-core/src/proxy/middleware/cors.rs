// CORS headers
//
// Browser callers cannot see a response that lacks these. The proxy handler
// sets them itself; `cors_layer` covers every other route on the server.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::proxy::response::{X_PROXY_AUTH, X_PROXY_METHOD, X_PROXY_SERVICE};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, Accept";
pub const MAX_AGE_SECS: &str = "86400";
const MAX_AGE: Duration = Duration::from_secs(86400);
pub const EXPOSE_HEADERS: &str =
    "Content-Length, Content-Disposition, X-Proxy-Service, X-Proxy-Auth, X-Proxy-Method";

/// Insert (or overwrite) the CORS header set.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
    headers
        .insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static(EXPOSE_HEADERS));
}

/// Answer to `OPTIONS`: headers only, no body, no outbound work.
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    apply_cors_headers(response.headers_mut());
    response
}

/// Browser access rules for routes that do not go through `route_request`.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_DISPOSITION,
            X_PROXY_SERVICE,
            X_PROXY_AUTH,
            X_PROXY_METHOD,
        ])
        .allow_credentials(false)
        .max_age(MAX_AGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_headers() {
        let response = preflight_response();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization, Accept"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    fn layered() -> axum_test::TestServer {
        let app = axum::Router::new()
            .route("/health", axum::routing::get(|| async { "ok" }))
            .layer(cors_layer());
        axum_test::TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_layer_answers_browser_preflight() {
        let response = layered()
            .method(Method::OPTIONS, "/health")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example"))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("GET"),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("GET") && methods.contains("OPTIONS"));
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
        assert!(allowed.contains("authorization"));
    }

    #[tokio::test]
    async fn test_layer_exposes_proxy_headers() {
        let response = layered()
            .get("/health")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example"))
            .await;
        response.assert_status_ok();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let exposed = headers[header::ACCESS_CONTROL_EXPOSE_HEADERS].to_str().unwrap();
        assert!(exposed.contains("content-disposition"));
        assert!(exposed.contains("x-proxy-auth"));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers);
        apply_cors_headers(&mut headers);
        assert_eq!(headers.get_all(header::ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(), 1);
    }
}
