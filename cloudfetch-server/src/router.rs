use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use cloudfetch_core::proxy::middleware::cors_layer;
use cloudfetch_core::{build_proxy_router, AppState};
use tower_http::trace::TraceLayer;

/// Health and version routes in front of the proxy; every other path falls
/// through to the proxy router.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/version", get(version_info));

    public_routes
        .merge(build_proxy_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({"status": "ok"})))
}

async fn version_info() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "version": option_env!("GIT_VERSION").unwrap_or("dev"),
            "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
            "cargo_version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use axum_test::TestServer;
    use cloudfetch_types::ProxyConfig;

    fn server() -> TestServer {
        let state = AppState::from_config(ProxyConfig::default()).unwrap();
        TestServer::new(build_router(state)).unwrap()
    }

    #[tokio::test]
    async fn test_health_routes() {
        let server = server();
        for uri in ["/health", "/healthz"] {
            let response = server.get(uri).await;
            response.assert_status_ok();
            assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
        }
    }

    #[tokio::test]
    async fn test_browser_preflight_on_health_route() {
        let response = server()
            .method(axum::http::Method::OPTIONS, "/health")
            .add_header(header::ORIGIN, header::HeaderValue::from_static("https://app.example"))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                header::HeaderValue::from_static("GET"),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[tokio::test]
    async fn test_version_route() {
        let response = server().get("/version").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["cargo_version"], env!("CARGO_PKG_VERSION"));
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_path_reaches_proxy() {
        let response = server()
            .get("/download")
            .add_query_param("url", "https://example.com/a.csv")
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("example.com"));
    }
}
