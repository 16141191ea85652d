// Middleware module - Axum middleware

pub mod cors;

pub use cors::{apply_cors_headers, cors_layer, preflight_response};
