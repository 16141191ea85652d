//! # cloudfetch Core
//!
//! Request semantics for the cloudfetch download proxy.
//!
//! ```text
//! cloudfetch-core/src/
//! ├── proxy/
//! │   ├── whitelist.rs      # provider domain whitelist (the security boundary)
//! │   ├── classifier.rs     # provider label for diagnostics + credential gating
//! │   ├── github/           # private release asset resolution via the REST API
//! │   ├── fetcher.rs        # single-hop direct fetch
//! │   ├── response.rs       # JSON error envelope + streaming relay
//! │   ├── active_downloads.rs # in-flight relay count for shutdown logs
//! │   ├── middleware/cors.rs
//! │   ├── handler.rs        # per-request routing
//! │   └── server.rs         # AppState + axum router
//! └── utils/http.rs         # outbound client, deadlines, URL redaction
//! ```
//!
//! The only state shared between requests is the immutable [`proxy::DomainWhitelist`]
//! and the pooled `reqwest::Client`, plus a counter of relays in flight.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod proxy;
pub mod utils;

pub use proxy::{build_proxy_router, AppState, DomainWhitelist};
