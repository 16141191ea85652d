//! # cloudfetch Types
//!
//! Core types, models, and error definitions for the cloudfetch download proxy.
//!
//! - **`error`** - Typed error hierarchy for proxy requests and configuration
//! - **`models`** - Domain models (request, provider kind, release metadata, config)
//!
//! ## Architecture Role
//!
//! `cloudfetch-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!     cloudfetch-types (this crate)
//!              │
//!              ▼
//!       cloudfetch-core
//!              │
//!              ▼
//!      cloudfetch-server
//! ```
//!
//! Nothing here knows about axum or reqwest, so the types stay cheap to share
//! and easy to test.

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ConfigError, ErrorCategory, ProxyError};

// Re-export core model types
pub use models::{
    ProxyConfig, ProxyRequest, ReleaseAsset, ReleaseAssetRef, ReleaseMetadata, ServiceKind,
    UpstreamProxyConfig, DEFAULT_GITHUB_API_BASE, DEFAULT_USER_AGENT,
};
