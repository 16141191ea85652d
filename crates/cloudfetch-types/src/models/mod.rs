//! Domain models for the cloudfetch proxy.

mod config;
mod provider;
mod release;
mod request;

pub use config::{ProxyConfig, UpstreamProxyConfig, DEFAULT_GITHUB_API_BASE, DEFAULT_USER_AGENT};
pub use provider::ServiceKind;
pub use release::{ReleaseAsset, ReleaseAssetRef, ReleaseMetadata};
pub use request::ProxyRequest;
