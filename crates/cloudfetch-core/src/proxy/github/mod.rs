//! GitHub private release assets.
//!
//! A browser-style `releases/download` URL for a private repository redirects
//! to signed storage that rejects the caller's credential, so the asset is
//! located through the authenticated REST API instead.

mod release_url;
mod resolver;

pub use release_url::{parse_release_asset, GITHUB_WEB_HOST};
pub use resolver::{GitHubAssetResolver, ACCEPT_GITHUB_JSON, ACCEPT_OCTET_STREAM};
