//! GitHub release models.

use serde::{Deserialize, Serialize};

/// Coordinates parsed from `/{owner}/{repo}/releases/download/{tag}/{filename}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAssetRef {
    pub owner: String,
    pub repo: String,
    pub tag: String,
    pub filename: String,
}

/// Subset of the `GET /repos/{owner}/{repo}/releases/tags/{tag}` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseMetadata {
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One entry of a release's `assets` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    /// API URL of the asset (`url` in the GitHub payload), not the browser URL.
    #[serde(rename = "url")]
    pub api_url: String,
    #[serde(default)]
    pub size: u64,
}

impl ReleaseMetadata {
    /// Exact, case-sensitive name match.
    pub fn find_asset(&self, filename: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == filename)
    }
}
