use cloudfetch_types::{ProxyError, ReleaseAssetRef, ReleaseMetadata};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use url::Url;

use crate::utils::http::{transport_error, Deadline};

pub const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
pub const ACCEPT_OCTET_STREAM: &str = "application/octet-stream";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Resolves a private release asset in three sequential calls:
/// release by tag, exact-name asset lookup, authenticated asset download.
///
/// Nothing is retried and nothing is cached between requests.
pub struct GitHubAssetResolver<'a> {
    client: &'a Client,
    api_base: &'a Url,
    user_agent: &'a str,
}

impl<'a> GitHubAssetResolver<'a> {
    pub fn new(client: &'a Client, api_base: &'a Url, user_agent: &'a str) -> Self {
        Self { client, api_base, user_agent }
    }

    /// `{api_base}/repos/{owner}/{repo}/releases/tags/{tag}`, each part percent-encoded.
    pub fn release_tag_url(&self, asset: &ReleaseAssetRef) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "repos",
                asset.owner.as_str(),
                asset.repo.as_str(),
                "releases",
                "tags",
                asset.tag.as_str(),
            ]);
        }
        url
    }

    /// Returns the upstream response whose body is the asset's bytes.
    ///
    /// `authorization` is forwarded verbatim as an opaque credential.
    pub async fn resolve(
        &self,
        asset: &ReleaseAssetRef,
        authorization: &str,
        deadline: &Deadline,
    ) -> Result<Response, ProxyError> {
        let release_url = self.release_tag_url(asset);
        tracing::debug!(
            owner = %asset.owner,
            repo = %asset.repo,
            tag = %asset.tag,
            "Looking up release by tag"
        );

        let response = deadline
            .send(
                self.client
                    .get(release_url)
                    .header(AUTHORIZATION, authorization)
                    .header(ACCEPT, ACCEPT_GITHUB_JSON)
                    .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
                    .header(USER_AGENT, self.user_agent),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), tag = %asset.tag, "Release lookup failed");
            return Err(ProxyError::ReleaseLookupFailed {
                status: status.as_u16(),
                tag: asset.tag.clone(),
            });
        }

        let metadata: ReleaseMetadata =
            deadline.run(response.json()).await?.map_err(transport_error)?;

        let Some(found) = metadata.find_asset(&asset.filename) else {
            tracing::warn!(
                filename = %asset.filename,
                available = metadata.assets.len(),
                "Release has no asset with this name"
            );
            return Err(ProxyError::AssetNotFound {
                filename: asset.filename.clone(),
                tag: asset.tag.clone(),
            });
        };

        tracing::debug!(filename = %found.name, size = found.size, "Downloading asset via API");

        // reqwest drops Authorization when the redirect leaves the API host,
        // so the signed storage URL never sees the token.
        let response = deadline
            .send(
                self.client
                    .get(found.api_url.as_str())
                    .header(AUTHORIZATION, authorization)
                    .header(ACCEPT, ACCEPT_OCTET_STREAM)
                    .header(USER_AGENT, self.user_agent),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), filename = %found.name, "Asset download failed");
            return Err(ProxyError::AssetDownloadFailed {
                status: status.as_u16(),
                filename: found.name.clone(),
            });
        }

        Ok(response)
    }
}
