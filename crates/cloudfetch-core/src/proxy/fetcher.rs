//! Default single-hop fetch for everything not routed to the GitHub API.

use cloudfetch_types::{ProxyError, ProxyRequest, ServiceKind};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use url::Url;

use crate::utils::http::Deadline;

/// Sent when the caller supplied no Accept header.
pub const DEFAULT_ACCEPT: &str = "application/octet-stream, */*";

/// Successful upstream response plus whether the credential went out with it.
#[derive(Debug)]
pub struct DirectFetch {
    pub response: Response,
    pub auth_forwarded: bool,
}

/// GET `target` (following redirects) and hand back the un-read response.
///
/// The caller's Authorization header is forwarded only to GitHub-classified
/// hosts. Google Drive, Dropbox and unknown hosts never receive it.
pub async fn fetch_direct(
    client: &Client,
    target: &Url,
    request: &ProxyRequest,
    service: ServiceKind,
    user_agent: &str,
    deadline: &Deadline,
) -> Result<DirectFetch, ProxyError> {
    let accept = request.accept_header.as_deref().unwrap_or(DEFAULT_ACCEPT);
    let mut builder =
        client.get(target.clone()).header(USER_AGENT, user_agent).header(ACCEPT, accept);

    let credential = request.auth_header.as_deref().filter(|_| service.accepts_credentials());
    if let Some(credential) = credential {
        builder = builder.header(AUTHORIZATION, credential);
    } else if request.has_auth() {
        tracing::debug!(service = %service, "Authorization withheld from non-GitHub target");
    }

    let response = deadline.send(builder).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProxyError::Upstream { status: status.as_u16() });
    }

    Ok(DirectFetch { response, auth_forwarded: credential.is_some() })
}
