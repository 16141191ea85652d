//! Proxy request errors.

use thiserror::Error;

/// Coarse classification used for logging and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad, missing, or disallowed input. No outbound call was made.
    Input,
    /// The authenticated GitHub release lookup did not produce an asset.
    AuthResolution,
    /// The direct fetch reached the provider but it answered non-2xx.
    Upstream,
    /// Network, DNS, TLS, or deadline failure.
    Transport,
}

/// Errors that can terminate a proxied download.
///
/// Messages and hints never contain the caller's credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// The `url` query parameter is absent or empty
    #[error("Missing 'url' query parameter")]
    MissingUrl,

    /// The target could not be parsed as an absolute URL
    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    /// Only http and https targets are fetched
    #[error("Unsupported URL scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// The target host is not on the provider whitelist
    #[error("Domain not allowed: {host}")]
    DomainNotAllowed { host: String },

    /// Anything but GET and OPTIONS
    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: String },

    /// `GET /repos/{owner}/{repo}/releases/tags/{tag}` answered non-2xx
    #[error("GitHub API error {status}: could not look up release '{tag}'")]
    ReleaseLookupFailed { status: u16, tag: String },

    /// The release exists but carries no asset with this exact name
    #[error("Asset '{filename}' not found in release '{tag}'")]
    AssetNotFound { filename: String, tag: String },

    /// The asset API URL answered non-2xx
    #[error("GitHub API error {status}: could not download asset '{filename}'")]
    AssetDownloadFailed { status: u16, filename: String },

    /// Direct fetch answered non-2xx
    #[error("Upstream returned {status}")]
    Upstream { status: u16 },

    /// The per-request deadline expired before the upstream answered
    #[error("Upstream request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Network-level failure talking to the upstream
    #[error("Upstream request failed: {message}")]
    Transport { message: String },
}

const HINT_USAGE: &str = "Usage: GET /?url=<percent-encoded URL>";
const HINT_PROVIDERS: &str =
    "Only GitHub, Google Drive and Dropbox hosts can be fetched through this proxy";
const HINT_TOKEN_REJECTED: &str =
    "GitHub rejected the token. Check that the PAT is valid and has not expired";
const HINT_TOKEN_SCOPE: &str = "Check the tag name and that the PAT has 'repo' scope (classic) \
     or 'Contents: read' access (fine-grained) to this repository";
const HINT_ASSET_NAME: &str =
    "The filename must match a release asset name exactly, including case";
const HINT_ASSET_ACCESS: &str = "Check that the PAT can read release assets of this repository";
const HINT_PRIVATE: &str = "The file may be private. For private GitHub repositories send an \
     'Authorization: token <PAT>' header";
const HINT_SHARING: &str = "The provider refused access. Check the sharing settings of the file";
const HINT_RETRY_LATER: &str = "The upstream provider did not answer in time. Try again later";

impl ProxyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingUrl
            | Self::InvalidUrl { .. }
            | Self::UnsupportedScheme { .. }
            | Self::DomainNotAllowed { .. }
            | Self::MethodNotAllowed { .. } => ErrorCategory::Input,
            Self::ReleaseLookupFailed { .. }
            | Self::AssetNotFound { .. }
            | Self::AssetDownloadFailed { .. } => ErrorCategory::AuthResolution,
            Self::Upstream { .. } => ErrorCategory::Upstream,
            Self::Timeout { .. } | Self::Transport { .. } => ErrorCategory::Transport,
        }
    }

    /// Get HTTP status code for this error.
    ///
    /// Upstream statuses are relayed as-is; the HTTP layer falls back to 502
    /// if the value is not a valid status code.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingUrl
            | Self::InvalidUrl { .. }
            | Self::UnsupportedScheme { .. }
            | Self::DomainNotAllowed { .. } => 400,
            Self::MethodNotAllowed { .. } => 405,
            Self::AssetNotFound { .. } => 404,
            Self::ReleaseLookupFailed { status, .. }
            | Self::AssetDownloadFailed { status, .. }
            | Self::Upstream { status } => *status,
            Self::Timeout { .. } => 504,
            Self::Transport { .. } => 500,
        }
    }

    /// Status reported by the upstream provider, if one was received.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::ReleaseLookupFailed { status, .. }
            | Self::AssetDownloadFailed { status, .. }
            | Self::Upstream { status } => Some(*status),
            _ => None,
        }
    }

    /// Corrective hint for the caller. Never echoes request data.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingUrl | Self::InvalidUrl { .. } | Self::UnsupportedScheme { .. } => {
                Some(HINT_USAGE)
            },
            Self::DomainNotAllowed { .. } => Some(HINT_PROVIDERS),
            Self::MethodNotAllowed { .. } => None,
            Self::ReleaseLookupFailed { status: 401, .. } => Some(HINT_TOKEN_REJECTED),
            Self::ReleaseLookupFailed { .. } => Some(HINT_TOKEN_SCOPE),
            Self::AssetNotFound { .. } => Some(HINT_ASSET_NAME),
            Self::AssetDownloadFailed { .. } => Some(HINT_ASSET_ACCESS),
            Self::Upstream { status: 404 } => Some(HINT_PRIVATE),
            Self::Upstream { status: 401 | 403 } => Some(HINT_SHARING),
            Self::Upstream { .. } => None,
            Self::Timeout { .. } => Some(HINT_RETRY_LATER),
            Self::Transport { .. } => None,
        }
    }
}
