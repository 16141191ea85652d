//! Storage provider labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider a target URL belongs to.
///
/// Diagnostic only: it fills `X-Proxy-Service` and gates credential
/// forwarding, but never decides whether a host may be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    GitHub,
    GoogleDrive,
    Dropbox,
    Unknown,
}

impl ServiceKind {
    /// Value used in the `X-Proxy-Service` response header.
    pub fn label(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GoogleDrive => "Google Drive",
            Self::Dropbox => "Dropbox",
            Self::Unknown => "Unknown",
        }
    }

    /// Only GitHub targets ever see the caller's Authorization header.
    pub fn accepts_credentials(self) -> bool {
        matches!(self, Self::GitHub)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
