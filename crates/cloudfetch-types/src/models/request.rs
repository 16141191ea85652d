//! Inbound proxy request.

use std::fmt;

/// What the caller asked for. Built once per request and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub target_url: String,
    pub auth_header: Option<String>,
    pub accept_header: Option<String>,
}

impl ProxyRequest {
    pub fn new(
        target_url: impl Into<String>,
        auth_header: Option<String>,
        accept_header: Option<String>,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            auth_header: auth_header.filter(|v| !v.trim().is_empty()),
            accept_header: accept_header.filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn has_auth(&self) -> bool {
        self.auth_header.is_some()
    }
}

// Keeps credentials out of `{:?}` output in logs and panics.
impl fmt::Debug for ProxyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRequest")
            .field("target_url", &self.target_url)
            .field("auth_header", &self.auth_header.as_ref().map(|_| "<redacted>"))
            .field("accept_header", &self.accept_header)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_authorization() {
        let req = ProxyRequest::new(
            "https://github.com/a/b",
            Some("token ghp_secret123".to_string()),
            None,
        );
        let debug = format!("{:?}", req);
        assert!(!debug.contains("ghp_secret123"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_blank_headers_are_absent() {
        let req = ProxyRequest::new("https://github.com/a/b", Some("  ".into()), Some(String::new()));
        assert!(!req.has_auth());
        assert!(req.accept_header.is_none());
    }
}
