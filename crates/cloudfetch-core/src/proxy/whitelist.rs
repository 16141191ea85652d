//! Provider domain whitelist.
//!
//! This is the security boundary of the proxy: a target whose host is not an
//! entry (or a dot-suffix of an entry) is rejected before any outbound call.

use cloudfetch_types::{ProxyError, ServiceKind};
use url::Url;

pub(crate) const GITHUB_DOMAINS: &[&str] = &[
    "github.com",
    "api.github.com",
    "githubusercontent.com",
    "raw.githubusercontent.com",
    "github.io",
    "ghcr.io",
];

pub(crate) const GOOGLE_DRIVE_DOMAINS: &[&str] = &[
    "drive.google.com",
    "drive.usercontent.google.com",
    "docs.google.com",
    "googleusercontent.com",
    "googleapis.com",
];

pub(crate) const DROPBOX_DOMAINS: &[&str] = &[
    "dropbox.com",
    "www.dropbox.com",
    "dl.dropboxusercontent.com",
    "dropboxusercontent.com",
    "content.dropboxapi.com",
];

/// Domains grouped under one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDomains {
    pub service: ServiceKind,
    pub domains: Vec<String>,
}

/// Immutable set of fetchable hosts, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainWhitelist {
    groups: Vec<ProviderDomains>,
}

/// `host` equals `entry` or ends with `"." + entry`. Both must be lower-case.
pub(crate) fn host_matches(host: &str, entry: &str) -> bool {
    host == entry || host.strip_suffix(entry).is_some_and(|prefix| prefix.ends_with('.'))
}

/// Lower-case host without a trailing root dot.
pub(crate) fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

impl DomainWhitelist {
    /// The compiled-in GitHub / Google Drive / Dropbox table.
    pub fn builtin() -> Self {
        Self::new([
            (ServiceKind::GitHub, GITHUB_DOMAINS),
            (ServiceKind::GoogleDrive, GOOGLE_DRIVE_DOMAINS),
            (ServiceKind::Dropbox, DROPBOX_DOMAINS),
        ])
    }

    pub fn new<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (ServiceKind, &'a [&'a str])>,
    {
        let groups = groups
            .into_iter()
            .map(|(service, domains)| ProviderDomains {
                service,
                domains: domains.iter().map(|d| normalize_host(d)).collect(),
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[ProviderDomains] {
        &self.groups
    }

    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = normalize_host(host);
        if host.is_empty() {
            return false;
        }
        self.groups
            .iter()
            .flat_map(|group| group.domains.iter())
            .any(|entry| host_matches(&host, entry))
    }

    /// Parse and check a raw target URL. Any parse failure rejects (fail closed).
    pub fn validate(&self, raw: &str) -> Result<Url, ProxyError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ProxyError::InvalidUrl { message: e.to_string() })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::UnsupportedScheme { scheme: url.scheme().to_string() });
        }

        let host = url
            .host_str()
            .ok_or_else(|| ProxyError::InvalidUrl { message: "URL has no host".to_string() })?;

        if !self.is_allowed_host(host) {
            return Err(ProxyError::DomainNotAllowed { host: normalize_host(host) });
        }
        Ok(url)
    }
}

impl Default for DomainWhitelist {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_entries_allowed() {
        let wl = DomainWhitelist::builtin();
        for host in GITHUB_DOMAINS.iter().chain(GOOGLE_DRIVE_DOMAINS).chain(DROPBOX_DOMAINS) {
            assert!(wl.is_allowed_host(host), "{host} should be allowed");
        }
    }

    #[test]
    fn test_subdomains_allowed() {
        let wl = DomainWhitelist::builtin();
        assert!(wl.is_allowed_host("objects.githubusercontent.com"));
        assert!(wl.is_allowed_host("acme.github.io"));
        assert!(wl.is_allowed_host("uc123.dl.dropboxusercontent.com"));
        assert!(wl.is_allowed_host("lh3.googleusercontent.com"));
    }

    #[test]
    fn test_case_insensitive() {
        let wl = DomainWhitelist::builtin();
        assert!(wl.is_allowed_host("GitHub.COM"));
        assert!(wl.is_allowed_host("github.com."));
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        let wl = DomainWhitelist::builtin();
        assert!(!wl.is_allowed_host("evilgithub.com"));
        assert!(!wl.is_allowed_host("github.com.evil.net"));
        assert!(!wl.is_allowed_host("notdropbox.com"));
        assert!(!wl.is_allowed_host("google.com"));
        assert!(!wl.is_allowed_host(""));
    }

    #[test]
    fn test_validate_accepts_whitelisted_url() {
        let wl = DomainWhitelist::builtin();
        let url = wl.validate("https://raw.githubusercontent.com/acme/data/main/a.csv").unwrap();
        assert_eq!(url.host_str(), Some("raw.githubusercontent.com"));
    }

    #[test]
    fn test_validate_rejects_unlisted_host() {
        let wl = DomainWhitelist::builtin();
        assert_eq!(
            wl.validate("https://example.com/file.csv"),
            Err(ProxyError::DomainNotAllowed { host: "example.com".to_string() })
        );
    }

    #[test]
    fn test_validate_fails_closed_on_garbage() {
        let wl = DomainWhitelist::builtin();
        assert!(matches!(wl.validate("not a url"), Err(ProxyError::InvalidUrl { .. })));
        assert!(matches!(wl.validate("github.com/a/b"), Err(ProxyError::InvalidUrl { .. })));
        assert!(matches!(wl.validate(""), Err(ProxyError::InvalidUrl { .. })));
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        let wl = DomainWhitelist::builtin();
        assert_eq!(
            wl.validate("ftp://github.com/file"),
            Err(ProxyError::UnsupportedScheme { scheme: "ftp".to_string() })
        );
        assert!(wl.validate("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_userinfo_does_not_spoof_host() {
        let wl = DomainWhitelist::builtin();
        assert!(matches!(
            wl.validate("https://github.com@evil.example/x"),
            Err(ProxyError::DomainNotAllowed { .. })
        ));
    }

    #[test]
    fn test_custom_whitelist() {
        let wl = DomainWhitelist::new([(ServiceKind::Unknown, &["files.internal"][..])]);
        assert!(wl.is_allowed_host("a.files.internal"));
        assert!(!wl.is_allowed_host("github.com"));
        assert_eq!(wl.groups().len(), 1);
    }
}
