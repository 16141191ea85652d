//! Provider labelling for diagnostics.
//!
//! Never a substitute for [`DomainWhitelist::validate`](super::DomainWhitelist::validate):
//! callers only classify hosts that already passed the whitelist.

use cloudfetch_types::ServiceKind;

use super::whitelist::{
    host_matches, normalize_host, DROPBOX_DOMAINS, GITHUB_DOMAINS, GOOGLE_DRIVE_DOMAINS,
};

/// Label a hostname with its provider.
///
/// The most specific provider domain wins, so `github.dropbox.com` is Dropbox
/// and never receives a GitHub credential. Hosts outside the provider tables
/// fall back to a substring guess.
pub fn classify_service(host: &str) -> ServiceKind {
    let host = normalize_host(host);

    let tables = [
        (ServiceKind::GitHub, GITHUB_DOMAINS),
        (ServiceKind::GoogleDrive, GOOGLE_DRIVE_DOMAINS),
        (ServiceKind::Dropbox, DROPBOX_DOMAINS),
    ];
    let best = tables
        .iter()
        .flat_map(|(service, domains)| domains.iter().map(move |d| (*service, *d)))
        .filter(|(_, domain)| host_matches(&host, domain))
        .max_by_key(|(_, domain)| domain.len());
    if let Some((service, _)) = best {
        return service;
    }

    if host.contains("github") {
        ServiceKind::GitHub
    } else if host.contains("drive.google") || host.contains("googleusercontent") {
        ServiceKind::GoogleDrive
    } else if host.contains("dropbox") {
        ServiceKind::Dropbox
    } else {
        ServiceKind::Unknown
    }
}
