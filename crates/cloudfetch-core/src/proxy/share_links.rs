//! Share-link normalization (opt-in).
//!
//! Google Drive and Dropbox hand out "view" links that answer with an HTML
//! page. These rewrites turn them into the provider's direct-download form.
//! The result still goes through the whitelist like any other target.

use std::borrow::Cow;

use url::Url;

const DRIVE_HOST: &str = "drive.google.com";
const DRIVE_DOWNLOAD_HOST: &str = "drive.usercontent.google.com";

fn is_drive_file_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn drive_file_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments().map(Iterator::collect).unwrap_or_default();
    let from_path = segments
        .windows(3)
        .find(|w| w[0] == "file" && w[1] == "d")
        .map(|w| w[2].to_string());

    from_path
        .or_else(|| url.query_pairs().find(|(k, _)| k == "id").map(|(_, v)| v.into_owned()))
        .filter(|id| is_drive_file_id(id))
}

fn normalize_drive(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if host == DRIVE_DOWNLOAD_HOST && url.query_pairs().any(|(k, v)| k == "confirm" && v == "t") {
        return None;
    }
    let id = drive_file_id(url)?;
    Some(format!("https://{DRIVE_DOWNLOAD_HOST}/download?id={id}&export=download&confirm=t"))
}

fn normalize_dropbox(url: &Url) -> Option<String> {
    if url.query_pairs().any(|(k, v)| k == "dl" && v == "1") {
        return None;
    }
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "dl")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut rewritten = url.clone();
    rewritten.query_pairs_mut().clear().extend_pairs(kept).append_pair("dl", "1");
    Some(rewritten.into())
}

/// Rewrite a share link into a direct-download link, or return it unchanged.
pub fn normalize_share_url(raw: &str) -> Cow<'_, str> {
    let Ok(url) = Url::parse(raw.trim()) else {
        return Cow::Borrowed(raw);
    };
    let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
        return Cow::Borrowed(raw);
    };

    let rewritten = if host == DRIVE_HOST || host == DRIVE_DOWNLOAD_HOST {
        normalize_drive(&url)
    } else if host == "dropbox.com" || host.ends_with(".dropbox.com") {
        normalize_dropbox(&url)
    } else {
        None
    };

    match rewritten {
        Some(direct) => {
            tracing::debug!(host = %host, "Share link rewritten to direct download");
            Cow::Owned(direct)
        },
        None => Cow::Borrowed(raw),
    }
}
