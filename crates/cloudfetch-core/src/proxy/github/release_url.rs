use cloudfetch_types::ReleaseAssetRef;
use percent_encoding::percent_decode_str;
use url::Url;

/// Only browser URLs on this exact host take the API resolution path.
pub const GITHUB_WEB_HOST: &str = "github.com";

/// Match `https://github.com/{owner}/{repo}/releases/download/{tag}/{filename}`.
///
/// Returns `None` for any other shape, including `releases/latest/download`
/// and URLs with extra or empty segments.
pub fn parse_release_asset(url: &Url) -> Option<ReleaseAssetRef> {
    let host = url.host_str()?.trim_end_matches('.');
    if !host.eq_ignore_ascii_case(GITHUB_WEB_HOST) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    let [owner, repo, "releases", "download", tag, filename] = segments.as_slice() else {
        return None;
    };

    let decode = |segment: &str| -> Option<String> {
        let decoded = percent_decode_str(segment).decode_utf8().ok()?;
        (!decoded.is_empty()).then(|| decoded.into_owned())
    };

    Some(ReleaseAssetRef {
        owner: decode(*owner)?,
        repo: decode(*repo)?,
        tag: decode(*tag)?,
        filename: decode(*filename)?,
    })
}
