use md5::{Digest, Md5};

/// Extension used when the URL path carries none.
pub const DEFAULT_EXTENSION: &str = ".jpg";

const HASH_LEN: usize = 8;

/// Map a remote image URL to its cache filename: `<8 hex of md5(url)><ext>`.
///
/// The digest covers the URL exactly as it appears in the feed, so the same
/// URL always lands on the same file. Empty input yields `None`.
pub fn image_filename(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }

    let digest = Md5::digest(url.as_bytes());
    let hash: String = digest
        .iter()
        .take(HASH_LEN / 2)
        .map(|b| format!("{b:02x}"))
        .collect();

    let path = url_path(url);
    let ext = extension(&path).unwrap_or(DEFAULT_EXTENSION);
    Some(format!("{hash}{ext}"))
}

/// Path component of an absolute URL, or the relative reference minus query
/// and fragment.
fn url_path(url: &str) -> String {
    if url.starts_with("http") {
        if let Ok(parsed) = url::Url::parse(url) {
            return parsed.path().to_string();
        }
    }
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

/// Extension of the last path segment including the dot, following the usual
/// "extname" rules: dotfiles and trailing dots have no extension.
fn extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let dot = segment.rfind('.')?;
    if dot == 0 || dot + 1 == segment.len() {
        return None;
    }
    let start = path.len() - segment.len() + dot;
    Some(&path[start..])
}
