//! Scheme defaulting for user-typed URLs.

/// Prepends `http://` unless the URL already starts with `http://` or
/// `https://` (any case).
pub fn add_scheme(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        return url.to_string();
    }
    tracing::trace!("assuming http:// on missing scheme for {:?}", url);
    format!("http://{}", url)
}
