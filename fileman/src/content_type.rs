//! File extension to MIME type resolution.

/// Extension table, checked as a case-sensitive suffix match in order.
const TABLE: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".htm", "text/html"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".ico", "image/x-icon"),
    (".txt", "text/plain"),
    (".jpg", "image/jpeg"),
    (".png", "image/png"),
];

/// Resolve the `Content-Type` for a file path from its extension.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn content_type_for(path: &str) -> &'static str {
    for (suffix, mime) in TABLE {
        if path.ends_with(suffix) {
            return mime;
        }
    }
    "application/octet-stream"
}
