//! Path and naming helpers shared by the publication and font modules.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside one path segment of an `href`.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

/// Characters escaped in a fragment identifier.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'%');

/// Relative, percent-encoded reference from resource `from` to resource `to`.
///
/// Both are package paths with `/` separators. Returns an empty string when
/// they name the same resource.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(relative_href("OPS/text/a.xhtml", "OPS/text/b.xhtml"), "b.xhtml");
/// assert_eq!(relative_href("OPS/style.css", "OPS/fonts/x.ttf"), "fonts/x.ttf");
/// assert_eq!(relative_href("OPS/text/a.xhtml", "OPS/style.css"), "../style.css");
/// ```
pub fn relative_href(from: &str, to: &str) -> String {
    if from == to {
        return String::new();
    }

    let from_dirs: Vec<&str> = match from.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to_parts: Vec<&str> = to.split('/').collect();
    let (to_dirs, to_file) = to_parts.split_at(to_parts.len() - 1);

    let common = from_dirs
        .iter()
        .zip(to_dirs)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_dirs.len() {
        segments.push("..".to_string());
    }
    for segment in to_dirs[common..].iter().chain(to_file) {
        segments.push(utf8_percent_encode(segment, SEGMENT).to_string());
    }
    segments.join("/")
}

/// Append `#fragment` to an href, percent-encoding the fragment.
pub fn with_fragment(href: &str, fragment: &str) -> String {
    format!("{href}#{}", utf8_percent_encode(fragment, FRAGMENT))
}

/// Reduce a display name to characters safe in a resource file name.
///
/// Runs of anything other than ASCII alphanumerics, `-` and `_` collapse to a
/// single `_`.
pub fn sanitize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if pending && !result.is_empty() {
                result.push('_');
            }
            pending = false;
            result.push(c);
        } else {
            pending = true;
        }
    }
    if result.is_empty() {
        result.push_str("font");
    }
    result
}

/// Guess a media type from a resource name's extension.
pub fn media_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xhtml" | "html" | "htm" => "application/xhtml+xml",
        "css" => "text/css",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ncx" => "application/x-dtbncx+xml",
        _ => "application/octet-stream",
    }
}
