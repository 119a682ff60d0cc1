//! HTML string building and sanitization.
//!
//! Rejected URLs and malformed input are data, not errors: every function
//! here degrades to an empty or omitted result instead of failing.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Replacement table for [`sanitize_text`]. The table also covers `/` and
/// `` ` `` although the active pattern only escapes the five primary
/// characters.
static SANITIZE_TEXT_CODES: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('<', "&lt;"),
        ('>', "&gt;"),
        ('&', "&amp;"),
        ('"', "&quot;"),
        ('\'', "&#x27;"),
        ('/', "&#x2F;"),
        ('`', "&#96;"),
    ])
});

/// Escape text for inclusion in HTML content or attribute values.
pub fn sanitize_text(text: &str) -> String {
    regex!(r#"[<>&"']"#)
        .replace_all(text, |caps: &regex::Captures| {
            caps[0]
                .chars()
                .next()
                .and_then(|c| SANITIZE_TEXT_CODES.get(&c).copied())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Validate a link/image destination.
///
/// URL-decodes, strips every character outside `[A-Za-z0-9/:]`, lowercases,
/// and rejects `javascript:`, `vbscript:` and `data:` schemes. Returns the
/// *original* string when accepted; `None` when rejected or undecodable.
pub fn sanitize_url(url: Option<&str>) -> Option<String> {
    let url = url?;
    if url.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(url).ok()?;
    let prot = regex!(r"[^A-Za-z0-9/:]").replace_all(&decoded, "").to_lowercase();
    if prot.starts_with("javascript:") || prot.starts_with("vbscript:") || prot.starts_with("data:")
    {
        return None;
    }
    Some(url.to_string())
}

/// Drop the backslash from `\X` escapes in a raw href.
pub fn unescape_url(raw_url: &str) -> String {
    regex!(r"\\([^0-9A-Za-z\s])").replace_all(raw_url, "$1").into_owned()
}

/// Render `<name k="v" …>inner</name>`, or just the open tag when
/// `is_closed` is false. Attribute names and values are sanitized;
/// missing or empty values drop the attribute entirely.
pub fn html_tag(
    tag_name: &str,
    content: &str,
    attributes: &[(&str, Option<String>)],
    is_closed: bool,
) -> String {
    let mut attribute_string = String::new();
    for (name, value) in attributes {
        let Some(value) = value else { continue };
        if value.is_empty() {
            continue;
        }
        attribute_string.push_str(&format!(" {}=\"{}\"", sanitize_text(name), sanitize_text(value)));
    }

    let unclosed_tag = format!("<{tag_name}{attribute_string}>");
    if is_closed {
        format!("{unclosed_tag}{content}</{tag_name}>")
    } else {
        unclosed_tag
    }
}
