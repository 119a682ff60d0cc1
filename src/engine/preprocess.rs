//! Input normalization.
//!
//! Applied once by the outer parse, before any rule sees the source. The
//! substitutions are long-standing compatibility quirks and are preserved
//! exactly: `\r\n`/`\r` become four spaces (not `\n`), form feeds are
//! removed, and tabs become newlines (not spaces). Downstream regexes are
//! written against this normalized form; do not "fix" the substitutions
//! without reworking the rule table.

/// Normalize line endings, form feeds and tabs.
///
/// Idempotent: no replacement reintroduces a character an earlier step
/// consumes.
pub fn preprocess(source: &str) -> String {
    let source = regex!(r"\r\n?").replace_all(source, "    ");
    let source = regex!(r"\f").replace_all(&source, "");
    regex!(r"\t").replace_all(&source, "\n").into_owned()
}
