//! Shared helpers for writing rules.

use crate::engine::{ParseError, Parser};
use crate::{Capture, Matcher, Node, ParseState, Scope};

/// Matcher firing only in block mode.
pub fn block_regex(re: &'static fancy_regex::Regex) -> Matcher {
    Matcher::Scoped(re, Scope::BLOCK)
}

/// Matcher firing only in inline mode.
pub fn inline_regex(re: &'static fancy_regex::Regex) -> Matcher {
    Matcher::Scoped(re, Scope::INLINE)
}

/// Matcher firing in either mode.
pub fn any_scope_regex(re: &'static fancy_regex::Regex) -> Matcher {
    Matcher::Scoped(re, Scope::BLOCK | Scope::INLINE)
}

/// Parse `content` in inline mode, restoring the caller's mode afterwards
/// (also on error).
pub fn parse_inline(
    parser: &Parser<'_>,
    content: &str,
    state: &mut ParseState,
) -> Result<Vec<Node>, ParseError> {
    let was_inline = state.inline;
    state.inline = true;
    let result = parser.nested(content, state);
    state.inline = was_inline;
    result
}

/// Parse `content` in block mode with the block terminator appended,
/// restoring the caller's mode afterwards (also on error).
pub fn parse_block(
    parser: &Parser<'_>,
    content: &str,
    state: &mut ParseState,
) -> Result<Vec<Node>, ParseError> {
    let was_inline = state.inline;
    state.inline = false;
    let result = parser.nested(&format!("{content}\n\n"), state);
    state.inline = was_inline;
    result
}

/// Inline-parse the first capture group; the shape of most emphasis-style
/// `parse` implementations.
pub fn parse_capture_inline(
    capture: &Capture,
    parser: &Parser<'_>,
    state: &mut ParseState,
) -> Result<Vec<Node>, ParseError> {
    parse_inline(parser, capture.text(1), state)
}
