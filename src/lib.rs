//! An extensible, rule-driven Markdown parser and renderer.
//!
//! The parser is not a fixed grammar: it is a priority-ordered dispatch
//! engine over a table of [`Rule`]s, each of which owns its matching regex,
//! its capture-to-node transformation, and its per-format renderers. The
//! default table realizes standard Markdown plus the common GFM extensions
//! (tables, strikethrough, fenced code, underline, reference links/images).
//!
//! ```
//! let html = rulemark::to_html("# Hello\n\nSome *text*.\n").unwrap();
//! assert_eq!(html, "<h1>Hello</h1><div class=\"paragraph\">Some <em>text</em>.</div>");
//! ```
//!
//! Custom tables plug into the same engines: build a [`RuleTable`], hand it
//! to [`Parser`] for parsing and to [`HtmlOutput`]/[`ElementOutput`] for
//! rendering.

#[macro_use]
mod macros;
mod api;
mod element;
mod engine;
mod html;
mod node;
pub mod rules;

use std::collections::HashMap;

use thiserror::Error;

pub use api::{
    parse, parse_implicit, parse_implicit_with, parse_inline, parse_inline_with, parse_with,
    to_elements, to_elements_with, to_html, to_html_with,
};
pub use element::{Element, ElementNode, Props, Style, element};
pub use engine::{
    ElementOutput, HtmlOutput, OutputError, OutputState, ParseError, Parser, preprocess,
};
pub use html::{html_tag, sanitize_text, sanitize_url, unescape_url};
pub use node::{Align, LinkTarget, Node, RefSlot, SharedRefSlot};

// --- Matching ---------------------------------------------------------------

bitflags::bitflags! {
    /// Parsing modes a matcher is willing to fire in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Scope: u8 {
        const BLOCK  = 1 << 0;
        const INLINE = 1 << 1;
    }
}

/// The result of a rule's `match`: the full matched text, the capture
/// groups, and the offset the match started at (the engine requires 0).
///
/// Captures own their text. A matcher is free to synthesize the haystack it
/// runs its regex over (the list rule re-prepends lookbehind indentation),
/// so group texts cannot borrow from the engine's source.
#[derive(Debug, Clone)]
pub struct Capture {
    start: usize,
    groups: Vec<Option<String>>,
}

impl Capture {
    pub(crate) fn from_fancy(caps: &fancy_regex::Captures<'_>) -> Capture {
        Capture {
            start: caps.get(0).map(|m| m.start()).unwrap_or(0),
            groups: (0..caps.len()).map(|i| caps.get(i).map(|m| m.as_str().to_string())).collect(),
        }
    }

    pub(crate) fn from_plain(caps: &regex::Captures<'_>) -> Capture {
        Capture {
            start: caps.get(0).map(|m| m.start()).unwrap_or(0),
            groups: (0..caps.len()).map(|i| caps.get(i).map(|m| m.as_str().to_string())).collect(),
        }
    }

    /// Byte offset the full match started at.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The full matched text (group 0).
    pub fn full(&self) -> &str {
        self.groups.first().and_then(|g| g.as_deref()).unwrap_or("")
    }

    /// A capture group, `None` when it did not participate in the match.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// A capture group, defaulting to `""` when absent.
    pub fn text(&self, index: usize) -> &str {
        self.group(index).unwrap_or("")
    }
}

/// Custom match callback: `(source, state, previous_capture_text)`.
pub type CustomMatchFn = fn(&str, &ParseState, &str) -> Option<Capture>;

/// How a rule recognizes input at the current position.
///
/// Most rules are a scoped regex; rules that need lookbehind context or
/// extra state checks (list, table separator) use a custom callback.
pub enum Matcher {
    Scoped(&'static fancy_regex::Regex, Scope),
    Custom(CustomMatchFn),
}

impl Matcher {
    pub fn matches(&self, source: &str, state: &ParseState, previous_capture: &str) -> Option<Capture> {
        match self {
            Matcher::Scoped(re, scope) => {
                if !scope.contains(state.scope()) {
                    return None;
                }
                match re.captures(source) {
                    Ok(caps) => caps.as_ref().map(Capture::from_fancy),
                    Err(err) => {
                        log::warn!("regex failed while matching: {err}");
                        None
                    }
                }
            }
            Matcher::Custom(f) => f(source, state, previous_capture),
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Scoped(re, scope) => {
                f.debug_tuple("Scoped").field(&re.as_str()).field(scope).finish()
            }
            Matcher::Custom(_) => f.debug_tuple("Custom").field(&"<function>").finish(),
        }
    }
}

// --- Rules ------------------------------------------------------------------

/// Secondary score breaking ties between same-order rules; larger wins.
pub type QualityFn = fn(&Capture, &ParseState, &str) -> f64;

/// Capture-to-node transformation; may recurse through the [`Parser`].
pub type ParseFn = fn(&Capture, &Parser<'_>, &mut ParseState) -> Result<Parsed, ParseError>;

/// Per-node HTML renderer.
pub type HtmlFn = fn(&Node, &HtmlOutput<'_>, &mut OutputState) -> Result<String, OutputError>;

/// Per-node element renderer.
pub type ElementFn =
    fn(&Node, &ElementOutput<'_>, &mut OutputState) -> Result<ElementNode, OutputError>;

/// Sibling-list joiner for HTML output (the `Array` rule).
pub type HtmlJoinFn = fn(&[Node], &HtmlOutput<'_>, &mut OutputState) -> Result<String, OutputError>;

/// Sibling-list joiner for element output (the `Array` rule).
pub type ElementJoinFn =
    fn(&[Node], &ElementOutput<'_>, &mut OutputState) -> Result<ElementNode, OutputError>;

/// What a rule's `parse` produced: one node, or a list spliced into the
/// sibling sequence.
#[derive(Debug, Clone)]
pub enum Parsed {
    One(Node),
    Many(Vec<Node>),
}

/// A parsing/rendering rule.
///
/// `order` is the primary priority (lower is tried first); `quality`, when
/// present, lets same-order rules compete on their captures. Rules without
/// a `matcher` (the `Array` joiner) never participate in parsing. The
/// `rule!` macro builds these records with the optional fields defaulted.
pub struct Rule {
    pub name: &'static str,
    pub order: f64,
    pub quality: Option<QualityFn>,
    pub matcher: Option<Matcher>,
    pub parse: Option<ParseFn>,
    pub html: Option<HtmlFn>,
    pub element: Option<ElementFn>,
    pub html_join: Option<HtmlJoinFn>,
    pub element_join: Option<ElementJoinFn>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("quality", &self.quality.is_some())
            .field("matcher", &self.matcher)
            .finish()
    }
}

/// A name-keyed set of rules: the unit both engines are constructed over.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: HashMap<&'static str, Rule>,
}

impl RuleTable {
    /// Build a table from a rule list. Later duplicates replace earlier
    /// ones, so callers can override individual default rules.
    pub fn new(rules: Vec<Rule>) -> RuleTable {
        let mut table = RuleTable::default();
        for rule in rules {
            table.insert(rule);
        }
        table
    }

    pub fn insert(&mut self, rule: Rule) {
        self.rules.insert(rule.name, rule);
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// --- Parse state ------------------------------------------------------------

/// A registered link definition (`[name]: target "title"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDef {
    pub target: String,
    pub title: Option<String>,
}

/// Mutable state threaded through a single top-level parse.
///
/// `inline`, `in_list` and `in_table` follow a save/restore discipline
/// around every nested parse; `previous_capture` holds the full text of the
/// last capture consumed at the current level (lookbehind for the list
/// rule); `defs`/`refs` are the two halves of the reference registry.
/// States must not be shared across concurrent parses — construct a fresh
/// one per top-level call.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    pub inline: bool,
    pub in_list: bool,
    pub in_table: bool,
    /// Suppress the `"\n\n"` the outer parse appends in block mode.
    pub disable_auto_block_newlines: bool,
    pub previous_capture: Option<String>,
    pub defs: HashMap<String, LinkDef>,
    pub refs: HashMap<String, Vec<SharedRefSlot>>,
}

impl ParseState {
    /// The scope matchers are filtered against in the current mode.
    pub fn scope(&self) -> Scope {
        if self.inline { Scope::INLINE } else { Scope::BLOCK }
    }
}

// --- Errors -----------------------------------------------------------------

/// Any failure from the combined parse + render pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Output(#[from] OutputError),
}
