//! Rule-dispatch parsing engine.
//!
//! This module is the operational core of the crate:
//!
//! - Order the matchable rules of a table once, at construction.
//! - At each source position, scan rules in priority order and let
//!   same-order rules with a `quality` score compete on their captures.
//! - Hand the winning capture to the rule's `parse`, which may recurse
//!   back into the engine for nested inline/block content.
//! - Advance past the capture and repeat until the source is consumed.
//!
//! ```text
//! rules (table) ── filter(matchable) ── sort(order, quality-first, name)
//!                                         │
//! source ── preprocess ──┐                v
//!                        └──▶ loop: select best rule at position
//!                               │     (qualified-peer window)
//!                               ├──▶ rule.parse ──▶ Node(s)  ── may recurse
//!                               └──▶ consume capture, record previous_capture
//! ```
//!
//! The scan stops at the first match whose order no later rule can beat:
//! after a rule matches, only rules at the *same* order that carry a
//! `quality` function are still examined, and a candidate displaces the
//! best only with a strictly greater score. This is what lets `strong`
//! beat `em` on `**bold**` while keeping dispatch deterministic.
//!
//! Failures here are programmer errors in the rule table (a fallback rule
//! that does not match everything, a regex missing its `^` anchor), never
//! properties of the input — see [`ParseError`].
//!
//! ## Debugging
//!
//! Set `RULEMARK_DEBUG_RULES=1` to print rule adoption traces to stderr.

use std::cmp::Ordering;

use thiserror::Error;

use super::preprocess::preprocess;
use crate::{Capture, Node, Parsed, ParseState, Rule, RuleTable};

/// Errors raised by the dispatch engine. All of them indicate a broken
/// rule table rather than bad input; data-level irregularities never fail.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(
        "could not find a matching rule; the rule with the highest `order` should always match \
         content provided to it — check the `match` of '{last_rule}'; the unmatched source \
         starts: {snippet:?}"
    )]
    NoRuleMatched { last_rule: &'static str, snippet: String },

    #[error(
        "rule '{rule}' returned a capture starting at index {index}, not at the current parse \
         index; did you forget a ^ at the start of the regex?"
    )]
    UnanchoredCapture { rule: &'static str, index: usize },

    #[error("rule '{rule}' matched without consuming any input; parsing cannot make progress")]
    NoProgress { rule: &'static str },

    #[error("rule '{rule}' has a `match` but no `parse`")]
    MissingParse { rule: &'static str },

    #[error("the rule table contains no matchable rules")]
    EmptyRuleTable,
}

/// Dispatch engine over one rule table.
///
/// Construction filters and orders the table's matchable rules; parsing
/// borrows the table, so a `Parser` is cheap to build per call. Rules
/// recurse through [`Parser::nested`]; the save/restore of `inline` and
/// friends around that recursion is the caller's responsibility (see the
/// `parse_inline`/`parse_block` helpers in the rules module).
pub struct Parser<'a> {
    rules: &'a RuleTable,
    rule_list: Vec<&'a Rule>,
}

impl<'a> Parser<'a> {
    /// Build a parser over `rules`.
    ///
    /// Rules without a matcher are skipped (the `Array` joiner lives in the
    /// same table but only renders). A rule whose order is not a finite
    /// number is excluded with a warning. The remaining rules are sorted by
    /// ascending order, quality-bearing rules before plain ones at the same
    /// order, then by name as a stable tiebreak.
    pub fn new(rules: &'a RuleTable) -> Parser<'a> {
        let mut rule_list: Vec<&Rule> = rules
            .iter()
            .filter(|rule| rule.matcher.is_some())
            .filter(|rule| {
                if rule.order.is_finite() {
                    true
                } else {
                    log::warn!("invalid order for rule `{}`: {}", rule.name, rule.order);
                    false
                }
            })
            .collect();

        rule_list.sort_by(|a, b| {
            a.order
                .partial_cmp(&b.order)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.quality.is_none().cmp(&b.quality.is_none()))
                .then_with(|| a.name.cmp(b.name))
        });

        Parser { rules, rule_list }
    }

    /// The table this parser dispatches over.
    pub fn rules(&self) -> &'a RuleTable {
        self.rules
    }

    /// Top-level entry point: preprocesses the source, appends the block
    /// terminator unless parsing inline (or the state disables it), and
    /// resets the lookbehind capture before dispatching.
    pub fn parse(&self, source: &str, state: &mut ParseState) -> Result<Vec<Node>, ParseError> {
        let mut source = source.to_string();
        if !state.inline && !state.disable_auto_block_newlines {
            source.push_str("\n\n");
        }

        state.previous_capture = None;
        self.nested(&preprocess(&source), state)
    }

    /// Reentrant entry point used by rules for nested content. Shares the
    /// caller's state; no preprocessing, no terminator, and the lookbehind
    /// capture carries over from the enclosing level.
    pub fn nested(&self, source: &str, state: &mut ParseState) -> Result<Vec<Node>, ParseError> {
        let debug = std::env::var_os("RULEMARK_DEBUG_RULES").is_some();
        let mut result = Vec::new();
        let mut remaining = source;

        while !remaining.is_empty() {
            let (rule, capture) = self.select(remaining, state)?;

            if capture.start() != 0 {
                return Err(ParseError::UnanchoredCapture { rule: rule.name, index: capture.start() });
            }
            let consumed = capture.full().len();
            if consumed == 0 {
                return Err(ParseError::NoProgress { rule: rule.name });
            }
            if debug {
                eprintln!("[rule:consume] name=\"{}\" len={} text={:?}", rule.name, consumed, capture.full());
            }

            let parse = rule.parse.ok_or(ParseError::MissingParse { rule: rule.name })?;
            match parse(&capture, self, state)? {
                Parsed::One(node) => result.push(node),
                Parsed::Many(nodes) => result.extend(nodes),
            }

            state.previous_capture = Some(capture.full().to_string());
            // The capture may include text a lookbehind matcher re-prepended,
            // so it can be longer than what is actually left.
            remaining = remaining.get(consumed..).unwrap_or("");
        }

        Ok(result)
    }

    /// Pick the best-matching rule at the current position.
    fn select(&self, source: &str, state: &ParseState) -> Result<(&'a Rule, Capture), ParseError> {
        let last_rule = self.rule_list.last().ok_or(ParseError::EmptyRuleTable)?;
        let previous_capture = state.previous_capture.as_deref().unwrap_or("");
        let debug = std::env::var_os("RULEMARK_DEBUG_RULES").is_some();

        let mut best: Option<(&Rule, Capture)> = None;
        let mut best_quality = -1.0f64;
        let mut current_order = f64::NAN;

        for (i, &rule) in self.rule_list.iter().enumerate() {
            // Once something matched, only qualified peers at the same
            // order may still displace it.
            if i > 0
                && best.is_some()
                && !(rule.order == current_order && rule.quality.is_some())
            {
                break;
            }
            current_order = rule.order;

            let Some(matcher) = rule.matcher.as_ref() else { continue };
            let Some(capture) = matcher.matches(source, state, previous_capture) else { continue };

            let quality = match rule.quality {
                Some(quality) => quality(&capture, state, previous_capture),
                None => 0.0,
            };
            if quality > best_quality {
                if debug {
                    eprintln!("[rule:adopt] name=\"{}\" order={} quality={}", rule.name, rule.order, quality);
                }
                best_quality = quality;
                best = Some((rule, capture));
            }
        }

        best.ok_or_else(|| ParseError::NoRuleMatched {
            last_rule: last_rule.name,
            snippet: source.chars().take(80).collect(),
        })
    }
}
