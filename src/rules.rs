//! The default Markdown rule table.
//!
//! Standard Markdown plus the common GFM extensions, one rule per
//! construct, with the priority order fixed here by explicit literals:
//!
//! ```text
//! 0 heading        8 def            14 autolink      21 em / strong / u
//! 1 nptable        9 table          15 mailto        22 del
//! 2 lheading      10 newline        16 url           23 inlineCode
//! 3 hr            11 paragraph      17 link          24 br
//! 4 codeBlock     12 escape         18 image         25 text
//! 5 fence         13 tableSeparator 19 reflink
//! 6 blockQuote                      20 refimage
//! 7 list
//! ```
//!
//! `em`, `strong` and `u` deliberately share order 21; all three carry a
//! `quality` so they compete on capture length at the same position. The
//! `Array` rule never matches — it is the sibling-list joiner the output
//! engines dispatch node lists through.

#[path = "rules/block.rs"]
mod block;
#[path = "rules/helpers.rs"]
pub mod helpers;
#[path = "rules/inline.rs"]
mod inline;
#[path = "rules/table.rs"]
mod table;
#[cfg(test)]
#[path = "rules/tests.rs"]
mod tests;

use crate::element::ElementNode;
use crate::{Node, Rule, RuleTable};

/// Build the default rule table.
pub fn get() -> RuleTable {
    let mut rules = vec![array()];
    rules.extend(block::rules());
    rules.extend(inline::rules());
    rules.extend(table::rules());
    RuleTable::new(rules)
}

/// The sibling-list joiner.
///
/// HTML output concatenates children in order. Element output additionally
/// coalesces runs of adjacent text nodes into one synthetic text node and
/// assigns each child its 0-based index as `key` (a run keeps the index of
/// its first node), restoring the enclosing key afterwards.
fn array() -> Rule {
    rule! {
        name: "Array",
        order: 0.0,
        html_join: |nodes, out, state| {
            let mut result = String::new();
            for node in nodes {
                result.push_str(&out.node(node, state)?);
            }
            Ok(result)
        },
        element_join: |nodes, out, state| {
            let old_key = state.key.clone();
            let mut result = Vec::new();

            let mut i = 0;
            while i < nodes.len() {
                state.key = Some(i.to_string());

                let rendered = if let Node::Text { content } = &nodes[i] {
                    let mut merged = content.clone();
                    while let Some(Node::Text { content: next }) = nodes.get(i + 1) {
                        merged.push_str(next);
                        i += 1;
                    }
                    out.node(&Node::Text { content: merged }, state)?
                } else {
                    out.node(&nodes[i], state)?
                };

                result.push(rendered);
                i += 1;
            }

            state.key = old_key;
            Ok(ElementNode::Many(result))
        },
    }
}
