//! Rendering dispatch engine.
//!
//! Rendering walks a parsed tree and dispatches every node back to its
//! rule, looked up by [`Node::type_name`]. Sibling lists go through the
//! table's `Array` joiner rule, which owns the join semantics for the
//! format (plain concatenation for HTML; key assignment and adjacent-text
//! coalescing for elements). A table without an `Array` joiner for the
//! requested format is rejected at construction.
//!
//! ```text
//!            ┌─ [Node, Node, …] ──▶ Array joiner ──┐ (recurses per child)
//! render ────┤                                     │
//!            └─ Node ──▶ rules[type_name] ──▶ per-format renderer
//! ```
//!
//! Two renders of the same tree are bit-identical; renderers have no side
//! effects beyond the `key` bookkeeping in [`OutputState`].

use thiserror::Error;

use crate::{ElementNode, Node, RuleTable};

/// Misconfiguration of the output side of a rule table. Like parsing,
/// these are programmer errors; irregular data renders best-effort.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error(
        "to join sibling nodes as {format} you must provide an `Array` joiner rule with that \
         format"
    )]
    MissingArrayRule { format: &'static str },

    #[error("rule '{rule}' has no {format} renderer")]
    MissingRenderer { rule: &'static str, format: &'static str },

    #[error("no rule is registered for node type '{node_type}'")]
    UnknownNodeType { node_type: &'static str },

    #[error("the '{renderer}' renderer was dispatched a '{found}' node")]
    UnexpectedNode { renderer: &'static str, found: &'static str },
}

impl OutputError {
    /// Shorthand used by renderers destructuring their node variant.
    pub fn unexpected(renderer: &'static str, found: &Node) -> OutputError {
        OutputError::UnexpectedNode { renderer, found: found.type_name() }
    }
}

/// State threaded through a render: the key path assigned to children of
/// structured output. HTML rendering carries it but never reads it.
#[derive(Debug, Clone, Default)]
pub struct OutputState {
    pub key: Option<String>,
}

/// HTML renderer over a rule table.
#[derive(Debug)]
pub struct HtmlOutput<'a> {
    rules: &'a RuleTable,
    join: crate::HtmlJoinFn,
}

impl<'a> HtmlOutput<'a> {
    pub fn new(rules: &'a RuleTable) -> Result<HtmlOutput<'a>, OutputError> {
        let join = rules
            .get("Array")
            .and_then(|rule| rule.html_join)
            .ok_or(OutputError::MissingArrayRule { format: "html" })?;
        Ok(HtmlOutput { rules, join })
    }

    /// Render a parsed tree to an HTML string.
    pub fn render(&self, ast: &[Node], state: &mut OutputState) -> Result<String, OutputError> {
        self.nodes(ast, state)
    }

    /// Render a sibling list through the `Array` joiner.
    pub fn nodes(&self, nodes: &[Node], state: &mut OutputState) -> Result<String, OutputError> {
        (self.join)(nodes, self, state)
    }

    /// Render a single node through its rule.
    pub fn node(&self, node: &Node, state: &mut OutputState) -> Result<String, OutputError> {
        let name = node.type_name();
        let rule = self.rules.get(name).ok_or(OutputError::UnknownNodeType { node_type: name })?;
        let render =
            rule.html.ok_or(OutputError::MissingRenderer { rule: rule.name, format: "html" })?;
        render(node, self, state)
    }
}

/// Element-tree renderer over a rule table.
#[derive(Debug)]
pub struct ElementOutput<'a> {
    rules: &'a RuleTable,
    join: crate::ElementJoinFn,
}

impl<'a> ElementOutput<'a> {
    pub fn new(rules: &'a RuleTable) -> Result<ElementOutput<'a>, OutputError> {
        let join = rules
            .get("Array")
            .and_then(|rule| rule.element_join)
            .ok_or(OutputError::MissingArrayRule { format: "element" })?;
        Ok(ElementOutput { rules, join })
    }

    /// Render a parsed tree to an element tree.
    pub fn render(&self, ast: &[Node], state: &mut OutputState) -> Result<ElementNode, OutputError> {
        self.nodes(ast, state)
    }

    /// Render a sibling list through the `Array` joiner.
    pub fn nodes(&self, nodes: &[Node], state: &mut OutputState) -> Result<ElementNode, OutputError> {
        (self.join)(nodes, self, state)
    }

    /// Render a single node through its rule.
    pub fn node(&self, node: &Node, state: &mut OutputState) -> Result<ElementNode, OutputError> {
        let name = node.type_name();
        let rule = self.rules.get(name).ok_or(OutputError::UnknownNodeType { node_type: name })?;
        let render = rule
            .element
            .ok_or(OutputError::MissingRenderer { rule: rule.name, format: "element" })?;
        render(node, self, state)
    }
}
