//! Public API over the default rule table.
//!
//! Every function here is a thin wrapper: build a [`Parser`] (and, for the
//! render entry points, an output engine) over the shared default table
//! and run it with the documented mode flags. The `_with` variants thread
//! a caller-owned [`ParseState`], which is how link definitions can be
//! observed after the fact or shared across a multi-fragment parse; a
//! state must never be reused across concurrent parses.

use once_cell::sync::Lazy;

use crate::engine::{ElementOutput, HtmlOutput, OutputState, ParseError, Parser};
use crate::{ElementNode, Error, Node, ParseState, RuleTable};

static DEFAULT_RULES: Lazy<RuleTable> = Lazy::new(crate::rules::get);

/// Parse in block mode.
///
/// # Example
/// ```
/// let ast = rulemark::parse("# Hi\n").unwrap();
/// assert_eq!(ast.len(), 1);
/// ```
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    parse_with(source, &mut ParseState::default())
}

/// Parse in block mode with a caller-provided state.
pub fn parse_with(source: &str, state: &mut ParseState) -> Result<Vec<Node>, ParseError> {
    state.inline = false;
    Parser::new(&DEFAULT_RULES).parse(source, state)
}

/// Parse in inline mode: block rules (headings, lists, …) do not apply.
pub fn parse_inline(source: &str) -> Result<Vec<Node>, ParseError> {
    parse_inline_with(source, &mut ParseState::default())
}

pub fn parse_inline_with(source: &str, state: &mut ParseState) -> Result<Vec<Node>, ParseError> {
    state.inline = true;
    Parser::new(&DEFAULT_RULES).parse(source, state)
}

/// Parse inline unless the source ends with a blank line (two or more
/// trailing newlines), in which case parse as blocks.
pub fn parse_implicit(source: &str) -> Result<Vec<Node>, ParseError> {
    parse_implicit_with(source, &mut ParseState::default())
}

pub fn parse_implicit_with(source: &str, state: &mut ParseState) -> Result<Vec<Node>, ParseError> {
    state.inline = !regex!(r"\n{2,}$").is_match(source);
    Parser::new(&DEFAULT_RULES).parse(source, state)
}

/// Block-parse and render to an HTML string.
pub fn to_html(source: &str) -> Result<String, Error> {
    to_html_with(source, &mut ParseState::default())
}

pub fn to_html_with(source: &str, state: &mut ParseState) -> Result<String, Error> {
    let ast = parse_with(source, state)?;
    let output = HtmlOutput::new(&DEFAULT_RULES)?;
    Ok(output.render(&ast, &mut OutputState::default())?)
}

/// Block-parse and render to a structured element tree.
pub fn to_elements(source: &str) -> Result<ElementNode, Error> {
    to_elements_with(source, &mut ParseState::default())
}

pub fn to_elements_with(source: &str, state: &mut ParseState) -> Result<ElementNode, Error> {
    let ast = parse_with(source, state)?;
    let output = ElementOutput::new(&DEFAULT_RULES)?;
    Ok(output.render(&ast, &mut OutputState::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, Node, Props};
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_returns_structured_headings() {
        let ast = parse("# Hello\n\n").unwrap();
        assert_eq!(
            ast,
            vec![Node::Heading { level: 1, content: vec![Node::text("Hello")] }]
        );
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "# T\n\n- a\n- b\n\npara **x** [l](/y)\n\n";
        assert_eq!(parse(source).unwrap(), parse(source).unwrap());
        assert_eq!(to_html(source).unwrap(), to_html(source).unwrap());
    }

    #[test]
    fn implicit_mode_follows_the_trailing_blank_line() {
        // No trailing blank line: inline, so no paragraph wrapper.
        let inline = parse_implicit("some text").unwrap();
        assert!(inline.iter().all(|n| n.type_name() != "paragraph"), "{inline:?}");

        // Trailing blank line: block.
        let block = parse_implicit("some text\n\n").unwrap();
        assert_eq!(block.iter().map(Node::type_name).collect::<Vec<_>>(), vec!["paragraph"]);
    }

    #[test]
    fn inline_mode_never_emits_block_nodes() {
        let source = "# h\n\n- a\n- b\n\n> q\n\n| a |\n|---|\n| 1 |\n\n---\n\n    code\n\n";
        let ast = parse_inline_with(source, &mut ParseState::default()).unwrap();
        let block_types =
            ["paragraph", "heading", "list", "blockQuote", "hr", "codeBlock", "table"];
        fn walk(nodes: &[Node], check: &impl Fn(&Node)) {
            for node in nodes {
                check(node);
                match node {
                    Node::Heading { content, .. }
                    | Node::Paragraph { content }
                    | Node::BlockQuote { content }
                    | Node::Link { content, .. }
                    | Node::Em { content }
                    | Node::Strong { content }
                    | Node::U { content }
                    | Node::Del { content } => walk(content, check),
                    Node::List { items, .. } => items.iter().for_each(|i| walk(i, check)),
                    _ => {}
                }
            }
        }
        walk(&ast, &|node| {
            assert!(!block_types.contains(&node.type_name()), "block node {:?}", node.type_name())
        });
    }

    #[test]
    fn states_expose_link_definitions() {
        let mut state = ParseState::default();
        parse_with("[a]: http://x \"T\"\n\n", &mut state).unwrap();
        let def = state.defs.get("a").unwrap();
        assert_eq!(def.target, "http://x");
        assert_eq!(def.title.as_deref(), Some("T"));
    }

    #[test]
    fn to_html_renders_the_showcase_line() {
        assert_eq!(
            to_html("# Hello\n\nSome *text*.\n").unwrap(),
            "<h1>Hello</h1><div class=\"paragraph\">Some <em>text</em>.</div>"
        );
    }

    #[test]
    fn to_elements_assigns_sibling_keys() {
        let tree = to_elements("first\n\nsecond\n\n").unwrap();
        let ElementNode::Many(children) = tree else { panic!("expected sibling list") };
        let keys: Vec<_> = children
            .iter()
            .map(|child| match child {
                ElementNode::Element(el) => el.key.clone(),
                other => panic!("expected element, got {other:?}"),
            })
            .collect();
        assert_eq!(keys, vec![Some("0".to_string()), Some("1".to_string())]);
    }

    #[test]
    fn to_elements_wraps_paragraphs_in_classed_divs() {
        let tree = to_elements("hi\n\n").unwrap();
        let ElementNode::Many(children) = tree else { panic!("expected sibling list") };
        let ElementNode::Element(div) = &children[0] else { panic!("expected element") };
        let expected = Element {
            tag: "div".to_string(),
            key: Some("0".to_string()),
            element_ref: None,
            props: Props {
                class_name: Some("paragraph".to_string()),
                children: Some(ElementNode::Many(vec![ElementNode::Text("hi".to_string())])),
                ..Default::default()
            },
            owner: None,
        };
        assert_eq!(**div, expected);
    }
}
