//! Block-level rules: headings, horizontal rules, code blocks, quotes,
//! lists, link definitions, blank lines and the paragraph fallback.
//!
//! Every block regex ends by consuming its trailing blank lines
//! (`(?:\n *)+\n`), which is why the outer parse appends `"\n\n"` — the
//! final block in a document terminates like any other.

use once_cell::sync::Lazy;

use crate::element::{ElementNode, Props, element};
use crate::engine::{OutputError, ParseError, Parser, normalize_ref, register_def};
use crate::html::{html_tag, sanitize_text};
use crate::rules::helpers::{block_regex, parse_capture_inline, parse_inline};
use crate::{Capture, Matcher, Node, Parsed, ParseState, Rule};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        heading(),
        lheading(),
        hr(),
        code_block(),
        fence(),
        block_quote(),
        list(),
        def(),
        newline(),
        paragraph(),
    ]
}

/// ATX headings. Trailing `#`s and surrounding spaces are dropped; the
/// title is inline-parsed.
fn heading() -> Rule {
    rule! {
        name: "heading",
        order: 0.0,
        match: block_regex(fregex!(r"^ *(#{1,6})([^\n]+?)#* *(?:\n *)+\n")),
        parse: |cap, parser, state| {
            Ok(Parsed::One(Node::Heading {
                level: cap.text(1).len() as u8,
                content: parse_inline(parser, cap.text(2).trim(), state)?,
            }))
        },
        html: |node, out, state| {
            let Node::Heading { level, content } = node else {
                return Err(OutputError::unexpected("heading", node));
            };
            Ok(html_tag(&format!("h{level}"), &out.nodes(content, state)?, &[], true))
        },
        element: |node, out, state| {
            let Node::Heading { level, content } = node else {
                return Err(OutputError::unexpected("heading", node));
            };
            let children = out.nodes(content, state)?;
            Ok(element(
                format!("h{level}"),
                state.key.clone(),
                Props { children: Some(children), ..Default::default() },
            ))
        },
    }
}

/// Setext headings rewrite themselves to `heading` nodes, so the heading
/// renderers cover both syntaxes.
fn lheading() -> Rule {
    rule! {
        name: "lheading",
        order: 2.0,
        match: block_regex(fregex!(r"^([^\n]+)\n *(=|-){3,} *(?:\n *)+\n")),
        parse: |cap, parser, state| {
            Ok(Parsed::One(Node::Heading {
                level: if cap.text(2) == "=" { 1 } else { 2 },
                content: parse_inline(parser, cap.text(1), state)?,
            }))
        },
    }
}

fn hr() -> Rule {
    rule! {
        name: "hr",
        order: 3.0,
        match: block_regex(fregex!(r"^( *[-*_]){3,} *(?:\n *)+\n")),
        parse: |_, _, _| Ok(Parsed::One(Node::Hr)),
        html: |_, _, _| Ok("<hr>".to_string()),
        element: |_, _, state| Ok(element("hr", state.key.clone(), Props::default())),
    }
}

/// Four-space indented code. The indent is stripped from every line and
/// trailing blank lines are dropped; indented code never names a language.
fn code_block() -> Rule {
    rule! {
        name: "codeBlock",
        order: 4.0,
        match: block_regex(fregex!(r"^(?:    [^\n]+\n*)+(?:\n *)+\n")),
        parse: |cap, _, _| {
            let outdented = regex!(r"(?m)^    ").replace_all(cap.full(), "");
            let content = regex!(r"\n+$").replace(&outdented, "").into_owned();
            Ok(Parsed::One(Node::CodeBlock { lang: None, content }))
        },
        html: render_code_block_html,
        element: render_code_block_element,
    }
}

/// Fenced code rewrites itself to a `codeBlock` node so both code syntaxes
/// share the renderers above.
fn fence() -> Rule {
    rule! {
        name: "fence",
        order: 5.0,
        match: block_regex(fregex!(r"^ *(`{3,}|~{3,}) *(?:(\S+) *)?\n([\s\S]+?)\n?\1 *(?:\n *)+\n")),
        parse: |cap, _, _| {
            Ok(Parsed::One(Node::CodeBlock {
                lang: cap.group(2).filter(|lang| !lang.is_empty()).map(str::to_string),
                content: cap.text(3).to_string(),
            }))
        },
    }
}

fn render_code_block_html(
    node: &Node,
    _: &crate::HtmlOutput<'_>,
    _: &mut crate::OutputState,
) -> Result<String, OutputError> {
    let Node::CodeBlock { lang, content } = node else {
        return Err(OutputError::unexpected("codeBlock", node));
    };
    let class_name = lang.as_ref().map(|lang| format!("markdown-code-{lang}"));
    let code_block = html_tag("code", &sanitize_text(content), &[("class", class_name)], true);
    Ok(html_tag("pre", &code_block, &[], true))
}

fn render_code_block_element(
    node: &Node,
    _: &crate::ElementOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<ElementNode, OutputError> {
    let Node::CodeBlock { lang, content } = node else {
        return Err(OutputError::unexpected("codeBlock", node));
    };
    let class_name = lang.as_ref().map(|lang| format!("markdown-code-{lang}"));
    let code = element(
        "code",
        None,
        Props {
            class_name,
            children: Some(ElementNode::Text(content.clone())),
            ..Default::default()
        },
    );
    Ok(element("pre", state.key.clone(), Props { children: Some(code), ..Default::default() }))
}

/// `>`-prefixed lines; the stripped body is re-parsed as blocks.
fn block_quote() -> Rule {
    rule! {
        name: "blockQuote",
        order: 6.0,
        match: block_regex(fregex!(r"^( *>[^\n]+(\n[^\n]+)*\n*)+\n{2,}")),
        parse: |cap, parser, state| {
            let content = regex!(r"(?m)^ *> ?").replace_all(cap.full(), "").into_owned();
            Ok(Parsed::One(Node::BlockQuote { content: parser.nested(&content, state)? }))
        },
        html: |node, out, state| {
            let Node::BlockQuote { content } = node else {
                return Err(OutputError::unexpected("blockQuote", node));
            };
            Ok(html_tag("blockquote", &out.nodes(content, state)?, &[], true))
        },
        element: |node, out, state| {
            let Node::BlockQuote { content } = node else {
                return Err(OutputError::unexpected("blockQuote", node));
            };
            let children = out.nodes(content, state)?;
            Ok(element(
                "blockquote",
                state.key.clone(),
                Props { children: Some(children), ..Default::default() },
            ))
        },
    }
}

// --- Lists ------------------------------------------------------------------

const LIST_BULLET: &str = r"(?:[*+-]|\d+\.)";

static LIST_ITEM_PREFIX_R: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(&format!(r"^( *)({LIST_BULLET}) +")).unwrap());

static LIST_ITEM_R: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(&format!(
        r"(?m)( *)({LIST_BULLET}) [^\n]*(?:\n(?!\1{LIST_BULLET} )[^\n]*)*(\n|$)"
    ))
    .unwrap()
});

static LIST_R: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(&format!(
        r"^( *)({LIST_BULLET}) [\s\S]+?(?:\n{{2,}}(?! )(?!\1{LIST_BULLET} )\n*|\s*\n*$)"
    ))
    .unwrap()
});

/// Lists only start on a line boundary, which a `^`-anchored rule cannot
/// see on its own: the indentation of the list's first line has usually
/// been consumed as the tail of the previous capture. The matcher
/// re-prepends that captured indentation before trying the list regex, so
/// the capture can be longer than the remaining source (the engine
/// tolerates the over-consumption, matching the reference behavior).
fn match_list(source: &str, state: &ParseState, previous_capture: &str) -> Option<Capture> {
    let lookbehind = regex!(r"(?:^|\n)( *)$").captures(previous_capture)?;
    let is_list_block = state.in_list || !state.inline;
    if !is_list_block {
        return None;
    }

    let indent = lookbehind.get(1).map(|m| m.as_str()).unwrap_or("");
    let prepended = format!("{indent}{source}");
    match LIST_R.captures(&prepended) {
        Ok(caps) => caps.as_ref().map(Capture::from_fancy),
        Err(err) => {
            log::warn!("list regex failed: {err}");
            None
        }
    }
}

fn parse_list(
    capture: &Capture,
    parser: &Parser<'_>,
    state: &mut ParseState,
) -> Result<Parsed, ParseError> {
    let bullet = capture.text(2);
    let ordered = bullet.len() > 1;
    let start: Option<u32> =
        if ordered { regex!(r"[^\d]").replace_all(bullet, "").parse().ok() } else { None };

    // Replace the block terminator with a single newline so the last item
    // splits like the others.
    let block = regex!(r"\n{2,}$").replace(capture.full(), "\n").into_owned();
    let items: Vec<String> = LIST_ITEM_R
        .captures_iter(&block)
        .filter_map(|caps| caps.ok())
        .filter_map(|caps| caps.get(0).map(|m| m.as_str().to_string()))
        .collect();

    let mut parsed_items = Vec::with_capacity(items.len());
    let mut last_item_was_a_paragraph = false;

    for (i, item) in items.iter().enumerate() {
        let space = LIST_ITEM_PREFIX_R
            .captures(item)
            .and_then(|caps| caps.get(0))
            .map(|m| m.as_str().len())
            .unwrap_or(0);
        let outdented = if space > 0 {
            match regex::Regex::new(&format!("(?m)^ {{1,{space}}}")) {
                Ok(re) => re.replace_all(item, "").into_owned(),
                Err(_) => item.clone(),
            }
        } else {
            item.clone()
        };
        let content = LIST_ITEM_PREFIX_R.replace(&outdented, "").into_owned();

        // An item switches to paragraph mode when it contains a blank
        // line, or when it is the last item and the previous one already
        // did (the contagion keeps trailing items consistent).
        let is_last_item = i == items.len() - 1;
        let contains_blocks = content.contains("\n\n");
        let this_item_is_a_paragraph =
            contains_blocks || (is_last_item && last_item_was_a_paragraph);
        last_item_was_a_paragraph = this_item_is_a_paragraph;

        let old_inline = state.inline;
        let old_in_list = state.in_list;
        state.in_list = true;
        let adjusted_content = if this_item_is_a_paragraph {
            state.inline = false;
            regex!(r" *\n+$").replace(&content, "\n\n").into_owned()
        } else {
            state.inline = true;
            regex!(r" *\n+$").replace(&content, "").into_owned()
        };
        let result = parser.nested(&adjusted_content, state);
        state.inline = old_inline;
        state.in_list = old_in_list;
        parsed_items.push(result?);
    }

    Ok(Parsed::One(Node::List { ordered, start, items: parsed_items }))
}

fn render_list_html(
    node: &Node,
    out: &crate::HtmlOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<String, OutputError> {
    let Node::List { ordered, start, items } = node else {
        return Err(OutputError::unexpected("list", node));
    };

    let mut list_items = String::new();
    for item in items {
        list_items.push_str(&html_tag("li", &out.nodes(item, state)?, &[], true));
    }

    let list_tag = if *ordered { "ol" } else { "ul" };
    // A zero start is dropped along with a missing one.
    let start = start.filter(|start| *start != 0).map(|start| start.to_string());
    Ok(html_tag(list_tag, &list_items, &[("start", start)], true))
}

fn render_list_element(
    node: &Node,
    out: &crate::ElementOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<ElementNode, OutputError> {
    let Node::List { ordered, start, items } = node else {
        return Err(OutputError::unexpected("list", node));
    };

    let mut children = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_children = out.nodes(item, state)?;
        children.push(element(
            "li",
            Some(index.to_string()),
            Props { children: Some(item_children), ..Default::default() },
        ));
    }

    Ok(element(
        if *ordered { "ol" } else { "ul" },
        state.key.clone(),
        Props { start: *start, children: Some(ElementNode::Many(children)), ..Default::default() },
    ))
}

fn list() -> Rule {
    rule! {
        name: "list",
        order: 7.0,
        match: Matcher::Custom(match_list),
        parse: parse_list,
        html: render_list_html,
        element: render_list_element,
    }
}

/// Link-reference definitions. Registers the definition, back-patches any
/// queued references, and renders to nothing.
fn def() -> Rule {
    rule! {
        name: "def",
        order: 8.0,
        match: block_regex(fregex!(r#"^ *\[([^\]]+)\]: *<?([^\s>]*)>?(?: +["(]([^\n]+)[")])? *\n(?: *\n)*"#)),
        parse: |cap, _, state| {
            let name = normalize_ref(cap.text(1));
            let target = cap.text(2).to_string();
            let title = cap.group(3).map(str::to_string);
            register_def(state, &name, &target, title.as_deref());
            Ok(Parsed::One(Node::Def { name, target, title }))
        },
        html: |_, _, _| Ok(String::new()),
        element: |_, _, _| Ok(ElementNode::Empty),
    }
}

fn newline() -> Rule {
    rule! {
        name: "newline",
        order: 10.0,
        match: block_regex(fregex!(r"^(?:\n *)*\n")),
        parse: |_, _, _| Ok(Parsed::One(Node::Newline)),
        html: |_, _, _| Ok("\n".to_string()),
        element: |_, _, _| Ok(ElementNode::Text("\n".to_string())),
    }
}

/// The block fallback: anything up to the next blank line, inline-parsed.
fn paragraph() -> Rule {
    rule! {
        name: "paragraph",
        order: 11.0,
        match: block_regex(fregex!(r"^((?:[^\n]|\n(?! *\n))+)(?:\n *)+\n")),
        parse: |cap, parser, state| {
            Ok(Parsed::One(Node::Paragraph { content: parse_capture_inline(cap, parser, state)? }))
        },
        html: |node, out, state| {
            let Node::Paragraph { content } = node else {
                return Err(OutputError::unexpected("paragraph", node));
            };
            let attributes = [("class", Some("paragraph".to_string()))];
            Ok(html_tag("div", &out.nodes(content, state)?, &attributes, true))
        },
        element: |node, out, state| {
            let Node::Paragraph { content } = node else {
                return Err(OutputError::unexpected("paragraph", node));
            };
            let children = out.nodes(content, state)?;
            Ok(element(
                "div",
                state.key.clone(),
                Props {
                    class_name: Some("paragraph".to_string()),
                    children: Some(children),
                    ..Default::default()
                },
            ))
        },
    }
}
