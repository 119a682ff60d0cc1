//! Inline rules: escapes, links and images (inline, auto and reference
//! style), emphasis, code spans, hard breaks and the text fallback.
//!
//! `em`, `strong` and `u` share one priority and compete through their
//! `quality` scores, which is how `**bold**` and `__underline__` beat the
//! shorter overlapping `em` interpretations at the same position.

use once_cell::sync::Lazy;

use crate::element::{ElementNode, Props, element};
use crate::engine::{OutputError, normalize_ref, register_ref};
use crate::html::{html_tag, sanitize_text, sanitize_url, unescape_url};
use crate::rules::helpers::{any_scope_regex, inline_regex, parse_capture_inline};
use crate::{LinkTarget, Node, Parsed, Rule};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        escape(),
        autolink(),
        mailto(),
        url(),
        link(),
        image(),
        reflink(),
        refimage(),
        em(),
        strong(),
        u(),
        del(),
        inline_code(),
        br(),
        text(),
    ]
}

/// `\X` for punctuation X becomes a literal text node.
fn escape() -> Rule {
    rule! {
        name: "escape",
        order: 12.0,
        match: inline_regex(fregex!(r"^\\([^0-9A-Za-z\s])")),
        parse: |cap, _, _| Ok(Parsed::One(Node::text(cap.text(1)))),
    }
}

fn autolink() -> Rule {
    rule! {
        name: "autolink",
        order: 14.0,
        match: inline_regex(fregex!(r"^<([^: >]+:\/[^ >]+)>")),
        parse: |cap, _, _| {
            Ok(Parsed::One(Node::Link {
                content: vec![Node::text(cap.text(1))],
                target: LinkTarget::direct(cap.text(1)),
            }))
        },
    }
}

/// `<addr@host>`; the `mailto:` scheme is prefixed unless already present.
fn mailto() -> Rule {
    rule! {
        name: "mailto",
        order: 15.0,
        match: inline_regex(fregex!(r"^<([^ >]+@[^ >]+)>")),
        parse: |cap, _, _| {
            let address = cap.text(1).to_string();
            let target = if regex!(r"(?i)^mailto:").is_match(&address) {
                address.clone()
            } else {
                format!("mailto:{address}")
            };
            Ok(Parsed::One(Node::Link {
                content: vec![Node::text(address)],
                target: LinkTarget::direct(target),
            }))
        },
    }
}

/// Bare `http(s)://` URLs, with trailing punctuation left out of the match.
fn url() -> Rule {
    rule! {
        name: "url",
        order: 16.0,
        match: inline_regex(fregex!(r#"^(https?:\/\/[^\s<]+[^<.,:;"')\]\s])"#)),
        parse: |cap, _, _| {
            Ok(Parsed::One(Node::Link {
                content: vec![Node::text(cap.text(1))],
                target: LinkTarget::direct(cap.text(1)),
            }))
        },
    }
}

const LINK_INSIDE: &str = r"(?:\[[^\]]*\]|[^\[\]]|\](?=[^\[]*\]))*";
const LINK_HREF_AND_TITLE: &str =
    r#"\s*<?((?:\([^)]*\)|[^\s\\]|\\.)*?)>?(?:\s+['"]([\s\S]*?)['"])?\s*"#;

static LINK_R: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(&format!(r"^\[({LINK_INSIDE})\]\({LINK_HREF_AND_TITLE}\)")).unwrap()
});

static IMAGE_R: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(&format!(r"^!\[({LINK_INSIDE})\]\({LINK_HREF_AND_TITLE}\)")).unwrap()
});

static REFLINK_R: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(&format!(r"^\[({LINK_INSIDE})\]\s*\[([^\]]*)\]")).unwrap()
});

static REFIMAGE_R: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(&format!(r"^!\[({LINK_INSIDE})\]\s*\[([^\]]*)\]")).unwrap()
});

fn render_link_html(
    node: &Node,
    out: &crate::HtmlOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<String, OutputError> {
    let Node::Link { content, target } = node else {
        return Err(OutputError::unexpected("link", node));
    };
    let attributes =
        [("href", sanitize_url(target.target().as_deref())), ("title", target.title())];
    Ok(html_tag("a", &out.nodes(content, state)?, &attributes, true))
}

fn render_link_element(
    node: &Node,
    out: &crate::ElementOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<ElementNode, OutputError> {
    let Node::Link { content, target } = node else {
        return Err(OutputError::unexpected("link", node));
    };
    let children = out.nodes(content, state)?;
    Ok(element(
        "a",
        state.key.clone(),
        Props {
            href: sanitize_url(target.target().as_deref()),
            title: target.title(),
            children: Some(children),
            ..Default::default()
        },
    ))
}

fn link() -> Rule {
    rule! {
        name: "link",
        order: 17.0,
        match: inline_regex(&LINK_R),
        parse: |cap, parser, state| {
            Ok(Parsed::One(Node::Link {
                content: parser.nested(cap.text(1), state)?,
                target: LinkTarget::Direct {
                    target: Some(unescape_url(cap.text(2))),
                    title: cap.group(3).map(str::to_string),
                },
            }))
        },
        html: render_link_html,
        element: render_link_element,
    }
}

fn render_image_html(
    node: &Node,
    _: &crate::HtmlOutput<'_>,
    _: &mut crate::OutputState,
) -> Result<String, OutputError> {
    let Node::Image { alt, target } = node else {
        return Err(OutputError::unexpected("image", node));
    };
    let attributes = [
        ("src", sanitize_url(target.target().as_deref())),
        ("alt", Some(alt.clone())),
        ("title", target.title()),
    ];
    Ok(html_tag("img", "", &attributes, false))
}

fn render_image_element(
    node: &Node,
    _: &crate::ElementOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<ElementNode, OutputError> {
    let Node::Image { alt, target } = node else {
        return Err(OutputError::unexpected("image", node));
    };
    Ok(element(
        "img",
        state.key.clone(),
        Props {
            src: sanitize_url(target.target().as_deref()),
            alt: Some(alt.clone()),
            title: target.title(),
            ..Default::default()
        },
    ))
}

/// `![alt](href "title")`; the alt text is stored raw, not parsed.
fn image() -> Rule {
    rule! {
        name: "image",
        order: 18.0,
        match: inline_regex(&IMAGE_R),
        parse: |cap, _, _| {
            Ok(Parsed::One(Node::Image {
                alt: cap.text(1).to_string(),
                target: LinkTarget::Direct {
                    target: Some(unescape_url(cap.text(2))),
                    title: cap.group(3).map(str::to_string),
                },
            }))
        },
        html: render_image_html,
        element: render_image_element,
    }
}

/// `[text][name]`: a link whose target resolves through the reference
/// registry. An empty `[name]` falls back to the link text.
fn reflink() -> Rule {
    rule! {
        name: "reflink",
        order: 19.0,
        match: inline_regex(&REFLINK_R),
        parse: |cap, parser, state| {
            let content = parser.nested(cap.text(1), state)?;
            let name_source = match cap.group(2) {
                Some(name) if !name.is_empty() => name,
                _ => cap.text(1),
            };
            let name = normalize_ref(name_source);
            let slot = register_ref(state, &name);
            Ok(Parsed::One(Node::Link { content, target: LinkTarget::Reference(slot) }))
        },
    }
}

fn refimage() -> Rule {
    rule! {
        name: "refimage",
        order: 20.0,
        match: inline_regex(&REFIMAGE_R),
        parse: |cap, _, state| {
            let name_source = match cap.group(2) {
                Some(name) if !name.is_empty() => name,
                _ => cap.text(1),
            };
            let name = normalize_ref(name_source);
            let slot = register_ref(state, &name);
            Ok(Parsed::One(Node::Image {
                alt: cap.text(1).to_string(),
                target: LinkTarget::Reference(slot),
            }))
        },
    }
}

fn em() -> Rule {
    rule! {
        name: "em",
        order: 21.0,
        quality: |cap, _, _| cap.full().chars().count() as f64 + 0.2,
        match: inline_regex(fregex!(
            r"^\b_((?:__|\\[\s\S]|[^\\_])+?)_\b|^\*(?=\S)((?:\*\*|\\[\s\S]|\s+(?:\\[\s\S]|[^\s\*\\]|\*\*)|[^\s\*\\])+?)\*(?!\*)"
        )),
        parse: |cap, parser, state| {
            let inner = match cap.group(2) {
                Some(inner) if !inner.is_empty() => inner,
                _ => cap.text(1),
            };
            Ok(Parsed::One(Node::Em { content: parser.nested(inner, state)? }))
        },
        html: |node, out, state| {
            let Node::Em { content } = node else {
                return Err(OutputError::unexpected("em", node));
            };
            Ok(html_tag("em", &out.nodes(content, state)?, &[], true))
        },
        element: |node, out, state| {
            let Node::Em { content } = node else {
                return Err(OutputError::unexpected("em", node));
            };
            let children = out.nodes(content, state)?;
            Ok(element("em", state.key.clone(), Props { children: Some(children), ..Default::default() }))
        },
    }
}

fn strong() -> Rule {
    rule! {
        name: "strong",
        order: 21.0,
        quality: |cap, _, _| cap.full().chars().count() as f64 + 0.1,
        match: inline_regex(fregex!(r"^\*\*((?:\\[\s\S]|[^\\])+?)\*\*(?!\*)")),
        parse: |cap, parser, state| {
            Ok(Parsed::One(Node::Strong { content: parse_capture_inline(cap, parser, state)? }))
        },
        html: |node, out, state| {
            let Node::Strong { content } = node else {
                return Err(OutputError::unexpected("strong", node));
            };
            Ok(html_tag("strong", &out.nodes(content, state)?, &[], true))
        },
        element: |node, out, state| {
            let Node::Strong { content } = node else {
                return Err(OutputError::unexpected("strong", node));
            };
            let children = out.nodes(content, state)?;
            Ok(element("strong", state.key.clone(), Props { children: Some(children), ..Default::default() }))
        },
    }
}

fn u() -> Rule {
    rule! {
        name: "u",
        order: 21.0,
        quality: |cap, _, _| cap.full().chars().count() as f64,
        match: inline_regex(fregex!(r"^__((?:\\[\s\S]|[^\\])+?)__(?!_)")),
        parse: |cap, parser, state| {
            Ok(Parsed::One(Node::U { content: parse_capture_inline(cap, parser, state)? }))
        },
        html: |node, out, state| {
            let Node::U { content } = node else {
                return Err(OutputError::unexpected("u", node));
            };
            Ok(html_tag("u", &out.nodes(content, state)?, &[], true))
        },
        element: |node, out, state| {
            let Node::U { content } = node else {
                return Err(OutputError::unexpected("u", node));
            };
            let children = out.nodes(content, state)?;
            Ok(element("u", state.key.clone(), Props { children: Some(children), ..Default::default() }))
        },
    }
}

fn del() -> Rule {
    rule! {
        name: "del",
        order: 22.0,
        match: inline_regex(fregex!(r"^~~(?=\S)((?:\\[\s\S]|~(?!~)|[^\s~]|\s(?!~~))+?)~~")),
        parse: |cap, parser, state| {
            Ok(Parsed::One(Node::Del { content: parse_capture_inline(cap, parser, state)? }))
        },
        html: |node, out, state| {
            let Node::Del { content } = node else {
                return Err(OutputError::unexpected("del", node));
            };
            Ok(html_tag("del", &out.nodes(content, state)?, &[], true))
        },
        element: |node, out, state| {
            let Node::Del { content } = node else {
                return Err(OutputError::unexpected("del", node));
            };
            let children = out.nodes(content, state)?;
            Ok(element("del", state.key.clone(), Props { children: Some(children), ..Default::default() }))
        },
    }
}

/// Backtick code spans; the fence length may be 1..N backticks and must
/// balance. One space of padding next to the backticks is dropped.
fn inline_code() -> Rule {
    rule! {
        name: "inlineCode",
        order: 23.0,
        match: inline_regex(fregex!(r"^(`+)([\s\S]*?[^`])\1(?!`)")),
        parse: |cap, _, _| {
            let content = fregex!(r"^ (?= *`)|(` *) $").replace_all(cap.text(2), "$1").into_owned();
            Ok(Parsed::One(Node::InlineCode { content }))
        },
        html: |node, _, _| {
            let Node::InlineCode { content } = node else {
                return Err(OutputError::unexpected("inlineCode", node));
            };
            Ok(html_tag("code", &sanitize_text(content), &[], true))
        },
        element: |node, _, state| {
            let Node::InlineCode { content } = node else {
                return Err(OutputError::unexpected("inlineCode", node));
            };
            Ok(element(
                "code",
                state.key.clone(),
                Props { children: Some(ElementNode::Text(content.clone())), ..Default::default() },
            ))
        },
    }
}

/// Two trailing spaces before a newline force a hard break.
fn br() -> Rule {
    rule! {
        name: "br",
        order: 24.0,
        match: any_scope_regex(fregex!(r"^ {2,}\n")),
        parse: |_, _, _| Ok(Parsed::One(Node::Br)),
        html: |_, _, _| Ok("<br>".to_string()),
        element: |_, _, state| Ok(element("br", state.key.clone(), Props::default())),
    }
}

/// The catchall: consumes up to the next punctuation, blank line, hard
/// break or URL-like token. This rule must match anything the others
/// decline, in either mode.
fn text() -> Rule {
    rule! {
        name: "text",
        order: 25.0,
        match: any_scope_regex(fregex!(
            r"^[\s\S]+?(?=[^0-9A-Za-z\s\u{00c0}-\u{ffff}]|\n\n| {2,}\n|\w+:\S|$)"
        )),
        parse: |cap, _, _| Ok(Parsed::One(Node::text(cap.full()))),
        html: |node, _, _| {
            let Node::Text { content } = node else {
                return Err(OutputError::unexpected("text", node));
            };
            Ok(sanitize_text(content))
        },
        element: |node, _, _| {
            let Node::Text { content } = node else {
                return Err(OutputError::unexpected("text", node));
            };
            Ok(ElementNode::Text(content.clone()))
        },
    }
}
