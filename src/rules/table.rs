//! GFM tables, with and without outer pipes, plus the transient cell
//! separator rule.
//!
//! Rows are not parsed by a dedicated grammar: each row is inline-parsed
//! with `in_table` set, which lets the `tableSeparator` rule emit marker
//! nodes between the ordinary inline content. Cell grouping then splits
//! the node sequence on those markers, and any marker matched deeper in
//! the row (a pipe inside emphasis, say) is collapsed out of the cell
//! afterwards — no separator node survives table construction. Rows may
//! be ragged; renderers fall back to unstyled cells when a row is wider
//! than the align row.

use crate::element::{ElementNode, Props, Style, element};
use crate::engine::{OutputError, ParseError, Parser};
use crate::html::html_tag;
use crate::rules::helpers::block_regex;
use crate::{Align, Capture, Matcher, Node, Parsed, ParseState, Rule};

pub(crate) fn rules() -> Vec<Rule> {
    vec![nptable(), table(), table_separator()]
}

fn parse_table_align_capture(align_capture: &str) -> Option<Align> {
    if regex!(r"^ *-+: *$").is_match(align_capture) {
        Some(Align::Right)
    } else if regex!(r"^ *:-+: *$").is_match(align_capture) {
        Some(Align::Center)
    } else if regex!(r"^ *:-+ *$").is_match(align_capture) {
        Some(Align::Left)
    } else {
        None
    }
}

fn parse_table_align(source: &str, trim_end_separators: bool) -> Vec<Option<Align>> {
    let source = if trim_end_separators {
        regex!(r"^ *\| *| *\| *$").replace_all(source, "").into_owned()
    } else {
        source.to_string()
    };
    source.trim().split('|').map(parse_table_align_capture).collect()
}

/// Remove every separator marker left in cell content.
///
/// Cell grouping only consumes the separators at the top level of a row's
/// node list, but `in_table` stays set through nested inline parses, so a
/// pipe inside emphasis (or any other container) also matches the
/// separator rule. Those markers carry no content; collapse them out of
/// the tree entirely.
fn strip_nested_separators(nodes: &mut Vec<Node>) {
    nodes.retain(|node| !matches!(node, Node::TableSeparator));
    for node in nodes {
        match node {
            Node::Heading { content, .. }
            | Node::Paragraph { content }
            | Node::BlockQuote { content }
            | Node::Link { content, .. }
            | Node::Em { content }
            | Node::Strong { content }
            | Node::U { content }
            | Node::Del { content } => strip_nested_separators(content),
            Node::List { items, .. } => items.iter_mut().for_each(strip_nested_separators),
            Node::Table { header, cells, .. } => {
                header.iter_mut().for_each(strip_nested_separators);
                cells.iter_mut().flatten().for_each(strip_nested_separators);
            }
            _ => {}
        }
    }
}

/// Inline-parse one row with `in_table` set, then split the node sequence
/// into cells on the separator markers. With `trim_end_separators`, the
/// outer pipes' separators do not open cells. A text node sitting right
/// before a separator loses its trailing padding.
fn parse_table_row(
    source: &str,
    parser: &Parser<'_>,
    state: &mut ParseState,
    trim_end_separators: bool,
) -> Result<Vec<Vec<Node>>, ParseError> {
    let prev_in_table = state.in_table;
    state.in_table = true;
    let row = parser.nested(source.trim(), state);
    state.in_table = prev_in_table;
    let table_row = row?;

    let mut cells: Vec<Vec<Node>> = vec![Vec::new()];
    for index in 0..table_row.len() {
        if matches!(table_row[index], Node::TableSeparator) {
            if !trim_end_separators || (index != 0 && index != table_row.len() - 1) {
                cells.push(Vec::new());
            }
            continue;
        }

        let mut node = table_row[index].clone();
        if matches!(table_row.get(index + 1), Some(Node::TableSeparator)) {
            if let Node::Text { content } = &mut node {
                *content = regex!(r" *$").replace(content, "").into_owned();
            }
        }
        if let Some(cell) = cells.last_mut() {
            cell.push(node);
        }
    }

    for cell in &mut cells {
        strip_nested_separators(cell);
    }

    Ok(cells)
}

fn parse_table_cells(
    source: &str,
    parser: &Parser<'_>,
    state: &mut ParseState,
    trim_end_separators: bool,
) -> Result<Vec<Vec<Vec<Node>>>, ParseError> {
    source
        .trim()
        .split('\n')
        .map(|row_text| parse_table_row(row_text, parser, state, trim_end_separators))
        .collect()
}

fn parse_table(
    capture: &Capture,
    parser: &Parser<'_>,
    state: &mut ParseState,
    trim_end_separators: bool,
) -> Result<Parsed, ParseError> {
    let was_inline = state.inline;
    state.inline = true;
    let header = parse_table_row(capture.text(1), parser, state, trim_end_separators);
    let align = parse_table_align(capture.text(2), trim_end_separators);
    let cells = parse_table_cells(capture.text(3), parser, state, trim_end_separators);
    state.inline = was_inline;

    Ok(Parsed::One(Node::Table { header: header?, align, cells: cells? }))
}

fn style_of(align: &[Option<Align>], column_index: usize) -> Option<String> {
    align
        .get(column_index)
        .and_then(|a| a.as_ref())
        .map(|a| format!("text-align:{};", a.as_css()))
}

fn render_table_html(
    node: &Node,
    out: &crate::HtmlOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<String, OutputError> {
    let Node::Table { header, align, cells } = node else {
        return Err(OutputError::unexpected("table", node));
    };

    let mut headers = String::new();
    for (index, content) in header.iter().enumerate() {
        let attributes =
            [("style", style_of(align, index)), ("scope", Some("col".to_string()))];
        headers.push_str(&html_tag("th", &out.nodes(content, state)?, &attributes, true));
    }

    let mut rows = String::new();
    for row in cells {
        let mut row_html = String::new();
        for (column_index, content) in row.iter().enumerate() {
            let attributes = [("style", style_of(align, column_index))];
            row_html.push_str(&html_tag("td", &out.nodes(content, state)?, &attributes, true));
        }
        rows.push_str(&html_tag("tr", &row_html, &[], true));
    }

    let thead = html_tag("thead", &html_tag("tr", &headers, &[], true), &[], true);
    let tbody = html_tag("tbody", &rows, &[], true);
    Ok(html_tag("table", &format!("{thead}{tbody}"), &[], true))
}

fn render_table_element(
    node: &Node,
    out: &crate::ElementOutput<'_>,
    state: &mut crate::OutputState,
) -> Result<ElementNode, OutputError> {
    let Node::Table { header, align, cells } = node else {
        return Err(OutputError::unexpected("table", node));
    };

    // Element styles carry the bare alignment keyword, not a CSS snippet.
    let element_style = |column_index: usize| {
        align
            .get(column_index)
            .and_then(|a| a.as_ref())
            .map(|a| Style { text_align: Some(a.as_css().to_string()) })
    };

    let mut header_cells = Vec::with_capacity(header.len());
    for (index, content) in header.iter().enumerate() {
        let children = out.nodes(content, state)?;
        header_cells.push(element(
            "th",
            Some(index.to_string()),
            Props {
                style: element_style(index),
                scope: Some("col".to_string()),
                children: Some(children),
                ..Default::default()
            },
        ));
    }

    let mut rows = Vec::with_capacity(cells.len());
    for (row_index, row) in cells.iter().enumerate() {
        let mut row_cells = Vec::with_capacity(row.len());
        for (column_index, content) in row.iter().enumerate() {
            let children = out.nodes(content, state)?;
            row_cells.push(element(
                "td",
                Some(column_index.to_string()),
                Props {
                    style: element_style(column_index),
                    children: Some(children),
                    ..Default::default()
                },
            ));
        }
        rows.push(element(
            "tr",
            Some(row_index.to_string()),
            Props { children: Some(ElementNode::Many(row_cells)), ..Default::default() },
        ));
    }

    let thead = element(
        "thead",
        Some("thead".to_string()),
        Props {
            children: Some(element(
                "tr",
                None,
                Props { children: Some(ElementNode::Many(header_cells)), ..Default::default() },
            )),
            ..Default::default()
        },
    );
    let tbody = element(
        "tbody",
        Some("tbody".to_string()),
        Props { children: Some(ElementNode::Many(rows)), ..Default::default() },
    );

    Ok(element(
        "table",
        state.key.clone(),
        Props { children: Some(ElementNode::Many(vec![thead, tbody])), ..Default::default() },
    ))
}

/// Pipe-delimited GFM table without the outer pipes.
fn nptable() -> Rule {
    rule! {
        name: "nptable",
        order: 1.0,
        match: block_regex(fregex!(r"^ *(\S.*\|.*)\n *([-:]+ *\|[-| :]*)\n((?:.*\|.*(?:\n|$))*)\n*")),
        parse: |cap, parser, state| parse_table(cap, parser, state, false),
    }
}

/// Pipe-bounded GFM table.
fn table() -> Rule {
    rule! {
        name: "table",
        order: 9.0,
        match: block_regex(fregex!(r"^ *(\|.+)\n *\|( *[-:]+[-| :]*)\n((?: *\|.*(?:\n|$))*)\n*")),
        parse: |cap, parser, state| parse_table(cap, parser, state, true),
        html: render_table_html,
        element: render_table_element,
    }
}

fn match_table_separator(source: &str, state: &ParseState, _: &str) -> Option<Capture> {
    if !state.in_table {
        return None;
    }
    regex!(r"^ *\| *").captures(source).map(|caps| Capture::from_plain(&caps))
}

/// Marker between table cells; only matchable while a row is being
/// parsed, and fully consumed by table construction. The renderers only
/// matter to custom tables that emit the node themselves.
fn table_separator() -> Rule {
    rule! {
        name: "tableSeparator",
        order: 13.0,
        match: Matcher::Custom(match_table_separator),
        parse: |_, _, _| Ok(Parsed::One(Node::TableSeparator)),
        html: |_, _, _| Ok(" &vert; ".to_string()),
        element: |_, _, _| Ok(ElementNode::Text(" | ".to_string())),
    }
}
