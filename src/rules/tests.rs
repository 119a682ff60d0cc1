use pretty_assertions::assert_eq;

use crate::engine::{HtmlOutput, OutputState, Parser};
use crate::{Align, LinkTarget, Node, ParseState, parse, parse_inline, to_html};

#[test]
fn html_examples_matching() {
    // Array of (input, expected_html); the block terminator is appended by
    // the outer parse, so inputs read like real documents.
    let cases: Vec<(&str, &str)> = vec![
        ("# Hello", "<h1>Hello</h1>"),
        ("###### Deep", "<h6>Deep</h6>"),
        ("## Trailing ##", "<h2>Trailing</h2>"),
        ("## Sub *em*", "<h2>Sub <em>em</em></h2>"),
        ("Alt-H1\n======", "<h1>Alt-H1</h1>"),
        ("Alt-H2\n------", "<h2>Alt-H2</h2>"),
        ("---", "<hr>"),
        (" * * * ", "<hr>"),
        ("    code line\n    two", "<pre><code>code line\ntwo</code></pre>"),
        (
            "```rust\nfn main() {}\n```",
            "<pre><code class=\"markdown-code-rust\">fn main() {}</code></pre>",
        ),
        ("~~~\nplain fence\n~~~", "<pre><code>plain fence</code></pre>"),
        (
            "    <b>&\"x\"</b>",
            "<pre><code>&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;</code></pre>",
        ),
        (
            "> quote\n> more",
            "<blockquote><div class=\"paragraph\">quote\nmore</div></blockquote>",
        ),
        ("- a\n- b", "<ul><li>a</li><li>b</li></ul>"),
        ("+ a\n+ b", "<ul><li>a</li><li>b</li></ul>"),
        ("1. a\n2. b", "<ol start=\"1\"><li>a</li><li>b</li></ol>"),
        ("7. a\n8. b", "<ol start=\"7\"><li>a</li><li>b</li></ol>"),
        ("- a\n  - b", "<ul><li>a\n<ul><li>b</li></ul></li></ul>"),
        (
            "* one\n\n* two",
            "<ul><li><div class=\"paragraph\">one</div></li><li><div class=\"paragraph\">two</div></li></ul>",
        ),
        (
            "para one\n\npara two",
            "<div class=\"paragraph\">para one</div><div class=\"paragraph\">para two</div>",
        ),
        ("\n\nhello", "\n<div class=\"paragraph\">hello</div>"),
        (
            "[text](/url \"title\")",
            "<div class=\"paragraph\"><a href=\"/url\" title=\"title\">text</a></div>",
        ),
        ("[text](/url)", "<div class=\"paragraph\"><a href=\"/url\">text</a></div>"),
        (
            "[esc](/a\\_b)",
            "<div class=\"paragraph\"><a href=\"/a_b\">esc</a></div>",
        ),
        (
            "![alt](/img.png)",
            "<div class=\"paragraph\"><img src=\"/img.png\" alt=\"alt\"></div>",
        ),
        (
            "![a][logo]\n\n[logo]: /l.png \"L\"",
            "<div class=\"paragraph\"><img src=\"/l.png\" alt=\"a\" title=\"L\"></div>",
        ),
        (
            "<http://example.com/x>",
            "<div class=\"paragraph\"><a href=\"http://example.com/x\">http://example.com/x</a></div>",
        ),
        (
            "<user@example.com>",
            "<div class=\"paragraph\"><a href=\"mailto:user@example.com\">user@example.com</a></div>",
        ),
        (
            "<mailto:user@example.com>",
            "<div class=\"paragraph\"><a href=\"mailto:user@example.com\">mailto:user@example.com</a></div>",
        ),
        (
            "visit https://example.com/a now",
            "<div class=\"paragraph\">visit <a href=\"https://example.com/a\">https://example.com/a</a> now</div>",
        ),
        (
            "[x][y]\n\n[y]: http://z",
            "<div class=\"paragraph\"><a href=\"http://z\">x</a></div>",
        ),
        (
            "[y]: http://z\n\nsee [x][y]",
            "<div class=\"paragraph\">see <a href=\"http://z\">x</a></div>",
        ),
        ("[x][nope]", "<div class=\"paragraph\"><a>x</a></div>"),
        (
            "[link text itself][]\n\n[link text itself]: http://r",
            "<div class=\"paragraph\"><a href=\"http://r\">link text itself</a></div>",
        ),
        ("**bold**", "<div class=\"paragraph\"><strong>bold</strong></div>"),
        ("*em*", "<div class=\"paragraph\"><em>em</em></div>"),
        ("_em_", "<div class=\"paragraph\"><em>em</em></div>"),
        ("__under__", "<div class=\"paragraph\"><u>under</u></div>"),
        ("~~gone~~", "<div class=\"paragraph\"><del>gone</del></div>"),
        (
            "a **b _c_** d",
            "<div class=\"paragraph\">a <strong>b <em>c</em></strong> d</div>",
        ),
        ("a `code` b", "<div class=\"paragraph\">a <code>code</code> b</div>"),
        ("``a ` b``", "<div class=\"paragraph\"><code>a ` b</code></div>"),
        ("line  \nbreak", "<div class=\"paragraph\">line<br>break</div>"),
        ("\\*not em\\*", "<div class=\"paragraph\">*not em*</div>"),
        ("a < b & c", "<div class=\"paragraph\">a &lt; b &amp; c</div>"),
        (
            "| A | B |\n|---|:-:|\n| 1 | 2 |",
            "<table><thead><tr><th scope=\"col\">A</th><th style=\"text-align:center;\" scope=\"col\">B</th></tr></thead>\
             <tbody><tr><td>1</td><td style=\"text-align:center;\">2</td></tr></tbody></table>",
        ),
        (
            "A | B\n--- | ---\n1 | 2",
            "<table><thead><tr><th scope=\"col\">A</th><th scope=\"col\">B</th></tr></thead>\
             <tbody><tr><td>1</td><td>2</td></tr></tbody></table>",
        ),
        // A bodyless table still emits one empty row: the cell grouper
        // always opens a first cell.
        (
            "| L | R |\n|:--|--:|",
            "<table><thead><tr><th style=\"text-align:left;\" scope=\"col\">L</th>\
             <th style=\"text-align:right;\" scope=\"col\">R</th></tr></thead>\
             <tbody><tr><td style=\"text-align:left;\"></td></tr></tbody></table>",
        ),
        // Preprocessing quirks flow through to output.
        ("a\tb", "<div class=\"paragraph\">a\nb</div>"),
        ("x\r\ny", "<div class=\"paragraph\">x    y</div>"),
    ];

    for (input, expected) in cases {
        let html = to_html(input).unwrap_or_else(|err| panic!("to_html({input:?}) failed: {err}"));
        assert_eq!(html, expected, "input: {input:?}");
    }
}

#[test]
fn paragraphs_interleave_inline_nodes() {
    let ast = parse("a **b** c").unwrap();
    assert_eq!(
        ast,
        vec![Node::Paragraph {
            content: vec![
                Node::text("a "),
                Node::Strong { content: vec![Node::text("b")] },
                Node::text(" c"),
            ],
        }]
    );
}

#[test]
fn strong_wins_over_em_at_the_same_position() {
    let ast = parse_inline("**a**").unwrap();
    assert_eq!(ast, vec![Node::Strong { content: vec![Node::text("a")] }]);
}

#[test]
fn a_long_em_still_parses_as_em() {
    let ast = parse_inline("*abcdefghij*").unwrap();
    assert_eq!(ast, vec![Node::Em { content: vec![Node::text("abcdefghij")] }]);
}

#[test]
fn lists_parse_to_item_node_lists() {
    let ast = parse("- a\n- b").unwrap();
    assert_eq!(
        ast,
        vec![Node::List {
            ordered: false,
            start: None,
            items: vec![vec![Node::text("a")], vec![Node::text("b")]],
        }]
    );
}

#[test]
fn ordered_lists_keep_their_start() {
    let ast = parse("23. a\n24. b").unwrap();
    let Node::List { ordered, start, items } = &ast[0] else { panic!("expected list") };
    assert!(ordered);
    assert_eq!(*start, Some(23));
    assert_eq!(items.len(), 2);
}

#[test]
fn tables_classify_alignment_per_column() {
    let ast = parse("| A | B |\n|---|:-:|\n| 1 | 2 |").unwrap();
    let Node::Table { header, align, cells } = &ast[0] else { panic!("expected table") };
    assert_eq!(header.len(), 2);
    assert_eq!(header[0], vec![Node::text("A")]);
    assert_eq!(*align, vec![None, Some(Align::Center)]);
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0], vec![vec![Node::text("1")], vec![Node::text("2")]]);
}

#[test]
fn ragged_table_rows_are_tolerated() {
    let input = "| A | B |\n|---|---|\n| 1 |\n| 1 | 2 | 3 |";
    let ast = parse(input).unwrap();
    let Node::Table { cells, .. } = &ast[0] else { panic!("expected table") };
    assert_eq!(cells[0].len(), 1);
    assert_eq!(cells[1].len(), 3);
    // Rendering must not fail on the width mismatch either.
    to_html(input).unwrap();
}

#[test]
fn separators_inside_nested_inline_content_collapse() {
    // `in_table` stays set through nested inline parses, so the pipe in
    // `**a|b**` matches the separator rule inside the strong node. It must
    // be collapsed out of the cell, not left behind for the renderers.
    let input = "| **a|b** |\n|---|\n| 1 |";
    assert_eq!(
        to_html(input).unwrap(),
        "<table><thead><tr><th scope=\"col\"><strong>ab</strong></th></tr></thead>\
         <tbody><tr><td>1</td></tr></tbody></table>",
    );

    fn assert_no_separators(nodes: &[Node]) {
        for node in nodes {
            assert!(!matches!(node, Node::TableSeparator), "separator survived: {nodes:?}");
            match node {
                Node::Heading { content, .. }
                | Node::Paragraph { content }
                | Node::BlockQuote { content }
                | Node::Link { content, .. }
                | Node::Em { content }
                | Node::Strong { content }
                | Node::U { content }
                | Node::Del { content } => assert_no_separators(content),
                Node::List { items, .. } => items.iter().for_each(|item| assert_no_separators(item)),
                Node::Table { header, cells, .. } => {
                    header.iter().for_each(|cell| assert_no_separators(cell));
                    cells.iter().flatten().for_each(|cell| assert_no_separators(cell));
                }
                _ => {}
            }
        }
    }

    assert_no_separators(&parse(input).unwrap());
}

#[test]
fn reference_targets_resolve_forward_and_backward() {
    let backward = parse("[x][y]\n\n[y]: http://z").unwrap();
    let Node::Paragraph { content } = &backward[0] else { panic!("expected paragraph") };
    let Node::Link { target, .. } = &content[0] else { panic!("expected link") };
    assert_eq!(target.target().as_deref(), Some("http://z"));

    let forward = parse("[y]: http://z\n\n[x][y]").unwrap();
    let link = forward.iter().find_map(|node| match node {
        Node::Paragraph { content } => content.first(),
        _ => None,
    });
    let Some(Node::Link { target, .. }) = link else { panic!("expected link") };
    assert_eq!(target.target().as_deref(), Some("http://z"));
}

#[test]
fn later_definitions_override_earlier_ones() {
    let ast = parse("[x][y]\n\n[y]: http://a\n\n[y]: http://b").unwrap();
    let Node::Paragraph { content } = &ast[0] else { panic!("expected paragraph") };
    let Node::Link { target, .. } = &content[0] else { panic!("expected link") };
    assert_eq!(target.target().as_deref(), Some("http://b"));
}

#[test]
fn unresolved_references_stay_unresolved() {
    let ast = parse_inline("[x][missing]").unwrap();
    let Node::Link { target, .. } = &ast[0] else { panic!("expected link") };
    assert_eq!(target.target(), None);
    assert!(matches!(target, LinkTarget::Reference(_)));
}

#[test]
fn reference_names_are_case_and_whitespace_insensitive() {
    let ast = parse("[x][Some  Ref]\n\n[some ref]: http://z").unwrap();
    let Node::Paragraph { content } = &ast[0] else { panic!("expected paragraph") };
    let Node::Link { target, .. } = &content[0] else { panic!("expected link") };
    assert_eq!(target.target().as_deref(), Some("http://z"));
}

#[test]
fn scripting_urls_lose_their_href() {
    let cases = [
        "[click](javascript:alert%281%29)",
        "[click](JAVASCRIPT:alert(1))",
        "[click](vbscript:msgbox)",
        "[click](data:text/html;base64,x)",
    ];
    for input in cases {
        assert_eq!(
            to_html(input).unwrap(),
            "<div class=\"paragraph\"><a>click</a></div>",
            "input: {input:?}"
        );
    }
}

#[test]
fn mailto_targets_are_prefixed_once() {
    let ast = parse_inline("<a@b.com>").unwrap();
    let Node::Link { target, .. } = &ast[0] else { panic!("expected link") };
    assert_eq!(target.target().as_deref(), Some("mailto:a@b.com"));

    let ast = parse_inline("<MAILTO:a@b.com>").unwrap();
    let Node::Link { target, .. } = &ast[0] else { panic!("expected link") };
    assert_eq!(target.target().as_deref(), Some("MAILTO:a@b.com"));
}

#[test]
fn setext_headings_rewrite_to_heading_nodes() {
    let ast = parse("Title\n=====").unwrap();
    assert_eq!(ast, vec![Node::Heading { level: 1, content: vec![Node::text("Title")] }]);
}

#[test]
fn fences_rewrite_to_code_block_nodes() {
    let ast = parse("```py\nx = 1\n```").unwrap();
    assert_eq!(
        ast,
        vec![Node::CodeBlock { lang: Some("py".to_string()), content: "x = 1".to_string() }]
    );
}

#[test]
fn defs_parse_but_render_to_nothing() {
    let ast = parse("[r]: /t \"T\"").unwrap();
    assert_eq!(
        ast,
        vec![Node::Def {
            name: "r".to_string(),
            target: "/t".to_string(),
            title: Some("T".to_string()),
        }]
    );
    assert_eq!(to_html("[r]: /t \"T\"").unwrap(), "");
}

#[test]
fn every_emitted_type_has_a_rule() {
    let source = "# h *i*\n\nSetext\n---\n\n- item\n\n1. one\n\n> q\n\n    code\n\n\
                  ```l\nf\n```\n\n| **a|b** | b |\n|---|---|\n| 1 | 2 |\n\n\
                  [l](/u) ![i](/v) [r][x] ![r][x] <http://a/b> <a@b.c> \
                  **s** __u__ ~~d~~ `c` \\# text  \nbreak\n\n[x]: /w\n\n---\n";
    let rules = crate::rules::get();

    fn walk(nodes: &[Node], rules: &crate::RuleTable) {
        for node in nodes {
            assert!(
                rules.get(node.type_name()).is_some(),
                "no rule registered for node type {:?}",
                node.type_name()
            );
            match node {
                Node::Heading { content, .. }
                | Node::Paragraph { content }
                | Node::BlockQuote { content }
                | Node::Link { content, .. }
                | Node::Em { content }
                | Node::Strong { content }
                | Node::U { content }
                | Node::Del { content } => walk(content, rules),
                Node::List { items, .. } => items.iter().for_each(|item| walk(item, rules)),
                Node::Table { header, cells, .. } => {
                    header.iter().for_each(|cell| walk(cell, rules));
                    cells.iter().flatten().for_each(|cell| walk(cell, rules));
                }
                _ => {}
            }
        }
    }

    walk(&parse(source).unwrap(), &rules);
}

#[test]
fn hostile_fragments_always_terminate() {
    // Progress is an engine invariant: every iteration consumes at least
    // one byte, so pathological punctuation soup must still finish.
    let cases = [
        "****", "__", "``", "~~~~", "[[[[", "]]]]", "(()(", "*_*_*", "|||",
        "- ", ">>", "###########", "\\", "   ", "\n \n \n", "a:b:c:d",
    ];
    for source in cases {
        parse(source).unwrap_or_else(|err| panic!("parse({source:?}) failed: {err}"));
        parse_inline(source).unwrap_or_else(|err| panic!("parse_inline({source:?}) failed: {err}"));
    }
}

#[test]
fn hand_built_engines_match_the_api_wrappers() {
    // The api functions are thin wrappers; driving Parser and HtmlOutput
    // over a freshly built table must agree with them.
    let table = crate::rules::get();
    let parser = Parser::new(&table);
    let out = HtmlOutput::new(&table).unwrap();

    let source = "# only\n\n- a\n- b\n";
    let mut state = ParseState::default();
    let ast = parser.parse(source, &mut state).unwrap();
    let html = out.render(&ast, &mut OutputState::default()).unwrap();
    assert_eq!(html, to_html(source).unwrap());
    assert_eq!(html, "<h1>only</h1><ul><li>a</li><li>b</li></ul>");
}
