//! HTML to document, filtered through the schema.
//!
//! Parsing never fails. Elements the schema does not know are unwrapped
//! (their text survives) or dropped, and each case is recorded as a
//! [`ParseWarning`] so the host can tell that the stored article lost
//! something on the way in.

use std::fmt;

use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use smol_str::SmolStr;

use crate::extensions::video;
use crate::html::style;
use crate::model::{
    Block, CodeBlock, Document, Heading, ImageAttrs, Inline, List, ListItem, ListKind, TextBlock,
    TextRun,
};
use crate::schema::{MarkType, NodeType, Schema};
use crate::types::{Alignment, Link, Marks};

/// Output of [`parse`].
#[derive(Clone, Debug)]
pub struct Parsed {
    pub document: Document,
    pub warnings: Vec<ParseWarning>,
}

/// Something in the source HTML that did not survive as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub element: SmolStr,
    pub reason: DropReason,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Not an element the editor understands; its text was kept.
    Unknown,
    /// Belongs to an extension this editor does not register.
    NotRegistered,
    /// Never carries article content (scripts, styles, embeds).
    Discarded,
    /// Media element without a usable source.
    MissingSource,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            DropReason::Unknown => "is not supported, kept its text",
            DropReason::NotRegistered => "needs an extension that is not registered",
            DropReason::Discarded => "was removed",
            DropReason::MissingSource => "has no source and was removed",
        };
        write!(f, "<{}> {}", self.element, reason)
    }
}

const DISCARDED: &[&str] = &[
    "script", "style", "template", "noscript", "iframe", "object", "embed", "head", "title",
    "meta", "link", "svg", "canvas", "form", "input", "button", "select", "textarea",
];

/// Wrappers whose children are parsed as if they stood in the parent.
const TRANSPARENT: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "aside", "nav",
    "figure", "figcaption", "center",
];

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "pre"
            | "img"
            | "video"
            | "hr"
    ) || TRANSPARENT.contains(&name)
}

fn heading_level(name: &str) -> Option<u8> {
    let digit = name.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

enum Piece<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

fn pieces(el: ElementRef<'_>) -> Vec<Piece<'_>> {
    el.children()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(Piece::Text(&**text)),
            Node::Element(_) => ElementRef::wrap(node).map(Piece::Element),
            _ => None,
        })
        .collect()
}

/// Parse host HTML into a document the schema accepts.
pub fn parse(html: &str, schema: &Schema) -> Parsed {
    let fragment = Html::parse_fragment(html);
    let mut parser = Parser {
        schema,
        warnings: Vec::new(),
    };
    let blocks = parser.blocks(pieces(fragment.root_element()));
    Parsed {
        document: Document::from_blocks(blocks),
        warnings: parser.warnings,
    }
}

struct Parser<'s> {
    schema: &'s Schema,
    warnings: Vec<ParseWarning>,
}

impl Parser<'_> {
    fn warn(&mut self, element: &str, reason: DropReason) {
        tracing::debug!(element, ?reason, "html element not kept as-is");
        self.warnings.push(ParseWarning {
            element: element.into(),
            reason,
        });
    }

    /// Block context. Loose inline content is gathered into paragraphs.
    fn blocks(&mut self, pieces: Vec<Piece<'_>>) -> Vec<Block> {
        let mut out = Vec::new();
        let mut loose = TextBlock::new();
        let mut hoisted = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Element(el) if is_block(el.value().name()) => {
                    flush(&mut loose, &mut hoisted, &mut out);
                    self.block(el, &mut out);
                }
                piece => self.inline_piece(piece, &Marks::default(), &mut loose, &mut hoisted),
            }
        }
        flush(&mut loose, &mut hoisted, &mut out);
        out
    }

    fn block(&mut self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        let name = el.value().name();

        if let Some(level) = heading_level(name) {
            let (body, hoisted) = self.text_block(el);
            if self.schema.allows_heading(level) {
                let id = el
                    .attr("id")
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(SmolStr::from);
                out.push(Block::Heading(Heading { level, id, body }));
            } else {
                self.warn(name, DropReason::NotRegistered);
                out.push(Block::Paragraph(body));
            }
            out.extend(hoisted);
            return;
        }

        match name {
            "p" => {
                let (tb, hoisted) = self.text_block(el);
                out.push(Block::Paragraph(tb));
                out.extend(hoisted);
            }
            "ul" | "ol" => self.list(el, out),
            "blockquote" => {
                let children = self.blocks(pieces(el));
                if self.schema.allows_node(NodeType::Blockquote) {
                    out.push(Block::Blockquote(children));
                } else {
                    self.warn(name, DropReason::NotRegistered);
                    out.extend(children);
                }
            }
            "pre" => self.code_block(el, out),
            "img" => self.image(el, out),
            "video" => {
                if self.schema.allows_node(NodeType::Video) {
                    out.push(Block::Video(video::parse(el, self.schema.video_options())));
                } else {
                    self.warn(name, DropReason::NotRegistered);
                }
            }
            "hr" => {
                if self.schema.allows_node(NodeType::HorizontalRule) {
                    out.push(Block::HorizontalRule);
                } else {
                    self.warn(name, DropReason::NotRegistered);
                }
            }
            // stray <li> and transparent wrappers
            _ => out.extend(self.blocks(pieces(el))),
        }
    }

    fn list(&mut self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        let name = el.value().name();
        let (kind, node) = if name == "ol" {
            (ListKind::Ordered, NodeType::OrderedList)
        } else {
            (ListKind::Bullet, NodeType::BulletList)
        };
        let start = match kind {
            ListKind::Ordered => el
                .attr("start")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1),
            ListKind::Bullet => 1,
        };

        let mut items = Vec::new();
        for piece in pieces(el) {
            match piece {
                Piece::Element(li) if li.value().name() == "li" => items.push(ListItem {
                    blocks: self.blocks(pieces(li)),
                }),
                Piece::Text(text) if text.trim().is_empty() => {}
                other => items.push(ListItem {
                    blocks: self.blocks(vec![other]),
                }),
            }
        }

        if self.schema.allows_node(node) {
            out.push(Block::List(List { kind, start, items }));
        } else {
            self.warn(name, DropReason::NotRegistered);
            out.extend(items.into_iter().flat_map(|item| item.blocks));
        }
    }

    fn code_block(&mut self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        let language = el
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == "code")
            .and_then(|code| {
                code.value()
                    .classes()
                    .find_map(|class| class.strip_prefix("language-"))
                    .map(SmolStr::from)
            });
        let text: String = el.text().collect();

        if self.schema.allows_node(NodeType::CodeBlock) {
            out.push(Block::CodeBlock(CodeBlock { language, text }));
        } else {
            self.warn("pre", DropReason::NotRegistered);
            out.push(Block::Paragraph(TextBlock::from_text(&text)));
        }
    }

    fn image(&mut self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        if !self.schema.allows_node(NodeType::Image) {
            self.warn("img", DropReason::NotRegistered);
            return;
        }
        let Some(src) = el.attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
            self.warn("img", DropReason::MissingSource);
            return;
        };
        out.push(Block::Image(ImageAttrs {
            src: src.into(),
            alt: el.attr("alt").map(SmolStr::from),
            title: el.attr("title").map(SmolStr::from),
        }));
    }

    /// Inline content of a paragraph or heading. Media found inside is
    /// returned separately and placed after the block.
    fn text_block(&mut self, el: ElementRef<'_>) -> (TextBlock, Vec<Block>) {
        let mut tb = TextBlock::new().with_align(self.alignment(el));
        let mut hoisted = Vec::new();
        for piece in pieces(el) {
            self.inline_piece(piece, &Marks::default(), &mut tb, &mut hoisted);
        }
        finish(&mut tb);
        (tb, hoisted)
    }

    fn alignment(&self, el: ElementRef<'_>) -> Option<Alignment> {
        el.attr("style")
            .and_then(style::alignment)
            .or_else(|| el.attr("align").and_then(Alignment::from_css))
            .filter(|align| self.schema.allows_alignment(*align))
    }

    fn inline_piece(
        &mut self,
        piece: Piece<'_>,
        marks: &Marks,
        tb: &mut TextBlock,
        hoisted: &mut Vec<Block>,
    ) {
        match piece {
            Piece::Text(text) => push_text(tb, text, marks),
            Piece::Element(el) => self.inline(el, marks, tb, hoisted),
        }
    }

    fn inline(
        &mut self,
        el: ElementRef<'_>,
        marks: &Marks,
        tb: &mut TextBlock,
        hoisted: &mut Vec<Block>,
    ) {
        let name = el.value().name();
        let mut marks = marks.clone();
        match name {
            "br" => {
                if self.schema.allows_node(NodeType::HardBreak) {
                    tb.content.push(Inline::HardBreak);
                } else {
                    push_text(tb, " ", &marks);
                }
                return;
            }
            "strong" | "b" => self.flag(&mut marks, MarkType::Bold, name),
            "em" | "i" => self.flag(&mut marks, MarkType::Italic, name),
            "u" => self.flag(&mut marks, MarkType::Underline, name),
            "s" | "strike" | "del" => self.flag(&mut marks, MarkType::Strike, name),
            "sub" => self.flag(&mut marks, MarkType::Subscript, name),
            "sup" => self.flag(&mut marks, MarkType::Superscript, name),
            "a" => self.link(el, &mut marks),
            "span" => self.span_style(el, &mut marks),
            "img" | "video" | "hr" => {
                self.block(el, hoisted);
                return;
            }
            name if DISCARDED.contains(&name) => {
                self.warn(name, DropReason::Discarded);
                return;
            }
            // nested block content is flattened into the enclosing textblock
            name if is_block(name) => {}
            _ => self.warn(name, DropReason::Unknown),
        }
        for piece in pieces(el) {
            self.inline_piece(piece, &marks, tb, hoisted);
        }
    }

    fn flag(&mut self, marks: &mut Marks, mark: MarkType, name: &str) {
        match mark.flag() {
            Some(flag) if self.schema.allows_mark(mark) => marks.insert_flag(flag),
            _ => self.warn(name, DropReason::NotRegistered),
        }
    }

    fn link(&mut self, el: ElementRef<'_>, marks: &mut Marks) {
        if !self.schema.allows_mark(MarkType::Link) {
            self.warn("a", DropReason::NotRegistered);
            return;
        }
        if let Some(href) = el.attr("href").map(str::trim).filter(|h| !h.is_empty()) {
            marks.link = Some(Link {
                href: href.into(),
                target: el.attr("target").map(SmolStr::from),
            });
        }
    }

    fn span_style(&mut self, el: ElementRef<'_>, marks: &mut Marks) {
        let Some(css) = el.attr("style") else {
            return;
        };
        let mut rejected = false;
        for (attr, value) in style::text_style(css) {
            if self.schema.allows_style(attr) {
                marks.style.set(attr, Some(value.into()));
            } else {
                rejected = true;
            }
        }
        if rejected {
            self.warn("span", DropReason::NotRegistered);
        }
    }
}

/// Emit gathered loose content as a paragraph, followed by any media found in it.
fn flush(loose: &mut TextBlock, hoisted: &mut Vec<Block>, out: &mut Vec<Block>) {
    let mut tb = std::mem::take(loose);
    finish(&mut tb);
    if !tb.is_empty() {
        out.push(Block::Paragraph(tb));
    }
    out.append(hoisted);
}

fn ends_with_space(tb: &TextBlock) -> bool {
    match tb.content.last() {
        None | Some(Inline::HardBreak) => true,
        Some(Inline::Text(run)) => run.text.ends_with(' '),
    }
}

/// Append text with HTML whitespace collapsing.
fn push_text(tb: &mut TextBlock, raw: &str, marks: &Marks) {
    let mut space = ends_with_space(tb);
    let mut text = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_whitespace() {
            if !space {
                text.push(' ');
                space = true;
            }
        } else {
            text.push(ch);
            space = false;
        }
    }
    if !text.is_empty() {
        tb.content.push(Inline::Text(TextRun::new(text, marks.clone())));
    }
}

/// Trim spaces before hard breaks and at the end of the block.
fn finish(tb: &mut TextBlock) {
    let len = tb.content.len();
    for i in 0..len {
        let at_edge = i + 1 == len || matches!(tb.content[i + 1], Inline::HardBreak);
        if let (true, Inline::Text(run)) = (at_edge, &mut tb.content[i]) {
            let trimmed = run.text.trim_end_matches(' ').len();
            run.text.truncate(trimmed);
        }
    }
    tb.normalize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions;
    use crate::html::to_html;
    use crate::types::{MarkFlags, StyleAttr};

    fn standard(html: &str) -> Parsed {
        parse(html, &Schema::standard())
    }

    #[derive(Debug, Serialize)]
    struct ParseOutput {
        html: String,
        warnings: Vec<ParseWarning>,
    }

    fn parse_output(html: &str, schema: &Schema) -> ParseOutput {
        let parsed = parse(html, schema);
        ParseOutput {
            html: to_html(&parsed.document),
            warnings: parsed.warnings,
        }
    }

    #[test]
    fn test_canonical_html_round_trips() {
        let html = concat!(
            "<h1 id=\"heading-intro-1\">Intro</h1>",
            "<p style=\"text-align: justify\">Plain <strong>bold</strong> and ",
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer nofollow\">a link</a>",
            "<br>next line</p>",
            "<ul><li><p>one</p></li><li><p>two</p></li></ul>",
            "<blockquote><p>quoted</p></blockquote>",
            "<pre><code class=\"language-rust\">fn main() {}</code></pre>",
            "<img src=\"a.png\" alt=\"A\">",
            "<video controls width=\"100%\" max-width=\"100%\" src=\"blob:abc\"></video>",
            "<hr>",
            "<p><span style=\"color: #ff0000; font-size: 18px\">red</span></p>",
        );
        let parsed = standard(html);
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        assert_eq!(to_html(&parsed.document), html);
    }

    #[test]
    fn test_empty_input_gives_one_empty_paragraph() {
        let parsed = standard("");
        assert_eq!(parsed.document, Document::new());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_whitespace_collapses() {
        let parsed = standard("<p>\n  hello \n\t <em> big </em>  world  <br>  again </p>");
        assert_eq!(
            to_html(&parsed.document),
            "<p>hello <em>big </em>world<br>again</p>"
        );
    }

    #[test]
    fn test_loose_text_becomes_paragraph() {
        let parsed = standard("just text<p>para</p>tail");
        assert_eq!(
            to_html(&parsed.document),
            "<p>just text</p><p>para</p><p>tail</p>"
        );
    }

    #[test]
    fn test_unsupported_elements_reported() {
        insta::assert_yaml_snapshot!(parse_output(
            "<p>keep<script>alert(1)</script> <mark>this</mark></p><img alt=\"x\">",
            &Schema::standard()
        ));
    }

    #[test]
    fn test_unregistered_extensions_degrade() {
        let schema = Schema::from_extensions(&[
            extensions::paragraph(),
            extensions::heading_with_levels(&[1, 2]),
            extensions::bold(),
            extensions::text_style(),
            extensions::color(),
        ])
        .unwrap();
        insta::assert_yaml_snapshot!(parse_output(
            "<h3>Deep</h3><p><em>soft</em> <span style=\"color: red; font-size: 9px\">x</span></p><video src=\"v.mp4\"></video>",
            &schema
        ));
    }

    #[test]
    fn test_marks_and_styles_parsed() {
        let parsed = standard(
            "<p><b><i>both</i></b><span style=\"font-family: Inter; font-size: 12px\">styled</span><sub><sup>up</sup></sub></p>",
        );
        let Block::Paragraph(tb) = &parsed.document.blocks()[0] else {
            panic!("expected paragraph");
        };
        let runs = tb.runs_in(0..tb.len());
        assert_eq!(runs[0].marks.flags, MarkFlags::BOLD | MarkFlags::ITALIC);
        assert_eq!(
            runs[1].marks.style.get(StyleAttr::FontSize).map(|s| s.as_str()),
            Some("12px")
        );
        assert_eq!(runs[1].marks.style.font_family.as_deref(), Some("Inter"));
        // the innermost of two exclusive marks wins
        assert_eq!(runs[2].marks.flags, MarkFlags::SUPERSCRIPT);
    }

    #[test]
    fn test_media_inside_paragraph_is_lifted() {
        let parsed = standard("<p>before <img src=\"a.png\"> after</p>");
        assert_eq!(
            to_html(&parsed.document),
            "<p>before after</p><img src=\"a.png\">"
        );
    }

    #[test]
    fn test_ordered_list_start_and_alignment_attr() {
        let parsed = standard("<ol start=\"4\"><li>four</li></ol><p align=\"center\">mid</p>");
        assert_eq!(
            to_html(&parsed.document),
            "<ol start=\"4\"><li><p>four</p></li></ol><p style=\"text-align: center\">mid</p>"
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = ParseWarning {
            element: "iframe".into(),
            reason: DropReason::Discarded,
        };
        assert_eq!(warning.to_string(), "<iframe> was removed");
    }

    mod generated {
        use proptest::prelude::*;

        use super::*;

        fn text() -> impl Strategy<Value = String> {
            "[a-z][a-z&<'\" ]{0,10}".prop_map(|t| t.replace('&', "&amp;").replace('<', "&lt;"))
        }

        fn inline() -> impl Strategy<Value = String> {
            prop_oneof![
                text(),
                (prop::sample::select(vec!["strong", "em", "u", "s", "sub", "sup"]), text())
                    .prop_map(|(tag, t)| format!("<{tag}>{t}</{tag}>")),
                text().prop_map(|t| format!("<a href=\"https://example.com/{}\">{t}</a>", t.len())),
                (prop::sample::select(vec!["color: #e03131", "font-size: 18px", "font-family: Inter"]), text())
                    .prop_map(|(style, t)| format!("<span style=\"{style}\">{t}</span>")),
                Just("<br>".to_string()),
            ]
        }

        fn inlines() -> impl Strategy<Value = String> {
            prop::collection::vec(inline(), 1..4).prop_map(|parts| parts.concat())
        }

        fn block() -> impl Strategy<Value = String> {
            prop_oneof![
                inlines().prop_map(|c| format!("<p>{c}</p>")),
                (1u8..=3, inlines()).prop_map(|(l, c)| format!("<h{l}>{c}</h{l}>")),
                inlines().prop_map(|c| format!("<blockquote><p>{c}</p></blockquote>")),
                prop::collection::vec(inlines(), 1..3).prop_map(|items| {
                    let items: String = items.iter().map(|c| format!("<li><p>{c}</p></li>")).collect();
                    format!("<ul>{items}</ul>")
                }),
                (1u32..5, inlines()).prop_map(|(start, c)| format!("<ol start=\"{start}\"><li>{c}</li></ol>")),
                text().prop_map(|t| format!("<pre><code>{t}</code></pre>")),
                Just("<hr>".to_string()),
                Just("<img src=\"a.png\" alt=\"A\">".to_string()),
                Just("<video src=\"blob:abc\"></video>".to_string()),
            ]
        }

        proptest! {
            /// Canonical output is a fixed point: parsing it again changes nothing.
            #[test]
            fn prop_serialize_parse_round_trip(blocks in prop::collection::vec(block(), 0..6)) {
                let html = blocks.concat();
                let first = standard(&html);
                prop_assert!(first.warnings.is_empty(), "{:?}", first.warnings);

                let canonical = to_html(&first.document);
                let second = standard(&canonical);
                prop_assert_eq!(&second.document, &first.document);
                prop_assert_eq!(to_html(&second.document), canonical);
            }
        }
    }
}
