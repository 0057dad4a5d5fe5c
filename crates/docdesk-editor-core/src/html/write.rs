//! Canonical HTML serialization.
//!
//! Output is deterministic: attributes come in a fixed order and marks nest
//! link > text-style span > strong > em > u > s > sub/sup, so two documents
//! with the same content always serialize to the same string.

use std::convert::Infallible;
use std::fmt;

use pulldown_cmark_escape::{StrWrite, escape_href, escape_html};

use crate::extensions::video;
use crate::html::style::render_text_style;
use crate::model::{Block, CodeBlock, Document, Heading, ImageAttrs, Inline, List, ListKind, TextBlock};
use crate::types::{Alignment, MarkFlags, Marks};

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// `rel` attached to every link.
pub const LINK_REL: &str = "noopener noreferrer nofollow";

const FLAG_TAGS: [(MarkFlags, &str); 6] = [
    (MarkFlags::BOLD, "strong"),
    (MarkFlags::ITALIC, "em"),
    (MarkFlags::UNDERLINE, "u"),
    (MarkFlags::STRIKE, "s"),
    (MarkFlags::SUBSCRIPT, "sub"),
    (MarkFlags::SUPERSCRIPT, "sup"),
];

/// String sink for the serializer.
#[derive(Debug, Clone, Default)]
pub struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl StrWrite for HtmlWriter {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.out.push_str(s);
        Ok(())
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), Self::Error> {
        let _ = fmt::Write::write_fmt(&mut self.out, args);
        Ok(())
    }
}

/// Serialize a document to canonical HTML.
pub fn to_html(doc: &Document) -> String {
    let mut w = HtmlWriter::new();
    let Ok(()) = write_document(&mut w, doc);
    w.into_string()
}

pub fn write_document<W: StrWrite>(w: &mut W, doc: &Document) -> Result<(), W::Error> {
    write_blocks(w, doc.blocks())
}

fn write_blocks<W: StrWrite>(w: &mut W, blocks: &[Block]) -> Result<(), W::Error> {
    for block in blocks {
        write_block(w, block)?;
    }
    Ok(())
}

fn write_block<W: StrWrite>(w: &mut W, block: &Block) -> Result<(), W::Error> {
    match block {
        Block::Paragraph(tb) => write_text_block(w, "p", None, tb),
        Block::Heading(Heading { level, id, body }) => {
            let tag = HEADING_TAGS[usize::from((*level).clamp(1, 6)) - 1];
            write_text_block(w, tag, id.as_deref(), body)
        }
        Block::CodeBlock(code) => write_code_block(w, code),
        Block::List(list) => write_list(w, list),
        Block::Blockquote(children) => {
            w.write_str("<blockquote>")?;
            write_blocks(w, children)?;
            w.write_str("</blockquote>")
        }
        Block::Image(img) => write_image(w, img),
        Block::Video(attrs) => video::render(w, attrs),
        Block::HorizontalRule => w.write_str("<hr>"),
    }
}

fn write_text_block<W: StrWrite>(
    w: &mut W,
    tag: &str,
    id: Option<&str>,
    tb: &TextBlock,
) -> Result<(), W::Error> {
    w.write_str("<")?;
    w.write_str(tag)?;
    if let Some(id) = id {
        w.write_str(" id=\"")?;
        escape_html(&mut *w, id)?;
        w.write_str("\"")?;
    }
    write_align(w, tb.align)?;
    w.write_str(">")?;
    write_inlines(w, &tb.content)?;
    w.write_str("</")?;
    w.write_str(tag)?;
    w.write_str(">")
}

fn write_align<W: StrWrite>(w: &mut W, align: Option<Alignment>) -> Result<(), W::Error> {
    match align {
        Some(align) => write!(w, " style=\"text-align: {}\"", align.as_css()),
        None => Ok(()),
    }
}

fn write_code_block<W: StrWrite>(w: &mut W, code: &CodeBlock) -> Result<(), W::Error> {
    w.write_str("<pre><code")?;
    if let Some(lang) = &code.language {
        w.write_str(" class=\"language-")?;
        escape_html(&mut *w, lang)?;
        w.write_str("\"")?;
    }
    w.write_str(">")?;
    escape_html(&mut *w, &code.text)?;
    w.write_str("</code></pre>")
}

fn write_list<W: StrWrite>(w: &mut W, list: &List) -> Result<(), W::Error> {
    let tag = match list.kind {
        ListKind::Bullet => {
            w.write_str("<ul>")?;
            "ul"
        }
        ListKind::Ordered if list.start != 1 => {
            write!(w, "<ol start=\"{}\">", list.start)?;
            "ol"
        }
        ListKind::Ordered => {
            w.write_str("<ol>")?;
            "ol"
        }
    };
    for item in &list.items {
        w.write_str("<li>")?;
        write_blocks(w, &item.blocks)?;
        w.write_str("</li>")?;
    }
    w.write_str("</")?;
    w.write_str(tag)?;
    w.write_str(">")
}

fn write_image<W: StrWrite>(w: &mut W, img: &ImageAttrs) -> Result<(), W::Error> {
    w.write_str("<img src=\"")?;
    escape_href(&mut *w, &img.src)?;
    w.write_str("\"")?;
    if let Some(alt) = &img.alt {
        w.write_str(" alt=\"")?;
        escape_html(&mut *w, alt)?;
        w.write_str("\"")?;
    }
    if let Some(title) = &img.title {
        w.write_str(" title=\"")?;
        escape_html(&mut *w, title)?;
        w.write_str("\"")?;
    }
    w.write_str(">")
}

fn write_inlines<W: StrWrite>(w: &mut W, content: &[Inline]) -> Result<(), W::Error> {
    for inline in content {
        match inline {
            Inline::Text(run) => {
                let closers = open_marks(w, &run.marks)?;
                escape_html(&mut *w, &run.text)?;
                for tag in closers.iter().rev() {
                    w.write_str("</")?;
                    w.write_str(tag)?;
                    w.write_str(">")?;
                }
            }
            Inline::HardBreak => w.write_str("<br>")?,
        }
    }
    Ok(())
}

/// Open every mark on a run, outermost first. Returns the tags to close.
fn open_marks<W: StrWrite>(w: &mut W, marks: &Marks) -> Result<Vec<&'static str>, W::Error> {
    let mut open = Vec::new();
    if let Some(link) = &marks.link {
        w.write_str("<a href=\"")?;
        escape_href(&mut *w, &link.href)?;
        w.write_str("\"")?;
        if let Some(target) = &link.target {
            w.write_str(" target=\"")?;
            escape_html(&mut *w, target)?;
            w.write_str("\"")?;
        }
        write!(w, " rel=\"{LINK_REL}\">")?;
        open.push("a");
    }
    if !marks.style.is_empty() {
        w.write_str("<span style=\"")?;
        escape_html(&mut *w, &render_text_style(&marks.style))?;
        w.write_str("\">")?;
        open.push("span");
    }
    for (flag, tag) in FLAG_TAGS {
        if marks.flags.contains(flag) {
            w.write_str("<")?;
            w.write_str(tag)?;
            w.write_str(">")?;
            open.push(tag);
        }
    }
    Ok(open)
}
