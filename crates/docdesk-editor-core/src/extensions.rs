//! Extension registry: the node, mark and attribute definitions an editor
//! is composed from.
//!
//! Every definition comes from a factory function, so each editor gets its
//! own fresh list and nothing is shared at module scope. Two definitions are
//! bespoke to docdesk and carry their own HTML round-trip: the [`video`]
//! node and the [`font_size`] text-style attribute.

use smol_str::SmolStr;

use crate::schema::{MarkType, NodeType};
use crate::types::{Alignment, StyleAttr};

/// What an extension contributes to the schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtensionKind {
    Node(NodeType),
    Mark(MarkType),
    /// An attribute layered onto the text-style mark.
    Style(StyleAttr),
    /// Block-level `text-align` attribute on paragraphs and headings.
    TextAlign,
}

/// Per-extension configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtensionOptions {
    None,
    Heading { levels: Vec<u8> },
    Video(VideoOptions),
    TextAlign { alignments: Vec<Alignment> },
}

/// Default attribute values for new video nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoOptions {
    pub width: SmolStr,
    pub max_width: SmolStr,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            width: SmolStr::new_static("100%"),
            max_width: SmolStr::new_static("100%"),
        }
    }
}

/// A single node, mark or attribute definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extension {
    name: &'static str,
    kind: ExtensionKind,
    options: ExtensionOptions,
}

impl Extension {
    const fn new(name: &'static str, kind: ExtensionKind) -> Self {
        Self {
            name,
            kind,
            options: ExtensionOptions::None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    pub fn options(&self) -> &ExtensionOptions {
        &self.options
    }
}

pub fn paragraph() -> Extension {
    Extension::new("paragraph", ExtensionKind::Node(NodeType::Paragraph))
}

/// Headings h1 through h6.
pub fn heading() -> Extension {
    heading_with_levels(&[1, 2, 3, 4, 5, 6])
}

pub fn heading_with_levels(levels: &[u8]) -> Extension {
    Extension {
        options: ExtensionOptions::Heading {
            levels: levels.iter().copied().filter(|l| (1..=6).contains(l)).collect(),
        },
        ..Extension::new("heading", ExtensionKind::Node(NodeType::Heading))
    }
}

pub fn bullet_list() -> Extension {
    Extension::new("bulletList", ExtensionKind::Node(NodeType::BulletList))
}

pub fn ordered_list() -> Extension {
    Extension::new("orderedList", ExtensionKind::Node(NodeType::OrderedList))
}

pub fn list_item() -> Extension {
    Extension::new("listItem", ExtensionKind::Node(NodeType::ListItem))
}

pub fn blockquote() -> Extension {
    Extension::new("blockquote", ExtensionKind::Node(NodeType::Blockquote))
}

pub fn code_block() -> Extension {
    Extension::new("codeBlock", ExtensionKind::Node(NodeType::CodeBlock))
}

pub fn image() -> Extension {
    Extension::new("image", ExtensionKind::Node(NodeType::Image))
}

pub fn hard_break() -> Extension {
    Extension::new("hardBreak", ExtensionKind::Node(NodeType::HardBreak))
}

pub fn horizontal_rule() -> Extension {
    Extension::new("horizontalRule", ExtensionKind::Node(NodeType::HorizontalRule))
}

pub fn bold() -> Extension {
    Extension::new("bold", ExtensionKind::Mark(MarkType::Bold))
}

pub fn italic() -> Extension {
    Extension::new("italic", ExtensionKind::Mark(MarkType::Italic))
}

pub fn underline() -> Extension {
    Extension::new("underline", ExtensionKind::Mark(MarkType::Underline))
}

pub fn strike() -> Extension {
    Extension::new("strike", ExtensionKind::Mark(MarkType::Strike))
}

pub fn subscript() -> Extension {
    Extension::new("subscript", ExtensionKind::Mark(MarkType::Subscript))
}

pub fn superscript() -> Extension {
    Extension::new("superscript", ExtensionKind::Mark(MarkType::Superscript))
}

pub fn link() -> Extension {
    Extension::new("link", ExtensionKind::Mark(MarkType::Link))
}

/// The `<span style>` mark that color, font family and font size hang off.
pub fn text_style() -> Extension {
    Extension::new("textStyle", ExtensionKind::Mark(MarkType::TextStyle))
}

pub fn color() -> Extension {
    Extension::new("color", ExtensionKind::Style(StyleAttr::Color))
}

pub fn font_family() -> Extension {
    Extension::new("fontFamily", ExtensionKind::Style(StyleAttr::FontFamily))
}

/// Font size as a text-style attribute. See [`font_size`](mod@font_size).
pub fn font_size() -> Extension {
    Extension::new("fontSize", ExtensionKind::Style(StyleAttr::FontSize))
}

pub fn text_align() -> Extension {
    Extension {
        options: ExtensionOptions::TextAlign {
            alignments: Alignment::ALL.to_vec(),
        },
        ..Extension::new("textAlign", ExtensionKind::TextAlign)
    }
}

/// Atomic video block. See [`video`](mod@video).
pub fn video() -> Extension {
    video_with_options(VideoOptions::default())
}

pub fn video_with_options(options: VideoOptions) -> Extension {
    Extension {
        options: ExtensionOptions::Video(options),
        ..Extension::new("video", ExtensionKind::Node(NodeType::Video))
    }
}

/// The full extension list used by the article editor.
pub fn standard() -> Vec<Extension> {
    vec![
        paragraph(),
        heading(),
        bullet_list(),
        ordered_list(),
        list_item(),
        blockquote(),
        code_block(),
        hard_break(),
        horizontal_rule(),
        bold(),
        italic(),
        underline(),
        strike(),
        subscript(),
        superscript(),
        link(),
        image(),
        text_style(),
        color(),
        font_family(),
        text_align(),
        video(),
        font_size(),
    ]
}

/// HTML round-trip for the video node.
///
/// Any `<video>` element parses into a video node; it always renders back
/// with `controls` present.
pub mod video {
    use pulldown_cmark_escape::{StrWrite, escape_href, escape_html};
    use scraper::ElementRef;
    use smol_str::SmolStr;

    use super::VideoOptions;
    use crate::html::style::declarations;
    use crate::model::VideoAttrs;

    /// Read a `<video>` element. `src` falls back to the first `<source>` child.
    pub fn parse(el: ElementRef<'_>, defaults: &VideoOptions) -> VideoAttrs {
        let src = el
            .attr("src")
            .or_else(|| {
                el.children()
                    .filter_map(ElementRef::wrap)
                    .find(|child| child.value().name() == "source")
                    .and_then(|source| source.attr("src"))
            })
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SmolStr::from);

        let style_max_width = el.attr("style").and_then(|style| {
            declarations(style)
                .find(|(prop, _)| *prop == "max-width")
                .map(|(_, value)| SmolStr::from(value))
        });

        VideoAttrs {
            src,
            width: el
                .attr("width")
                .map(SmolStr::from)
                .unwrap_or_else(|| defaults.width.clone()),
            max_width: el
                .attr("max-width")
                .map(SmolStr::from)
                .or(style_max_width)
                .unwrap_or_else(|| defaults.max_width.clone()),
        }
    }

    pub fn render<W: StrWrite>(w: &mut W, attrs: &VideoAttrs) -> Result<(), W::Error> {
        w.write_str("<video controls width=\"")?;
        escape_html(&mut *w, &attrs.width)?;
        w.write_str("\" max-width=\"")?;
        escape_html(&mut *w, &attrs.max_width)?;
        w.write_str("\"")?;
        if let Some(src) = &attrs.src {
            w.write_str(" src=\"")?;
            escape_href(&mut *w, src)?;
            w.write_str("\"")?;
        }
        w.write_str("></video>")
    }
}

/// `font-size` attribute of the text-style mark, read from and written to
/// inline `style`.
pub mod font_size {
    use smol_str::SmolStr;

    use crate::html::style::declarations;

    pub fn parse(style: &str) -> Option<SmolStr> {
        declarations(style)
            .find(|(prop, _)| *prop == "font-size")
            .map(|(_, value)| SmolStr::from(value))
    }

    pub fn render(value: &str) -> String {
        format!("font-size: {value}")
    }

    const UNITS: [&str; 10] = ["px", "pt", "pc", "em", "rem", "ex", "ch", "vw", "vh", "%"];
    const KEYWORDS: [&str; 9] = [
        "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "smaller",
        "larger",
    ];

    /// A CSS length (`18px`, `1.25rem`, `120%`) or an absolute/relative size
    /// keyword.
    pub fn is_valid(value: &str) -> bool {
        let value = value.trim().to_ascii_lowercase();
        if KEYWORDS.contains(&value.as_str()) {
            return true;
        }
        UNITS.iter().any(|unit| {
            value.strip_suffix(unit).is_some_and(|number| {
                !number.is_empty()
                    && !number.starts_with('-')
                    && number.parse::<f64>().is_ok_and(f64::is_finite)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;
    use crate::model::VideoAttrs;

    fn first_video(html: &str) -> VideoAttrs {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("video").unwrap();
        let el = doc.select(&sel).next().unwrap();
        video::parse(el, &VideoOptions::default())
    }

    #[test]
    fn test_factories_return_fresh_lists() {
        assert_eq!(standard(), standard());
        assert_eq!(standard().len(), 23);
    }

    #[test]
    fn test_heading_levels_are_filtered() {
        let ext = heading_with_levels(&[0, 1, 2, 9]);
        assert_eq!(
            ext.options(),
            &ExtensionOptions::Heading { levels: vec![1, 2] }
        );
    }

    #[test]
    fn test_video_parse_defaults() {
        let attrs = first_video(r#"<video src="movie.mp4"></video>"#);
        assert_eq!(attrs.src.as_deref(), Some("movie.mp4"));
        assert_eq!(attrs.width, "100%");
        assert_eq!(attrs.max_width, "100%");
    }

    #[test]
    fn test_video_parse_source_child_and_style() {
        let attrs = first_video(
            r#"<video width="640" style="max-width: 50%"><source src="clip.webm" type="video/webm"></video>"#,
        );
        assert_eq!(attrs.src.as_deref(), Some("clip.webm"));
        assert_eq!(attrs.width, "640");
        assert_eq!(attrs.max_width, "50%");
    }

    #[test]
    fn test_video_render_always_has_controls() {
        let mut out = String::new();
        let attrs = VideoAttrs::new(Some("blob:abc".into()));
        video::render(&mut pulldown_cmark_escape::FmtWriter(&mut out), &attrs).unwrap();
        assert_eq!(
            out,
            r#"<video controls width="100%" max-width="100%" src="blob:abc"></video>"#
        );
    }

    #[test]
    fn test_font_size_lengths() {
        for ok in ["18px", "1.25rem", "120%", "12PT", "larger"] {
            assert!(font_size::is_valid(ok), "{ok}");
        }
        for bad in ["", "px", "-2px", "12", "big", "12px red", "infpx"] {
            assert!(!font_size::is_valid(bad), "{bad}");
        }
    }

    #[test]
    fn test_font_size_style_round_trip() {
        assert_eq!(
            font_size::parse("color: red; font-size: 18px").as_deref(),
            Some("18px")
        );
        assert_eq!(font_size::parse("color: red"), None);
        assert_eq!(font_size::render("18px"), "font-size: 18px");
    }
}
