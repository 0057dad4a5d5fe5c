//! Document schema derived from a fixed extension list.
//!
//! The schema is built once per editor from [`Extension`] values and never
//! changes afterwards. Parsing consults it to decide what HTML survives, and
//! command execution consults it before touching the tree.

use std::collections::HashSet;

use miette::Diagnostic;
use thiserror::Error;

use crate::extensions::{Extension, ExtensionKind, ExtensionOptions, VideoOptions};
use crate::types::{Alignment, MarkFlags, StyleAttr};

/// Block and inline node types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    Image,
    Video,
    HorizontalRule,
    HardBreak,
}

/// Mark types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkType {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    Link,
    TextStyle,
}

impl MarkType {
    /// The flag backing an attribute-free mark. `None` for link and text style.
    pub fn flag(&self) -> Option<MarkFlags> {
        match self {
            MarkType::Bold => Some(MarkFlags::BOLD),
            MarkType::Italic => Some(MarkFlags::ITALIC),
            MarkType::Underline => Some(MarkFlags::UNDERLINE),
            MarkType::Strike => Some(MarkFlags::STRIKE),
            MarkType::Subscript => Some(MarkFlags::SUBSCRIPT),
            MarkType::Superscript => Some(MarkFlags::SUPERSCRIPT),
            MarkType::Link | MarkType::TextStyle => None,
        }
    }
}

/// Errors raised while composing a schema.
#[derive(Error, Debug, Diagnostic, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// The same extension was registered twice.
    #[error("extension `{0}` is registered more than once")]
    #[diagnostic(code(docdesk::schema::duplicate))]
    DuplicateExtension(&'static str),

    /// Every document needs paragraphs to hold text.
    #[error("the paragraph extension is required")]
    #[diagnostic(
        code(docdesk::schema::paragraph),
        help("start from `extensions::standard()` or add `extensions::paragraph()`")
    )]
    MissingParagraph,

    /// An extension depends on another one that is not registered.
    #[error("extension `{extension}` requires `{requires}`")]
    #[diagnostic(code(docdesk::schema::dependency))]
    MissingDependency {
        extension: &'static str,
        requires: &'static str,
    },
}

/// The set of node types, marks and attributes an editor accepts.
#[derive(Clone, Debug)]
pub struct Schema {
    names: Vec<&'static str>,
    nodes: HashSet<NodeType>,
    marks: HashSet<MarkType>,
    styles: HashSet<StyleAttr>,
    alignments: Vec<Alignment>,
    heading_levels: Vec<u8>,
    video: VideoOptions,
}

impl Schema {
    /// Build a schema from an extension list, validating it.
    pub fn from_extensions(extensions: &[Extension]) -> Result<Self, SchemaError> {
        let mut schema = Schema {
            names: Vec::with_capacity(extensions.len()),
            nodes: HashSet::new(),
            marks: HashSet::new(),
            styles: HashSet::new(),
            alignments: Vec::new(),
            heading_levels: Vec::new(),
            video: VideoOptions::default(),
        };

        for ext in extensions {
            if schema.names.contains(&ext.name()) {
                return Err(SchemaError::DuplicateExtension(ext.name()));
            }
            schema.names.push(ext.name());

            match ext.kind() {
                ExtensionKind::Node(node) => {
                    schema.nodes.insert(node);
                }
                ExtensionKind::Mark(mark) => {
                    schema.marks.insert(mark);
                }
                ExtensionKind::Style(attr) => {
                    schema.styles.insert(attr);
                }
                ExtensionKind::TextAlign => {}
            }

            match ext.options() {
                ExtensionOptions::Heading { levels } => schema.heading_levels = levels.clone(),
                ExtensionOptions::Video(opts) => schema.video = opts.clone(),
                ExtensionOptions::TextAlign { alignments } => {
                    schema.alignments = alignments.clone()
                }
                ExtensionOptions::None => {}
            }
        }

        schema.validate(extensions)?;
        tracing::debug!(extensions = ?schema.names, "schema composed");
        Ok(schema)
    }

    /// Schema for the standard extension set.
    pub fn standard() -> Self {
        match Self::from_extensions(&crate::extensions::standard()) {
            Ok(schema) => schema,
            Err(err) => unreachable!("standard extension set is valid: {err}"),
        }
    }

    fn validate(&self, extensions: &[Extension]) -> Result<(), SchemaError> {
        if !self.nodes.contains(&NodeType::Paragraph) {
            return Err(SchemaError::MissingParagraph);
        }
        for ext in extensions {
            let requires = match ext.kind() {
                ExtensionKind::Node(NodeType::BulletList | NodeType::OrderedList)
                    if !self.nodes.contains(&NodeType::ListItem) =>
                {
                    Some("listItem")
                }
                ExtensionKind::Style(_) if !self.marks.contains(&MarkType::TextStyle) => {
                    Some("textStyle")
                }
                _ => None,
            };
            if let Some(requires) = requires {
                return Err(SchemaError::MissingDependency {
                    extension: ext.name(),
                    requires,
                });
            }
        }
        Ok(())
    }

    pub fn allows_node(&self, node: NodeType) -> bool {
        self.nodes.contains(&node)
    }

    pub fn allows_mark(&self, mark: MarkType) -> bool {
        self.marks.contains(&mark)
    }

    pub fn allows_style(&self, attr: StyleAttr) -> bool {
        self.marks.contains(&MarkType::TextStyle) && self.styles.contains(&attr)
    }

    pub fn allows_alignment(&self, align: Alignment) -> bool {
        self.alignments.contains(&align)
    }

    pub fn allows_heading(&self, level: u8) -> bool {
        self.nodes.contains(&NodeType::Heading) && self.heading_levels.contains(&level)
    }

    pub fn video_options(&self) -> &VideoOptions {
        &self.video
    }

    /// Registered extension names, in registration order.
    pub fn extension_names(&self) -> &[&'static str] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions;

    #[test]
    fn test_standard_schema_has_bespoke_extensions() {
        let schema = Schema::standard();
        assert!(schema.allows_node(NodeType::Video));
        assert!(schema.allows_style(StyleAttr::FontSize));
        assert!(schema.allows_heading(6));
        assert!(!schema.allows_heading(7));
        assert!(schema.allows_alignment(Alignment::Justify));
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let exts = vec![extensions::paragraph(), extensions::video(), extensions::video()];
        assert_eq!(
            Schema::from_extensions(&exts).unwrap_err(),
            SchemaError::DuplicateExtension("video")
        );
    }

    #[test]
    fn test_paragraph_required() {
        let exts = vec![extensions::bold()];
        assert_eq!(
            Schema::from_extensions(&exts).unwrap_err(),
            SchemaError::MissingParagraph
        );
    }

    #[test]
    fn test_font_size_requires_text_style() {
        let exts = vec![extensions::paragraph(), extensions::font_size()];
        assert_eq!(
            Schema::from_extensions(&exts).unwrap_err(),
            SchemaError::MissingDependency {
                extension: "fontSize",
                requires: "textStyle"
            }
        );
    }

    #[test]
    fn test_list_requires_list_item() {
        let exts = vec![extensions::paragraph(), extensions::bullet_list()];
        assert!(matches!(
            Schema::from_extensions(&exts),
            Err(SchemaError::MissingDependency { requires: "listItem", .. })
        ));
    }

    #[test]
    fn test_style_needs_its_own_extension() {
        let exts = vec![
            extensions::paragraph(),
            extensions::text_style(),
            extensions::color(),
        ];
        let schema = Schema::from_extensions(&exts).unwrap();
        assert!(schema.allows_style(StyleAttr::Color));
        assert!(!schema.allows_style(StyleAttr::FontSize));
    }
}
