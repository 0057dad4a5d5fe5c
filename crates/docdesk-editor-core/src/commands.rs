//! Editor commands.
//!
//! A [`Command`] is a semantic operation on the editor state, decoupled from
//! how it is triggered (toolbar button, keyboard shortcut, media upload).
//! Commands are executed by [`crate::execute::execute_command`].

use smol_str::SmolStr;

use crate::model::{ImageAttrs, ListKind};
use crate::schema::MarkType;
use crate::types::{Alignment, Link, Selection, StyleAttr};

/// Target type for block conversion commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextBlockType {
    Paragraph,
    Heading(u8),
    CodeBlock,
}

/// All editor commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // === Marks ===
    /// Toggle an attribute-free mark (bold, italic, ...). A collapsed
    /// selection acts on the surrounding word.
    ToggleMark(MarkType),

    /// Set one attribute of the text-style mark.
    SetStyle { attr: StyleAttr, value: SmolStr },

    /// Remove one attribute of the text-style mark, keeping the others.
    UnsetStyle(StyleAttr),

    SetLink(Link),

    /// Remove the link under the selection. A collapsed cursor inside a link
    /// removes the whole link.
    UnsetLink,

    // === Blocks ===
    SetBlockType(TextBlockType),

    /// Switch to the given type, or back to a paragraph if every selected
    /// block already has it.
    ToggleBlockType(TextBlockType),

    ToggleList(ListKind),
    ToggleBlockquote,
    SetAlignment(Alignment),
    UnsetAlignment,

    // === Atomic nodes ===
    InsertImage(ImageAttrs),
    InsertVideo { src: SmolStr },
    InsertHorizontalRule,

    // === Text editing ===
    InsertText(String),
    SplitBlock,
    DeleteBackward,

    // === Selection ===
    SelectAll,
    SetSelection(Selection),

    // === History ===
    Undo,
    Redo,
}

impl Command {
    pub fn set_font_size(size: impl Into<SmolStr>) -> Self {
        Command::SetStyle {
            attr: StyleAttr::FontSize,
            value: size.into(),
        }
    }

    pub fn unset_font_size() -> Self {
        Command::UnsetStyle(StyleAttr::FontSize)
    }

    pub fn set_color(color: impl Into<SmolStr>) -> Self {
        Command::SetStyle {
            attr: StyleAttr::Color,
            value: color.into(),
        }
    }

    pub fn set_font_family(family: impl Into<SmolStr>) -> Self {
        Command::SetStyle {
            attr: StyleAttr::FontFamily,
            value: family.into(),
        }
    }

    /// Insert a video block at the cursor.
    pub fn set_video(src: impl Into<SmolStr>) -> Self {
        Command::InsertVideo { src: src.into() }
    }

    pub fn insert_image(src: impl Into<SmolStr>) -> Self {
        Command::InsertImage(ImageAttrs {
            src: src.into(),
            alt: None,
            title: None,
        })
    }

    /// Whether the command edits the document (as opposed to only moving
    /// the selection).
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Command::SelectAll | Command::SetSelection(_))
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ToggleMark(_) => "toggle_mark",
            Command::SetStyle { .. } => "set_style",
            Command::UnsetStyle(_) => "unset_style",
            Command::SetLink(_) => "set_link",
            Command::UnsetLink => "unset_link",
            Command::SetBlockType(_) => "set_block_type",
            Command::ToggleBlockType(_) => "toggle_block_type",
            Command::ToggleList(_) => "toggle_list",
            Command::ToggleBlockquote => "toggle_blockquote",
            Command::SetAlignment(_) => "set_alignment",
            Command::UnsetAlignment => "unset_alignment",
            Command::InsertImage(_) => "insert_image",
            Command::InsertVideo { .. } => "insert_video",
            Command::InsertHorizontalRule => "insert_horizontal_rule",
            Command::InsertText(_) => "insert_text",
            Command::SplitBlock => "split_block",
            Command::DeleteBackward => "delete_backward",
            Command::SelectAll => "select_all",
            Command::SetSelection(_) => "set_selection",
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_build_expected_variants() {
        assert_eq!(
            Command::set_font_size("18px"),
            Command::SetStyle {
                attr: StyleAttr::FontSize,
                value: "18px".into()
            }
        );
        assert_eq!(
            Command::set_video("blob:abc"),
            Command::InsertVideo {
                src: "blob:abc".into()
            }
        );
    }

    #[test]
    fn test_selection_commands_are_not_mutations() {
        assert!(!Command::SelectAll.is_mutation());
        assert!(!Command::SetSelection(Selection::collapsed(0)).is_mutation());
        assert!(Command::Undo.is_mutation());
        assert!(Command::ToggleMark(MarkType::Bold).is_mutation());
    }
}
