//! Core editor types: selection, marks, and block-level attributes.
//!
//! These types are framework-agnostic; the document tree in [`crate::model`]
//! and the commands in [`crate::commands`] are built on them.

use std::ops::Range;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Text selection with anchor and head positions.
///
/// Positions live in the document's linear coordinate space (see
/// [`crate::model::Document::size`]). The anchor is where the selection
/// started, the head is where the cursor is now. They may be in any order -
/// use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    /// Moves with shift-extension; the caret is drawn here.
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A caret at `offset`.
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Half-open: `end()` is outside.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start() && offset < self.end()
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }

    /// Clamp both ends to `max`.
    pub fn clamp(self, max: usize) -> Self {
        Self {
            anchor: self.anchor.min(max),
            head: self.head.min(max),
        }
    }
}

/// Horizontal text alignment of a paragraph or heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub const ALL: [Alignment; 4] = [
        Alignment::Left,
        Alignment::Center,
        Alignment::Right,
        Alignment::Justify,
    ];

    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

bitflags! {
    /// Attribute-free marks. Subscript and superscript exclude each other.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MarkFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKE = 1 << 3;
        const SUBSCRIPT = 1 << 4;
        const SUPERSCRIPT = 1 << 5;
    }
}

/// A hyperlink mark.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub href: SmolStr,
    pub target: Option<SmolStr>,
}

impl Link {
    /// Link opening in a new tab, the default for links created from the toolbar.
    pub fn new(href: impl Into<SmolStr>) -> Self {
        Self {
            href: href.into(),
            target: Some(SmolStr::new_static("_blank")),
        }
    }
}

/// Attributes of the text-style mark.
///
/// Each attribute is owned by its own extension; clearing one leaves the
/// others in place, and the mark disappears once all three are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    pub color: Option<SmolStr>,
    pub font_family: Option<SmolStr>,
    pub font_size: Option<SmolStr>,
}

impl TextStyle {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.font_family.is_none() && self.font_size.is_none()
    }

    pub fn get(&self, attr: StyleAttr) -> Option<&SmolStr> {
        match attr {
            StyleAttr::Color => self.color.as_ref(),
            StyleAttr::FontFamily => self.font_family.as_ref(),
            StyleAttr::FontSize => self.font_size.as_ref(),
        }
    }

    pub fn set(&mut self, attr: StyleAttr, value: Option<SmolStr>) {
        match attr {
            StyleAttr::Color => self.color = value,
            StyleAttr::FontFamily => self.font_family = value,
            StyleAttr::FontSize => self.font_size = value,
        }
    }
}

/// One attribute of the text-style mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleAttr {
    Color,
    FontFamily,
    FontSize,
}

impl StyleAttr {
    pub const ALL: [StyleAttr; 3] = [StyleAttr::Color, StyleAttr::FontFamily, StyleAttr::FontSize];

    /// CSS property this attribute round-trips through.
    pub fn css_property(&self) -> &'static str {
        match self {
            StyleAttr::Color => "color",
            StyleAttr::FontFamily => "font-family",
            StyleAttr::FontSize => "font-size",
        }
    }
}

/// The full mark set carried by a text run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Marks {
    pub flags: MarkFlags,
    pub link: Option<Link>,
    pub style: TextStyle,
}

impl Marks {
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.link.is_none() && self.style.is_empty()
    }

    /// Add a flag mark, dropping its exclusive partner.
    pub fn insert_flag(&mut self, flag: MarkFlags) {
        if flag.contains(MarkFlags::SUBSCRIPT) {
            self.flags.remove(MarkFlags::SUPERSCRIPT);
        }
        if flag.contains(MarkFlags::SUPERSCRIPT) {
            self.flags.remove(MarkFlags::SUBSCRIPT);
        }
        self.flags.insert(flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_orders_endpoints() {
        let backwards = Selection::new(12, 4);
        assert!(backwards.is_backwards());
        assert_eq!(backwards.to_range(), 4..12);
        assert_eq!(backwards.len(), 8);
        assert!(backwards.contains(4) && !backwards.contains(12));

        let cursor = Selection::collapsed(3);
        assert!(cursor.is_empty());
        assert!(!cursor.contains(3));
    }

    #[test]
    fn test_selection_clamp() {
        assert_eq!(Selection::new(3, 40).clamp(12), Selection::new(3, 12));
    }

    #[test]
    fn test_sub_and_superscript_exclude_each_other() {
        let mut marks = Marks::default();
        marks.insert_flag(MarkFlags::BOLD | MarkFlags::SUBSCRIPT);
        marks.insert_flag(MarkFlags::SUPERSCRIPT);
        assert_eq!(marks.flags, MarkFlags::BOLD | MarkFlags::SUPERSCRIPT);
    }

    #[test]
    fn test_text_style_attrs_are_independent() {
        let mut style = TextStyle::default();
        style.set(StyleAttr::FontSize, Some("16px".into()));
        style.set(StyleAttr::Color, Some("#ff0000".into()));
        style.set(StyleAttr::FontSize, None);
        assert_eq!(style.color.as_deref(), Some("#ff0000"));
        assert!(style.font_size.is_none());
        assert!(!style.is_empty());
    }

    #[test]
    fn test_alignment_css_round_trip() {
        for align in Alignment::ALL {
            assert_eq!(Alignment::from_css(align.as_css()), Some(align));
        }
        assert_eq!(Alignment::from_css(" Center "), Some(Alignment::Center));
        assert_eq!(Alignment::from_css("middle"), None);
    }
}
