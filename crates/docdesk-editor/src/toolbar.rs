//! Toolbar controller.
//!
//! Rendering is the host's job; this module decides what each control shows
//! and what pressing it does. Transient popover state (the link input, the
//! color palette) and the last media error live here, outside the document.

use docdesk_editor_core::query::Query;
use docdesk_editor_core::{Alignment, Command, Link, ListKind, MarkType, SmolStr, TextBlockType};
use serde::Serialize;

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::MediaError;
use crate::media::MediaKind;
use crate::popover::{Placement, Point, Rect, Size, normalize_url, place};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    Paragraph,
    Heading(u8),
    CodeBlock,
    BulletList,
    OrderedList,
    Blockquote,
    Align(Alignment),
    Link,
    Color,
    Image,
    Video,
    HorizontalRule,
    Undo,
    Redo,
}

/// Controls in display order.
pub const CONTROLS: &[Control] = &[
    Control::Bold,
    Control::Italic,
    Control::Underline,
    Control::Strike,
    Control::Subscript,
    Control::Superscript,
    Control::Paragraph,
    Control::Heading(1),
    Control::Heading(2),
    Control::Heading(3),
    Control::CodeBlock,
    Control::BulletList,
    Control::OrderedList,
    Control::Blockquote,
    Control::Align(Alignment::Left),
    Control::Align(Alignment::Center),
    Control::Align(Alignment::Right),
    Control::Align(Alignment::Justify),
    Control::Link,
    Control::Color,
    Control::Image,
    Control::Video,
    Control::HorizontalRule,
    Control::Undo,
    Control::Redo,
];

impl Control {
    /// The command a press issues directly. Popover and file controls have none.
    pub fn command(self) -> Option<Command> {
        let command = match self {
            Control::Bold => Command::ToggleMark(MarkType::Bold),
            Control::Italic => Command::ToggleMark(MarkType::Italic),
            Control::Underline => Command::ToggleMark(MarkType::Underline),
            Control::Strike => Command::ToggleMark(MarkType::Strike),
            Control::Subscript => Command::ToggleMark(MarkType::Subscript),
            Control::Superscript => Command::ToggleMark(MarkType::Superscript),
            Control::Paragraph => Command::SetBlockType(TextBlockType::Paragraph),
            Control::Heading(level) => Command::ToggleBlockType(TextBlockType::Heading(level)),
            Control::CodeBlock => Command::ToggleBlockType(TextBlockType::CodeBlock),
            Control::BulletList => Command::ToggleList(ListKind::Bullet),
            Control::OrderedList => Command::ToggleList(ListKind::Ordered),
            Control::Blockquote => Command::ToggleBlockquote,
            Control::Align(align) => Command::SetAlignment(align),
            Control::HorizontalRule => Command::InsertHorizontalRule,
            Control::Undo => Command::Undo,
            Control::Redo => Command::Redo,
            Control::Link | Control::Color | Control::Image | Control::Video => return None,
        };
        Some(command)
    }

    fn query(self) -> Option<Query> {
        let query = match self {
            Control::Bold => Query::Mark(MarkType::Bold),
            Control::Italic => Query::Mark(MarkType::Italic),
            Control::Underline => Query::Mark(MarkType::Underline),
            Control::Strike => Query::Mark(MarkType::Strike),
            Control::Subscript => Query::Mark(MarkType::Subscript),
            Control::Superscript => Query::Mark(MarkType::Superscript),
            Control::Link => Query::Mark(MarkType::Link),
            Control::Paragraph => Query::Block(TextBlockType::Paragraph),
            Control::Heading(level) => Query::Block(TextBlockType::Heading(level)),
            Control::CodeBlock => Query::Block(TextBlockType::CodeBlock),
            Control::BulletList => Query::List(ListKind::Bullet),
            Control::OrderedList => Query::List(ListKind::Ordered),
            Control::Blockquote => Query::Blockquote,
            Control::Align(align) => Query::Align(align),
            Control::Color
            | Control::Image
            | Control::Video
            | Control::HorizontalRule
            | Control::Undo
            | Control::Redo => return None,
        };
        Some(query)
    }
}

/// How a control should render right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub control: Control,
    pub active: bool,
    pub enabled: bool,
}

/// What pressing a control did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// The command ran and changed the document.
    Applied,
    /// The command did not apply (nothing to undo, no word under the cursor).
    NotApplied,
    /// The host should call [`Toolbar::open_link`].
    OpenLink,
    /// The host should call [`Toolbar::open_color_picker`].
    OpenColorPicker,
    /// The host should show a file picker and start an ingestion.
    PickFile(MediaKind),
    /// Preview mode or a torn-down editor.
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopoverKind {
    Link,
    Color,
}

#[derive(Clone, Copy, Debug)]
struct OpenPopover {
    kind: PopoverKind,
    trigger: Rect,
    surface: Rect,
}

/// Toolbar UI state.
#[derive(Clone, Debug)]
pub struct Toolbar {
    popover: Option<OpenPopover>,
    link_input: String,
    file_error: Option<String>,
    palette: Vec<SmolStr>,
    gap: f64,
    margin: f64,
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Toolbar {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            popover: None,
            link_input: String::new(),
            file_error: None,
            palette: config.palette.clone(),
            gap: config.popover_gap,
            margin: config.viewport_margin,
        }
    }

    /// One state per control. Everything is disabled without an editable
    /// editor.
    pub fn controls(&self, editor: Option<&Editor>) -> Vec<ControlState> {
        CONTROLS
            .iter()
            .map(|&control| {
                let Some(editor) = editor else {
                    return ControlState {
                        control,
                        active: false,
                        enabled: false,
                    };
                };
                let active = match control {
                    Control::Color => editor.color().is_some(),
                    _ => control.query().is_some_and(|q| editor.is_active(q)),
                };
                let enabled = editor.is_editable()
                    && match control {
                        Control::Undo | Control::Redo => control
                            .command()
                            .is_some_and(|command| editor.can_apply(&command)),
                        _ => true,
                    };
                ControlState {
                    control,
                    active,
                    enabled,
                }
            })
            .collect()
    }

    pub fn activate(&mut self, control: Control, editor: &mut Editor) -> Activation {
        if !editor.is_editable() {
            return Activation::Disabled;
        }
        match control {
            Control::Link => Activation::OpenLink,
            Control::Color => Activation::OpenColorPicker,
            Control::Image => Activation::PickFile(MediaKind::Image),
            Control::Video => Activation::PickFile(MediaKind::Video),
            _ => match control.command() {
                Some(command) => {
                    if editor.apply(command) {
                        Activation::Applied
                    } else {
                        Activation::NotApplied
                    }
                }
                None => Activation::NotApplied,
            },
        }
    }

    /// Apply a font size from the size picker; `None` clears it.
    pub fn set_font_size(&mut self, editor: &mut Editor, size: Option<&str>) -> bool {
        match size {
            Some(size) => editor.apply(Command::set_font_size(size)),
            None => editor.apply(Command::unset_font_size()),
        }
    }

    pub fn open_popover(&self) -> Option<PopoverKind> {
        self.popover.map(|p| p.kind)
    }

    fn open(
        &mut self,
        kind: PopoverKind,
        trigger: Rect,
        size: Size,
        viewport: Size,
    ) -> Placement {
        let placement = place(trigger, size, viewport, self.gap, self.margin);
        self.popover = Some(OpenPopover {
            kind,
            trigger,
            surface: placement.rect,
        });
        placement
    }

    fn close(&mut self) {
        self.popover = None;
        self.link_input.clear();
    }

    // === Link ===

    /// Open the link input, prefilled with the link under the selection.
    pub fn open_link(
        &mut self,
        editor: &Editor,
        trigger: Rect,
        size: Size,
        viewport: Size,
    ) -> Option<Placement> {
        if !editor.is_editable() {
            return None;
        }
        let placement = self.open(PopoverKind::Link, trigger, size, viewport);
        self.link_input = editor.link().map(|link| link.href.to_string()).unwrap_or_default();
        Some(placement)
    }

    pub fn link_input(&self) -> &str {
        &self.link_input
    }

    pub fn set_link_input(&mut self, input: impl Into<String>) {
        self.link_input = input.into();
    }

    /// Apply the typed URL to the selection; empty input removes the link.
    /// An unparseable URL leaves the popover open.
    pub fn confirm_link(&mut self, editor: &mut Editor) -> Result<bool, url::ParseError> {
        if self.open_popover() != Some(PopoverKind::Link) {
            return Ok(false);
        }
        let applied = match normalize_url(&self.link_input) {
            None => editor.apply(Command::UnsetLink),
            Some(Ok(href)) => editor.apply(Command::SetLink(Link::new(href))),
            Some(Err(err)) => {
                tracing::debug!(input = %self.link_input, %err, "rejected link");
                return Err(err);
            }
        };
        self.close();
        Ok(applied)
    }

    pub fn cancel_link(&mut self) {
        if self.open_popover() == Some(PopoverKind::Link) {
            self.close();
        }
    }

    // === Color ===

    pub fn open_color_picker(
        &mut self,
        editor: &Editor,
        trigger: Rect,
        size: Size,
        viewport: Size,
    ) -> Option<Placement> {
        if !editor.is_editable() {
            return None;
        }
        Some(self.open(PopoverKind::Color, trigger, size, viewport))
    }

    pub fn palette(&self) -> &[SmolStr] {
        &self.palette
    }

    /// Apply a swatch and close the palette.
    pub fn choose_color(&mut self, editor: &mut Editor, color: &str) -> bool {
        if self.open_popover() != Some(PopoverKind::Color) {
            return false;
        }
        let applied = editor.apply(Command::set_color(color));
        self.close();
        applied
    }

    /// Close the open popover if `point` is outside both its trigger and
    /// its surface. Returns whether it closed.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        let Some(open) = self.popover else {
            return false;
        };
        if open.trigger.contains(point) || open.surface.contains(point) {
            return false;
        }
        self.close();
        true
    }

    // === Media errors ===

    pub fn file_error(&self) -> Option<&str> {
        self.file_error.as_deref()
    }

    /// Remember the outcome of an ingestion: errors are shown until the next
    /// success. Cancellation is not the user's problem and shows nothing.
    pub fn record_ingest<T>(&mut self, result: &Result<T, MediaError>) {
        match result {
            Ok(_) => self.file_error = None,
            Err(MediaError::Cancelled) => {}
            Err(err) => self.file_error = Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use docdesk_editor_core::Selection;

    use super::*;
    use crate::media::InMemoryFile;

    const VIEWPORT: Size = Size {
        width: 1024.0,
        height: 768.0,
    };
    const POPOVER: Size = Size {
        width: 240.0,
        height: 120.0,
    };

    fn editor(content: &str, preview: bool) -> Editor {
        Editor::builder()
            .content(content)
            .preview(preview)
            .build()
            .unwrap()
    }

    fn state_of(states: &[ControlState], control: Control) -> ControlState {
        *states.iter().find(|s| s.control == control).unwrap()
    }

    #[test]
    fn test_all_disabled_without_editor_or_in_preview() {
        let toolbar = Toolbar::default();
        let states = toolbar.controls(None);
        assert_eq!(states.len(), CONTROLS.len());
        assert!(states.iter().all(|s| !s.enabled && !s.active));

        let preview = editor("<p>text</p>", true);
        assert!(toolbar.controls(Some(&preview)).iter().all(|s| !s.enabled));
    }

    #[test]
    fn test_states_follow_selection() {
        let mut ed = editor("<h2><strong>Title</strong></h2><p>body</p>", false);
        ed.apply(Command::SetSelection(Selection::new(0, 5)));
        let states = Toolbar::default().controls(Some(&ed));

        assert!(state_of(&states, Control::Bold).active);
        assert!(!state_of(&states, Control::Italic).active);
        assert!(state_of(&states, Control::Heading(2)).active);
        assert!(!state_of(&states, Control::Paragraph).active);
        assert!(state_of(&states, Control::Align(Alignment::Left)).active);
        assert!(!state_of(&states, Control::Undo).enabled);
        assert!(state_of(&states, Control::Bold).enabled);
    }

    #[test]
    fn test_activate_issues_commands() {
        let mut ed = editor("<p>text</p>", false);
        let mut toolbar = Toolbar::default();
        ed.apply(Command::SelectAll);

        assert_eq!(toolbar.activate(Control::Italic, &mut ed), Activation::Applied);
        assert_eq!(ed.html(), "<p><em>text</em></p>");
        assert_eq!(toolbar.activate(Control::Redo, &mut ed), Activation::NotApplied);
        assert_eq!(toolbar.activate(Control::Undo, &mut ed), Activation::Applied);
        assert_eq!(toolbar.activate(Control::Link, &mut ed), Activation::OpenLink);
        assert_eq!(
            toolbar.activate(Control::Video, &mut ed),
            Activation::PickFile(MediaKind::Video)
        );

        let mut preview = editor("<p>text</p>", true);
        assert_eq!(toolbar.activate(Control::Bold, &mut preview), Activation::Disabled);
    }

    #[test]
    fn test_link_flow() {
        let mut ed = editor("<p>read the docs</p>", false);
        ed.apply(Command::SetSelection(Selection::new(9, 13)));
        let mut toolbar = Toolbar::default();

        let trigger = Rect::new(300.0, 40.0, 28.0, 28.0);
        assert!(toolbar.open_link(&ed, trigger, POPOVER, VIEWPORT).is_some());
        assert_eq!(toolbar.link_input(), "");
        toolbar.set_link_input("docs.example.com");
        assert_eq!(toolbar.confirm_link(&mut ed), Ok(true));
        assert_eq!(toolbar.open_popover(), None);
        assert_eq!(
            ed.link().map(|l| l.href),
            Some(SmolStr::new_static("https://docs.example.com"))
        );

        // Reopening prefills; clearing the input removes the link.
        toolbar.open_link(&ed, trigger, POPOVER, VIEWPORT);
        assert_eq!(toolbar.link_input(), "https://docs.example.com");
        toolbar.set_link_input("");
        assert_eq!(toolbar.confirm_link(&mut ed), Ok(true));
        assert_eq!(ed.html(), "<p>read the docs</p>");
    }

    #[test]
    fn test_link_cancel_and_invalid_input() {
        let mut ed = editor("<p>read the docs</p>", false);
        ed.apply(Command::SetSelection(Selection::new(9, 13)));
        let mut toolbar = Toolbar::default();
        let trigger = Rect::new(300.0, 40.0, 28.0, 28.0);

        toolbar.open_link(&ed, trigger, POPOVER, VIEWPORT);
        toolbar.set_link_input("bad host.com");
        assert!(toolbar.confirm_link(&mut ed).is_err());
        assert_eq!(toolbar.open_popover(), Some(PopoverKind::Link));

        toolbar.cancel_link();
        assert_eq!(toolbar.open_popover(), None);
        assert_eq!(toolbar.link_input(), "");
        assert_eq!(ed.html(), "<p>read the docs</p>");
    }

    #[test]
    fn test_color_picker() {
        let mut ed = editor("<p>paint</p>", false);
        ed.apply(Command::SelectAll);
        let mut toolbar = Toolbar::default();
        assert_eq!(toolbar.palette().len(), 15);

        let placed = toolbar
            .open_color_picker(&ed, Rect::new(1000.0, 700.0, 24.0, 24.0), POPOVER, VIEWPORT)
            .unwrap();
        assert!(placed.above);
        assert_eq!(placed.rect.x, 1024.0 - 8.0 - 240.0);

        let swatch = toolbar.palette()[5].clone();
        assert!(toolbar.choose_color(&mut ed, &swatch));
        assert_eq!(ed.html(), "<p><span style=\"color: #e03131\">paint</span></p>");
        assert_eq!(toolbar.open_popover(), None);
        assert!(toolbar.controls(Some(&ed)).iter().any(|s| s.control == Control::Color && s.active));
    }

    #[test]
    fn test_outside_pointer_closes_popover() {
        let ed = editor("<p>x</p>", false);
        let mut toolbar = Toolbar::default();
        let trigger = Rect::new(100.0, 40.0, 24.0, 24.0);
        let placed = toolbar.open_color_picker(&ed, trigger, POPOVER, VIEWPORT).unwrap();

        assert!(!toolbar.pointer_down(Point::new(110.0, 50.0)));
        assert!(!toolbar.pointer_down(Point::new(placed.rect.x + 5.0, placed.rect.y + 5.0)));
        assert_eq!(toolbar.open_popover(), Some(PopoverKind::Color));

        assert!(toolbar.pointer_down(Point::new(900.0, 700.0)));
        assert_eq!(toolbar.open_popover(), None);
        assert!(!toolbar.pointer_down(Point::new(900.0, 700.0)));
    }

    #[test]
    fn test_file_error_cleared_on_success() {
        let ed = editor("<p>x</p>", false);
        let mut toolbar = Toolbar::default();

        let rejected = ed.ingest_video(InMemoryFile::new("a.avi", Bytes::new()).with_mime_type("video/avi"));
        toolbar.record_ingest(&rejected);
        assert_eq!(toolbar.file_error(), Some("unsupported video format `video/avi`"));

        toolbar.record_ingest(&Err::<(), _>(MediaError::Cancelled));
        assert!(toolbar.file_error().is_some());

        toolbar.record_ingest(&Ok::<bool, MediaError>(true));
        assert_eq!(toolbar.file_error(), None);
    }

    #[test]
    fn test_font_size_picker() {
        let mut ed = editor("<p>size</p>", false);
        ed.apply(Command::SelectAll);
        let mut toolbar = Toolbar::default();
        assert!(toolbar.set_font_size(&mut ed, Some("24px")));
        assert_eq!(ed.font_size().as_deref(), Some("24px"));
        assert!(toolbar.set_font_size(&mut ed, None));
        assert_eq!(ed.html(), "<p>size</p>");
    }
}
