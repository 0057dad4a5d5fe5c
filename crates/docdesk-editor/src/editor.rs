//! The editor instance a host page mounts.
//!
//! An [`Editor`] owns the document state for its whole lifetime. The host
//! only ever sees serialized HTML (through the change callback) and the
//! heading outline (through the TOC callback).
//!
//! Heading blocks always carry the id their outline entry resolves to, so
//! every TOC entry names an element in the HTML the host receives.

use std::fmt;

use docdesk_editor_core::html;
use docdesk_editor_core::query::{self, Query};
use docdesk_editor_core::toc::{ExtractedHeading, HeadingEntry, scan_headings, scroll_target};
use docdesk_editor_core::{
    Command, EditorState, Extension, ImageAttrs, Link, ParseWarning, Schema, SchemaError,
    Selection, SmolStr, StyleAttr, execute_command,
};
use tokio_util::sync::CancellationToken;

use crate::config::EditorConfig;
use crate::error::MediaError;
use crate::media::{IngestTask, Ingested, MediaKind, MediaSource};

pub type ChangeCallback = Box<dyn FnMut(&str)>;
pub type TocCallback = Box<dyn FnMut(&[HeadingEntry])>;

/// Builder for [`Editor`].
#[derive(Default)]
pub struct EditorBuilder {
    content: String,
    preview: bool,
    config: EditorConfig,
    extensions: Option<Vec<Extension>>,
    on_change: Option<ChangeCallback>,
    on_toc_change: Option<TocCallback>,
}

impl EditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial HTML. Empty content gives a single empty paragraph.
    pub fn content(mut self, html: impl Into<String>) -> Self {
        self.content = html.into();
        self
    }

    /// Start read-only.
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the standard extension list. Fixed for the editor's lifetime.
    pub fn extensions(mut self, extensions: Vec<Extension>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn on_change(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn on_toc_change(mut self, callback: impl FnMut(&[HeadingEntry]) + 'static) -> Self {
        self.on_toc_change = Some(Box::new(callback));
        self
    }

    /// Parse the content and mount the editor. Heading ids are resolved
    /// immediately and the TOC callback fires once with the initial outline.
    pub fn build(self) -> Result<Editor, SchemaError> {
        let schema = match &self.extensions {
            Some(extensions) => Schema::from_extensions(extensions)?,
            None => Schema::standard(),
        };
        let (mut state, warnings) =
            EditorState::from_html(&self.content, schema, self.config.history_depth);
        for warning in &warnings {
            tracing::debug!(%warning, "dropped unsupported content");
        }
        state.set_editable(!self.preview);

        let mut editor = Editor {
            state,
            config: self.config,
            warnings,
            outline: Vec::new(),
            on_change: self.on_change,
            on_toc_change: self.on_toc_change,
            lifetime: CancellationToken::new(),
            destroyed: false,
        };
        editor.sync_outline();
        editor.notify_toc();
        tracing::debug!(preview = self.preview, "editor mounted");
        Ok(editor)
    }
}

/// A mounted rich-text editor.
pub struct Editor {
    state: EditorState,
    config: EditorConfig,
    warnings: Vec<ParseWarning>,
    outline: Vec<HeadingEntry>,
    on_change: Option<ChangeCallback>,
    on_toc_change: Option<TocCallback>,
    /// Parent of every in-flight media task's token.
    lifetime: CancellationToken,
    destroyed: bool,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("warnings", &self.warnings)
            .field("outline", &self.outline)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Editor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder::new()
    }

    /// Run a command. Fires the change callback once if the document changed.
    pub fn apply(&mut self, command: Command) -> bool {
        if self.destroyed {
            tracing::debug!(command = command.name(), "editor destroyed, command ignored");
            return false;
        }
        let applied = execute_command(&mut self.state, &command);
        if applied && command.is_mutation() {
            self.notify_change();
        }
        applied
    }

    pub fn is_active(&self, query: Query) -> bool {
        !self.destroyed && query::is_active(&self.state, query)
    }

    pub fn can_apply(&self, command: &Command) -> bool {
        !self.destroyed && query::can_apply(&self.state, command)
    }

    /// Canonical HTML for the current document.
    pub fn html(&self) -> String {
        self.state.to_html()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Content dropped while parsing the most recent HTML input.
    pub fn parse_warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// The current heading outline.
    pub fn outline(&self) -> &[HeadingEntry] {
        &self.outline
    }

    pub fn is_editable(&self) -> bool {
        !self.destroyed && self.state.is_editable()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Switch between editing and preview. The document is unchanged; the
    /// TOC callback fires again with the current outline.
    pub fn set_editable(&mut self, editable: bool) {
        if self.destroyed || self.state.is_editable() == editable {
            return;
        }
        self.state.set_editable(editable);
        self.notify_toc();
        tracing::debug!(editable, "editor mode changed");
    }

    /// Replace the whole document. Outstanding media reads are cancelled and
    /// history is cleared.
    pub fn set_content(&mut self, content: &str) {
        if self.destroyed {
            return;
        }
        self.cancel_pending();
        let parsed = html::parse(content, self.state.schema());
        for warning in &parsed.warnings {
            tracing::debug!(%warning, "dropped unsupported content");
        }
        self.warnings = parsed.warnings;
        self.state.replace_document(parsed.document);
        self.notify_change();
    }

    pub fn font_size(&self) -> Option<SmolStr> {
        query::style_value(&self.state, StyleAttr::FontSize)
    }

    pub fn color(&self) -> Option<SmolStr> {
        query::style_value(&self.state, StyleAttr::Color)
    }

    pub fn font_family(&self) -> Option<SmolStr> {
        query::style_value(&self.state, StyleAttr::FontFamily)
    }

    pub fn link(&self) -> Option<Link> {
        query::link(&self.state)
    }

    /// Scroll position for jumping to a heading, clearing the sticky header.
    pub fn scroll_target(&self, element_top: f64, scroll_y: f64) -> f64 {
        scroll_target(element_top, scroll_y, self.config.sticky_header_offset)
    }

    // === Media ===

    /// Start reading an image file.
    pub fn ingest_image<S: MediaSource>(&self, file: S) -> Result<IngestTask<S>, MediaError> {
        self.ensure_ingest_allowed()?;
        Ok(IngestTask::new(
            MediaKind::Image,
            file,
            self.lifetime.child_token(),
        ))
    }

    /// Start reading a video file. The declared MIME type must be on the
    /// configured allow-list.
    pub fn ingest_video<S: MediaSource>(&self, file: S) -> Result<IngestTask<S>, MediaError> {
        self.ensure_ingest_allowed()?;
        let mime = file.mime_type().unwrap_or_default();
        if !self.config.allows_video_type(mime) {
            tracing::debug!(name = file.name(), mime, "rejected video type");
            return Err(MediaError::UnsupportedFormat {
                mime: if mime.is_empty() { "unknown" } else { mime }.to_owned(),
                allowed: self.config.video_mime_types.join(", "),
            });
        }
        Ok(IngestTask::new(
            MediaKind::Video,
            file,
            self.lifetime.child_token(),
        ))
    }

    /// Insert a finished read at the cursor. Reads that outlived the content
    /// they were started for are dropped.
    pub fn complete_ingest(&mut self, ingested: Ingested) -> Result<bool, MediaError> {
        if self.destroyed || ingested.is_cancelled() {
            tracing::debug!(name = %ingested.name, "discarding cancelled media read");
            return Err(MediaError::Cancelled);
        }
        if !self.state.is_editable() {
            return Err(MediaError::Disabled);
        }
        let command = match ingested.kind {
            MediaKind::Image => Command::InsertImage(ImageAttrs {
                src: ingested.src.into(),
                alt: None,
                title: None,
            }),
            MediaKind::Video => Command::set_video(ingested.src),
        };
        Ok(self.apply(command))
    }

    fn ensure_ingest_allowed(&self) -> Result<(), MediaError> {
        if self.destroyed {
            return Err(MediaError::Cancelled);
        }
        if !self.state.is_editable() {
            return Err(MediaError::Disabled);
        }
        Ok(())
    }

    fn cancel_pending(&mut self) {
        self.lifetime.cancel();
        self.lifetime = CancellationToken::new();
    }

    // === Lifecycle ===

    /// Tear down: cancel media reads and drop the callbacks. Every later call
    /// is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.lifetime.cancel();
        self.destroyed = true;
        self.on_change = None;
        self.on_toc_change = None;
        tracing::debug!("editor destroyed");
    }

    /// Outline first, then HTML: the host only ever sees markup whose
    /// heading ids match the entries it gets next.
    fn notify_change(&mut self) {
        let html = self.sync_outline();
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&html);
        }
        self.notify_toc();
    }

    /// Recompute the outline and write every resolved id onto its heading
    /// block. Returns the HTML after write-back.
    fn sync_outline(&mut self) -> String {
        let html = self.state.to_html();
        let headings = scan_headings(&html);
        self.outline = headings.iter().map(|h| h.entry.clone()).collect();

        if !headings.iter().any(ExtractedHeading::needs_write_back) {
            return html;
        }
        let written = self.state.doc_mut().apply_heading_ids(&self.outline);
        tracing::trace!(written, "heading anchors written back");
        self.state.to_html()
    }

    fn notify_toc(&mut self) {
        if let Some(on_toc_change) = self.on_toc_change.as_mut() {
            on_toc_change(&self.outline);
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bytes::Bytes;
    use docdesk_editor_core::{MarkType, TextBlockType, extensions};
    use serde::Serialize;

    use super::*;
    use crate::media::InMemoryFile;

    type Log<T> = Rc<RefCell<Vec<T>>>;

    fn recording_editor(content: &str, preview: bool) -> (Editor, Log<String>, Log<Vec<HeadingEntry>>) {
        let changes: Log<String> = Rc::default();
        let outlines: Log<Vec<HeadingEntry>> = Rc::default();
        let editor = Editor::builder()
            .content(content)
            .preview(preview)
            .on_change({
                let changes = changes.clone();
                move |html| changes.borrow_mut().push(html.to_owned())
            })
            .on_toc_change({
                let outlines = outlines.clone();
                move |entries| outlines.borrow_mut().push(entries.to_vec())
            })
            .build()
            .unwrap();
        (editor, changes, outlines)
    }

    fn select(editor: &mut Editor, anchor: usize, head: usize) {
        assert!(editor.apply(Command::SetSelection(Selection::new(anchor, head))));
    }

    #[test]
    fn test_change_fires_once_per_mutation() {
        let (mut editor, changes, _) = recording_editor("<p>hello world</p>", false);
        select(&mut editor, 0, 5);
        assert!(changes.borrow().is_empty());

        assert!(editor.apply(Command::ToggleMark(MarkType::Bold)));
        assert_eq!(
            *changes.borrow(),
            vec!["<p><strong>hello</strong> world</p>".to_owned()]
        );

        assert!(!editor.apply(Command::Redo));
        assert_eq!(changes.borrow().len(), 1);
    }

    #[test]
    fn test_initial_outline_and_ids() {
        let (editor, _, outlines) =
            recording_editor("<h1>Intro</h1><p>Text</p><h2>Intro</h2>", false);
        let ids: Vec<&str> = editor.outline().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["heading-intro-1", "heading-intro-2-2"]);
        assert_eq!(outlines.borrow().len(), 1);
        assert_eq!(
            editor.html(),
            "<h1 id=\"heading-intro-1\">Intro</h1><p>Text</p><h2 id=\"heading-intro-2-2\">Intro</h2>"
        );
    }

    #[test]
    fn test_edited_heading_gets_fresh_anchor() {
        let (mut editor, changes, outlines) =
            recording_editor("<h1 id=\"heading-intro-1\">Intro</h1>", false);
        select(&mut editor, 0, 5);
        assert!(editor.apply(Command::InsertText("Outro".into())));

        let html = editor.html();
        assert_eq!(html, "<h1 id=\"heading-outro-1\">Outro</h1>");
        assert_eq!(changes.borrow().last(), Some(&html));
        let last = outlines.borrow().last().cloned().unwrap();
        assert_eq!(last.len(), 1);
        assert!(html.contains(&format!("id=\"{}\"", last[0].id)));
    }

    #[test]
    fn test_outline_ids_always_name_elements() {
        let (mut editor, changes, _) = recording_editor("<p>Setup</p><p>Usage</p>", false);
        assert!(editor.apply(Command::SetBlockType(TextBlockType::Heading(2))));
        assert!(editor.apply(Command::Undo));
        assert!(editor.apply(Command::Redo));

        for html in changes.borrow().iter() {
            assert_eq!(*html, editor_html_at_parse(html));
        }
        for entry in editor.outline() {
            assert!(editor.html().contains(&format!("id=\"{}\"", entry.id)));
        }

        // Switching modes never rewrites the document.
        let before = editor.html();
        editor.set_editable(false);
        assert_eq!(editor.html(), before);
        assert_eq!(changes.borrow().last(), Some(&before));
    }

    /// What a fresh editor makes of `html`: a change snapshot must already
    /// be in its settled form.
    fn editor_html_at_parse(html: &str) -> String {
        Editor::builder().content(html).build().unwrap().html()
    }

    #[test]
    fn test_preview_writes_anchor_ids() {
        let (editor, _, _) = recording_editor("<h1>Intro</h1><h2 id=\"old\">Intro</h2>", true);
        assert_eq!(
            editor.html(),
            "<h1 id=\"heading-intro-1\">Intro</h1><h2 id=\"heading-intro-2-2\">Intro</h2>"
        );
    }

    #[test]
    fn test_preview_mode_is_inert() {
        let (mut editor, changes, _) = recording_editor("<p>hello</p>", true);
        select(&mut editor, 0, 5);
        assert!(!editor.apply(Command::ToggleMark(MarkType::Bold)));
        assert!(!editor.can_apply(&Command::ToggleMark(MarkType::Bold)));
        assert!(matches!(
            editor.ingest_image(InMemoryFile::new("a.png", Bytes::new())),
            Err(MediaError::Disabled)
        ));
        assert!(changes.borrow().is_empty());
        assert_eq!(editor.html(), "<p>hello</p>");

        editor.set_editable(true);
        assert!(editor.apply(Command::ToggleMark(MarkType::Bold)));
    }

    #[test]
    fn test_unsupported_video_never_mutates() {
        let (editor, changes, _) = recording_editor("<p>hello</p>", false);
        let file = InMemoryFile::new("clip.avi", Bytes::from_static(b"RIFF")).with_mime_type("video/avi");
        let err = editor.ingest_video(file).unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedFormat { ref mime, .. } if mime == "video/avi"));
        assert_eq!(err.to_string(), "unsupported video format `video/avi`");
        assert!(changes.borrow().is_empty());
        assert_eq!(editor.html(), "<p>hello</p>");
    }

    #[tokio::test]
    async fn test_video_ingest_inserts_node() {
        let (mut editor, changes, _) = recording_editor("<p>hello</p>", false);
        select(&mut editor, 5, 5);
        let file = InMemoryFile::new("clip.mp4", Bytes::from_static(b"hi")).with_mime_type("video/mp4");
        let ingested = editor.ingest_video(file).unwrap().run().await.unwrap();
        assert!(editor.complete_ingest(ingested).unwrap());
        assert_eq!(
            editor.html(),
            "<p>hello</p><video controls width=\"100%\" max-width=\"100%\" src=\"data:video/mp4;base64,aGk=\"></video>"
        );
        assert_eq!(changes.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_set_content_cancels_pending_reads() {
        let (mut editor, changes, _) = recording_editor("<p>old</p>", false);
        let task = editor
            .ingest_image(InMemoryFile::new("a.png", Bytes::from_static(b"img")))
            .unwrap();
        let ingested = task.run().await.unwrap();

        editor.set_content("<p>new</p>");
        assert!(matches!(
            editor.complete_ingest(ingested),
            Err(MediaError::Cancelled)
        ));
        assert_eq!(*changes.borrow(), vec!["<p>new</p>".to_owned()]);
        assert!(!editor.state().history().can_undo());
    }

    #[tokio::test]
    async fn test_destroy_cancels_in_flight_reads() {
        let (mut editor, changes, _) = recording_editor("<p>a</p>", false);
        let task = editor
            .ingest_image(InMemoryFile::new("a.png", Bytes::from_static(b"img")))
            .unwrap();
        editor.destroy();
        assert!(matches!(task.run().await, Err(MediaError::Cancelled)));
        assert!(!editor.apply(Command::InsertText("x".into())));
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_parse_warnings_surface() {
        let (editor, _, _) = recording_editor("<p>a<script>x</script></p><marquee>b</marquee>", false);
        let elements: Vec<&str> = editor
            .parse_warnings()
            .iter()
            .map(|w| w.element.as_str())
            .collect();
        assert_eq!(elements, vec!["script", "marquee"]);
    }

    #[test]
    fn test_invalid_extension_list() {
        let result = Editor::builder()
            .extensions(vec![extensions::paragraph(), extensions::font_size()])
            .build();
        assert!(matches!(result, Err(SchemaError::MissingDependency { .. })));
    }

    #[test]
    fn test_style_accessors() {
        let (mut editor, _, _) = recording_editor(
            "<p><span style=\"color: #e03131; font-size: 18px\">red</span></p>",
            false,
        );
        select(&mut editor, 0, 3);
        assert_eq!(editor.font_size().as_deref(), Some("18px"));
        assert_eq!(editor.color().as_deref(), Some("#e03131"));
        assert_eq!(editor.font_family(), None);
        assert!(editor.apply(Command::unset_font_size()));
        assert_eq!(editor.font_size(), None);
        assert_eq!(editor.color().as_deref(), Some("#e03131"));
    }

    #[test]
    fn test_scroll_target_uses_header_offset() {
        let (editor, _, _) = recording_editor("", false);
        assert_eq!(editor.scroll_target(200.0, 50.0), 170.0);
    }

    #[derive(Serialize)]
    struct Session {
        changes: Vec<String>,
        toc_updates: usize,
        final_outline: Vec<HeadingEntry>,
    }

    #[test]
    fn test_editing_session() {
        let (mut editor, changes, outlines) = recording_editor("<p>Hello world</p>", false);
        select(&mut editor, 0, 5);
        editor.apply(Command::ToggleMark(MarkType::Bold));
        editor.apply(Command::SetBlockType(TextBlockType::Heading(1)));
        editor.apply(Command::Undo);
        editor.apply(Command::Redo);

        let session = Session {
            changes: changes.borrow().clone(),
            toc_updates: outlines.borrow().len(),
            final_outline: editor.outline().to_vec(),
        };
        insta::assert_yaml_snapshot!(session);
    }
}
