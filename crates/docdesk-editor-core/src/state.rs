//! Editor state: schema, document, selection and history in one place.

use crate::history::History;
use crate::html::{self, ParseWarning};
use crate::model::Document;
use crate::schema::Schema;
use crate::types::Selection;

/// Everything a command reads or writes.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub(crate) schema: Schema,
    pub(crate) doc: Document,
    pub(crate) selection: Selection,
    pub(crate) history: History,
    pub(crate) editable: bool,
}

impl EditorState {
    pub fn new(schema: Schema, doc: Document, history_depth: usize) -> Self {
        Self {
            schema,
            doc,
            selection: Selection::collapsed(0),
            history: History::new(history_depth),
            editable: true,
        }
    }

    /// Parse `content` with the schema. Returns the state and whatever the
    /// parser could not keep.
    pub fn from_html(
        content: &str,
        schema: Schema,
        history_depth: usize,
    ) -> (Self, Vec<ParseWarning>) {
        let parsed = html::parse(content, &schema);
        (
            Self::new(schema, parsed.document, history_depth),
            parsed.warnings,
        )
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// False in preview mode, where only selection commands apply.
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Replace the whole document. History is discarded.
    pub fn replace_document(&mut self, doc: Document) {
        self.doc = doc;
        self.selection = self.selection.clamp(self.doc.max_pos());
        self.history.clear();
    }

    /// Mutable access for out-of-band updates that should not be undoable,
    /// such as heading anchors.
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn to_html(&self) -> String {
        html::to_html(&self.doc)
    }
}
