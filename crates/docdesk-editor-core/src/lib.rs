//! docdesk-editor-core: Rich-text document logic without framework dependencies.
//!
//! This crate provides:
//! - `Extension` factories and the `Schema` composed from them
//! - `Document` - the block/inline tree with a linear position space
//! - HTML parsing (lenient, with warnings) and canonical serialization
//! - `Command` execution with undo history, plus active-state queries
//! - Heading outline extraction for the table of contents

pub mod commands;
pub mod execute;
pub mod extensions;
pub mod history;
pub mod html;
pub mod model;
pub mod query;
pub mod schema;
pub mod state;
pub mod text_helpers;
pub mod toc;
pub mod types;

pub use commands::{Command, TextBlockType};
pub use execute::{can_execute, execute_command};
pub use extensions::{Extension, ExtensionKind, ExtensionOptions, VideoOptions};
pub use history::{History, Snapshot};
pub use html::{DropReason, ParseWarning, Parsed, to_html};
pub use model::{Block, Document, ImageAttrs, ListKind, VideoAttrs};
pub use query::{Query, is_active};
pub use schema::{MarkType, NodeType, Schema, SchemaError};
pub use smol_str::SmolStr;
pub use state::EditorState;
pub use toc::{ExtractedHeading, HeadingEntry, extract_headings, scan_headings, scroll_target};
pub use types::{Alignment, Link, MarkFlags, Marks, Selection, StyleAttr, TextStyle};
