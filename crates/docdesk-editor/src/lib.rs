//! docdesk-editor: the mountable editor instance.
//!
//! Wraps [`docdesk_editor_core`] with what a host page needs:
//! - `Editor` - content in, HTML and outline out through callbacks
//! - `Toolbar` - control states, link and color popovers
//! - media ingestion that turns picked files into data URIs
//! - `EditorConfig` loaded from TOML or JSON

pub mod config;
pub mod editor;
pub mod error;
pub mod media;
pub mod popover;
pub mod toolbar;

pub use config::EditorConfig;
pub use editor::{ChangeCallback, Editor, EditorBuilder, TocCallback};
pub use error::{ConfigError, MediaError};
pub use media::{FsFile, InMemoryFile, IngestTask, Ingested, MediaKind, MediaSource, data_uri};
pub use popover::{Placement, Point, Rect, Size, normalize_url, place};
pub use toolbar::{Activation, CONTROLS, Control, ControlState, PopoverKind, Toolbar};
