//! HTML in and out of the document model.

mod parse;
pub mod style;
mod write;

pub use parse::{DropReason, ParseWarning, Parsed, parse};
pub use write::{HtmlWriter, LINK_REL, to_html, write_document};
