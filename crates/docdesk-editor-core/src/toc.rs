//! Heading outline extraction.
//!
//! The outline is rebuilt from serialized HTML every time it changes; there
//! is no incremental bookkeeping. Each heading gets a stable anchor id
//! derived from its text and level, deduplicated in document order.

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::text_helpers::collapse_whitespace;

/// One outline entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    pub id: SmolStr,
    pub text: String,
    pub level: u8,
}

impl HeadingEntry {
    pub fn new(id: impl Into<SmolStr>, text: impl Into<String>, level: u8) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            level,
        }
    }
}

/// An outline entry together with the id the element carried in the HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedHeading {
    pub entry: HeadingEntry,
    pub existing_id: Option<SmolStr>,
}

impl ExtractedHeading {
    /// True when the element's id differs from the resolved one.
    pub fn needs_write_back(&self) -> bool {
        self.existing_id.as_deref() != Some(self.entry.id.as_str())
    }
}

/// Outline entries for every `h1`..`h6` in `html`, in document order.
pub fn extract_headings(html: &str) -> Vec<HeadingEntry> {
    scan_headings(html)
        .into_iter()
        .map(|heading| heading.entry)
        .collect()
}

/// Like [`extract_headings`], also reporting the ids already present.
pub fn scan_headings(html: &str) -> Vec<ExtractedHeading> {
    let fragment = Html::parse_fragment(html);
    let mut ids = IdAllocator::default();

    let headings: Vec<ExtractedHeading> = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|el| {
            let level = heading_level(el.value().name())?;
            let text = collapse_whitespace(&el.text().collect::<String>());
            let id = ids.allocate(&slugify(&text), level);
            Some(ExtractedHeading {
                entry: HeadingEntry { id, text, level },
                existing_id: el.attr("id").map(SmolStr::from),
            })
        })
        .collect();

    tracing::trace!(count = headings.len(), "headings extracted");
    headings
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Lowercase `text`, collapsing every run of non-alphanumeric chars into a
/// single hyphen. Text with nothing alphanumeric becomes `untitled`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

/// Hands out unique heading ids for one extraction pass.
#[derive(Default)]
struct IdAllocator {
    occurrences: HashMap<String, usize>,
    used: HashSet<SmolStr>,
}

impl IdAllocator {
    /// `heading-{slug}-{level}` for the first heading with this slug, then
    /// `-{n}` appended for the n-th. Collisions bump `n` until the id is free.
    fn allocate(&mut self, slug: &str, level: u8) -> SmolStr {
        let base = format_smolstr!("heading-{slug}-{level}");
        let n = self.occurrences.entry(slug.to_owned()).or_insert(0);
        *n += 1;

        let mut id = if *n == 1 {
            base.clone()
        } else {
            format_smolstr!("{base}-{n}")
        };
        while self.used.contains(&id) {
            *n += 1;
            id = format_smolstr!("{base}-{n}");
        }
        self.used.insert(id.clone());
        id
    }
}

/// Scroll offset that brings an element just below the sticky header.
///
/// `element_top` is relative to the viewport, `scroll_y` is the current
/// scroll position. Never negative.
pub fn scroll_target(element_top: f64, scroll_y: f64, header_offset: f64) -> f64 {
    (element_top + scroll_y - header_offset).max(0.0)
}
