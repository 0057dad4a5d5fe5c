//! The document tree.
//!
//! A [`Document`] is an ordered list of [`Block`]s. Paragraphs and headings
//! hold inline content ([`TextBlock`]); code blocks hold plain text; lists and
//! blockquotes hold further blocks; images, videos and rules are atomic.
//!
//! Positions: every leaf block (anything that is not a list or blockquote)
//! occupies a slice of a single linear coordinate space. A text leaf of `n`
//! chars covers positions `start..=start + n` and is followed by one
//! separator slot; an atomic leaf covers exactly `start`. See [`Leaf`].

use std::ops::Range;

use smol_str::SmolStr;

use crate::toc::HeadingEntry;
use crate::types::{Alignment, Marks};

/// A run of text sharing one mark set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: Marks,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Marks::default())
    }
}

/// Inline content of a textblock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text(TextRun),
    HardBreak,
}

impl Inline {
    /// Length in positions. A hard break counts as one.
    pub fn len(&self) -> usize {
        match self {
            Inline::Text(run) => run.text.chars().count(),
            Inline::HardBreak => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inline content plus block alignment. Shared by paragraphs and headings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub align: Option<Alignment>,
    pub content: Vec<Inline>,
}

impl TextBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unmarked text; `\n` becomes a hard break.
    pub fn from_text(text: &str) -> Self {
        let mut block = Self::new();
        block.content = inlines_from_text(text, &Marks::default());
        block.normalize();
        block
    }

    pub fn with_align(mut self, align: Option<Alignment>) -> Self {
        self.align = align;
        self
    }

    pub fn len(&self) -> usize {
        self.content.iter().map(Inline::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain text with hard breaks as `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for inline in &self.content {
            match inline {
                Inline::Text(run) => out.push_str(&run.text),
                Inline::HardBreak => out.push('\n'),
            }
        }
        out
    }

    /// Drop empty runs and merge neighbours with identical marks.
    pub fn normalize(&mut self) {
        let mut merged: Vec<Inline> = Vec::with_capacity(self.content.len());
        for inline in self.content.drain(..) {
            match inline {
                Inline::Text(run) if run.text.is_empty() => {}
                Inline::Text(run) => match merged.last_mut() {
                    Some(Inline::Text(prev)) if prev.marks == run.marks => {
                        prev.text.push_str(&run.text)
                    }
                    _ => merged.push(Inline::Text(run)),
                },
                Inline::HardBreak => merged.push(Inline::HardBreak),
            }
        }
        self.content = merged;
    }

    /// Make sure an inline boundary exists at `offset` and return the index
    /// of the first inline at or after it.
    fn boundary(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.content.len() {
            if pos == offset {
                return i;
            }
            let len = self.content[i].len();
            if offset < pos + len {
                if let Inline::Text(run) = &mut self.content[i] {
                    let split = offset - pos;
                    let byte = run
                        .text
                        .char_indices()
                        .nth(split)
                        .map(|(b, _)| b)
                        .unwrap_or(run.text.len());
                    let tail = run.text.split_off(byte);
                    let marks = run.marks.clone();
                    self.content
                        .insert(i + 1, Inline::Text(TextRun::new(tail, marks)));
                }
                return i + 1;
            }
            pos += len;
        }
        self.content.len()
    }

    /// Apply `f` to the marks of every run inside `range`.
    pub fn map_marks(&mut self, range: Range<usize>, mut f: impl FnMut(&mut Marks)) {
        if range.is_empty() {
            return;
        }
        let from = self.boundary(range.start);
        let to = self.boundary(range.end);
        for inline in &mut self.content[from..to] {
            if let Inline::Text(run) = inline {
                f(&mut run.marks);
            }
        }
        self.normalize();
    }

    /// Text runs overlapping `range`.
    pub fn runs_in(&self, range: Range<usize>) -> Vec<&TextRun> {
        let mut pos = 0;
        let mut out = Vec::new();
        for inline in &self.content {
            let len = inline.len();
            if pos < range.end && range.start < pos + len {
                if let Inline::Text(run) = inline {
                    out.push(run);
                }
            }
            pos += len;
        }
        out
    }

    /// Marks in effect for a collapsed cursor: those of the char before it,
    /// or of the first char when the cursor sits at the start.
    pub fn marks_at(&self, offset: usize) -> Option<&Marks> {
        let mut pos = 0;
        for inline in &self.content {
            let len = inline.len();
            let hit = if offset == 0 {
                pos == 0
            } else {
                pos < offset && offset <= pos + len
            };
            if hit {
                return match inline {
                    Inline::Text(run) => Some(&run.marks),
                    Inline::HardBreak => None,
                };
            }
            pos += len;
        }
        None
    }

    pub fn delete(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let from = self.boundary(range.start);
        let to = self.boundary(range.end);
        self.content.drain(from..to);
        self.normalize();
    }

    /// Insert text carrying `marks`; `\n` becomes a hard break.
    pub fn insert_text(&mut self, offset: usize, text: &str, marks: &Marks) {
        let at = self.boundary(offset);
        let inserted = inlines_from_text(text, marks);
        self.content.splice(at..at, inserted);
        self.normalize();
    }

    /// Split at `offset`, keeping the head and returning the tail. Both halves
    /// keep the alignment.
    pub fn split_off(&mut self, offset: usize) -> TextBlock {
        let at = self.boundary(offset);
        let tail = self.content.split_off(at);
        TextBlock {
            align: self.align,
            content: tail,
        }
    }

    pub fn append(&mut self, other: TextBlock) {
        self.content.extend(other.content);
        self.normalize();
    }
}

fn inlines_from_text(text: &str, marks: &Marks) -> Vec<Inline> {
    let mut out = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push(Inline::HardBreak);
        }
        if !line.is_empty() {
            out.push(Inline::Text(TextRun::new(line, marks.clone())));
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    /// Anchor id. Written back by the outline extractor in preview mode.
    pub id: Option<SmolStr>,
    pub body: TextBlock,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<SmolStr>,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Ordered,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct List {
    pub kind: ListKind,
    /// First number of an ordered list.
    pub start: u32,
    pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttrs {
    pub src: SmolStr,
    pub alt: Option<SmolStr>,
    pub title: Option<SmolStr>,
}

/// Attributes of the atomic video block. `controls` is implied and always on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoAttrs {
    pub src: Option<SmolStr>,
    pub width: SmolStr,
    pub max_width: SmolStr,
}

impl VideoAttrs {
    pub fn new(src: Option<SmolStr>) -> Self {
        Self {
            src,
            width: SmolStr::new_static("100%"),
            max_width: SmolStr::new_static("100%"),
        }
    }

    pub fn controls(&self) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Paragraph(TextBlock),
    Heading(Heading),
    CodeBlock(CodeBlock),
    List(List),
    Blockquote(Vec<Block>),
    Image(ImageAttrs),
    Video(VideoAttrs),
    HorizontalRule,
}

impl Block {
    pub fn paragraph(text: &str) -> Self {
        Block::Paragraph(TextBlock::from_text(text))
    }

    pub fn empty_paragraph() -> Self {
        Block::Paragraph(TextBlock::new())
    }

    pub fn heading(level: u8, text: &str) -> Self {
        Block::Heading(Heading {
            level,
            id: None,
            body: TextBlock::from_text(text),
        })
    }

    /// Inline content for paragraphs and headings.
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Block::Paragraph(tb) => Some(tb),
            Block::Heading(h) => Some(&h.body),
            _ => None,
        }
    }

    pub fn text_block_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Paragraph(tb) => Some(tb),
            Block::Heading(h) => Some(&mut h.body),
            _ => None,
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Block::Image(_) | Block::Video(_) | Block::HorizontalRule
        )
    }
}

/// What owns the container a leaf sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Root,
    Blockquote,
    ListItem(ListKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafKind {
    Text { len: usize },
    Atom,
}

/// A leaf block located in the position space.
///
/// `path` indexes from the root: a blockquote's children add one component,
/// a list adds two (item index, then block index). `levels` lists every
/// container on the way down as `(container path length, owner)`, starting
/// with the root at `(0, Owner::Root)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub path: Vec<usize>,
    pub levels: Vec<(usize, Owner)>,
    pub start: usize,
    pub kind: LeafKind,
}

impl Leaf {
    pub fn len(&self) -> usize {
        match self.kind {
            LeafKind::Text { len } => len,
            LeafKind::Atom => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, LeafKind::Text { .. })
    }

    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    pub fn next_start(&self) -> usize {
        match self.kind {
            LeafKind::Text { len } => self.start + len + 1,
            LeafKind::Atom => self.start + 1,
        }
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos <= self.end()
    }

    /// Path of the container holding this leaf.
    pub fn container(&self) -> &[usize] {
        &self.path[..self.path.len() - 1]
    }

    /// Index of this leaf inside its container.
    pub fn index(&self) -> usize {
        self.path[self.path.len() - 1]
    }

    /// Innermost enclosing container owned by `pred`, as the path of the
    /// owning block.
    pub fn nearest_owner(&self, pred: impl Fn(Owner) -> bool) -> Option<(Vec<usize>, Owner)> {
        self.levels
            .iter()
            .rev()
            .find(|(_, owner)| pred(*owner))
            .map(|&(len, owner)| {
                let owner_len = match owner {
                    Owner::ListItem(_) => len - 1,
                    _ => len,
                };
                (self.path[..owner_len].to_vec(), owner)
            })
    }
}

/// Deepest container level shared by two leaves.
pub fn common_level(a: &Leaf, b: &Leaf) -> usize {
    let mut level = 0;
    for l in 1..a.levels.len().min(b.levels.len()) {
        let (len_a, _) = a.levels[l];
        let (len_b, _) = b.levels[l];
        if len_a == len_b && a.path[..len_a] == b.path[..len_b] {
            level = l;
        } else {
            break;
        }
    }
    level
}

/// The rich-text document. Never empty: it always holds at least one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding one empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::empty_paragraph()],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Self { blocks };
        doc.normalize();
        doc
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of positions in the document.
    pub fn size(&self) -> usize {
        self.leaves().last().map(Leaf::next_start).unwrap_or(0)
    }

    /// Largest valid cursor position.
    pub fn max_pos(&self) -> usize {
        self.size().saturating_sub(1)
    }

    pub fn leaves(&self) -> Vec<Leaf> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        let mut levels = vec![(0, Owner::Root)];
        let mut pos = 0;
        collect_leaves(&self.blocks, &mut prefix, &mut levels, &mut pos, &mut out);
        out
    }

    /// Leaf containing `pos`; positions past the end resolve to the last leaf.
    pub fn leaf_at(&self, pos: usize) -> Option<Leaf> {
        let leaves = self.leaves();
        let found = leaves.iter().position(|leaf| leaf.contains(pos));
        match found {
            Some(i) => leaves.into_iter().nth(i),
            None => leaves.into_iter().last(),
        }
    }

    /// Leaves touched by the inclusive range `range.start..=range.end`.
    pub fn leaves_in(&self, range: Range<usize>) -> Vec<Leaf> {
        let leaves = self.leaves();
        let touched: Vec<Leaf> = leaves
            .iter()
            .filter(|leaf| leaf.start <= range.end && range.start <= leaf.end())
            .cloned()
            .collect();
        if touched.is_empty() {
            leaves.into_iter().last().into_iter().collect()
        } else {
            touched
        }
    }

    pub fn block(&self, path: &[usize]) -> Option<&Block> {
        let (&last, container) = path.split_last()?;
        container_ref(&self.blocks, container)?.get(last)
    }

    pub fn block_mut(&mut self, path: &[usize]) -> Option<&mut Block> {
        let (&last, container) = path.split_last()?;
        self.container_mut(container)?.get_mut(last)
    }

    /// The block list at a container path: the root for `[]`, a blockquote's
    /// children for its block path, a list item's blocks for `list path + [item]`.
    pub fn container_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Block>> {
        container_mut(&mut self.blocks, path)
    }

    /// Headings in document order.
    pub fn headings(&self) -> Vec<&Heading> {
        let mut out = Vec::new();
        collect_headings(&self.blocks, &mut out);
        out
    }

    /// Write outline ids back onto heading blocks, pairing them in document
    /// order. Only ids that differ are written; returns how many changed.
    pub fn apply_heading_ids(&mut self, entries: &[HeadingEntry]) -> usize {
        let mut headings = Vec::new();
        collect_headings_mut(&mut self.blocks, &mut headings);
        let mut changed = 0;
        for (heading, entry) in headings.into_iter().zip(entries) {
            if heading.id.as_deref() != Some(entry.id.as_str()) {
                heading.id = Some(entry.id.clone());
                changed += 1;
            }
        }
        changed
    }

    /// Restore the tree invariants after an edit.
    pub fn normalize(&mut self) {
        normalize_blocks(&mut self.blocks);
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
    }
}

fn collect_leaves(
    blocks: &[Block],
    prefix: &mut Vec<usize>,
    levels: &mut Vec<(usize, Owner)>,
    pos: &mut usize,
    out: &mut Vec<Leaf>,
) {
    for (i, block) in blocks.iter().enumerate() {
        prefix.push(i);
        let kind = match block {
            Block::Paragraph(tb) => Some(LeafKind::Text { len: tb.len() }),
            Block::Heading(h) => Some(LeafKind::Text { len: h.body.len() }),
            Block::CodeBlock(code) => Some(LeafKind::Text {
                len: code.text.chars().count(),
            }),
            Block::Image(_) | Block::Video(_) | Block::HorizontalRule => Some(LeafKind::Atom),
            Block::Blockquote(children) => {
                levels.push((prefix.len(), Owner::Blockquote));
                collect_leaves(children, prefix, levels, pos, out);
                levels.pop();
                None
            }
            Block::List(list) => {
                for (k, item) in list.items.iter().enumerate() {
                    prefix.push(k);
                    levels.push((prefix.len(), Owner::ListItem(list.kind)));
                    collect_leaves(&item.blocks, prefix, levels, pos, out);
                    levels.pop();
                    prefix.pop();
                }
                None
            }
        };
        if let Some(kind) = kind {
            let leaf = Leaf {
                path: prefix.clone(),
                levels: levels.clone(),
                start: *pos,
                kind,
            };
            *pos = leaf.next_start();
            out.push(leaf);
        }
        prefix.pop();
    }
}

fn container_ref<'a>(blocks: &'a [Block], path: &[usize]) -> Option<&'a [Block]> {
    let Some((&first, rest)) = path.split_first() else {
        return Some(blocks);
    };
    match blocks.get(first)? {
        Block::Blockquote(children) => container_ref(children, rest),
        Block::List(list) => {
            let (&item, rest) = rest.split_first()?;
            container_ref(&list.items.get(item)?.blocks, rest)
        }
        _ => None,
    }
}

fn container_mut<'a>(blocks: &'a mut Vec<Block>, path: &[usize]) -> Option<&'a mut Vec<Block>> {
    let Some((&first, rest)) = path.split_first() else {
        return Some(blocks);
    };
    match blocks.get_mut(first)? {
        Block::Blockquote(children) => container_mut(children, rest),
        Block::List(list) => {
            let (&item, rest) = rest.split_first()?;
            container_mut(&mut list.items.get_mut(item)?.blocks, rest)
        }
        _ => None,
    }
}

fn collect_headings<'a>(blocks: &'a [Block], out: &mut Vec<&'a Heading>) {
    for block in blocks {
        match block {
            Block::Heading(h) => out.push(h),
            Block::Blockquote(children) => collect_headings(children, out),
            Block::List(list) => {
                for item in &list.items {
                    collect_headings(&item.blocks, out);
                }
            }
            _ => {}
        }
    }
}

fn collect_headings_mut<'a>(blocks: &'a mut [Block], out: &mut Vec<&'a mut Heading>) {
    for block in blocks {
        match block {
            Block::Heading(h) => out.push(h),
            Block::Blockquote(children) => collect_headings_mut(children, out),
            Block::List(list) => {
                for item in &mut list.items {
                    collect_headings_mut(&mut item.blocks, out);
                }
            }
            _ => {}
        }
    }
}

fn normalize_blocks(blocks: &mut Vec<Block>) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(tb) => tb.normalize(),
            Block::Heading(h) => h.body.normalize(),
            Block::Blockquote(children) => {
                normalize_blocks(children);
                if children.is_empty() {
                    children.push(Block::empty_paragraph());
                }
            }
            Block::List(list) => {
                for item in &mut list.items {
                    normalize_blocks(&mut item.blocks);
                    if item.blocks.is_empty() {
                        item.blocks.push(Block::empty_paragraph());
                    }
                }
            }
            Block::CodeBlock(_) | Block::Image(_) | Block::Video(_) | Block::HorizontalRule => {}
        }
    }
    blocks.retain(|block| !matches!(block, Block::List(list) if list.items.is_empty()));
}
