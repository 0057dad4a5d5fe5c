//! Command execution for editor state.
//!
//! This module provides the `execute_command` function that applies a
//! [`Command`] to an [`EditorState`]. Edits run against a scratch copy of the
//! document; the copy only replaces the live document (and lands in history)
//! when it is valid and actually differs.

use std::ops::Range;

use crate::commands::{Command, TextBlockType};
use crate::extensions::font_size;
use crate::history::Snapshot;
use crate::html::style;
use crate::model::{
    Block, CodeBlock, Document, Heading, ImageAttrs, Inline, Leaf, List, ListItem, ListKind,
    Owner, TextBlock, VideoAttrs, common_level,
};
use crate::schema::{MarkType, NodeType, Schema};
use crate::state::EditorState;
use crate::text_helpers::{char_len, char_to_byte, find_word_boundaries};
use crate::types::{Alignment, Link, Marks, Selection, StyleAttr};

/// Execute a command against the editor state.
///
/// This is the central dispatch point for all editor operations. Returns
/// true if the command applied. Commands that would leave the document
/// unchanged, that the schema forbids, or that get malformed arguments
/// return false and touch nothing.
pub fn execute_command(state: &mut EditorState, command: &Command) -> bool {
    if command.is_mutation() && !state.editable {
        tracing::debug!(command = command.name(), "editor is read-only, command ignored");
        return false;
    }

    let applied = match command {
        Command::SelectAll => execute_select_all(state),
        Command::SetSelection(selection) => execute_set_selection(state, *selection),
        Command::Undo => execute_undo(state),
        Command::Redo => execute_redo(state),
        _ => execute_edit(state, command),
    };

    if applied {
        tracing::trace!(command = command.name(), "command applied");
    } else {
        tracing::debug!(command = command.name(), "command not applicable");
    }
    applied
}

/// Whether `command` would apply, without changing anything.
pub fn can_execute(state: &EditorState, command: &Command) -> bool {
    let mut dry_run = state.clone();
    execute_command(&mut dry_run, command)
}

fn execute_select_all(state: &mut EditorState) -> bool {
    state.selection = Selection::new(0, state.doc.max_pos());
    true
}

fn execute_set_selection(state: &mut EditorState, selection: Selection) -> bool {
    state.selection = selection.clamp(state.doc.max_pos());
    true
}

fn execute_undo(state: &mut EditorState) -> bool {
    let current = Snapshot {
        doc: state.doc.clone(),
        selection: state.selection,
    };
    let Some(previous) = state.history.undo(current) else {
        return false;
    };
    state.doc = previous.doc;
    state.selection = previous.selection.clamp(state.doc.max_pos());
    true
}

fn execute_redo(state: &mut EditorState) -> bool {
    let current = Snapshot {
        doc: state.doc.clone(),
        selection: state.selection,
    };
    let Some(next) = state.history.redo(current) else {
        return false;
    };
    state.doc = next.doc;
    state.selection = next.selection.clamp(state.doc.max_pos());
    true
}

fn execute_edit(state: &mut EditorState, command: &Command) -> bool {
    let mut edit = Edit {
        schema: &state.schema,
        doc: state.doc.clone(),
        selection: state.selection,
    };

    let ok = match command {
        Command::ToggleMark(mark) => edit.toggle_mark(*mark),
        Command::SetStyle { attr, value } => edit.set_style(*attr, value),
        Command::UnsetStyle(attr) => edit.unset_style(*attr),
        Command::SetLink(link) => edit.set_link(link),
        Command::UnsetLink => edit.unset_link(),
        Command::SetBlockType(target) => edit.set_block_type(*target),
        Command::ToggleBlockType(target) => edit.toggle_block_type(*target),
        Command::ToggleList(kind) => edit.toggle_list(*kind),
        Command::ToggleBlockquote => edit.toggle_blockquote(),
        Command::SetAlignment(align) => edit.set_alignment(Some(*align)),
        Command::UnsetAlignment => edit.set_alignment(None),
        Command::InsertImage(attrs) => edit.insert_image(attrs),
        Command::InsertVideo { src } => edit.insert_video(src),
        Command::InsertHorizontalRule => {
            edit.schema.allows_node(NodeType::HorizontalRule)
                && edit.insert_atom(Block::HorizontalRule)
        }
        Command::InsertText(text) => edit.insert_text(text),
        Command::SplitBlock => edit.split_block(),
        Command::DeleteBackward => edit.delete_backward(),
        Command::SelectAll | Command::SetSelection(_) | Command::Undo | Command::Redo => false,
    };
    if !ok {
        return false;
    }

    let Edit { mut doc, selection, .. } = edit;
    doc.normalize();
    if doc == state.doc {
        return false;
    }

    let before = Snapshot {
        doc: std::mem::replace(&mut state.doc, doc),
        selection: state.selection,
    };
    state.selection = selection.clamp(state.doc.max_pos());
    state.history.record(before);
    true
}

/// A char range inside one textblock, addressed by block path.
type Target = (Vec<usize>, Range<usize>);

/// Scratch state for one command.
struct Edit<'a> {
    schema: &'a Schema,
    doc: Document,
    selection: Selection,
}

impl Edit<'_> {
    // === Marks ===

    /// Inline ranges a mark command acts on. A collapsed cursor resolves to
    /// the word around it; no word means no targets.
    fn mark_targets(&self) -> Vec<Target> {
        let sel = self.selection;
        if sel.is_collapsed() {
            let Some(leaf) = self.doc.leaf_at(sel.head) else {
                return Vec::new();
            };
            let Some(tb) = self.doc.block(&leaf.path).and_then(Block::text_block) else {
                return Vec::new();
            };
            let offset = sel.head.saturating_sub(leaf.start).min(leaf.len());
            let word = find_word_boundaries(&tb.text(), offset);
            if word.is_empty() {
                return Vec::new();
            }
            return vec![(leaf.path, word)];
        }

        self.doc
            .leaves_in(sel.to_range())
            .into_iter()
            .filter_map(|leaf| {
                self.doc.block(&leaf.path).and_then(Block::text_block)?;
                let from = sel.start().max(leaf.start) - leaf.start;
                let to = sel.end().min(leaf.end()) - leaf.start;
                (from < to).then_some((leaf.path, from..to))
            })
            .collect()
    }

    fn all_marked(&self, targets: &[Target], pred: impl Fn(&Marks) -> bool) -> bool {
        targets.iter().all(|(path, range)| {
            self.doc
                .block(path)
                .and_then(Block::text_block)
                .is_some_and(|tb| tb.runs_in(range.clone()).iter().all(|run| pred(&run.marks)))
        })
    }

    fn map_marks(&mut self, targets: &[Target], mut f: impl FnMut(&mut Marks)) {
        for (path, range) in targets {
            if let Some(tb) = self.doc.block_mut(path).and_then(Block::text_block_mut) {
                tb.map_marks(range.clone(), &mut f);
            }
        }
    }

    fn toggle_mark(&mut self, mark: MarkType) -> bool {
        let Some(flag) = mark.flag() else {
            return false;
        };
        if !self.schema.allows_mark(mark) {
            return false;
        }
        let targets = self.mark_targets();
        if targets.is_empty() {
            return false;
        }
        let active = self.all_marked(&targets, |marks| marks.flags.contains(flag));
        self.map_marks(&targets, |marks| {
            if active {
                marks.flags.remove(flag);
            } else {
                marks.insert_flag(flag);
            }
        });
        true
    }

    fn set_style(&mut self, attr: StyleAttr, value: &str) -> bool {
        let value = value.trim();
        if !self.schema.allows_style(attr) {
            return false;
        }
        if !style::is_safe_value(value)
            || (attr == StyleAttr::FontSize && !font_size::is_valid(value))
        {
            tracing::debug!(?attr, value, "rejected style value");
            return false;
        }
        let targets = self.mark_targets();
        if targets.is_empty() {
            return false;
        }
        self.map_marks(&targets, |marks| marks.style.set(attr, Some(value.into())));
        true
    }

    fn unset_style(&mut self, attr: StyleAttr) -> bool {
        if !self.schema.allows_style(attr) {
            return false;
        }
        let targets = self.mark_targets();
        if targets.is_empty() {
            return false;
        }
        self.map_marks(&targets, |marks| marks.style.set(attr, None));
        true
    }

    fn set_link(&mut self, link: &Link) -> bool {
        if link.href.trim().is_empty() || !self.schema.allows_mark(MarkType::Link) {
            return false;
        }
        let targets = self.mark_targets();
        if targets.is_empty() {
            return false;
        }
        self.map_marks(&targets, |marks| marks.link = Some(link.clone()));
        true
    }

    fn unset_link(&mut self) -> bool {
        if !self.schema.allows_mark(MarkType::Link) {
            return false;
        }
        let targets = if self.selection.is_collapsed() {
            self.link_extent().into_iter().collect()
        } else {
            self.mark_targets()
        };
        if targets.is_empty() {
            return false;
        }
        self.map_marks(&targets, |marks| marks.link = None);
        true
    }

    /// Full extent of the link under a collapsed cursor.
    fn link_extent(&self) -> Option<Target> {
        let leaf = self.doc.leaf_at(self.selection.head)?;
        let tb = self.doc.block(&leaf.path)?.text_block()?;
        let offset = self.selection.head.saturating_sub(leaf.start);

        let mut spans: Vec<(Range<usize>, Option<&Link>)> = Vec::with_capacity(tb.content.len());
        let mut pos = 0;
        for inline in &tb.content {
            let len = inline.len();
            let link = match inline {
                Inline::Text(run) => run.marks.link.as_ref(),
                Inline::HardBreak => None,
            };
            spans.push((pos..pos + len, link));
            pos += len;
        }

        let hit = spans.iter().position(|(range, link)| {
            link.is_some() && range.start <= offset && offset <= range.end
        })?;
        let link = spans[hit].1;
        let mut from = hit;
        while from > 0 && spans[from - 1].1 == link {
            from -= 1;
        }
        let mut to = hit;
        while to + 1 < spans.len() && spans[to + 1].1 == link {
            to += 1;
        }
        Some((leaf.path, spans[from].0.start..spans[to].0.end))
    }

    // === Block types ===

    fn selected_leaves(&self) -> Vec<Leaf> {
        self.doc.leaves_in(self.selection.to_range())
    }

    fn allows_block_type(&self, target: TextBlockType) -> bool {
        match target {
            TextBlockType::Paragraph => true,
            TextBlockType::Heading(level) => self.schema.allows_heading(level),
            TextBlockType::CodeBlock => self.schema.allows_node(NodeType::CodeBlock),
        }
    }

    fn set_block_type(&mut self, target: TextBlockType) -> bool {
        if !self.allows_block_type(target) {
            return false;
        }
        let leaves: Vec<Leaf> = self
            .selected_leaves()
            .into_iter()
            .filter(Leaf::is_text)
            .collect();
        if leaves.is_empty() {
            return false;
        }
        for leaf in leaves {
            if let Some(block) = self.doc.block_mut(&leaf.path) {
                if is_block_type(block, target) {
                    continue;
                }
                if let Some(converted) = convert_block(block, target) {
                    *block = converted;
                }
            }
        }
        true
    }

    fn toggle_block_type(&mut self, target: TextBlockType) -> bool {
        let all_match = self
            .selected_leaves()
            .iter()
            .filter(|leaf| leaf.is_text())
            .all(|leaf| {
                self.doc
                    .block(&leaf.path)
                    .is_some_and(|block| is_block_type(block, target))
            });
        if all_match {
            self.set_block_type(TextBlockType::Paragraph)
        } else {
            self.set_block_type(target)
        }
    }

    // === Wrapping ===

    fn toggle_list(&mut self, kind: ListKind) -> bool {
        let node = match kind {
            ListKind::Bullet => NodeType::BulletList,
            ListKind::Ordered => NodeType::OrderedList,
        };
        if !self.schema.allows_node(node) || !self.schema.allows_node(NodeType::ListItem) {
            return false;
        }
        let leaves = self.selected_leaves();
        let (Some(first), Some(last)) = (leaves.first(), leaves.last()) else {
            return false;
        };

        let is_item = |owner: Owner| matches!(owner, Owner::ListItem(_));
        if let (Some((list_path, Owner::ListItem(current))), Some((last_list, _))) =
            (first.nearest_owner(is_item), last.nearest_owner(is_item))
        {
            if list_path == last_list {
                if current == kind {
                    let from = first.path[list_path.len()];
                    let to = last.path[list_path.len()];
                    return self.lift_items(&list_path, from, to);
                }
                return match self.doc.block_mut(&list_path) {
                    Some(Block::List(list)) => {
                        list.kind = kind;
                        list.start = 1;
                        true
                    }
                    _ => false,
                };
            }
        }

        let (cpath, from, to) = sibling_range(first, last);
        self.wrap(&cpath, from, to, |blocks| {
            Block::List(List {
                kind,
                start: 1,
                items: blocks
                    .into_iter()
                    .map(|block| ListItem {
                        blocks: vec![block],
                    })
                    .collect(),
            })
        })
    }

    fn toggle_blockquote(&mut self) -> bool {
        if !self.schema.allows_node(NodeType::Blockquote) {
            return false;
        }
        let leaves = self.selected_leaves();
        let (Some(first), Some(last)) = (leaves.first(), leaves.last()) else {
            return false;
        };

        let is_quote = |owner: Owner| owner == Owner::Blockquote;
        if let (Some((quote, _)), Some((last_quote, _))) =
            (first.nearest_owner(is_quote), last.nearest_owner(is_quote))
        {
            if quote == last_quote {
                return self.unwrap_blockquote(&quote);
            }
        }

        let (cpath, from, to) = sibling_range(first, last);
        self.wrap(&cpath, from, to, Block::Blockquote)
    }

    /// Replace siblings `from..=to` of a container with one wrapping block.
    fn wrap(
        &mut self,
        cpath: &[usize],
        from: usize,
        to: usize,
        make: impl FnOnce(Vec<Block>) -> Block,
    ) -> bool {
        let Some(container) = self.doc.container_mut(cpath) else {
            return false;
        };
        if from > to || to >= container.len() {
            return false;
        }
        let taken: Vec<Block> = container.drain(from..=to).collect();
        container.insert(from, make(taken));
        true
    }

    /// Move items `from..=to` of the list at `list_path` out of the list,
    /// splitting it around them.
    fn lift_items(&mut self, list_path: &[usize], from: usize, to: usize) -> bool {
        let Some((&index, cpath)) = list_path.split_last() else {
            return false;
        };
        let Some(container) = self.doc.container_mut(cpath) else {
            return false;
        };
        match container.get(index) {
            Some(Block::List(list)) if from <= to && to < list.items.len() => {}
            _ => return false,
        }
        let Block::List(mut list) = container.remove(index) else {
            return false;
        };

        let after = list.items.split_off(to + 1);
        let lifted = list.items.split_off(from);
        let mut replacement = Vec::with_capacity(lifted.len() + 2);
        if !list.items.is_empty() {
            replacement.push(Block::List(List {
                kind: list.kind,
                start: list.start,
                items: list.items,
            }));
        }
        replacement.extend(lifted.into_iter().flat_map(|item| item.blocks));
        if !after.is_empty() {
            let skipped = u32::try_from(to + 1).unwrap_or(u32::MAX);
            replacement.push(Block::List(List {
                kind: list.kind,
                start: list.start.saturating_add(skipped),
                items: after,
            }));
        }
        container.splice(index..index, replacement);
        true
    }

    fn unwrap_blockquote(&mut self, quote_path: &[usize]) -> bool {
        let Some((&index, cpath)) = quote_path.split_last() else {
            return false;
        };
        let Some(container) = self.doc.container_mut(cpath) else {
            return false;
        };
        if !matches!(container.get(index), Some(Block::Blockquote(_))) {
            return false;
        }
        let Block::Blockquote(children) = container.remove(index) else {
            return false;
        };
        container.splice(index..index, children);
        true
    }

    fn set_alignment(&mut self, align: Option<Alignment>) -> bool {
        let allowed = match align {
            Some(align) => self.schema.allows_alignment(align),
            None => Alignment::ALL
                .iter()
                .any(|align| self.schema.allows_alignment(*align)),
        };
        if !allowed {
            return false;
        }
        let mut touched = false;
        for leaf in self.selected_leaves() {
            if let Some(tb) = self.doc.block_mut(&leaf.path).and_then(Block::text_block_mut) {
                tb.align = align;
                touched = true;
            }
        }
        touched
    }

    // === Atomic nodes ===

    fn insert_image(&mut self, attrs: &ImageAttrs) -> bool {
        let src = attrs.src.trim();
        if src.is_empty() || !self.schema.allows_node(NodeType::Image) {
            return false;
        }
        self.insert_atom(Block::Image(ImageAttrs {
            src: src.into(),
            alt: attrs.alt.clone(),
            title: attrs.title.clone(),
        }))
    }

    fn insert_video(&mut self, src: &str) -> bool {
        let src = src.trim();
        if src.is_empty() || !self.schema.allows_node(NodeType::Video) {
            return false;
        }
        let options = self.schema.video_options();
        self.insert_atom(Block::Video(VideoAttrs {
            src: Some(src.into()),
            width: options.width.clone(),
            max_width: options.max_width.clone(),
        }))
    }

    /// Insert an atomic block at the cursor, splitting a textblock if the
    /// cursor sits inside one. An empty paragraph is replaced. The cursor
    /// lands after the new block.
    fn insert_atom(&mut self, atom: Block) -> bool {
        if !self.selection.is_collapsed() && !self.delete_selection() {
            return false;
        }
        let pos = self.selection.head;
        let Some(leaf) = self.doc.leaf_at(pos) else {
            return false;
        };
        let offset = pos.saturating_sub(leaf.start).min(leaf.len());
        let mut path = leaf.container().to_vec();
        let index = leaf.index();

        let Some(container) = self.doc.container_mut(&path) else {
            return false;
        };
        let at = match container.get(index) {
            None => return false,
            Some(block) if block.is_atom() => index + 1,
            Some(Block::Paragraph(tb)) if tb.is_empty() => {
                container.remove(index);
                index
            }
            Some(_) if offset == 0 => index,
            Some(_) if offset >= leaf.len() => index + 1,
            Some(_) => {
                let Some(tail) = split_block(&mut container[index], offset) else {
                    return false;
                };
                container.insert(index + 1, tail);
                index + 1
            }
        };
        container.insert(at, atom);

        path.push(at);
        if let Some(inserted) = self.doc.leaves().into_iter().find(|l| l.path == path) {
            self.selection =
                Selection::collapsed(inserted.next_start().min(self.doc.max_pos()));
        }
        true
    }

    // === Text editing ===

    /// Delete a selection that lies inside one text leaf.
    fn delete_selection(&mut self) -> bool {
        let (start, end) = (self.selection.start(), self.selection.end());
        let Some(leaf) = self.doc.leaf_at(start) else {
            return false;
        };
        if !leaf.is_text() || end > leaf.end() {
            return false;
        }
        if !self.delete_in_leaf(&leaf.path, start - leaf.start..end - leaf.start) {
            return false;
        }
        self.selection = Selection::collapsed(start);
        true
    }

    fn delete_in_leaf(&mut self, path: &[usize], range: Range<usize>) -> bool {
        match self.doc.block_mut(path) {
            Some(Block::Paragraph(tb)) => tb.delete(range),
            Some(Block::Heading(h)) => h.body.delete(range),
            Some(Block::CodeBlock(code)) => {
                let from = char_to_byte(&code.text, range.start);
                let to = char_to_byte(&code.text, range.end);
                code.text.replace_range(from..to, "");
            }
            _ => return false,
        }
        true
    }

    fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if !self.selection.is_collapsed() && !self.delete_selection() {
            return false;
        }
        let pos = self.selection.head;
        let Some(leaf) = self.doc.leaf_at(pos) else {
            return false;
        };
        let inserted = char_len(text);

        if !leaf.is_text() {
            // typing on an atom starts a paragraph after it
            let Some(container) = self.doc.container_mut(leaf.container()) else {
                return false;
            };
            container.insert(leaf.index() + 1, Block::Paragraph(TextBlock::from_text(text)));
            self.selection = Selection::collapsed(leaf.next_start() + inserted);
            return true;
        }

        let offset = pos.saturating_sub(leaf.start).min(leaf.len());
        match self.doc.block_mut(&leaf.path) {
            Some(Block::Paragraph(tb)) => insert_inline(tb, offset, text),
            Some(Block::Heading(h)) => insert_inline(&mut h.body, offset, text),
            Some(Block::CodeBlock(code)) => {
                let at = char_to_byte(&code.text, offset);
                code.text.insert_str(at, text);
            }
            _ => return false,
        }
        self.selection = Selection::collapsed(leaf.start + offset + inserted);
        true
    }

    fn split_block(&mut self) -> bool {
        if !self.selection.is_collapsed() && !self.delete_selection() {
            return false;
        }
        let pos = self.selection.head;
        let Some(leaf) = self.doc.leaf_at(pos) else {
            return false;
        };
        let cpath = leaf.container().to_vec();
        let index = leaf.index();

        if !leaf.is_text() {
            let Some(container) = self.doc.container_mut(&cpath) else {
                return false;
            };
            container.insert(index + 1, Block::empty_paragraph());
            self.selection = Selection::collapsed(leaf.next_start());
            return true;
        }

        let offset = pos.saturating_sub(leaf.start).min(leaf.len());
        if let Some(&(_, Owner::ListItem(_))) = leaf.levels.last() {
            if matches!(self.doc.block(&leaf.path), Some(Block::Paragraph(_))) {
                return self.split_list_item(&leaf, offset);
            }
        }

        let Some(container) = self.doc.container_mut(&cpath) else {
            return false;
        };
        let Some(block) = container.get_mut(index) else {
            return false;
        };
        if let Block::CodeBlock(code) = block {
            let at = char_to_byte(&code.text, offset);
            code.text.insert(at, '\n');
            self.selection = Selection::collapsed(pos + 1);
            return true;
        }

        // Enter at the end of a heading continues with a paragraph.
        let heading_end = match block {
            Block::Heading(h) if offset >= h.body.len() => Some(h.body.align),
            _ => None,
        };
        let tail = match heading_end {
            Some(align) => Block::Paragraph(TextBlock::new().with_align(align)),
            None => match split_block(block, offset) {
                Some(tail) => tail,
                None => return false,
            },
        };
        container.insert(index + 1, tail);
        self.selection = Selection::collapsed(pos + 1);
        true
    }

    /// Enter inside a list item: an empty item leaves the list, anything else
    /// starts a new item with the text after the cursor.
    fn split_list_item(&mut self, leaf: &Leaf, offset: usize) -> bool {
        let depth = leaf.path.len();
        let list_path = &leaf.path[..depth - 2];
        let item = leaf.path[depth - 2];
        let block_index = leaf.path[depth - 1];
        let empty = matches!(self.doc.block(&leaf.path), Some(Block::Paragraph(tb)) if tb.is_empty());

        let Some(Block::List(list)) = self.doc.block_mut(list_path) else {
            return false;
        };
        let Some(current) = list.items.get_mut(item) else {
            return false;
        };
        if empty && current.blocks.len() == 1 {
            return self.lift_items(list_path, item, item);
        }

        let mut moved = current.blocks.split_off(block_index + 1);
        let tail = match current.blocks.get_mut(block_index) {
            Some(Block::Paragraph(tb)) => tb.split_off(offset),
            _ => return false,
        };
        moved.insert(0, Block::Paragraph(tail));
        list.items.insert(item + 1, ListItem { blocks: moved });
        self.selection = Selection::collapsed(self.selection.head + 1);
        true
    }

    fn delete_backward(&mut self) -> bool {
        if !self.selection.is_collapsed() {
            return self.delete_selection();
        }
        let pos = self.selection.head;
        let Some(leaf) = self.doc.leaf_at(pos) else {
            return false;
        };

        if !leaf.is_text() {
            let Some(container) = self.doc.container_mut(leaf.container()) else {
                return false;
            };
            container.remove(leaf.index());
            self.selection = Selection::collapsed(leaf.start.saturating_sub(1));
            return true;
        }

        let offset = pos.saturating_sub(leaf.start).min(leaf.len());
        if offset > 0 {
            if !self.delete_in_leaf(&leaf.path, offset - 1..offset) {
                return false;
            }
            self.selection = Selection::collapsed(pos - 1);
            return true;
        }

        // At the start of the first block in a container: leave the container.
        let index = leaf.index();
        if index == 0 {
            let depth = leaf.path.len();
            return match leaf.levels.last() {
                Some(&(_, Owner::ListItem(_))) => {
                    let item = leaf.path[depth - 2];
                    self.lift_items(&leaf.path[..depth - 2], item, item)
                }
                Some(&(_, Owner::Blockquote)) => self.unwrap_blockquote(leaf.container()),
                _ => false,
            };
        }

        let Some(container) = self.doc.container_mut(leaf.container()) else {
            return false;
        };
        let current_empty = leaf.is_empty();
        match container.get(index - 1) {
            Some(prev) if prev.is_atom() => {
                container.remove(index - 1);
            }
            Some(Block::Paragraph(_) | Block::Heading(_) | Block::CodeBlock(_)) => {
                let current = container.remove(index);
                if !merge_into(&mut container[index - 1], current) {
                    return false;
                }
            }
            Some(_) if current_empty => {
                container.remove(index);
            }
            _ => return false,
        }
        self.selection = Selection::collapsed(pos - 1);
        true
    }
}

/// Container path and sibling index range spanning two leaves.
fn sibling_range(first: &Leaf, last: &Leaf) -> (Vec<usize>, usize, usize) {
    let level = common_level(first, last);
    let depth = first.levels[level].0;
    (first.path[..depth].to_vec(), first.path[depth], last.path[depth])
}

pub(crate) fn is_block_type(block: &Block, target: TextBlockType) -> bool {
    match (block, target) {
        (Block::Paragraph(_), TextBlockType::Paragraph) => true,
        (Block::Heading(h), TextBlockType::Heading(level)) => h.level == level,
        (Block::CodeBlock(_), TextBlockType::CodeBlock) => true,
        _ => false,
    }
}

fn convert_block(block: &Block, target: TextBlockType) -> Option<Block> {
    let body = match block {
        Block::Paragraph(tb) => tb.clone(),
        Block::Heading(h) => h.body.clone(),
        Block::CodeBlock(code) => TextBlock::from_text(&code.text),
        _ => return None,
    };
    Some(match target {
        TextBlockType::Paragraph => Block::Paragraph(body),
        TextBlockType::Heading(level) => Block::Heading(Heading {
            level,
            id: None,
            body,
        }),
        TextBlockType::CodeBlock => Block::CodeBlock(CodeBlock {
            language: None,
            text: body.text(),
        }),
    })
}

/// Split a textual block at `offset`, returning the tail.
fn split_block(block: &mut Block, offset: usize) -> Option<Block> {
    match block {
        Block::Paragraph(tb) => Some(Block::Paragraph(tb.split_off(offset))),
        Block::Heading(h) => Some(Block::Heading(Heading {
            level: h.level,
            id: None,
            body: h.body.split_off(offset),
        })),
        Block::CodeBlock(code) => {
            let at = char_to_byte(&code.text, offset);
            Some(Block::CodeBlock(CodeBlock {
                language: code.language.clone(),
                text: code.text.split_off(at),
            }))
        }
        _ => None,
    }
}

/// Append a textual block onto the previous one, keeping the previous type.
fn merge_into(prev: &mut Block, current: Block) -> bool {
    let body = match current {
        Block::Paragraph(tb) => tb,
        Block::Heading(h) => h.body,
        Block::CodeBlock(code) => TextBlock::from_text(&code.text),
        _ => return false,
    };
    match prev {
        Block::Paragraph(tb) => tb.append(body),
        Block::Heading(h) => h.body.append(body),
        Block::CodeBlock(code) => code.text.push_str(&body.text()),
        _ => return false,
    }
    true
}

/// Typed text inherits the marks in effect at the cursor.
fn insert_inline(tb: &mut TextBlock, offset: usize, text: &str) {
    let marks = tb.marks_at(offset).cloned().unwrap_or_default();
    tb.insert_text(offset, text, &marks);
}
