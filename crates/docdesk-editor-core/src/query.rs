//! Read-only questions about the selection, used to light up toolbar controls.

use smol_str::SmolStr;

use crate::commands::{Command, TextBlockType};
use crate::execute::{can_execute, is_block_type};
use crate::model::{Block, Leaf, ListKind, Owner};
use crate::schema::MarkType;
use crate::state::EditorState;
use crate::types::{Alignment, Link, Marks, StyleAttr};

/// Something a toolbar control can show as active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Query {
    Mark(MarkType),
    Block(TextBlockType),
    List(ListKind),
    Blockquote,
    Align(Alignment),
}

/// Whether `query` holds for the current selection.
///
/// Marks are active when every selected run carries them; a collapsed cursor
/// looks at the marks it would type with.
pub fn is_active(state: &EditorState, query: Query) -> bool {
    match query {
        Query::Mark(mark) => {
            let marks = selected_marks(state);
            !marks.is_empty() && marks.iter().all(|m| has_mark(m, mark))
        }
        Query::Block(target) => {
            let leaves = selected_text_leaves(state);
            !leaves.is_empty()
                && leaves.iter().all(|leaf| {
                    state
                        .doc()
                        .block(&leaf.path)
                        .is_some_and(|block| is_block_type(block, target))
                })
        }
        Query::List(kind) => first_leaf(state)
            .and_then(|leaf| leaf.nearest_owner(|o| matches!(o, Owner::ListItem(_))))
            .is_some_and(|(_, owner)| owner == Owner::ListItem(kind)),
        Query::Blockquote => first_leaf(state)
            .and_then(|leaf| leaf.nearest_owner(|o| o == Owner::Blockquote))
            .is_some(),
        Query::Align(align) => {
            let aligns: Vec<Alignment> = state
                .doc()
                .leaves_in(state.selection().to_range())
                .iter()
                .filter_map(|leaf| state.doc().block(&leaf.path)?.text_block())
                .map(|tb| tb.align.unwrap_or(Alignment::Left))
                .collect();
            !aligns.is_empty() && aligns.iter().all(|a| *a == align)
        }
    }
}

/// The value of a text-style attribute if the whole selection shares one.
pub fn style_value(state: &EditorState, attr: StyleAttr) -> Option<SmolStr> {
    uniform(selected_marks(state), |marks| marks.style.get(attr).cloned())
}

/// The link under the selection, if the whole selection is one link.
pub fn link(state: &EditorState) -> Option<Link> {
    uniform(selected_marks(state), |marks| marks.link.clone())
}

/// Whether `command` would apply right now.
pub fn can_apply(state: &EditorState, command: &Command) -> bool {
    can_execute(state, command)
}

fn has_mark(marks: &Marks, mark: MarkType) -> bool {
    match mark.flag() {
        Some(flag) => marks.flags.contains(flag),
        None => match mark {
            MarkType::Link => marks.link.is_some(),
            _ => !marks.style.is_empty(),
        },
    }
}

fn uniform<T: PartialEq>(marks: Vec<&Marks>, get: impl Fn(&Marks) -> Option<T>) -> Option<T> {
    let mut values = marks.into_iter().map(get);
    let first = values.next()??;
    values
        .all(|value| value.as_ref() == Some(&first))
        .then_some(first)
}

fn first_leaf(state: &EditorState) -> Option<Leaf> {
    state
        .doc()
        .leaves_in(state.selection().to_range())
        .into_iter()
        .next()
}

fn selected_text_leaves(state: &EditorState) -> Vec<Leaf> {
    state
        .doc()
        .leaves_in(state.selection().to_range())
        .into_iter()
        .filter(Leaf::is_text)
        .collect()
}

/// Mark sets covered by the selection.
fn selected_marks(state: &EditorState) -> Vec<&Marks> {
    let doc = state.doc();
    let sel = state.selection();
    if sel.is_collapsed() {
        let Some(leaf) = doc.leaf_at(sel.head) else {
            return Vec::new();
        };
        return doc
            .block(&leaf.path)
            .and_then(Block::text_block)
            .and_then(|tb| tb.marks_at(sel.head.saturating_sub(leaf.start)))
            .into_iter()
            .collect();
    }

    doc.leaves_in(sel.to_range())
        .into_iter()
        .filter_map(|leaf| {
            let tb = doc.block(&leaf.path)?.text_block()?;
            let from = sel.start().max(leaf.start) - leaf.start;
            let to = sel.end().min(leaf.end()) - leaf.start;
            Some(tb.runs_in(from..to))
        })
        .flatten()
        .map(|run| &run.marks)
        .collect()
}
