//! Selection Splitter: one live selection to per-paragraph ranges.

use crate::dom::{BoundaryPoint, DocumentTree, NodeId, Selection};
use crate::highlighting::offsets::offset_of;
use crate::models::{Highlight, HighlightRange};

/// Split the tree's live selection into one range per touched paragraph.
///
/// Ranges come back in document order. Collapsed selections, selections
/// outside `root` and ranges with only whitespace yield nothing. The live
/// selection is cleared whatever the outcome.
pub fn split_selection(
    tree: &mut DocumentTree,
    root: NodeId,
    highlights: &[Highlight],
) -> Vec<HighlightRange> {
    let Some(selection) = tree.selection.take() else {
        return Vec::new();
    };
    split(tree, root, selection, highlights)
}

/// Split `selection` without touching the tree's live selection
pub fn split(
    tree: &DocumentTree,
    root: NodeId,
    selection: Selection,
    highlights: &[Highlight],
) -> Vec<HighlightRange> {
    if selection.is_collapsed() {
        log::debug!("Ignoring collapsed selection");
        return Vec::new();
    }

    let range = selection.range(tree);
    let inside_root = range
        .common_ancestor(tree)
        .is_some_and(|common| tree.contains(root, common));
    if !inside_root {
        log::debug!("Ignoring selection outside the tracked root");
        return Vec::new();
    }

    let (Some(first), Some(last)) = (
        tree.paragraph_of(range.start.node),
        tree.paragraph_of(range.end.node),
    ) else {
        log::debug!("Ignoring selection that does not start and end in paragraphs");
        return Vec::new();
    };

    if first == last {
        let start = offset_of(tree, range.start, highlights);
        let end = offset_of(tree, range.end, highlights);
        return paragraph_range(tree, first, start, end).into_iter().collect();
    }

    let Some(common) = range.common_ancestor(tree) else {
        return Vec::new();
    };
    let paragraphs = paragraphs_between(tree, common, first, last);
    let count = paragraphs.len();

    paragraphs
        .into_iter()
        .enumerate()
        .filter_map(|(i, paragraph)| {
            let start = if i == 0 {
                offset_of(tree, range.start, highlights)
            } else {
                0
            };
            let end = if i + 1 == count {
                offset_of(tree, range.end, highlights)
            } else {
                paragraph_end(tree, paragraph)
            };
            paragraph_range(tree, paragraph, start, end)
        })
        .collect()
}

/// Paragraph roots from `first` through `last` in document order, walking
/// only the subtree of `common`
fn paragraphs_between(tree: &DocumentTree, common: NodeId, first: NodeId, last: NodeId) -> Vec<NodeId> {
    let ordered: Vec<NodeId> = tree
        .descendants(common)
        .into_iter()
        .filter(|n| tree.is_paragraph(*n))
        .collect();

    let position = |p: NodeId| ordered.iter().position(|n| *n == p);
    match (position(first), position(last)) {
        (Some(a), Some(b)) if a <= b => ordered[a..=b].to_vec(),
        (Some(a), Some(b)) => ordered[b..=a].to_vec(),
        _ => Vec::new(),
    }
}

/// Logical end of a paragraph, measured the same way as any other position
fn paragraph_end(tree: &DocumentTree, paragraph: NodeId) -> usize {
    offset_of(
        tree,
        BoundaryPoint::new(paragraph, tree.children(paragraph).len()),
        &[],
    )
}

fn paragraph_range(
    tree: &DocumentTree,
    paragraph: NodeId,
    start: usize,
    end: usize,
) -> Option<HighlightRange> {
    if start >= end {
        return None;
    }
    let element_id = tree.element_id(paragraph)?;
    let text: String = tree
        .text_content(paragraph)
        .chars()
        .skip(start)
        .take(end - start)
        .collect();
    if text.trim().is_empty() {
        log::debug!("Dropping whitespace-only range in paragraph {element_id}");
        return None;
    }
    Some(HighlightRange {
        element_id,
        start_offset: start,
        end_offset: end,
        text,
    })
}
