//! Offset Calculator: tree positions to logical-text offsets.
//!
//! A paragraph's logical text is its text content with every mark wrapper
//! ignored. Wrapping never changes that text, so a mark simply contributes
//! its full text length to anything after it.
//!
//! The one subtle case is a position inside an existing mark. There the
//! offset is resolved from the mark's persisted highlight rather than from a
//! fresh sum, so re-selecting inside highlighted text lands in that
//! highlight's own coordinate space.

use crate::dom::{BoundaryPoint, DocumentTree, HIGHLIGHT_ATTR, NodeId};
use crate::models::{Highlight, HighlightId};

/// A classified boundary point inside a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Outside any mark: `offset` is the plain sum of preceding text
    Plain { offset: usize },
    /// In a text node inside a mark for `highlight`
    InsideMark {
        highlight: HighlightId,
        /// Offset from the start of the highlight's first mark segment
        offset_in_mark: usize,
        /// Plain sum, used when the highlight is unknown
        fallback: usize,
    },
    /// On the mark element itself, between its children
    AtMark {
        highlight: HighlightId,
        offset_in_mark: usize,
        fallback: usize,
    },
}

impl Position {
    /// Classify `point`, which must lie inside a paragraph root
    pub fn classify(tree: &DocumentTree, point: BoundaryPoint) -> Self {
        let Some(paragraph) = tree.paragraph_of(point.node) else {
            return Position::Plain { offset: point.offset };
        };
        let local = local_offset(tree, point);
        let fallback = preceding_len(tree, point.node, paragraph) + local;

        let Some(mark) = tree.mark_of(point.node) else {
            return Position::Plain { offset: fallback };
        };
        let Some(highlight) = tree
            .attr(mark, HIGHLIGHT_ATTR)
            .and_then(|id| id.parse::<HighlightId>().ok())
        else {
            return Position::Plain { offset: fallback };
        };

        let offset_in_mark = lead_len(tree, paragraph, mark) + preceding_len(tree, point.node, mark) + local;
        if point.node == mark {
            Position::AtMark {
                highlight,
                offset_in_mark,
                fallback,
            }
        } else {
            Position::InsideMark {
                highlight,
                offset_in_mark,
                fallback,
            }
        }
    }

    /// Resolve against the persisted highlights
    pub fn resolve(self, highlights: &[Highlight]) -> usize {
        match self {
            Position::Plain { offset } => offset,
            Position::InsideMark {
                highlight,
                offset_in_mark,
                fallback,
            }
            | Position::AtMark {
                highlight,
                offset_in_mark,
                fallback,
            } => highlights
                .iter()
                .find(|h| h.id == highlight)
                .map(|h| h.start_offset + offset_in_mark)
                .unwrap_or(fallback),
        }
    }
}

/// Offset of `point` in its paragraph's logical text
pub fn offset_of(tree: &DocumentTree, point: BoundaryPoint, highlights: &[Highlight]) -> usize {
    Position::classify(tree, point).resolve(highlights)
}

/// Offset within the node itself: chars for text, child text for elements
fn local_offset(tree: &DocumentTree, point: BoundaryPoint) -> usize {
    if tree.is_text(point.node) {
        point.offset.min(tree.text_len(point.node))
    } else {
        tree.children(point.node)
            .iter()
            .take(point.offset)
            .map(|c| tree.text_len(*c))
            .sum()
    }
}

/// Text before `node` at every level up to (not including) `stop`
fn preceding_len(tree: &DocumentTree, node: NodeId, stop: NodeId) -> usize {
    tree.ancestors_inclusive(node)
        .take_while(|n| *n != stop)
        .flat_map(|n| tree.previous_siblings(n))
        .map(|sibling| tree.text_len(sibling))
        .sum()
}

/// Text of earlier segments of the same highlight within the paragraph.
///
/// A span crossing inline elements is painted as several marks sharing one
/// id; offsets inside a later segment count from the first one.
fn lead_len(tree: &DocumentTree, paragraph: NodeId, mark: NodeId) -> usize {
    let id = tree.attr(mark, HIGHLIGHT_ATTR);
    tree.marks(paragraph)
        .into_iter()
        .take_while(|m| *m != mark)
        .filter(|m| tree.attr(*m, HIGHLIGHT_ATTR) == id)
        .map(|m| tree.text_len(m))
        .sum()
}
