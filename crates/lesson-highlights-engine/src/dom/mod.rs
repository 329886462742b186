//! In-memory stand-in for the host page's document tree.
//!
//! The highlighting core needs three things from a page: text nodes it can
//! measure, elements it can wrap and unwrap, and the reader's live selection.
//! [`DocumentTree`] provides all three so the offset, splitting and
//! reconciliation logic can run (and be tested) without a browser.

pub mod tree;

pub use tree::*;

use std::cmp::Ordering;

/// A position in the tree: a node plus an offset into it.
///
/// For text nodes the offset counts chars; for elements it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// The reader's live selection: where the drag started and where it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: BoundaryPoint,
    pub focus: BoundaryPoint,
}

impl Selection {
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// True when the reader dragged from end to start.
    ///
    /// Setting a range's end before its start collapses it, so a non-empty
    /// selection whose anchor-to-focus range collapses runs backwards.
    pub fn is_backward(&self, tree: &DocumentTree) -> bool {
        !self.is_collapsed() && Range::from_points(tree, self.anchor, self.focus).is_collapsed()
    }

    /// The selection as a forward range
    pub fn range(&self, tree: &DocumentTree) -> Range {
        if self.is_backward(tree) {
            Range::from_points(tree, self.focus, self.anchor)
        } else {
            Range::from_points(tree, self.anchor, self.focus)
        }
    }
}

/// A forward range between two boundary points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    /// Set start then end; an end before the start collapses onto the end
    pub fn from_points(tree: &DocumentTree, start: BoundaryPoint, end: BoundaryPoint) -> Self {
        if tree.compare_points(end, start) == Ordering::Less {
            Self { start: end, end }
        } else {
            Self { start, end }
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn common_ancestor(&self, tree: &DocumentTree) -> Option<NodeId> {
        tree.common_ancestor(self.start.node, self.end.node)
    }
}
