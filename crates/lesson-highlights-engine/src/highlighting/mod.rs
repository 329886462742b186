/*!
 * # Highlighting Core
 *
 * Everything between a finished text selection and painted marks:
 *
 * - **`offsets`**: maps tree positions to paragraph-relative offsets in the
 *   logical text, resolving positions inside existing marks through the
 *   persisted highlight
 * - **`splitter`**: turns one selection into one range per paragraph
 * - **`render`**: pure planning; overlapping highlights merge into
 *   non-overlapping spans with group rounding
 * - **`reconcile`**: paints a plan onto a [`MarkSurface`], idempotently
 * - **`history`**: undoable commands with a linear undo/redo stack
 * - **`navigation`**: reading-order cursor over highlights and groups
 *
 * ## Flow
 *
 * ```rust
 * use lesson_highlights_engine::dom::DocumentTree;
 * use lesson_highlights_engine::highlighting::*;
 * use lesson_highlights_engine::models::{ElementId, HighlightCollection, HighlightColor};
 *
 * let mut tree = DocumentTree::new();
 * let root = tree.root();
 * let p = tree.append_paragraph(root, "p", &ElementId::from("0"));
 * let text = tree.append_text(p, "Highlight me please");
 * tree.select(text, 10, text, 12);
 *
 * let ranges = split_selection(&mut tree, root, &[]);
 * let command = HighlightCommand::add(&ranges, HighlightColor::Yellow, chrono::Utc::now()).unwrap();
 * let mut history = History::new();
 * let collection = history.apply(command, &HighlightCollection::new());
 *
 * render_collection(&mut tree, &collection);
 * assert_eq!(tree.marks(p).len(), 1);
 * ```
 */

pub mod history;
pub mod navigation;
pub mod offsets;
pub mod reconcile;
pub mod render;
pub mod splitter;

pub use history::{Command, HighlightCommand, History};
pub use navigation::{NavEntry, NavStatus, Navigator};
pub use offsets::{Position, offset_of};
pub use reconcile::{
    HtmlSurface, MarkSurface, PaintError, RenderReport, clicked_highlight, hovered_group, render,
    render_collection, set_group_hover,
};
pub use render::{RenderPlan, RenderSpan, Rounding, merge_spans};
pub use splitter::{split, split_selection};
