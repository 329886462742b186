//! Reconciliation: painting render plans onto a surface.
//!
//! Every repaint starts from scratch: a paragraph's marks are removed, its
//! text normalized, and the current plan painted again. Painting the same
//! collection twice therefore yields the same marks.

use std::collections::BTreeMap;

use crate::dom::{
    COLOR_ATTR, DocumentTree, GROUP_ATTR, GROUP_HOVER_ATTR, HIGHLIGHT_ATTR, MARK_TAG, NodeId,
    ROUNDING_ATTR,
};
use crate::highlighting::render::{RenderPlan, RenderSpan};
use crate::models::{ElementId, GroupId, HighlightCollection, HighlightId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaintError {
    #[error("Paragraph {0} is not in the document")]
    MissingParagraph(ElementId),
    #[error("Span {start}..{end} does not fit paragraph {element_id} of length {len}")]
    OutOfBounds {
        element_id: ElementId,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Something marks can be painted onto.
///
/// The engine ships [`DocumentTree`] and [`HtmlSurface`]; hosts plug in
/// their own (a browser DOM, a terminal) by implementing this trait.
pub trait MarkSurface {
    /// Keys of every tracked paragraph on the surface
    fn paragraphs(&self) -> Vec<ElementId>;

    /// Remove every mark from a paragraph, leaving its plain text
    fn clear(&mut self, element_id: &ElementId) -> Result<(), PaintError>;

    /// Paint one span of a paragraph's logical text as a mark
    fn paint(&mut self, element_id: &ElementId, span: &RenderSpan) -> Result<(), PaintError>;
}

/// Outcome of one render pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub painted: usize,
    /// Spans that did not match live text this pass; they stay persisted
    pub skipped: Vec<HighlightId>,
}

impl RenderReport {
    fn merge(&mut self, other: RenderReport) {
        self.painted += other.painted;
        self.skipped.extend(other.skipped);
    }
}

/// Clear one paragraph and paint its plan
pub fn render<S: MarkSurface + ?Sized>(surface: &mut S, plan: &RenderPlan) -> RenderReport {
    let mut report = RenderReport::default();
    if let Err(e) = surface.clear(&plan.element_id) {
        log::debug!("Skipping paragraph render: {e}");
        report.skipped = plan.spans.iter().map(|s| s.highlight_id).collect();
        return report;
    }
    for span in &plan.spans {
        match surface.paint(&plan.element_id, span) {
            Ok(()) => report.painted += 1,
            Err(e) => {
                log::debug!("Skipping highlight {} this pass: {e}", span.highlight_id);
                report.skipped.push(span.highlight_id);
            }
        }
    }
    report
}

/// Repaint every paragraph on the surface from the collection.
///
/// Paragraphs without highlights are cleared too, so removed highlights
/// disappear.
pub fn render_collection<S: MarkSurface + ?Sized>(
    surface: &mut S,
    collection: &HighlightCollection,
) -> RenderReport {
    let mut report = RenderReport::default();
    for element_id in surface.paragraphs() {
        let plan = RenderPlan::for_paragraph(collection, &element_id);
        report.merge(render(surface, &plan));
    }
    report
}

impl MarkSurface for DocumentTree {
    fn paragraphs(&self) -> Vec<ElementId> {
        self.paragraph_roots()
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    fn clear(&mut self, element_id: &ElementId) -> Result<(), PaintError> {
        let paragraph = self
            .paragraph(element_id)
            .ok_or_else(|| PaintError::MissingParagraph(element_id.clone()))?;
        for mark in self.marks(paragraph) {
            self.unwrap_to_text(mark);
        }
        self.normalize(paragraph);
        Ok(())
    }

    fn paint(&mut self, element_id: &ElementId, span: &RenderSpan) -> Result<(), PaintError> {
        let paragraph = self
            .paragraph(element_id)
            .ok_or_else(|| PaintError::MissingParagraph(element_id.clone()))?;
        let len = self.text_len(paragraph);
        if span.start >= span.end || span.end > len {
            return Err(PaintError::OutOfBounds {
                element_id: element_id.clone(),
                start: span.start,
                end: span.end,
                len,
            });
        }

        // Locate covered pieces before mutating anything
        let mut pieces: Vec<(NodeId, usize, usize)> = Vec::new();
        let mut cursor = 0;
        for node in self.text_nodes(paragraph) {
            let node_len = self.text_len(node);
            let node_end = cursor + node_len;
            if cursor < span.end && span.start < node_end {
                let local_start = span.start.saturating_sub(cursor);
                let local_end = span.end.min(node_end) - cursor;
                pieces.push((node, local_start, local_end));
            }
            cursor = node_end;
        }

        for (node, local_start, local_end) in pieces {
            let mut target = node;
            if local_start > 0 {
                target = self.split_text(target, local_start).unwrap_or(target);
            }
            if local_end - local_start < self.text_len(target) {
                self.split_text(target, local_end - local_start);
            }
            let mark = self.create_element(MARK_TAG);
            for (name, value) in mark_attributes(span) {
                self.set_attr(mark, name, &value);
            }
            self.wrap(target, mark);
        }
        Ok(())
    }
}

fn mark_attributes(span: &RenderSpan) -> Vec<(&'static str, String)> {
    let mut attrs = vec![
        (HIGHLIGHT_ATTR, span.highlight_id.to_string()),
        (COLOR_ATTR, span.color.name().to_string()),
        (ROUNDING_ATTR, span.rounding.name().to_string()),
        (
            "style",
            format!(
                "background-color: {}; border-radius: {}",
                span.color.background(),
                span.rounding.border_radius()
            ),
        ),
    ];
    if let Some(group_id) = span.group_id {
        attrs.push((GROUP_ATTR, group_id.to_string()));
    }
    attrs
}

/// Highlight id of the mark under `node`, for click handling
pub fn clicked_highlight(tree: &DocumentTree, node: NodeId) -> Option<HighlightId> {
    let mark = tree.mark_of(node)?;
    tree.attr(mark, HIGHLIGHT_ATTR)?.parse().ok()
}

/// Group of the mark under `node`, for hover handling
pub fn hovered_group(tree: &DocumentTree, node: NodeId) -> Option<GroupId> {
    let mark = tree.mark_of(node)?;
    tree.attr(mark, GROUP_ATTR)?.parse().ok()
}

/// Toggle the shared hover state on every paragraph holding a member of `group_id`.
///
/// While active, paragraphs that carry the state but no longer hold a
/// member are cleared. Returns the paragraphs whose state changed.
pub fn set_group_hover(tree: &mut DocumentTree, group_id: GroupId, active: bool) -> Vec<ElementId> {
    let key = group_id.to_string();
    let mut changed = Vec::new();
    for (element_id, paragraph) in tree.paragraph_roots() {
        let holds_member = tree
            .marks(paragraph)
            .into_iter()
            .any(|m| tree.attr(m, GROUP_ATTR) == Some(key.as_str()));
        let is_hovered = tree.attr(paragraph, GROUP_HOVER_ATTR) == Some(key.as_str());

        match (active && holds_member, is_hovered) {
            (true, false) => {
                tree.set_attr(paragraph, GROUP_HOVER_ATTR, &key);
                changed.push(element_id);
            }
            (false, true) => {
                tree.remove_attr(paragraph, GROUP_HOVER_ATTR);
                changed.push(element_id);
            }
            _ => {}
        }
    }
    changed
}

/// A paragraph known to [`HtmlSurface`]
#[derive(Debug, Clone)]
struct HtmlParagraph {
    tag: String,
    text: String,
    spans: Vec<RenderSpan>,
}

/// Renders paragraphs of plain logical text to HTML strings.
///
/// Useful for static export and server-side previews where no live tree
/// exists.
#[derive(Debug, Clone, Default)]
pub struct HtmlSurface {
    paragraphs: BTreeMap<ElementId, HtmlParagraph>,
    order: Vec<ElementId>,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a paragraph's logical text under `element_id`
    pub fn push_paragraph(&mut self, element_id: ElementId, tag: &str, text: &str) {
        if !self.paragraphs.contains_key(&element_id) {
            self.order.push(element_id.clone());
        }
        self.paragraphs.insert(
            element_id,
            HtmlParagraph {
                tag: tag.to_string(),
                text: text.to_string(),
                spans: Vec::new(),
            },
        );
    }

    /// Surface mirroring the paragraphs of a tree (text only)
    pub fn from_tree(tree: &DocumentTree) -> Self {
        let mut surface = Self::new();
        for (element_id, paragraph) in tree.paragraph_roots() {
            let tag = tree.tag(paragraph).unwrap_or("p").to_string();
            surface.push_paragraph(element_id, &tag, &tree.text_content(paragraph));
        }
        surface
    }

    pub fn paragraph_html(&self, element_id: &ElementId) -> Option<String> {
        let paragraph = self.paragraphs.get(element_id)?;
        let mut out = format!(
            "<{} {}=\"{}\">",
            paragraph.tag,
            crate::dom::PARAGRAPH_ATTR,
            html_escape::encode_double_quoted_attribute(element_id.as_str())
        );
        let chars: Vec<char> = paragraph.text.chars().collect();
        let mut cursor = 0;
        for span in &paragraph.spans {
            let before: String = chars[cursor..span.start].iter().collect();
            out.push_str(&html_escape::encode_text(&before));
            out.push_str("<mark");
            let mut attrs = mark_attributes(span);
            attrs.sort();
            for (name, value) in attrs {
                out.push_str(&format!(
                    " {name}=\"{}\"",
                    html_escape::encode_double_quoted_attribute(&value)
                ));
            }
            out.push('>');
            let inner: String = chars[span.start..span.end].iter().collect();
            out.push_str(&html_escape::encode_text(&inner));
            out.push_str("</mark>");
            cursor = span.end;
        }
        let rest: String = chars[cursor..].iter().collect();
        out.push_str(&html_escape::encode_text(&rest));
        out.push_str(&format!("</{}>", paragraph.tag));
        Some(out)
    }

    /// All paragraphs, in insertion order, one per line
    pub fn to_html(&self) -> String {
        self.order
            .iter()
            .filter_map(|id| self.paragraph_html(id))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl MarkSurface for HtmlSurface {
    fn paragraphs(&self) -> Vec<ElementId> {
        self.order.clone()
    }

    fn clear(&mut self, element_id: &ElementId) -> Result<(), PaintError> {
        let paragraph = self
            .paragraphs
            .get_mut(element_id)
            .ok_or_else(|| PaintError::MissingParagraph(element_id.clone()))?;
        paragraph.spans.clear();
        Ok(())
    }

    fn paint(&mut self, element_id: &ElementId, span: &RenderSpan) -> Result<(), PaintError> {
        let paragraph = self
            .paragraphs
            .get_mut(element_id)
            .ok_or_else(|| PaintError::MissingParagraph(element_id.clone()))?;
        let len = paragraph.text.chars().count();
        let overlaps = paragraph
            .spans
            .iter()
            .any(|s| s.start < span.end && span.start < s.end);
        if span.start >= span.end || span.end > len || overlaps {
            return Err(PaintError::OutOfBounds {
                element_id: element_id.clone(),
                start: span.start,
                end: span.end,
                len,
            });
        }
        let at = paragraph
            .spans
            .iter()
            .position(|s| s.start > span.start)
            .unwrap_or(paragraph.spans.len());
        paragraph.spans.insert(at, span.clone());
        Ok(())
    }
}
