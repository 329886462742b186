use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::dom::{BoundaryPoint, Selection};
use crate::models::ElementId;

/// Attribute carrying a paragraph's stable key
pub const PARAGRAPH_ATTR: &str = "data-paragraph-index";
/// Tag used for highlight marks
pub const MARK_TAG: &str = "mark";
/// Attribute carrying the highlight id on a mark
pub const HIGHLIGHT_ATTR: &str = "data-highlight";
/// Attribute carrying the group id on a grouped mark
pub const GROUP_ATTR: &str = "data-group";
pub const COLOR_ATTR: &str = "data-color";
pub const ROUNDING_ATTR: &str = "data-rounding";
/// Set on every paragraph root holding a member of the hovered group
pub const GROUP_HOVER_ATTR: &str = "data-highlight-group-hover";

/// Index of a node inside a [`DocumentTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Text(String),
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A minimal mutable document tree: elements with attributes and text leaves.
///
/// It stands in for the host page's DOM. Paragraph roots are elements carrying
/// [`PARAGRAPH_ATTR`]; highlight marks are [`MARK_TAG`] elements carrying
/// [`HIGHLIGHT_ATTR`]. All text offsets are counted in `char`s.
///
/// Nodes are never freed; detached nodes stay in the arena without a parent.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeId,
    pub(crate) selection: Option<Selection>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    pub fn new() -> Self {
        let root = Node {
            data: NodeData::Element {
                tag: "body".to_string(),
                attrs: BTreeMap::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            selection: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ---- construction ----

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Create and append an element
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        id
    }

    /// Create and append a text node
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    /// Create a paragraph root keyed by `element_id` under `parent`
    pub fn append_paragraph(&mut self, parent: NodeId, tag: &str, element_id: &ElementId) -> NodeId {
        let id = self.append_element(parent, tag);
        self.set_attr(id, PARAGRAPH_ATTR, element_id.as_str());
        id
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Put `replacement` where `node` was, detaching `node`
    pub fn replace_with(&mut self, node: NodeId, replacement: NodeId) {
        let Some(parent) = self.nodes[node.0].parent else {
            return;
        };
        self.detach(replacement);
        let index = self.index_in_parent(node).unwrap_or(0);
        self.nodes[parent.0].children[index] = replacement;
        self.nodes[replacement.0].parent = Some(parent);
        self.nodes[node.0].parent = None;
    }

    /// Replace an element with a single text node holding its text content
    pub fn unwrap_to_text(&mut self, node: NodeId) -> NodeId {
        let text = self.text_content(node);
        let replacement = self.create_text(&text);
        self.replace_with(node, replacement);
        replacement
    }

    /// Wrap `node` in a fresh `wrapper` element placed at its position
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) {
        self.replace_with(node, wrapper);
        self.append_child(wrapper, node);
    }

    /// Split a text node at `at` chars, returning the new trailing node
    pub fn split_text(&mut self, node: NodeId, at: usize) -> Option<NodeId> {
        let NodeData::Text(text) = &self.nodes[node.0].data else {
            return None;
        };
        if at > text.chars().count() {
            return None;
        }
        let byte = byte_index(text, at);
        let tail = text[byte..].to_string();
        let head = text[..byte].to_string();
        let parent = self.nodes[node.0].parent?;
        let index = self.index_in_parent(node)?;
        self.nodes[node.0].data = NodeData::Text(head);

        let tail_id = self.create_text(&tail);
        self.nodes[parent.0].children.insert(index + 1, tail_id);
        self.nodes[tail_id.0].parent = Some(parent);
        Some(tail_id)
    }

    /// Merge adjacent text nodes and drop empty ones below `node`
    pub fn normalize(&mut self, node: NodeId) {
        let children = self.nodes[node.0].children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            match &self.nodes[child.0].data {
                NodeData::Text(text) if text.is_empty() => {
                    self.nodes[child.0].parent = None;
                }
                NodeData::Text(text) => {
                    let text = text.clone();
                    if let Some(&prev) = kept.last()
                        && let NodeData::Text(prev_text) = &mut self.nodes[prev.0].data
                    {
                        prev_text.push_str(&text);
                        self.nodes[child.0].parent = None;
                    } else {
                        kept.push(child);
                    }
                }
                NodeData::Element { .. } => {
                    self.normalize(child);
                    kept.push(child);
                }
            }
        }
        self.nodes[node.0].children = kept;
    }

    // ---- attributes ----

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[node.0].data {
            attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[node.0].data {
            attrs.remove(name);
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[node.0].data {
            NodeData::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    pub fn attrs(&self, node: NodeId) -> Option<&BTreeMap<String, String>> {
        match &self.nodes[node.0].data {
            NodeData::Element { attrs, .. } => Some(attrs),
            NodeData::Text(_) => None,
        }
    }

    // ---- inspection ----

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].data, NodeData::Text(_))
    }

    pub fn is_mark(&self, node: NodeId) -> bool {
        self.tag(node) == Some(MARK_TAG) && self.attr(node, HIGHLIGHT_ATTR).is_some()
    }

    pub fn is_paragraph(&self, node: NodeId) -> bool {
        self.attr(node, PARAGRAPH_ATTR).is_some()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.nodes[node.0].parent?;
        self.nodes[parent.0].children.iter().position(|c| *c == node)
    }

    /// Siblings before `node`, nearest first
    pub fn previous_siblings(&self, node: NodeId) -> Vec<NodeId> {
        match (self.parent(node), self.index_in_parent(node)) {
            (Some(parent), Some(index)) => {
                self.children(parent)[..index].iter().rev().copied().collect()
            }
            _ => Vec::new(),
        }
    }

    /// `node` and its ancestors, nearest first
    pub fn ancestors_inclusive(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |n| self.parent(*n))
    }

    /// Nearest inclusive ancestor matching `pred`
    pub fn closest(&self, node: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.ancestors_inclusive(node).find(|n| pred(*n))
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_inclusive(node).any(|n| n == ancestor)
    }

    /// `node` and all its descendants in document order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Text leaves below `node` in document order
    pub fn text_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|n| self.is_text(*n))
            .collect()
    }

    pub fn text_content(&self, node: NodeId) -> String {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => text.clone(),
            NodeData::Element { .. } => self
                .children(node)
                .iter()
                .map(|c| self.text_content(*c))
                .collect(),
        }
    }

    /// Length of `text_content` in chars
    pub fn text_len(&self, node: NodeId) -> usize {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => text.chars().count(),
            NodeData::Element { .. } => self.children(node).iter().map(|c| self.text_len(*c)).sum(),
        }
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let of_a: Vec<_> = self.ancestors_inclusive(a).collect();
        self.ancestors_inclusive(b).find(|n| of_a.contains(n))
    }

    // ---- paragraphs and marks ----

    /// Paragraph root keyed by `element_id`
    pub fn paragraph(&self, element_id: &ElementId) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.attr(*n, PARAGRAPH_ATTR) == Some(element_id.as_str()))
    }

    /// Every paragraph root with its key, in document order
    pub fn paragraph_roots(&self) -> Vec<(ElementId, NodeId)> {
        self.descendants(self.root)
            .into_iter()
            .filter_map(|n| {
                self.attr(n, PARAGRAPH_ATTR)
                    .map(|key| (ElementId::from(key), n))
            })
            .collect()
    }

    pub fn element_id(&self, paragraph: NodeId) -> Option<ElementId> {
        self.attr(paragraph, PARAGRAPH_ATTR).map(ElementId::from)
    }

    /// Nearest inclusive paragraph ancestor
    pub fn paragraph_of(&self, node: NodeId) -> Option<NodeId> {
        self.closest(node, |n| self.is_paragraph(n))
    }

    /// Nearest inclusive mark ancestor, stopping at the paragraph root
    pub fn mark_of(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors_inclusive(node)
            .take_while(|n| !self.is_paragraph(*n))
            .find(|n| self.is_mark(*n))
    }

    /// Highlight marks below `node` in document order
    pub fn marks(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|n| self.is_mark(*n))
            .collect()
    }

    /// Text position `offset` chars into `paragraph`'s text content.
    ///
    /// A position on a node boundary lands at the start of the later node,
    /// except at the very end.
    pub fn point_at(&self, paragraph: NodeId, offset: usize) -> Option<BoundaryPoint> {
        let mut cursor = 0;
        let mut last = None;
        for node in self.text_nodes(paragraph) {
            let len = self.text_len(node);
            if offset < cursor + len {
                return Some(BoundaryPoint::new(node, offset - cursor));
            }
            cursor += len;
            last = Some((node, len));
        }
        match last {
            Some((node, len)) if offset == cursor => Some(BoundaryPoint::new(node, len)),
            _ => None,
        }
    }

    // ---- ordering ----

    /// Child-index path from the root, used for document order
    fn path(&self, node: NodeId) -> Vec<usize> {
        let mut path: Vec<_> = self
            .ancestors_inclusive(node)
            .filter_map(|n| self.index_in_parent(n))
            .collect();
        path.reverse();
        path
    }

    /// Document order of two nodes; ancestors sort before descendants
    pub fn compare_nodes(&self, a: NodeId, b: NodeId) -> Ordering {
        self.path(a).cmp(&self.path(b))
    }

    /// Document order of two boundary points
    pub fn compare_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        if self.contains(a.node, b.node) {
            return self.compare_with_descendant(a, b.node);
        }
        if self.contains(b.node, a.node) {
            return self.compare_with_descendant(b, a.node).reverse();
        }
        self.compare_nodes(a.node, b.node)
    }

    /// `outer.node` is a proper ancestor of `inner`
    fn compare_with_descendant(&self, outer: BoundaryPoint, inner: NodeId) -> Ordering {
        let child = self
            .ancestors_inclusive(inner)
            .find(|n| self.parent(*n) == Some(outer.node));
        match child.and_then(|c| self.index_in_parent(c)) {
            Some(index) if index < outer.offset => Ordering::Greater,
            _ => Ordering::Less,
        }
    }

    // ---- selection ----

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    /// Select from `(anchor, anchor_offset)` to `(focus, focus_offset)`
    pub fn select(&mut self, anchor: NodeId, anchor_offset: usize, focus: NodeId, focus_offset: usize) {
        self.selection = Some(Selection {
            anchor: BoundaryPoint::new(anchor, anchor_offset),
            focus: BoundaryPoint::new(focus, focus_offset),
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // ---- serialization ----

    /// Serialize `node` as HTML, for debugging and tests
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                for child in self.children(node) {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Byte index of the `chars`-th char, clamped to the string end
pub(crate) fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
