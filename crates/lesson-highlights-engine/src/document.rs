//! Lesson Markdown to a [`DocumentTree`] with keyed paragraph roots.
//!
//! Every paragraph, heading and list item becomes a paragraph root carrying
//! a monotonic `data-paragraph-index`. Inline emphasis, strong, strikethrough,
//! links and code spans become nested elements inside it, which is exactly
//! the shape the offset calculator has to see through.

use pulldown_cmark::{Event, Parser, Tag};

use crate::dom::{DocumentTree, NodeId};
use crate::models::ElementId;

/// Build the lesson tree from Markdown
pub fn lesson_tree(markdown: &str) -> DocumentTree {
    let mut builder = LessonTreeBuilder::new();
    for event in Parser::new(markdown) {
        builder.process_event(event);
    }
    builder.finish()
}

#[derive(Debug, Clone, Copy)]
enum FrameKind {
    Block,
    /// A list item. Its own text goes into a paragraph root created on
    /// first use, so nested lists stay outside that root.
    Item { text_root: Option<NodeId> },
    Inline,
    /// Content that is not lesson text (HTML blocks, metadata)
    Skip,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    kind: FrameKind,
}

/// Turns pulldown-cmark events into tree nodes.
///
/// # Event Flow for List Items
///
/// Tight list items carry their text directly:
/// `Start(Item)`, `Text("first")`, `End(Item)`.
/// Loose items wrap it in paragraphs:
/// `Start(Item)`, `Start(Paragraph)`, `Text("first")`, `End(Paragraph)`, `End(Item)`.
///
/// A nested list appears inside its parent item, after the parent's text and
/// before the parent's `End(Item)`. Each `Start` pushes exactly one frame and
/// each `End` pops one.
struct LessonTreeBuilder {
    tree: DocumentTree,
    stack: Vec<Frame>,
    next_index: usize,
}

impl LessonTreeBuilder {
    fn new() -> Self {
        Self {
            tree: DocumentTree::new(),
            stack: Vec::new(),
            next_index: 0,
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => {
                self.stack.pop();
            }
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(parent) = self.inline_parent() {
                    let element = self.tree.append_element(parent, "code");
                    self.tree.append_text(element, &code);
                }
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.text("\n"),
            Event::Rule => {
                let parent = self.block_parent();
                self.tree.append_element(parent, "hr");
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                let parent = self.block_parent();
                let node = self.new_paragraph(parent, "p");
                self.push(node, FrameKind::Block);
            }
            Tag::Heading { level, .. } => {
                let parent = self.block_parent();
                let node = self.new_paragraph(parent, &format!("h{}", level as u8));
                self.push(node, FrameKind::Block);
            }
            Tag::List(first_number) => {
                let parent = self.block_parent();
                let tag = if first_number.is_some() { "ol" } else { "ul" };
                let node = self.tree.append_element(parent, tag);
                self.push(node, FrameKind::Block);
            }
            Tag::Item => {
                let parent = self.block_parent();
                let node = self.tree.append_element(parent, "li");
                self.push(node, FrameKind::Item { text_root: None });
            }
            Tag::BlockQuote(_) => {
                let parent = self.block_parent();
                let node = self.tree.append_element(parent, "blockquote");
                self.push(node, FrameKind::Block);
            }
            Tag::CodeBlock(_) => {
                let parent = self.block_parent();
                let pre = self.tree.append_element(parent, "pre");
                let code = self.tree.append_element(pre, "code");
                self.push(code, FrameKind::Inline);
            }
            Tag::Emphasis => self.start_inline("em"),
            Tag::Strong => self.start_inline("strong"),
            Tag::Strikethrough => self.start_inline("del"),
            Tag::Link { dest_url, .. } => {
                self.start_inline("a");
                if let Some(frame) = self.stack.last()
                    && matches!(frame.kind, FrameKind::Inline)
                {
                    self.tree.set_attr(frame.node, "href", &dest_url);
                }
            }
            Tag::Image { .. } => self.start_inline("span"),
            _ => {
                let node = self.block_parent();
                self.push(node, FrameKind::Skip);
            }
        }
    }

    fn start_inline(&mut self, tag: &str) {
        match self.inline_parent() {
            Some(parent) => {
                let node = self.tree.append_element(parent, tag);
                self.push(node, FrameKind::Inline);
            }
            None => {
                let node = self.tree.root();
                self.push(node, FrameKind::Skip);
            }
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(parent) = self.inline_parent() {
            self.tree.append_text(parent, text);
        }
    }

    fn push(&mut self, node: NodeId, kind: FrameKind) {
        self.stack.push(Frame { node, kind });
    }

    fn new_paragraph(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let element_id = ElementId::from(self.next_index);
        self.next_index += 1;
        self.tree.append_paragraph(parent, tag, &element_id)
    }

    /// Container for a new block; closes an item's implicit text root
    fn block_parent(&mut self) -> NodeId {
        match self.stack.last_mut() {
            Some(frame) => {
                if let FrameKind::Item { text_root } = &mut frame.kind {
                    *text_root = None;
                }
                frame.node
            }
            None => self.tree.root(),
        }
    }

    /// Container for inline content, or `None` where text is not lesson text
    fn inline_parent(&mut self) -> Option<NodeId> {
        let frame = *self.stack.last()?;
        match frame.kind {
            FrameKind::Block | FrameKind::Inline => Some(frame.node),
            FrameKind::Skip => None,
            FrameKind::Item { text_root: Some(root) } => Some(root),
            FrameKind::Item { text_root: None } => {
                let root = self.new_paragraph(frame.node, "p");
                if let Some(top) = self.stack.last_mut() {
                    top.kind = FrameKind::Item {
                        text_root: Some(root),
                    };
                }
                Some(root)
            }
        }
    }

    fn finish(mut self) -> DocumentTree {
        let root = self.tree.root();
        self.tree.normalize(root);
        self.tree
    }
}
