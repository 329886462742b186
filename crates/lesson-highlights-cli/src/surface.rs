use std::io::Write;

use crossterm::{
    queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
};
use lesson_highlights_engine::highlighting::PaintError;
use lesson_highlights_engine::{DocumentTree, ElementId, HighlightId, MarkSurface, RenderSpan, Rounding};

struct TerminalParagraph {
    element_id: ElementId,
    heading: bool,
    text: String,
    spans: Vec<RenderSpan>,
}

/// Paragraph text painted with ANSI background colors
#[derive(Default)]
pub struct TerminalSurface {
    paragraphs: Vec<TerminalParagraph>,
}

impl TerminalSurface {
    pub fn from_tree(tree: &DocumentTree) -> Self {
        let paragraphs = tree
            .paragraph_roots()
            .into_iter()
            .map(|(element_id, node)| TerminalParagraph {
                element_id,
                heading: tree.tag(node).is_some_and(|tag| tag.starts_with('h')),
                text: tree.text_content(node),
                spans: Vec::new(),
            })
            .collect();
        Self { paragraphs }
    }

    fn paragraph_mut(&mut self, element_id: &ElementId) -> Result<&mut TerminalParagraph, PaintError> {
        self.paragraphs
            .iter_mut()
            .find(|p| &p.element_id == element_id)
            .ok_or_else(|| PaintError::MissingParagraph(element_id.clone()))
    }

    /// Write every paragraph, underlining spans whose highlight is `focused`
    pub fn draw<W: Write>(&self, out: &mut W, focused: &[HighlightId]) -> std::io::Result<()> {
        for paragraph in &self.paragraphs {
            queue!(
                out,
                SetForegroundColor(Color::DarkGrey),
                Print(format!("{:>3} ", paragraph.element_id.as_str())),
                ResetColor
            )?;
            if paragraph.heading {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }

            let chars: Vec<char> = paragraph.text.chars().collect();
            let mut cursor = 0;
            for span in &paragraph.spans {
                let before: String = chars[cursor..span.start].iter().collect();
                queue!(out, Print(before))?;

                let (r, g, b) = span.color.rgb();
                queue!(
                    out,
                    SetBackgroundColor(Color::Rgb { r, g, b }),
                    SetForegroundColor(Color::Black)
                )?;
                if focused.contains(&span.highlight_id) {
                    queue!(out, SetAttribute(Attribute::Underlined))?;
                }
                let inner: String = chars[span.start..span.end].iter().collect();
                queue!(
                    out,
                    Print(edge(span.rounding, true)),
                    Print(inner),
                    Print(edge(span.rounding, false)),
                    SetAttribute(Attribute::NoUnderline),
                    ResetColor
                )?;
                if paragraph.heading {
                    queue!(out, SetAttribute(Attribute::Bold))?;
                }
                cursor = span.end;
            }
            let rest: String = chars[cursor..].iter().collect();
            queue!(out, Print(rest), SetAttribute(Attribute::Reset), Print("\n"))?;
        }
        out.flush()
    }
}

/// Group edges are drawn as thin brackets where a browser would round corners
fn edge(rounding: Rounding, leading: bool) -> &'static str {
    match (rounding, leading) {
        (Rounding::Top, true) => "\u{23a1}",
        (Rounding::Bottom, false) => "\u{23a6}",
        _ => "",
    }
}

impl MarkSurface for TerminalSurface {
    fn paragraphs(&self) -> Vec<ElementId> {
        self.paragraphs.iter().map(|p| p.element_id.clone()).collect()
    }

    fn clear(&mut self, element_id: &ElementId) -> Result<(), PaintError> {
        self.paragraph_mut(element_id)?.spans.clear();
        Ok(())
    }

    fn paint(&mut self, element_id: &ElementId, span: &RenderSpan) -> Result<(), PaintError> {
        let paragraph = self.paragraph_mut(element_id)?;
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
        let at = paragraph.spans.partition_point(|s| s.start < span.start);
        paragraph.spans.insert(at, span.clone());
        Ok(())
    }
}
