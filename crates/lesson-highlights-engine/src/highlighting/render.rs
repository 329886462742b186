//! Render planning: persisted highlights to non-overlapping mark spans.
//!
//! This is the pure half of reconciliation. Painting the plan onto a
//! concrete surface lives in [`crate::highlighting::reconcile`].

use std::ops::Range;

use crate::models::{
    ElementId, GroupId, GroupPosition, Highlight, HighlightCollection, HighlightColor, HighlightId,
};

/// Corner rounding of a mark, stitching group members together visually
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Ungrouped, or the only member in view
    Full,
    /// First member of a group
    Top,
    /// Last member of a group
    Bottom,
    /// Interior member
    None,
}

impl Rounding {
    pub fn from_position(position: GroupPosition) -> Self {
        match (position.is_first, position.is_last) {
            (true, true) => Rounding::Full,
            (true, false) => Rounding::Top,
            (false, true) => Rounding::Bottom,
            (false, false) => Rounding::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rounding::Full => "full",
            Rounding::Top => "top",
            Rounding::Bottom => "bottom",
            Rounding::None => "none",
        }
    }

    pub fn border_radius(self) -> &'static str {
        match self {
            Rounding::Full => "2px",
            Rounding::Top => "2px 2px 0 0",
            Rounding::Bottom => "0 0 2px 2px",
            Rounding::None => "0",
        }
    }
}

/// One mark to paint: a render-only merge of one or more highlights
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSpan {
    /// Id of the earliest-starting highlight in the merge
    pub highlight_id: HighlightId,
    pub group_id: Option<GroupId>,
    pub color: HighlightColor,
    pub start: usize,
    pub end: usize,
    pub rounding: Rounding,
}

impl RenderSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Non-overlapping, sorted spans for one paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub element_id: ElementId,
    pub spans: Vec<RenderSpan>,
}

impl RenderPlan {
    /// Plan a paragraph from the whole collection
    pub fn for_paragraph(collection: &HighlightCollection, element_id: &ElementId) -> Self {
        let highlights: Vec<&Highlight> = collection.for_paragraph(element_id).collect();
        Self {
            element_id: element_id.clone(),
            spans: merge_spans(&highlights, |h| collection.group_position(h)),
        }
    }

    /// Plans for every paragraph carrying highlights
    pub fn for_collection(collection: &HighlightCollection) -> Vec<Self> {
        collection
            .paragraphs()
            .iter()
            .map(|element_id| Self::for_paragraph(collection, element_id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Sort by start and merge every span whose start is at or before the
/// running end. The merged span keeps the first highlight's id, color and
/// group; the highlights themselves are never modified.
pub fn merge_spans(
    highlights: &[&Highlight],
    position: impl Fn(&Highlight) -> GroupPosition,
) -> Vec<RenderSpan> {
    let mut sorted: Vec<&Highlight> = highlights.iter().copied().filter(|h| h.is_valid()).collect();
    sorted.sort_by_key(|h| h.start_offset);

    let mut spans: Vec<RenderSpan> = Vec::with_capacity(sorted.len());
    for highlight in sorted {
        if let Some(last) = spans.last_mut()
            && highlight.start_offset <= last.end
        {
            last.end = last.end.max(highlight.end_offset);
            continue;
        }
        spans.push(RenderSpan {
            highlight_id: highlight.id,
            group_id: highlight.group_id,
            color: highlight.color,
            start: highlight.start_offset,
            end: highlight.end_offset,
            rounding: Rounding::from_position(position(highlight)),
        });
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HighlightRange;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn highlight(start: usize, end: usize) -> Highlight {
        let range = HighlightRange {
            element_id: ElementId::from("0"),
            start_offset: start,
            end_offset: end,
            text: String::new(),
        };
        Highlight::from_range(&range, HighlightColor::Blue, None, Utc::now())
    }

    fn ranges(input: &[(usize, usize)]) -> Vec<(usize, usize)> {
        let highlights: Vec<_> = input.iter().map(|(s, e)| highlight(*s, *e)).collect();
        let refs: Vec<_> = highlights.iter().collect();
        merge_spans(&refs, |_| GroupPosition::SOLITARY)
            .iter()
            .map(|s| (s.start, s.end))
            .collect()
    }

    #[rstest]
    #[case::overlap(&[(0, 10), (5, 15)], &[(0, 15)])]
    #[case::unsorted(&[(20, 25), (0, 4)], &[(0, 4), (20, 25)])]
    #[case::adjacent(&[(0, 5), (5, 8)], &[(0, 8)])]
    #[case::contained(&[(0, 20), (3, 6), (8, 9)], &[(0, 20)])]
    #[case::chain(&[(0, 3), (2, 6), (6, 9), (12, 14)], &[(0, 9), (12, 14)])]
    #[case::zero_length_dropped(&[(4, 4), (6, 7)], &[(6, 7)])]
    fn test_merge(#[case] input: &[(usize, usize)], #[case] expected: &[(usize, usize)]) {
        assert_eq!(ranges(input), expected.to_vec());
    }

    #[test]
    fn test_rounding_of_group_stored_in_reverse() {
        let group = GroupId::new();
        let collection = HighlightCollection::from_highlights(
            ["2", "1", "0"].map(|element| crate::tests::grouped(element, 0, 3, group)),
        );

        let mut rounding: Vec<_> = RenderPlan::for_collection(&collection)
            .iter()
            .map(|plan| (plan.element_id.to_string(), plan.spans[0].rounding))
            .collect();
        rounding.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            rounding,
            vec![
                ("0".to_string(), Rounding::Top),
                ("1".to_string(), Rounding::None),
                ("2".to_string(), Rounding::Bottom),
            ]
        );
    }

    #[test]
    fn test_merge_keeps_first_highlight_identity_and_inputs() {
        let first = highlight(0, 10);
        let second = highlight(5, 15);
        let merged = merge_spans(&[&second, &first], |_| GroupPosition::SOLITARY);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].highlight_id, first.id);
        assert_eq!(merged[0].range(), 0..15);
        assert_eq!(first.range(), 0..10);
        assert_eq!(second.range(), 5..15);
    }

    #[rstest]
    #[case(true, true, Rounding::Full, "2px")]
    #[case(true, false, Rounding::Top, "2px 2px 0 0")]
    #[case(false, true, Rounding::Bottom, "0 0 2px 2px")]
    #[case(false, false, Rounding::None, "0")]
    fn test_rounding(
        #[case] is_first: bool,
        #[case] is_last: bool,
        #[case] expected: Rounding,
        #[case] radius: &str,
    ) {
        let rounding = Rounding::from_position(GroupPosition { is_first, is_last });
        assert_eq!(rounding, expected);
        assert_eq!(rounding.border_radius(), radius);
    }
}
