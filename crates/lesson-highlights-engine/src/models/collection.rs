use std::collections::HashSet;

use crate::models::{ElementId, GroupId, Highlight, HighlightId};

/// Where a highlight sits within its group, derived on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPosition {
    pub is_first: bool,
    pub is_last: bool,
}

impl GroupPosition {
    /// Position of an ungrouped highlight
    pub const SOLITARY: GroupPosition = GroupPosition {
        is_first: true,
        is_last: true,
    };
}

/// All highlights of one lesson for one user.
///
/// Unique by id and kept in insertion order, which is also document order
/// for the members of any group. Collections are values: every mutation
/// builds a new collection that is then handed to the sync client whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightCollection {
    highlights: Vec<Highlight>,
}

impl HighlightCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, dropping duplicate ids and zero-length ranges
    pub fn from_highlights(highlights: impl IntoIterator<Item = Highlight>) -> Self {
        let mut seen = HashSet::new();
        let highlights = highlights
            .into_iter()
            .filter(|h| {
                if !h.is_valid() {
                    log::debug!("Dropping zero-length highlight {}", h.id);
                    return false;
                }
                seen.insert(h.id)
            })
            .collect();
        Self { highlights }
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.iter()
    }

    pub fn as_slice(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn into_vec(self) -> Vec<Highlight> {
        self.highlights
    }

    pub fn get(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    pub fn contains(&self, id: HighlightId) -> bool {
        self.get(id).is_some()
    }

    /// Highlights anchored in one paragraph, in collection order
    pub fn for_paragraph<'a>(&'a self, element_id: &'a ElementId) -> impl Iterator<Item = &'a Highlight> {
        self.highlights
            .iter()
            .filter(move |h| &h.element_id == element_id)
    }

    /// Distinct paragraphs that carry at least one highlight
    pub fn paragraphs(&self) -> Vec<ElementId> {
        let mut seen = HashSet::new();
        self.highlights
            .iter()
            .filter(|h| seen.insert(&h.element_id))
            .map(|h| h.element_id.clone())
            .collect()
    }

    pub fn group_members(&self, group_id: GroupId) -> impl Iterator<Item = &Highlight> {
        self.highlights
            .iter()
            .filter(move |h| h.group_id == Some(group_id))
    }

    /// The highlight plus every group sibling; a mutation of one is a mutation of all
    pub fn affected_by(&self, id: HighlightId) -> Vec<Highlight> {
        match self.get(id) {
            Some(Highlight {
                group_id: Some(group_id),
                ..
            }) => self.group_members(*group_id).cloned().collect(),
            Some(highlight) => vec![highlight.clone()],
            None => Vec::new(),
        }
    }

    pub fn group_position(&self, highlight: &Highlight) -> GroupPosition {
        let Some(group_id) = highlight.group_id else {
            return GroupPosition::SOLITARY;
        };
        let mut members: Vec<&Highlight> = self.group_members(group_id).collect();
        members.sort_by_key(|h| h.document_key());
        GroupPosition {
            is_first: members.first().map(|h| h.id) == Some(highlight.id),
            is_last: members.last().map(|h| h.id) == Some(highlight.id),
        }
    }

    /// A new collection with `added` appended; ids already present are replaced in place
    pub fn with_added(&self, added: &[Highlight]) -> Self {
        let mut highlights = self.highlights.clone();
        for highlight in added {
            match highlights.iter_mut().find(|h| h.id == highlight.id) {
                Some(existing) => *existing = highlight.clone(),
                None => highlights.push(highlight.clone()),
            }
        }
        Self::from_highlights(highlights)
    }

    /// A new collection without the given ids
    pub fn without(&self, ids: &[HighlightId]) -> Self {
        Self {
            highlights: self
                .highlights
                .iter()
                .filter(|h| !ids.contains(&h.id))
                .cloned()
                .collect(),
        }
    }

    /// A new collection where `f` may rewrite each highlight in `ids`
    pub fn with_updated(&self, ids: &[HighlightId], mut f: impl FnMut(&mut Highlight)) -> Self {
        let mut highlights = self.highlights.clone();
        for highlight in highlights.iter_mut().filter(|h| ids.contains(&h.id)) {
            f(highlight);
        }
        Self { highlights }
    }
}

impl FromIterator<Highlight> for HighlightCollection {
    fn from_iter<T: IntoIterator<Item = Highlight>>(iter: T) -> Self {
        Self::from_highlights(iter)
    }
}

impl<'a> IntoIterator for &'a HighlightCollection {
    type Item = &'a Highlight;
    type IntoIter = std::slice::Iter<'a, Highlight>;

    fn into_iter(self) -> Self::IntoIter {
        self.highlights.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HighlightColor, HighlightRange};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn highlight(element: &str, start: usize, end: usize, group: Option<GroupId>) -> Highlight {
        let range = HighlightRange {
            element_id: ElementId::from(element),
            start_offset: start,
            end_offset: end,
            text: String::new(),
        };
        Highlight::from_range(&range, HighlightColor::Yellow, group, Utc::now())
    }

    #[test]
    fn test_from_highlights_drops_duplicates_and_zero_length() {
        let a = highlight("0", 0, 4, None);
        let empty = highlight("0", 3, 3, None);

        let collection = HighlightCollection::from_highlights([a.clone(), empty, a.clone()]);

        assert_eq!(collection.as_slice(), &[a]);
    }

    #[test]
    fn test_affected_by_expands_groups() {
        let group = GroupId::new();
        let first = highlight("0", 2, 8, Some(group));
        let second = highlight("1", 0, 5, Some(group));
        let loose = highlight("2", 1, 3, None);
        let collection =
            HighlightCollection::from_highlights([first.clone(), loose.clone(), second.clone()]);

        let ids: Vec<_> = collection.affected_by(second.id).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let ids: Vec<_> = collection.affected_by(loose.id).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![loose.id]);

        assert!(collection.affected_by(HighlightId::new()).is_empty());
    }

    #[test]
    fn test_group_position() {
        let group = GroupId::new();
        let members: Vec<_> = (0..3)
            .map(|i| highlight(&i.to_string(), 0, 4, Some(group)))
            .collect();
        let loose = highlight("4", 0, 2, None);
        let mut all = members.clone();
        all.push(loose.clone());
        let collection = HighlightCollection::from_highlights(all);

        let positions: Vec<_> = members.iter().map(|h| collection.group_position(h)).collect();
        assert_eq!(
            positions,
            vec![
                GroupPosition { is_first: true, is_last: false },
                GroupPosition { is_first: false, is_last: false },
                GroupPosition { is_first: false, is_last: true },
            ]
        );
        assert_eq!(collection.group_position(&loose), GroupPosition::SOLITARY);
    }

    #[test]
    fn test_group_position_follows_document_order() {
        let group = GroupId::new();
        let members: Vec<_> = (0..3)
            .rev()
            .map(|i| highlight(&i.to_string(), 0, 4, Some(group)))
            .collect();
        let collection = HighlightCollection::from_highlights(members.clone());

        // members[0] is paragraph "2", stored first
        assert_eq!(
            collection.group_position(&members[0]),
            GroupPosition { is_first: false, is_last: true }
        );
        assert_eq!(
            collection.group_position(&members[2]),
            GroupPosition { is_first: true, is_last: false }
        );
    }

    #[test]
    fn test_with_added_and_without_leave_original_untouched() {
        let a = highlight("0", 0, 4, None);
        let b = highlight("1", 2, 6, None);
        let original = HighlightCollection::from_highlights([a.clone()]);

        let grown = original.with_added(&[b.clone()]);
        let shrunk = grown.without(&[a.id]);

        assert_eq!(original.len(), 1);
        assert_eq!(grown.len(), 2);
        assert_eq!(shrunk.as_slice(), &[b]);
    }

    #[test]
    fn test_paragraphs_are_distinct_in_first_seen_order() {
        let collection = HighlightCollection::from_highlights([
            highlight("2", 0, 1, None),
            highlight("0", 0, 1, None),
            highlight("2", 3, 4, None),
        ]);
        assert_eq!(
            collection.paragraphs(),
            vec![ElementId::from("2"), ElementId::from("0")]
        );
    }
}
