//! Stepping through highlights in reading order.

use std::collections::BTreeMap;

use crate::models::{GroupId, Highlight, HighlightCollection, HighlightId};

/// One stop for the navigator: a lone highlight or a whole group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub group_id: Option<GroupId>,
    /// Members in document order; never empty
    pub highlights: Vec<Highlight>,
}

impl NavEntry {
    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// The highlight to scroll to
    pub fn first(&self) -> &Highlight {
        &self.highlights[0]
    }

    fn sort_key(&self) -> (u64, usize) {
        self.first().document_key()
    }
}

/// Entries in document order: paragraph index, then start offset
pub fn entries(collection: &HighlightCollection) -> Vec<NavEntry> {
    let mut groups: BTreeMap<GroupId, Vec<Highlight>> = BTreeMap::new();
    let mut entries = Vec::new();
    for highlight in collection {
        match highlight.group_id {
            Some(group_id) => groups.entry(group_id).or_default().push(highlight.clone()),
            None => entries.push(NavEntry {
                group_id: None,
                highlights: vec![highlight.clone()],
            }),
        }
    }
    entries.extend(groups.into_iter().map(|(group_id, mut highlights)| {
        highlights.sort_by_key(Highlight::document_key);
        NavEntry {
            group_id: Some(group_id),
            highlights,
        }
    }));
    entries.sort_by_key(NavEntry::sort_key);
    entries
}

/// Where the navigator currently stands, 1-based for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavStatus {
    pub current: usize,
    pub count: usize,
    pub entry: NavEntry,
}

impl NavStatus {
    pub fn is_group(&self) -> bool {
        self.entry.is_group()
    }
}

/// Cursor over [`entries`], remembered by highlight id so it survives
/// collection changes
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    at: Option<HighlightId>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step forward, wrapping to the first entry
    pub fn next(&mut self, collection: &HighlightCollection) -> Option<NavStatus> {
        self.step(collection, |index, count| match index {
            Some(i) => (i + 1) % count,
            None => 0,
        })
    }

    /// Step back, wrapping to the last entry
    pub fn prev(&mut self, collection: &HighlightCollection) -> Option<NavStatus> {
        self.step(collection, |index, count| match index {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        })
    }

    /// Current position without moving; `None` before the first step or
    /// once the current entry is gone
    pub fn status(&self, collection: &HighlightCollection) -> Option<NavStatus> {
        let entries = entries(collection);
        let index = self.index_in(&entries)?;
        let count = entries.len();
        entries.into_iter().nth(index).map(|entry| NavStatus {
            current: index + 1,
            count,
            entry,
        })
    }

    pub fn reset(&mut self) {
        self.at = None;
    }

    fn index_in(&self, entries: &[NavEntry]) -> Option<usize> {
        let at = self.at?;
        entries
            .iter()
            .position(|e| e.highlights.iter().any(|h| h.id == at))
    }

    fn step(
        &mut self,
        collection: &HighlightCollection,
        advance: impl Fn(Option<usize>, usize) -> usize,
    ) -> Option<NavStatus> {
        let entries = entries(collection);
        if entries.is_empty() {
            self.at = None;
            return None;
        }
        let index = advance(self.index_in(&entries), entries.len());
        let count = entries.len();
        let entry = entries.into_iter().nth(index)?;
        self.at = Some(entry.first().id);
        Some(NavStatus {
            current: index + 1,
            count,
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ElementId, HighlightColor, HighlightRange};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn highlight(element: usize, start: usize, group: Option<GroupId>) -> Highlight {
        let range = HighlightRange {
            element_id: ElementId::from(element),
            start_offset: start,
            end_offset: start + 3,
            text: String::new(),
        };
        Highlight::from_range(&range, HighlightColor::Yellow, group, Utc::now())
    }

    #[test]
    fn test_entries_follow_document_order_and_collapse_groups() {
        let group = GroupId::new();
        let late = highlight(10, 0, None);
        let g2 = highlight(3, 0, Some(group));
        let early = highlight(2, 4, None);
        let g1 = highlight(2, 8, Some(group));
        let first = highlight(2, 0, None);
        let collection = HighlightCollection::from_highlights([
            late.clone(),
            g2.clone(),
            early.clone(),
            g1.clone(),
            first.clone(),
        ]);

        let order: Vec<_> = entries(&collection)
            .iter()
            .map(|e| e.highlights.iter().map(|h| h.id).collect::<Vec<_>>())
            .collect();

        assert_eq!(
            order,
            vec![
                vec![first.id],
                vec![early.id],
                vec![g1.id, g2.id],
                vec![late.id],
            ]
        );
    }

    #[test]
    fn test_next_and_prev_wrap() {
        let a = highlight(0, 0, None);
        let b = highlight(1, 0, None);
        let collection = HighlightCollection::from_highlights([a.clone(), b.clone()]);
        let mut navigator = Navigator::new();

        let status = navigator.next(&collection).unwrap();
        assert_eq!((status.current, status.count), (1, 2));
        assert_eq!(navigator.next(&collection).unwrap().entry.first().id, b.id);
        assert_eq!(navigator.next(&collection).unwrap().entry.first().id, a.id);
        assert_eq!(navigator.prev(&collection).unwrap().entry.first().id, b.id);
    }

    #[test]
    fn test_prev_from_start_goes_to_last() {
        let group = GroupId::new();
        let collection = HighlightCollection::from_highlights([
            highlight(0, 0, None),
            highlight(4, 0, Some(group)),
            highlight(5, 0, Some(group)),
        ]);
        let mut navigator = Navigator::new();

        let status = navigator.prev(&collection).unwrap();

        assert_eq!((status.current, status.count), (2, 2));
        assert!(status.is_group());
    }

    #[test]
    fn test_empty_collection() {
        let mut navigator = Navigator::new();
        let empty = HighlightCollection::new();
        assert_eq!(navigator.next(&empty), None);
        assert_eq!(navigator.status(&empty), None);
    }

    #[test]
    fn test_status_tracks_removed_entry() {
        let a = highlight(0, 0, None);
        let b = highlight(1, 0, None);
        let collection = HighlightCollection::from_highlights([a.clone(), b.clone()]);
        let mut navigator = Navigator::new();
        navigator.next(&collection);

        assert_eq!(navigator.status(&collection).unwrap().current, 1);
        let shrunk = collection.without(&[a.id]);
        assert_eq!(navigator.status(&shrunk), None);
        assert_eq!(navigator.next(&shrunk).unwrap().entry.first().id, b.id);
    }
}
