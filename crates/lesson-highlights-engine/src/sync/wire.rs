use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{GroupId, Highlight, HighlightCollection, HighlightColor, LessonId};

/// Per-group data stored next to the flat highlight list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub color: HighlightColor,
}

/// The persisted document for one user and lesson
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHighlights {
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<GroupId, GroupInfo>>,
}

impl StoredHighlights {
    /// Flatten a collection, deriving the group map from grouped highlights
    pub fn from_collection(collection: &HighlightCollection) -> Self {
        let groups: BTreeMap<GroupId, GroupInfo> = collection
            .iter()
            .filter_map(|h| h.group_id.map(|g| (g, GroupInfo { color: h.color })))
            .collect();
        Self {
            highlights: collection.as_slice().to_vec(),
            groups: (!groups.is_empty()).then_some(groups),
        }
    }

    /// Rebuild the collection, taking each grouped highlight's color from the group map
    pub fn into_collection(self) -> HighlightCollection {
        let groups = self.groups.unwrap_or_default();
        self.highlights
            .into_iter()
            .map(|mut h| {
                if let Some(group_id) = h.group_id
                    && let Some(info) = groups.get(&group_id)
                {
                    h.color = info.color;
                }
                h
            })
            .collect()
    }
}

/// Body of a replace request to the HTTP backend
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceRequest<'a> {
    pub lesson_id: &'a LessonId,
    #[serde(flatten)]
    pub payload: &'a StoredHighlights,
}
