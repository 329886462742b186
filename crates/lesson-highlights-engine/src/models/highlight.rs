use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a persisted highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightId(pub Uuid);

impl HighlightId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HighlightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for HighlightId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Shared identifier of all highlights created from one multi-paragraph selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GroupId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque paragraph key handed out by the document renderer.
///
/// The renderer uses a monotonic per-render index, but nothing in the
/// engine relies on that beyond ordering paragraphs for navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric index if the key is one, used to order paragraphs
    pub fn index(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<usize> for ElementId {
    fn from(index: usize) -> Self {
        Self(index.to_string())
    }
}

/// Identifier of the lesson a highlight collection belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(pub String);

impl LessonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LessonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The fixed highlight palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Purple,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 4] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Blue,
        HighlightColor::Purple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Purple => "purple",
        }
    }

    /// Mark background as a CSS hex color
    pub fn background(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "#FFF9C4",
            HighlightColor::Green => "#C8E6C9",
            HighlightColor::Blue => "#BBDEFB",
            HighlightColor::Purple => "#E1BEE7",
        }
    }

    /// Foreground used on top of the background
    pub fn text(self) -> &'static str {
        "#000000"
    }

    /// Background as an RGB triple, for surfaces that cannot take CSS
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            HighlightColor::Yellow => (0xFF, 0xF9, 0xC4),
            HighlightColor::Green => (0xC8, 0xE6, 0xC9),
            HighlightColor::Blue => (0xBB, 0xDE, 0xFB),
            HighlightColor::Purple => (0xE1, 0xBE, 0xE7),
        }
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown highlight color: {0}")]
pub struct ParseColorError(pub String);

impl FromStr for HighlightColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HighlightColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

/// A paragraph-relative range produced by splitting a selection.
///
/// Ephemeral: it becomes a [`Highlight`] once a command adds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRange {
    pub element_id: ElementId,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Selected logical text, kept for display only
    pub text: String,
}

impl HighlightRange {
    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset >= self.end_offset
    }
}

/// A persisted colored span over a paragraph's logical text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: HighlightId,
    pub element_id: ElementId,
    pub start_offset: usize,
    pub end_offset: usize,
    pub color: HighlightColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Highlight {
    /// Build a fresh highlight from a split range
    pub fn from_range(
        range: &HighlightRange,
        color: HighlightColor,
        group_id: Option<GroupId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: HighlightId::new(),
            element_id: range.element_id.clone(),
            start_offset: range.start_offset,
            end_offset: range.end_offset,
            color,
            group_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_offset..self.end_offset
    }

    /// Zero-length and inverted ranges never render or persist
    pub fn is_valid(&self) -> bool {
        self.start_offset < self.end_offset
    }

    pub fn is_grouped(&self) -> bool {
        self.group_id.is_some()
    }

    /// Sort key for document order: paragraph index, then start offset
    pub fn document_key(&self) -> (u64, usize) {
        (self.element_id.index().unwrap_or(0), self.start_offset)
    }
}
