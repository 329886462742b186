//! Shared fixtures for unit tests

use std::path::PathBuf;

use chrono::Utc;
use tempfile::TempDir;

use crate::dom::{DocumentTree, NodeId};
use crate::models::{ElementId, GroupId, Highlight, HighlightColor, HighlightRange};

pub fn create_test_store_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

pub fn range(element: &str, start: usize, end: usize) -> HighlightRange {
    HighlightRange {
        element_id: ElementId::from(element),
        start_offset: start,
        end_offset: end,
        text: String::new(),
    }
}

pub fn highlight(element: &str, start: usize, end: usize) -> Highlight {
    Highlight::from_range(&range(element, start, end), HighlightColor::Yellow, None, Utc::now())
}

pub fn grouped(element: &str, start: usize, end: usize, group_id: GroupId) -> Highlight {
    Highlight::from_range(
        &range(element, start, end),
        HighlightColor::Yellow,
        Some(group_id),
        Utc::now(),
    )
}

/// One `<p>` per text, keyed "0", "1", ...; returns the text nodes
pub fn paragraphs_tree(texts: &[&str]) -> (DocumentTree, Vec<NodeId>) {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let nodes = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let p = tree.append_paragraph(root, "p", &ElementId::from(i));
            tree.append_text(p, text)
        })
        .collect();
    (tree, nodes)
}
