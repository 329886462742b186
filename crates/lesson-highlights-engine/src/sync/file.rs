use std::path::{Path, PathBuf};

use crate::io::{IoError, lesson_document_path, read_json, validate_store_dir, write_json};
use crate::models::LessonId;
use crate::sync::{HighlightStore, StoredHighlights, SyncError};

/// One JSON document per user and lesson: `<root>/<user>/<lesson>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    user_id: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, user_id: &str) -> Result<Self, IoError> {
        let root = root.into();
        validate_store_dir(&root)?;
        Ok(Self {
            root,
            user_id: user_id.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl HighlightStore for FileStore {
    fn load(&self, lesson: &LessonId) -> Result<StoredHighlights, SyncError> {
        let path = lesson_document_path(&self.user_id, lesson.as_str())?;
        Ok(read_json(&path, &self.root)?.unwrap_or_default())
    }

    fn replace(&self, lesson: &LessonId, document: &StoredHighlights) -> Result<(), SyncError> {
        let path = lesson_document_path(&self.user_id, lesson.as_str())?;
        write_json(&path, &self.root, document)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupId, HighlightCollection};
    use crate::tests::{create_test_store_dir, grouped, highlight};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_document_loads_empty() {
        let dir = create_test_store_dir();
        let store = FileStore::new(dir.path(), "alice").unwrap();

        let loaded = store.load(&LessonId::from("intro")).unwrap();

        assert_eq!(loaded, StoredHighlights::default());
    }

    #[test]
    fn test_replace_writes_per_user_document() {
        let dir = create_test_store_dir();
        let store = FileStore::new(dir.path(), "alice").unwrap();
        let group = GroupId::new();
        let collection = HighlightCollection::from_highlights([
            highlight("0", 1, 4),
            grouped("1", 0, 5, group),
            grouped("2", 0, 2, group),
        ]);
        let document = StoredHighlights::from_collection(&collection);

        store.replace(&LessonId::from("intro"), &document).unwrap();

        assert!(dir.path().join("alice").join("intro.json").is_file());
        assert_eq!(store.load(&LessonId::from("intro")).unwrap(), document);

        let other_user = FileStore::new(dir.path(), "bob").unwrap();
        assert!(other_user.load(&LessonId::from("intro")).unwrap().highlights.is_empty());
    }

    #[test]
    fn test_unsafe_lesson_id_is_rejected() {
        let dir = create_test_store_dir();
        let store = FileStore::new(dir.path(), "alice").unwrap();

        let err = store
            .replace(&LessonId::from("../../etc"), &StoredHighlights::default())
            .unwrap_err();

        assert!(matches!(err, SyncError::Io(IoError::InvalidSegment(_))));
    }

    #[test]
    fn test_root_must_be_a_directory() {
        let dir = create_test_store_dir();
        let file = crate::tests::create_test_file(&dir, "store", "");
        assert!(FileStore::new(file, "alice").is_err());
    }
}
