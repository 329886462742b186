use relative_path::{RelativePath, RelativePathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid store directory: {0}")]
    InvalidStoreDir(String),
    #[error("Invalid path segment: {0:?}")]
    InvalidSegment(String),
}

/// Read a file below `root` and return its content
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write content to a file below `root`, creating parent directories
pub fn write_file(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Read and deserialize a JSON document; `Ok(None)` if it does not exist yet
pub fn read_json<T: DeserializeOwned>(
    relative_path: &RelativePath,
    root: &Path,
) -> Result<Option<T>, IoError> {
    let content = match read_file(relative_path, root) {
        Ok(content) => content,
        Err(IoError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| IoError::Json {
            path: relative_path.to_path(root),
            source,
        })
}

/// Serialize as pretty JSON and write it
pub fn write_json<T: Serialize>(
    relative_path: &RelativePath,
    root: &Path,
    value: &T,
) -> Result<(), IoError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| IoError::Json {
        path: relative_path.to_path(root),
        source,
    })?;
    write_file(relative_path, root, &content)
}

/// `<user>/<lesson>.json`, rejecting segments that could escape the root
pub fn lesson_document_path(user: &str, lesson: &str) -> Result<RelativePathBuf, IoError> {
    let user = checked_segment(user)?;
    let lesson = checked_segment(lesson)?;
    Ok(RelativePathBuf::from(user).join(format!("{lesson}.json")))
}

fn checked_segment(segment: &str) -> Result<&str, IoError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(IoError::InvalidSegment(segment.to_string()));
    }
    Ok(segment)
}

pub fn validate_store_dir(path: &Path) -> Result<(), IoError> {
    if path.exists() && !path.is_dir() {
        return Err(IoError::InvalidStoreDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_store_dir};
    use rstest::rstest;

    #[test]
    fn test_read_file_success() {
        let store_dir = create_test_store_dir();
        create_test_file(&store_dir, "test.json", "{}");

        let content = read_file(RelativePath::new("test.json"), store_dir.path()).unwrap();
        assert_eq!(content, "{}");
    }

    #[test]
    fn test_read_file_not_found() {
        let store_dir = create_test_store_dir();
        let result = read_file(RelativePath::new("nonexistent.json"), store_dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let store_dir = create_test_store_dir();
        let relative_path = RelativePath::new("alice/lesson-1.json");

        write_file(relative_path, store_dir.path(), "[]").unwrap();

        assert_eq!(read_file(relative_path, store_dir.path()).unwrap(), "[]");
        assert!(store_dir.path().join("alice").is_dir());
    }

    #[test]
    fn test_write_file_overwrites_existing() {
        let store_dir = create_test_store_dir();
        create_test_file(&store_dir, "existing.json", "[1]");

        let relative_path = RelativePath::new("existing.json");
        write_file(relative_path, store_dir.path(), "[2]").unwrap();

        assert_eq!(read_file(relative_path, store_dir.path()).unwrap(), "[2]");
    }

    #[test]
    fn test_read_json_missing_is_none() {
        let store_dir = create_test_store_dir();
        let value: Option<Vec<u32>> = read_json(RelativePath::new("nope.json"), store_dir.path()).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_read_json_reports_path_on_bad_content() {
        let store_dir = create_test_store_dir();
        create_test_file(&store_dir, "broken.json", "{ not json");

        let result: Result<Option<Vec<u32>>, _> = read_json(RelativePath::new("broken.json"), store_dir.path());

        let err = result.unwrap_err();
        assert!(matches!(err, IoError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_json_round_trip() {
        let store_dir = create_test_store_dir();
        let relative_path = RelativePath::new("u/l.json");

        write_json(relative_path, store_dir.path(), &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<u32>> = read_json(relative_path, store_dir.path()).unwrap();

        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_lesson_document_path() {
        let path = lesson_document_path("alice", "intro-to-rust").unwrap();
        assert_eq!(path.as_str(), "alice/intro-to-rust.json");
    }

    #[rstest]
    #[case("", "lesson")]
    #[case("..", "lesson")]
    #[case("alice", "../escape")]
    #[case("a/b", "lesson")]
    fn test_lesson_document_path_rejects_unsafe_segments(#[case] user: &str, #[case] lesson: &str) {
        assert!(matches!(
            lesson_document_path(user, lesson),
            Err(IoError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_validate_store_dir() {
        let store_dir = create_test_store_dir();
        assert!(validate_store_dir(store_dir.path()).is_ok());
        assert!(validate_store_dir(&store_dir.path().join("not-yet-created")).is_ok());

        let file = create_test_file(&store_dir, "plain.txt", "x");
        assert!(matches!(
            validate_store_dir(&file),
            Err(IoError::InvalidStoreDir(_))
        ));
    }
}
