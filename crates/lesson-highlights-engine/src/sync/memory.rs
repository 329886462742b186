use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::LessonId;
use crate::sync::{HighlightStore, StoredHighlights, SyncError};

/// In-process store with failure injection, for tests and offline demos
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<LessonId, StoredHighlights>>,
    failing: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a lesson's document
    pub fn with_document(self, lesson: LessonId, document: StoredHighlights) -> Self {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(lesson, document);
        self
    }

    /// Make every following call fail with `reason` until [`Self::recover`]
    pub fn fail_with(&self, reason: &str) {
        *self.failing.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason.to_string());
    }

    pub fn recover(&self) {
        *self.failing.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// What the store currently holds for a lesson
    pub fn document(&self, lesson: &LessonId) -> Option<StoredHighlights> {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(lesson)
            .cloned()
    }

    fn check(&self) -> Result<(), SyncError> {
        match &*self.failing.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(reason) => Err(SyncError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl HighlightStore for MemoryStore {
    fn load(&self, lesson: &LessonId) -> Result<StoredHighlights, SyncError> {
        self.check()?;
        Ok(self.document(lesson).unwrap_or_default())
    }

    fn replace(&self, lesson: &LessonId, document: &StoredHighlights) -> Result<(), SyncError> {
        self.check()?;
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(lesson.clone(), document.clone());
        Ok(())
    }
}
