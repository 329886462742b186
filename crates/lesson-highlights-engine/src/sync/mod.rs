//! Sync Client: optimistic persistence of highlight collections.
//!
//! Every mutation replaces the whole lesson document. The in-memory
//! collection changes first; a failed call rolls back to the snapshot it
//! captured and leaves a notice for the host to show.

pub mod file;
pub mod http;
pub mod memory;
pub mod wire;

use chrono::{DateTime, Utc};

use crate::io::IoError;
use crate::models::{Highlight, HighlightCollection, LessonId};

pub use file::FileStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use wire::{GroupInfo, StoredHighlights};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Io(#[from] IoError),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid highlight data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Highlight store unavailable: {0}")]
    Unavailable(String),
}

/// Backend holding one highlight document per (user, lesson).
///
/// The user is part of the store's identity (a directory, a token).
pub trait HighlightStore {
    fn load(&self, lesson: &LessonId) -> Result<StoredHighlights, SyncError>;

    fn replace(&self, lesson: &LessonId, document: &StoredHighlights) -> Result<(), SyncError>;
}

impl<S: HighlightStore + ?Sized> HighlightStore for Box<S> {
    fn load(&self, lesson: &LessonId) -> Result<StoredHighlights, SyncError> {
        (**self).load(lesson)
    }

    fn replace(&self, lesson: &LessonId, document: &StoredHighlights) -> Result<(), SyncError> {
        (**self).replace(lesson, document)
    }
}

/// A transient failure message for the host to surface once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotice {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// An optimistic replace that has been applied locally but not settled
#[derive(Debug, Clone)]
#[must_use = "a staged sync must be settled"]
pub struct PendingSync {
    ticket: u64,
    lesson: LessonId,
    previous: HighlightCollection,
    next: HighlightCollection,
}

impl PendingSync {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// The document to send to the store
    pub fn document(&self) -> StoredHighlights {
        StoredHighlights::from_collection(&self.next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Saved,
    RolledBack { reason: String },
}

/// Optimistic client over a [`HighlightStore`] for the current lesson
#[derive(Debug)]
pub struct SyncClient<S> {
    store: S,
    lesson: Option<LessonId>,
    highlights: HighlightCollection,
    next_ticket: u64,
    in_flight: usize,
    notice: Option<SyncNotice>,
}

impl<S: HighlightStore> SyncClient<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            lesson: None,
            highlights: HighlightCollection::new(),
            next_ticket: 0,
            in_flight: 0,
            notice: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn lesson(&self) -> Option<&LessonId> {
        self.lesson.as_ref()
    }

    /// The collection as the user currently sees it
    pub fn highlights(&self) -> &HighlightCollection {
        &self.highlights
    }

    /// Number of staged calls not yet settled
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Load a lesson and make it current. On failure the current lesson
    /// switches anyway, with no highlights.
    pub fn load(&mut self, lesson: &LessonId) -> Result<Vec<Highlight>, SyncError> {
        self.lesson = Some(lesson.clone());
        self.highlights = HighlightCollection::new();
        let collection = self.store.load(lesson)?.into_collection();
        log::info!("Loaded {} highlight(s) for lesson {lesson}", collection.len());
        self.highlights = collection;
        Ok(self.highlights.as_slice().to_vec())
    }

    /// Apply `next` locally and capture the snapshot to roll back to
    pub fn stage(&mut self, lesson: &LessonId, next: HighlightCollection) -> PendingSync {
        self.next_ticket += 1;
        self.in_flight += 1;
        let previous = std::mem::replace(&mut self.highlights, next.clone());
        PendingSync {
            ticket: self.next_ticket,
            lesson: lesson.clone(),
            previous,
            next,
        }
    }

    /// Send a staged replace to the store
    pub fn send(&self, pending: &PendingSync) -> Result<(), SyncError> {
        self.store.replace(&pending.lesson, &pending.document())
    }

    /// Resolve a staged replace. Failures restore that call's own snapshot,
    /// whatever resolved in between.
    pub fn settle(&mut self, pending: PendingSync, result: Result<(), SyncError>) -> SyncOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(()) => {
                log::info!(
                    "Saved {} highlight(s) for lesson {} (sync #{})",
                    pending.next.len(),
                    pending.lesson,
                    pending.ticket
                );
                SyncOutcome::Saved
            }
            Err(e) => {
                log::warn!("Sync #{} failed, rolling back: {e}", pending.ticket);
                let relevant = self.lesson.as_ref() == Some(&pending.lesson);
                if relevant {
                    self.highlights = pending.previous;
                }
                self.notice = Some(SyncNotice {
                    message: format!("Failed to save highlights: {e}"),
                    at: Utc::now(),
                });
                SyncOutcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Stage, send and settle in one go
    pub fn batch_replace(&mut self, lesson: &LessonId, highlights: HighlightCollection) -> SyncOutcome {
        let pending = self.stage(lesson, highlights);
        let result = self.send(&pending);
        self.settle(pending, result)
    }

    /// The latest failure notice, cleared once taken
    pub fn take_notice(&mut self) -> Option<SyncNotice> {
        self.notice.take()
    }
}
