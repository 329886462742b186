pub mod document;
pub mod dom;
pub mod highlighting;
pub mod io;
pub mod models;
pub mod session;
pub mod sync;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use document::lesson_tree;
pub use dom::{BoundaryPoint, DocumentTree, NodeId, Selection};
pub use highlighting::{
    Command, HighlightCommand, History, HtmlSurface, MarkSurface, NavStatus, Navigator, RenderPlan,
    RenderReport, RenderSpan, Rounding,
};
pub use io::IoError;
pub use models::*;
pub use session::{HighlightMode, HighlightSession};
pub use sync::{
    FileStore, HighlightStore, HttpStore, MemoryStore, StoredHighlights, SyncClient, SyncError,
    SyncNotice, SyncOutcome,
};
