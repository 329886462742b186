//! The host-facing facade tying the pieces together.
//!
//! A [`HighlightSession`] owns the lesson tree, the sync client and the
//! command history. Hosts feed it UI events (selection end, click, hover,
//! color pick) and read back the collection and the painted tree.

use chrono::Utc;

use crate::dom::{DocumentTree, NodeId};
use crate::highlighting::{
    HighlightCommand, History, NavStatus, Navigator, RenderReport, clicked_highlight, hovered_group,
    render_collection, set_group_hover, split_selection,
};
use crate::models::{
    ElementId, GroupId, Highlight, HighlightCollection, HighlightColor, HighlightId, HighlightRange,
    LessonId,
};
use crate::sync::{HighlightStore, SyncClient, SyncError, SyncNotice, SyncOutcome};

/// Whether new selections become highlights, and in which color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightMode {
    pub enabled: bool,
    pub color: HighlightColor,
}

pub struct HighlightSession<S> {
    lesson: LessonId,
    tree: DocumentTree,
    root: NodeId,
    sync: SyncClient<S>,
    history: History,
    navigator: Navigator,
    mode: HighlightMode,
    hovered: Option<GroupId>,
    last_render: RenderReport,
}

impl<S: HighlightStore> HighlightSession<S> {
    /// A session over `tree`, tracking selections below its root
    pub fn new(store: S, lesson: LessonId, tree: DocumentTree) -> Self {
        let root = tree.root();
        Self {
            lesson,
            tree,
            root,
            sync: SyncClient::new(store),
            history: History::new(),
            navigator: Navigator::new(),
            mode: HighlightMode::default(),
            hovered: None,
            last_render: RenderReport::default(),
        }
    }

    /// Restrict selections to the subtree under `root`
    pub fn with_root(mut self, root: NodeId) -> Self {
        self.root = root;
        self
    }

    /// Load the lesson's highlights and paint them.
    ///
    /// A failed load leaves the lesson without highlights and is reported,
    /// never fatal.
    pub fn load(&mut self) -> Result<usize, SyncError> {
        self.history.reset();
        self.navigator.reset();
        let result = self.sync.load(&self.lesson).map(|loaded| loaded.len());
        if let Err(e) = &result {
            log::warn!("Could not load highlights for lesson {}: {e}", self.lesson);
        }
        self.render();
        result
    }

    pub fn lesson(&self) -> &LessonId {
        &self.lesson
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Mutable tree access for hosts that place the selection
    pub fn tree_mut(&mut self) -> &mut DocumentTree {
        &mut self.tree
    }

    pub fn highlights(&self) -> &HighlightCollection {
        self.sync.highlights()
    }

    pub fn lookup(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights().get(id)
    }

    pub fn store(&self) -> &S {
        self.sync.store()
    }

    // ---- mode ----

    pub fn mode(&self) -> HighlightMode {
        self.mode
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.mode.enabled = enabled;
        if !enabled {
            self.tree.clear_selection();
        }
    }

    pub fn toggle_mode(&mut self) -> bool {
        self.set_enabled(!self.mode.enabled);
        self.mode.enabled
    }

    /// Color for the next new highlight
    pub fn set_color(&mut self, color: HighlightColor) {
        self.mode.color = color;
    }

    // ---- mutations ----

    /// Turn the live selection into highlights.
    ///
    /// Returns `None` when nothing was added: mode off, collapsed or empty
    /// selection, or a selection outside the tracked root.
    pub fn on_selection_end(&mut self) -> Option<SyncOutcome> {
        if !self.mode.enabled {
            self.tree.clear_selection();
            return None;
        }
        let ranges = split_selection(&mut self.tree, self.root, self.sync.highlights().as_slice());
        self.add_ranges(&ranges)
    }

    /// Add one ungrouped highlight
    pub fn add_range(&mut self, range: HighlightRange) -> Option<SyncOutcome> {
        self.add_ranges(std::slice::from_ref(&range))
    }

    /// Add highlights; more than one range share a fresh group id
    pub fn add_ranges(&mut self, ranges: &[HighlightRange]) -> Option<SyncOutcome> {
        let command = HighlightCommand::add(ranges, self.mode.color, Utc::now())?;
        Some(self.commit(command))
    }

    /// Remove a highlight and its whole group
    pub fn remove(&mut self, id: HighlightId) -> Option<SyncOutcome> {
        let command = HighlightCommand::remove(self.sync.highlights(), id)?;
        Some(self.commit(command))
    }

    /// Recolor a highlight and its whole group
    pub fn recolor(&mut self, id: HighlightId, color: HighlightColor) -> Option<SyncOutcome> {
        let command = HighlightCommand::recolor(self.sync.highlights(), id, color, Utc::now())?;
        Some(self.commit(command))
    }

    pub fn clear(&mut self) -> Option<SyncOutcome> {
        let command = HighlightCommand::clear(self.sync.highlights())?;
        Some(self.commit(command))
    }

    pub fn undo(&mut self) -> Option<SyncOutcome> {
        let next = self.history.undo(self.sync.highlights())?;
        Some(self.persist(next))
    }

    pub fn redo(&mut self) -> Option<SyncOutcome> {
        let next = self.history.redo(self.sync.highlights())?;
        Some(self.persist(next))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn commit(&mut self, command: HighlightCommand) -> SyncOutcome {
        let next = self.history.apply(command, self.sync.highlights());
        self.persist(next)
    }

    fn persist(&mut self, next: HighlightCollection) -> SyncOutcome {
        let outcome = self.sync.batch_replace(&self.lesson, next);
        self.render();
        outcome
    }

    /// The latest sync failure, cleared once taken
    pub fn take_notice(&mut self) -> Option<SyncNotice> {
        self.sync.take_notice()
    }

    // ---- rendering and interaction ----

    /// Repaint every paragraph from the current collection
    pub fn render(&mut self) -> &RenderReport {
        self.last_render = render_collection(&mut self.tree, self.sync.highlights());
        if let Some(group_id) = self.hovered {
            let alive = self.sync.highlights().group_members(group_id).next().is_some();
            if !alive {
                self.hovered = None;
            }
            set_group_hover(&mut self.tree, group_id, alive);
        }
        &self.last_render
    }

    pub fn last_render(&self) -> &RenderReport {
        &self.last_render
    }

    /// The highlight under a clicked node, for the recolor/remove popover
    pub fn click(&self, node: NodeId) -> Option<&Highlight> {
        let id = clicked_highlight(&self.tree, node)?;
        self.lookup(id)
    }

    /// Pointer entered (`active`) or left a node. Returns the paragraphs
    /// whose group hover state changed.
    pub fn hover(&mut self, node: NodeId, active: bool) -> Vec<ElementId> {
        let Some(group_id) = hovered_group(&self.tree, node) else {
            return Vec::new();
        };
        self.hovered = active.then_some(group_id);
        set_group_hover(&mut self.tree, group_id, active)
    }

    pub fn next_highlight(&mut self) -> Option<NavStatus> {
        self.navigator.next(self.sync.highlights())
    }

    pub fn prev_highlight(&mut self) -> Option<NavStatus> {
        self.navigator.prev(self.sync.highlights())
    }

    pub fn navigation_status(&self) -> Option<NavStatus> {
        self.navigator.status(self.sync.highlights())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{GROUP_HOVER_ATTR, HIGHLIGHT_ATTR};
    use crate::sync::{MemoryStore, StoredHighlights};
    use crate::tests::{paragraphs_tree, range};
    use pretty_assertions::assert_eq;

    fn session(texts: &[&str]) -> (HighlightSession<MemoryStore>, Vec<NodeId>) {
        let (tree, nodes) = paragraphs_tree(texts);
        let mut session = HighlightSession::new(MemoryStore::new(), LessonId::from("l1"), tree);
        session.load().unwrap();
        session.set_enabled(true);
        (session, nodes)
    }

    #[test]
    fn test_selection_becomes_painted_persisted_highlight() {
        let (mut session, nodes) = session(&["Read this carefully"]);
        session.tree_mut().select(nodes[0], 5, nodes[0], 9);

        let outcome = session.on_selection_end();

        assert_eq!(outcome, Some(SyncOutcome::Saved));
        let highlight = session.highlights().as_slice()[0].clone();
        assert_eq!(highlight.range(), 5..9);
        assert_eq!(highlight.color, HighlightColor::Yellow);
        let p = session.tree().paragraph(&ElementId::from("0")).unwrap();
        let marks = session.tree().marks(p);
        assert_eq!(marks.len(), 1);
        assert_eq!(session.tree().text_content(marks[0]), "this");
        let stored = session.store().document(&LessonId::from("l1")).unwrap();
        assert_eq!(stored.highlights, vec![highlight]);
    }

    #[test]
    fn test_selection_ignored_when_mode_off() {
        let (mut session, nodes) = session(&["Read this carefully"]);
        session.set_enabled(false);
        session.tree_mut().select(nodes[0], 0, nodes[0], 4);

        assert_eq!(session.on_selection_end(), None);
        assert!(session.highlights().is_empty());
        assert!(session.tree().selection().is_none());
    }

    #[test]
    fn test_collapsed_selection_pushes_no_command() {
        let (mut session, nodes) = session(&["Read this carefully"]);
        session.tree_mut().select(nodes[0], 3, nodes[0], 3);

        assert_eq!(session.on_selection_end(), None);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_reselecting_inside_a_mark_uses_highlight_coordinates() {
        let (mut session, nodes) = session(&["Read this carefully"]);
        session.add_range(range("0", 5, 9));
        let p = session.tree().paragraph(&ElementId::from("0")).unwrap();
        let mark = session.tree().marks(p)[0];
        let inner = session.tree().children(mark)[0];
        let after = *session.tree().children(p).last().unwrap();
        assert_ne!(after, nodes[0]);

        // From "is" inside the mark to "care" after it
        session.tree_mut().select(inner, 2, after, 5);
        session.on_selection_end();

        let added = session.highlights().as_slice()[1].clone();
        assert_eq!(added.range(), 7..14);
    }

    #[test]
    fn test_click_and_recolor_group() {
        let (mut session, nodes) = session(&["One two", "Three four", "Five six"]);
        session.set_color(HighlightColor::Blue);
        session.tree_mut().select(nodes[0], 4, nodes[2], 4);
        session.on_selection_end();
        assert_eq!(session.highlights().len(), 3);

        let p = session.tree().paragraph(&ElementId::from("1")).unwrap();
        let mark = session.tree().marks(p)[0];
        let clicked = session.click(mark).unwrap().clone();
        assert_eq!(clicked.color, HighlightColor::Blue);

        session.recolor(clicked.id, HighlightColor::Green);

        assert!(session.highlights().iter().all(|h| h.color == HighlightColor::Green));
        let mark = session.tree().marks(p)[0];
        assert_eq!(session.tree().attr(mark, "data-color"), Some("green"));
    }

    #[test]
    fn test_remove_group_then_undo_redo() {
        let (mut session, nodes) = session(&["One two", "Three four", "Five six"]);
        session.tree_mut().select(nodes[0], 4, nodes[2], 4);
        session.on_selection_end();
        let grouped = session.highlights().clone();
        let middle = grouped.as_slice()[1].id;

        session.remove(middle);
        assert!(session.highlights().is_empty());
        assert!(session.tree().marks(session.tree().root()).is_empty());

        session.undo();
        assert_eq!(session.highlights(), &grouped);
        assert_eq!(session.tree().marks(session.tree().root()).len(), 3);

        session.redo();
        assert!(session.highlights().is_empty());
        assert!(session.can_undo());
        assert!(!session.can_redo());
    }

    #[test]
    fn test_failed_sync_rolls_back_paint_and_leaves_notice() {
        let (mut session, _) = session(&["Read this carefully"]);
        session.add_range(range("0", 0, 4));
        session.store().fail_with("network down");

        let outcome = session.add_range(range("0", 10, 19));

        assert!(matches!(outcome, Some(SyncOutcome::RolledBack { .. })));
        assert_eq!(session.highlights().len(), 1);
        assert_eq!(session.tree().marks(session.tree().root()).len(), 1);
        assert!(session.take_notice().unwrap().message.contains("network down"));
    }

    #[test]
    fn test_hover_marks_every_member_paragraph() {
        let (mut session, nodes) = session(&["One two", "Three four", "Five six"]);
        session.tree_mut().select(nodes[0], 4, nodes[1], 5);
        session.on_selection_end();

        let p0 = session.tree().paragraph(&ElementId::from("0")).unwrap();
        let mark = session.tree().marks(p0)[0];
        let changed = session.hover(mark, true);

        assert_eq!(changed, vec![ElementId::from("0"), ElementId::from("1")]);
        let p1 = session.tree().paragraph(&ElementId::from("1")).unwrap();
        assert!(session.tree().attr(p1, GROUP_HOVER_ATTR).is_some());

        // Repaints keep the hover state
        session.render();
        assert!(session.tree().attr(p1, GROUP_HOVER_ATTR).is_some());

        let mark = session.tree().marks(p0)[0];
        session.hover(mark, false);
        assert!(session.tree().attr(p1, GROUP_HOVER_ATTR).is_none());
    }

    #[test]
    fn test_removing_hovered_group_clears_hover_state() {
        let (mut session, nodes) = session(&["One two", "Three four"]);
        session.tree_mut().select(nodes[0], 4, nodes[1], 5);
        session.on_selection_end();
        let p0 = session.tree().paragraph(&ElementId::from("0")).unwrap();
        let mark = session.tree().marks(p0)[0];
        session.hover(mark, true);
        let id = session.click(mark).unwrap().id;

        session.remove(id);

        assert!(session.highlights().is_empty());
        let stuck: Vec<_> = session
            .tree()
            .paragraph_roots()
            .into_iter()
            .filter(|(_, p)| session.tree().attr(*p, GROUP_HOVER_ATTR).is_some())
            .map(|(element_id, _)| element_id)
            .collect();
        assert_eq!(stuck, Vec::<ElementId>::new());

        // Undo brings the group back without a stale hover
        session.undo();
        let p1 = session.tree().paragraph(&ElementId::from("1")).unwrap();
        assert!(session.tree().attr(p1, GROUP_HOVER_ATTR).is_none());
    }

    #[test]
    fn test_load_paints_stored_highlights_and_skips_stale_ones() {
        let (tree, _) = paragraphs_tree(&["Short"]);
        let stored = HighlightCollection::from_highlights([
            crate::tests::highlight("0", 0, 2),
            crate::tests::highlight("0", 7, 9),
            crate::tests::highlight("9", 0, 2),
        ]);
        let store = MemoryStore::new()
            .with_document(LessonId::from("l1"), StoredHighlights::from_collection(&stored));
        let mut session = HighlightSession::new(store, LessonId::from("l1"), tree);

        assert_eq!(session.load().unwrap(), 3);

        let marks = session.tree().marks(session.tree().root());
        assert_eq!(marks.len(), 1);
        assert_eq!(session.tree().text_content(marks[0]), "Sh");
        assert_eq!(session.last_render().skipped.len(), 1);
        assert_eq!(session.highlights().len(), 3);
    }

    #[test]
    fn test_clear_and_navigation() {
        let (mut session, _) = session(&["Alpha beta", "Gamma delta"]);
        session.add_range(range("1", 0, 5));
        session.add_range(range("0", 6, 10));

        let first = session.next_highlight().unwrap();
        assert_eq!((first.current, first.count), (1, 2));
        assert_eq!(first.entry.first().element_id, ElementId::from("0"));

        session.clear();
        assert!(session.highlights().is_empty());
        assert_eq!(session.next_highlight(), None);

        session.undo();
        assert_eq!(session.highlights().len(), 2);
        let p = session.tree().paragraph(&ElementId::from("0")).unwrap();
        let mark = session.tree().marks(p)[0];
        assert!(session.tree().attr(mark, HIGHLIGHT_ATTR).is_some());
    }
}
