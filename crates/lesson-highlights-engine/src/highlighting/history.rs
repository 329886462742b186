//! Command History: undoable highlight mutations.
//!
//! Commands carry exactly the highlights they touch, captured when the
//! command is built, and apply as deltas to whatever collection is current
//! when they run. A redo after an unrelated rollback therefore never drops
//! highlights that arrived in between.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::{
    GroupId, Highlight, HighlightCollection, HighlightColor, HighlightId, HighlightRange,
};

/// A reversible transformation of a highlight collection
pub trait Command: fmt::Debug {
    fn execute(&self, current: &HighlightCollection) -> HighlightCollection;

    fn undo(&self, current: &HighlightCollection) -> HighlightCollection;

    /// Short label for logs and toolbars
    fn label(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightCommand {
    /// New highlights; a multi-range add shares one group id
    Add { added: Vec<Highlight> },
    /// A highlight and every group sibling, as they were before removal
    Remove { removed: Vec<Highlight> },
    /// New color for a highlight and its group; `before` keeps the old fields
    Recolor {
        before: Vec<Highlight>,
        color: HighlightColor,
        at: DateTime<Utc>,
    },
    /// Everything that was present when the clear was issued
    Clear { removed: Vec<Highlight> },
}

impl HighlightCommand {
    /// Add one highlight per range. Several ranges become one group.
    ///
    /// Returns `None` when there is nothing to add.
    pub fn add(ranges: &[HighlightRange], color: HighlightColor, now: DateTime<Utc>) -> Option<Self> {
        let ranges: Vec<&HighlightRange> = ranges.iter().filter(|r| !r.is_empty()).collect();
        let group_id = (ranges.len() > 1).then(GroupId::new);
        let added: Vec<Highlight> = ranges
            .into_iter()
            .map(|range| Highlight::from_range(range, color, group_id, now))
            .collect();
        (!added.is_empty()).then_some(HighlightCommand::Add { added })
    }

    /// Remove `id` together with its group. `None` if `id` is unknown.
    pub fn remove(collection: &HighlightCollection, id: HighlightId) -> Option<Self> {
        let removed = collection.affected_by(id);
        (!removed.is_empty()).then_some(HighlightCommand::Remove { removed })
    }

    /// Recolor `id` together with its group. `None` if `id` is unknown.
    pub fn recolor(
        collection: &HighlightCollection,
        id: HighlightId,
        color: HighlightColor,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let before = collection.affected_by(id);
        (!before.is_empty()).then_some(HighlightCommand::Recolor {
            before,
            color,
            at: now,
        })
    }

    /// Remove everything. `None` if the collection is already empty.
    pub fn clear(collection: &HighlightCollection) -> Option<Self> {
        (!collection.is_empty()).then(|| HighlightCommand::Clear {
            removed: collection.as_slice().to_vec(),
        })
    }

    /// Ids of the highlights this command touches
    pub fn touched(&self) -> Vec<HighlightId> {
        let highlights = match self {
            HighlightCommand::Add { added } => added,
            HighlightCommand::Remove { removed } | HighlightCommand::Clear { removed } => removed,
            HighlightCommand::Recolor { before, .. } => before,
        };
        highlights.iter().map(|h| h.id).collect()
    }
}

impl Command for HighlightCommand {
    fn execute(&self, current: &HighlightCollection) -> HighlightCollection {
        match self {
            HighlightCommand::Add { added } => current.with_added(added),
            HighlightCommand::Remove { .. } => current.without(&self.touched()),
            HighlightCommand::Recolor { color, at, .. } => {
                current.with_updated(&self.touched(), |h| {
                    h.color = *color;
                    h.updated_at = *at;
                })
            }
            HighlightCommand::Clear { .. } => HighlightCollection::new(),
        }
    }

    fn undo(&self, current: &HighlightCollection) -> HighlightCollection {
        match self {
            HighlightCommand::Add { .. } => current.without(&self.touched()),
            HighlightCommand::Remove { removed } | HighlightCommand::Clear { removed } => {
                current.with_added(removed)
            }
            HighlightCommand::Recolor { before, .. } => {
                let previous: HashMap<HighlightId, &Highlight> =
                    before.iter().map(|h| (h.id, h)).collect();
                current.with_updated(&self.touched(), |h| {
                    if let Some(old) = previous.get(&h.id) {
                        h.color = old.color;
                        h.updated_at = old.updated_at;
                    }
                })
            }
        }
    }

    fn label(&self) -> String {
        match self {
            HighlightCommand::Add { added } => format!("add {} highlight(s)", added.len()),
            HighlightCommand::Remove { removed } => format!("remove {} highlight(s)", removed.len()),
            HighlightCommand::Recolor { before, color, .. } => {
                format!("recolor {} highlight(s) {color}", before.len())
            }
            HighlightCommand::Clear { removed } => format!("clear {} highlight(s)", removed.len()),
        }
    }
}

/// Linear undo/redo stacks. A new command after an undo drops the redo stack.
#[derive(Debug)]
pub struct History<C = HighlightCommand> {
    undo_stack: Vec<C>,
    redo_stack: Vec<C>,
}

impl<C> Default for History<C> {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }
}

impl<C: Command> History<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `command` against `current` and record it
    pub fn apply(&mut self, command: C, current: &HighlightCollection) -> HighlightCollection {
        log::debug!("Executing {}", command.label());
        let next = command.execute(current);
        self.undo_stack.push(command);
        self.redo_stack.clear();
        next
    }

    /// Undo the latest command, or `None` when there is nothing to undo
    pub fn undo(&mut self, current: &HighlightCollection) -> Option<HighlightCollection> {
        let command = self.undo_stack.pop()?;
        log::debug!("Undoing {}", command.label());
        let next = command.undo(current);
        self.redo_stack.push(command);
        Some(next)
    }

    /// Re-execute the latest undone command
    pub fn redo(&mut self, current: &HighlightCollection) -> Option<HighlightCollection> {
        let command = self.redo_stack.pop()?;
        log::debug!("Redoing {}", command.label());
        let next = command.execute(current);
        self.undo_stack.push(command);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget everything, e.g. after loading another lesson
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
