//! Bounded, reversible history of triage decisions
//!
//! Undo works from full snapshots rather than deltas: each record carries
//! the file as it was before the decision, so reinserting it is exact.

use crate::decide::DecisionEngine;
use crate::domain::{Decision, FileId, FileRecord};
use crate::session::SessionStore;
use std::collections::VecDeque;

/// Maximum number of undoable actions; oldest is evicted first.
pub const HISTORY_CAP: usize = 50;

/// One reversible action.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub decision: Decision,
    /// The file exactly as it was before the decision was applied.
    pub snapshot: FileRecord,
    /// Cursor value (into the visible sequence) before the action.
    pub prior_cursor: usize,
    /// Index in the unfiltered working list, when it was recoverable.
    pub original_index: Option<usize>,
}

#[derive(Debug, Default)]
pub struct UndoHistory {
    entries: VecDeque<UndoRecord>,
}

impl UndoHistory {
    pub fn new() -> Self {
        UndoHistory::default()
    }

    pub fn record(&mut self, entry: UndoRecord) {
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_CAP {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Rolls back the most recent decision. Returns the restored file's id,
    /// or `None` when the history is empty, which is a normal negative
    /// result, not a fault.
    ///
    /// The file is reinserted at its original index when still valid, else
    /// at the pre-action cursor position, else at the tail. Counters and
    /// the pending/stacked/relocated collections are reversed, and the
    /// cursor moves to the restored file when the active filter lets it
    /// show, else back to the pre-action value.
    ///
    /// A file already sent to the real trash is only reinstated for
    /// re-review; nothing is restored on disk.
    pub fn undo_last(
        &mut self,
        session: &mut SessionStore,
        decisions: &mut DecisionEngine,
    ) -> Option<FileId> {
        let entry = self.entries.pop_back()?;
        let id = entry.snapshot.id;
        let size = entry.snapshot.size;

        let at_index = match entry.original_index {
            Some(i) if i <= session.working_len() => Some(i),
            _ if entry.prior_cursor <= session.working_len() => Some(entry.prior_cursor),
            _ => None,
        };
        session.reinsert(entry.snapshot, at_index);

        let counters = session.counters_mut();
        match entry.decision {
            Decision::Keep => {
                counters.kept = counters.kept.saturating_sub(1);
            }
            Decision::Bin => {
                counters.binned = counters.binned.saturating_sub(1);
                counters.reclaimed_bytes = counters.reclaimed_bytes.saturating_sub(size);
                decisions.take_pending(id);
            }
            Decision::Stack => {
                decisions.take_stacked(id);
            }
            Decision::Cloud => {
                decisions.take_relocated(id);
            }
        }

        match session.position_in_visible(id) {
            Some(position) => session.set_cursor(position),
            None => session.set_cursor(entry.prior_cursor),
        }

        Some(id)
    }
}
