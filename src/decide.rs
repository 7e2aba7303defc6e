//! Decision engine: applies triage decisions and owns their side effects
//!
//! Mutations run on the coordinating context only. A failed trash request
//! never rolls a decision back: the decision records triage intent, not
//! I/O success, so it is reported upward and the accounting stands.

use crate::domain::{Decision, FileId, FileRecord};
use crate::error::{DesksweepError, MoveError, Result};
use crate::session::SessionStore;
use crate::source::{CloudMover, FileMover};
use crate::undo::{UndoHistory, UndoRecord};
use tracing::warn;

/// Whether Bin decisions hit the trash immediately or collect for an
/// end-of-session review pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinMode {
    #[default]
    Immediate,
    Deferred,
}

/// What a (bulk) apply actually did.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub applied: Vec<FileId>,
    /// Absorbed mover failures, for reporting.
    pub move_failures: Vec<MoveError>,
}

pub struct DecisionEngine {
    mode: BinMode,
    mover: Box<dyn FileMover>,
    cloud: Box<dyn CloudMover>,
    pending_bin: Vec<FileRecord>,
    stacked: Vec<FileRecord>,
    relocated: Vec<FileRecord>,
}

impl DecisionEngine {
    pub fn new(mode: BinMode, mover: Box<dyn FileMover>, cloud: Box<dyn CloudMover>) -> Self {
        DecisionEngine {
            mode,
            mover,
            cloud,
            pending_bin: Vec::new(),
            stacked: Vec::new(),
            relocated: Vec::new(),
        }
    }

    pub fn mode(&self) -> BinMode {
        self.mode
    }

    /// Files binned in deferred mode, awaiting the commit pass.
    pub fn pending_bin(&self) -> &[FileRecord] {
        &self.pending_bin
    }

    /// Files set aside for later.
    pub fn stacked(&self) -> &[FileRecord] {
        &self.stacked
    }

    /// Files handed to the cloud relocator.
    pub fn relocated(&self) -> &[FileRecord] {
        &self.relocated
    }

    /// Drops all collections for a fresh session.
    pub fn reset(&mut self) {
        self.pending_bin.clear();
        self.stacked.clear();
        self.relocated.clear();
    }

    /// Applies one decision to one file: records the undo entry, removes
    /// the file from the store (which drops its suggestion cache entry),
    /// updates counters and collections, then re-settles the cursor.
    pub fn apply(
        &mut self,
        session: &mut SessionStore,
        history: &mut UndoHistory,
        decision: Decision,
        id: FileId,
    ) -> Result<ApplyOutcome> {
        let prior_cursor = session.cursor();
        let (record, index) = session
            .remove(id)
            .ok_or(DesksweepError::UnknownFile(id))?;

        history.record(UndoRecord {
            decision,
            snapshot: record.clone(),
            prior_cursor,
            original_index: Some(index),
        });

        let mut outcome = ApplyOutcome::default();
        self.commit(session, record, decision, &mut outcome);
        session.settle_cursor();

        Ok(outcome)
    }

    /// Bulk variant: commits every file in the set, then settles the
    /// cursor exactly once so no partial state is observable mid-batch.
    /// Ids no longer in the working list are skipped. Bulk applications
    /// are not individually undoable.
    pub fn apply_all(
        &mut self,
        session: &mut SessionStore,
        decision: Decision,
        ids: &[FileId],
    ) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for &id in ids {
            if let Some((record, _)) = session.remove(id) {
                self.commit(session, record, decision, &mut outcome);
            }
        }

        session.settle_cursor();
        outcome
    }

    fn commit(
        &mut self,
        session: &mut SessionStore,
        mut record: FileRecord,
        decision: Decision,
        outcome: &mut ApplyOutcome,
    ) {
        record.decision = Some(decision);
        outcome.applied.push(record.id);

        match decision {
            Decision::Keep => {
                session.counters_mut().kept += 1;
            }
            Decision::Bin => {
                let counters = session.counters_mut();
                counters.binned += 1;
                counters.reclaimed_bytes += record.size;

                match self.mode {
                    BinMode::Immediate => {
                        if let Err(e) = self.mover.trash(&record) {
                            warn!("trash request failed, decision stands: {}", e);
                            outcome.move_failures.push(e);
                        }
                    }
                    BinMode::Deferred => self.pending_bin.push(record),
                }
            }
            Decision::Stack => self.stacked.push(record),
            Decision::Cloud => {
                if let Err(e) = self.cloud.relocate(&record) {
                    warn!("cloud relocation failed, decision stands: {}", e);
                    outcome.move_failures.push(e);
                }
                self.relocated.push(record);
            }
        }
    }

    /// Returns a deferred-mode pending file to the working list and
    /// reverses its bin accounting. `false` when the id is not pending.
    pub fn restore_from_bin(&mut self, session: &mut SessionStore, id: FileId) -> bool {
        let Some(record) = self.take_pending(id) else {
            return false;
        };

        let counters = session.counters_mut();
        counters.binned = counters.binned.saturating_sub(1);
        counters.reclaimed_bytes = counters.reclaimed_bytes.saturating_sub(record.size);

        session.reinsert(record, None);
        true
    }

    /// Flushes the pending-bin collection through the mover. Failures are
    /// collected, not retried; the files stay binned in the accounting
    /// either way.
    pub fn commit_pending(&mut self) -> Vec<MoveError> {
        let mut failures = Vec::new();

        for record in self.pending_bin.drain(..) {
            if let Err(e) = self.mover.trash(&record) {
                warn!("trash request failed during commit: {}", e);
                failures.push(e);
            }
        }

        failures
    }

    pub(crate) fn take_pending(&mut self, id: FileId) -> Option<FileRecord> {
        take_by_id(&mut self.pending_bin, id)
    }

    pub(crate) fn take_stacked(&mut self, id: FileId) -> Option<FileRecord> {
        take_by_id(&mut self.stacked, id)
    }

    pub(crate) fn take_relocated(&mut self, id: FileId) -> Option<FileRecord> {
        take_by_id(&mut self.relocated, id)
    }
}

fn take_by_id(records: &mut Vec<FileRecord>, id: FileId) -> Option<FileRecord> {
    let index = records.iter().position(|r| r.id == id)?;
    Some(records.remove(index))
}
