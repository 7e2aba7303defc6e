//! Engine facade: the command surface over one declutter session
//!
//! One `DesksweepEngine` owns the session store, decision engine, undo
//! history, and the background workers, and serializes every mutation.
//! Reading `current()` is the sole trigger for suggestion recomputation;
//! `poll()` drains background completions into committed state. State is
//! pull-based, with an event channel for change notification.

use crate::async_suggest::SuggestionPump;
use crate::decide::{ApplyOutcome, BinMode, DecisionEngine};
use crate::domain::{Decision, FileId, FileKind, FileRecord, SessionCounters};
use crate::error::{DesksweepError, Result};
use crate::review::{derive_smart_actions, ReviewContext, SmartAction};
use crate::session::SessionStore;
use crate::source::{CloudMover, FileMover, FileSource};
use crate::suggest::{Suggestion, SuggestionId, SuggestionThresholds};
use crate::thumbs::{ThumbnailFetcher, ThumbnailProvider};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Change notifications. State itself is read back through the engine's
/// query methods; events only say that something changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Loaded { count: usize },
    FilterChanged { filter: Option<FileKind> },
    FocusChanged { id: Option<FileId> },
    SuggestionsReady { id: FileId, count: usize },
    DecisionApplied { decision: Decision, ids: Vec<FileId> },
    MoveFailed { path: String, reason: String },
    Undone { id: FileId },
    ReviewOpened { members: usize },
    ReviewClosed,
}

/// Session-level options fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub bin_mode: BinMode,
    pub thresholds: SuggestionThresholds,
}

pub struct DesksweepEngine {
    source: Box<dyn FileSource>,
    session: SessionStore,
    decisions: DecisionEngine,
    undo: crate::undo::UndoHistory,
    pump: SuggestionPump,
    thumbs: ThumbnailFetcher,
    review: Option<ReviewContext>,
    thresholds: SuggestionThresholds,
    last_focus: Option<FileId>,
    loaded_count: usize,
    subscribers: Vec<mpsc::UnboundedSender<EngineEvent>>,
}

impl DesksweepEngine {
    pub fn new(
        source: Box<dyn FileSource>,
        thumbnails: Arc<dyn ThumbnailProvider>,
        mover: Box<dyn FileMover>,
        cloud: Box<dyn CloudMover>,
        options: EngineOptions,
    ) -> Result<Self> {
        let pump = SuggestionPump::new(options.thresholds.clone())?;
        let thumbs = ThumbnailFetcher::new(thumbnails, pump.runtime_handle());

        Ok(DesksweepEngine {
            source,
            session: SessionStore::new(),
            decisions: DecisionEngine::new(options.bin_mode, mover, cloud),
            undo: crate::undo::UndoHistory::new(),
            pump,
            thumbs,
            review: None,
            thresholds: options.thresholds,
            last_focus: None,
            loaded_count: 0,
            subscribers: Vec::new(),
        })
    }

    /// Registers a change listener.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EngineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Enumerates the location and starts a fresh session over it. On a
    /// scan failure the error is surfaced and the working list is empty.
    pub fn load_session(&mut self, location: &std::path::Path) -> Result<usize> {
        self.pump.cancel();
        self.review = None;
        self.undo.clear();
        self.decisions.reset();
        self.last_focus = None;

        let records = match self.source.enumerate(location) {
            Ok(records) => records,
            Err(e) => {
                self.session.load(Vec::new());
                self.loaded_count = 0;
                return Err(e);
            }
        };

        let count = records.len();
        self.session.load(records);
        self.loaded_count = count;
        info!("session loaded with {} files", count);

        self.emit(EngineEvent::Loaded { count });
        self.refresh_focus();
        Ok(count)
    }

    /// Replaces the active type filter and resets the cursor.
    pub fn set_filter(&mut self, filter: Option<FileKind>) {
        self.session.set_filter(filter);
        self.emit(EngineEvent::FilterChanged { filter });
        self.refresh_focus();
    }

    /// The file under review. Reading it is what arms suggestion
    /// computation: work starts only when the identity at the cursor
    /// differs from the previously observed one.
    pub fn current(&mut self) -> Option<FileRecord> {
        self.refresh_focus();
        self.session.current().cloned()
    }

    /// Cached suggestions for the file under review; empty while a
    /// computation is still pending.
    pub fn current_suggestions(&self) -> Vec<Suggestion> {
        self.session
            .current()
            .and_then(|r| self.session.suggestions(r.id))
            .map(|s| s.to_vec())
            .unwrap_or_default()
    }

    /// Moves past the current file without deciding it.
    pub fn skip(&mut self) {
        self.session.advance();
        self.refresh_focus();
    }

    /// Applies a decision to the file under review.
    pub fn decide(&mut self, decision: Decision) -> Result<()> {
        let Some(id) = self.session.current().map(|r| r.id) else {
            return Ok(());
        };

        let outcome = self
            .decisions
            .apply(&mut self.session, &mut self.undo, decision, id)?;
        self.report(decision, outcome);
        self.refresh_focus();
        Ok(())
    }

    /// Applies one decision to an arbitrary set of files, atomically with
    /// respect to this context: the cursor settles once at the end.
    pub fn decide_bulk(&mut self, decision: Decision, ids: &[FileId]) {
        let outcome = self.decisions.apply_all(&mut self.session, decision, ids);
        self.report(decision, outcome);
        self.refresh_focus();
    }

    fn report(&mut self, decision: Decision, outcome: ApplyOutcome) {
        for failure in &outcome.move_failures {
            self.emit(EngineEvent::MoveFailed {
                path: failure.path.display().to_string(),
                reason: failure.reason.clone(),
            });
        }
        if !outcome.applied.is_empty() {
            self.emit(EngineEvent::DecisionApplied {
                decision,
                ids: outcome.applied,
            });
        }
    }

    /// Rolls back the most recent decision. `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo.undo_last(&mut self.session, &mut self.decisions) {
            Some(id) => {
                self.emit(EngineEvent::Undone { id });
                self.refresh_focus();
                true
            }
            None => false,
        }
    }

    /// Drains completed background work into committed state. Call from
    /// the coordinating loop; stale results are discarded here.
    pub fn poll(&mut self) {
        while let Some(outcome) = self.pump.poll() {
            if Some(outcome.file_id) != self.last_focus {
                debug!("dropping suggestion result for defocused file");
                continue;
            }
            let count = outcome.suggestions.len();
            if self
                .session
                .store_suggestions(outcome.file_id, outcome.suggestions)
            {
                self.emit(EngineEvent::SuggestionsReady {
                    id: outcome.file_id,
                    count,
                });
            }
        }

        while let Some((id, thumbnail)) = self.thumbs.poll() {
            let Some(handle) = thumbnail else { continue };
            let wanted = self.session.contains(id)
                || self
                    .review
                    .as_ref()
                    .is_some_and(|ctx| ctx.member_ids().contains(&id));
            if !wanted {
                continue;
            }
            self.session.set_thumbnail(id, handle.clone());
            if let Some(ctx) = self.review.as_mut() {
                if let Some(member) = ctx.members.iter_mut().find(|m| m.id == id) {
                    member.thumbnail = Some(handle);
                }
            }
        }
    }

    /// Opens a review over the suggestion's still-live members.
    pub fn start_group_review(&mut self, suggestion_id: SuggestionId) -> Result<()> {
        let suggestion = self
            .find_suggestion(suggestion_id)
            .ok_or(DesksweepError::UnknownSuggestion(suggestion_id.0))?;

        let members: Vec<FileRecord> = suggestion
            .member_ids()
            .iter()
            .filter_map(|id| self.session.get(*id).cloned())
            .collect();

        if members.is_empty() {
            return Err(DesksweepError::EmptyGroup(suggestion_id.0));
        }

        for member in &members {
            if member.thumbnail.is_none() {
                self.thumbs.request(member);
            }
        }

        let count = members.len();
        self.review = Some(ReviewContext {
            suggestion,
            members,
        });
        self.emit(EngineEvent::ReviewOpened { members: count });
        Ok(())
    }

    fn find_suggestion(&self, suggestion_id: SuggestionId) -> Option<Suggestion> {
        self.session
            .cached_ids()
            .into_iter()
            .filter_map(|id| self.session.suggestions(id))
            .flatten()
            .find(|s| s.id == suggestion_id)
            .cloned()
    }

    pub fn active_review(&self) -> Option<&ReviewContext> {
        self.review.as_ref()
    }

    /// Ranked bulk actions for the open review, recomputed against its
    /// current members.
    pub fn group_actions(&self) -> Vec<SmartAction> {
        self.review
            .as_ref()
            .map(|ctx| derive_smart_actions(ctx, &self.thresholds, Utc::now()))
            .unwrap_or_default()
    }

    /// Executes one smart action against the whole group. The review
    /// closes implicitly once every member has been processed.
    pub fn apply_group_action(&mut self, action_index: usize) -> Result<()> {
        if self.review.is_none() {
            return Err(DesksweepError::NoActiveReview);
        }

        let actions = self.group_actions();
        let action = actions
            .get(action_index)
            .cloned()
            .ok_or(DesksweepError::UnknownAction(action_index))?;

        if !action.keep.is_empty() {
            self.decide_bulk(Decision::Keep, &action.keep);
        }
        if !action.bin.is_empty() {
            self.decide_bulk(Decision::Bin, &action.bin);
        }

        let mut processed = action.keep;
        processed.extend(action.bin);

        let review_drained = match self.review.as_mut() {
            Some(ctx) => {
                ctx.retain_unprocessed(&processed);
                ctx.is_empty()
            }
            None => false,
        };
        if review_drained {
            self.review = None;
            self.emit(EngineEvent::ReviewClosed);
        }
        Ok(())
    }

    pub fn close_group_review(&mut self) {
        if self.review.take().is_some() {
            self.emit(EngineEvent::ReviewClosed);
        }
    }

    /// Returns a deferred-mode pending file to the working list.
    pub fn restore_from_bin(&mut self, id: FileId) -> bool {
        let restored = self.decisions.restore_from_bin(&mut self.session, id);
        if restored {
            self.refresh_focus();
        }
        restored
    }

    /// Flushes deferred bins through the mover, reporting failures.
    pub fn commit_pending(&mut self) {
        for failure in self.decisions.commit_pending() {
            self.emit(EngineEvent::MoveFailed {
                path: failure.path.display().to_string(),
                reason: failure.reason.clone(),
            });
        }
    }

    // Pull-based state queries.

    pub fn counters(&self) -> SessionCounters {
        self.session.counters()
    }

    pub fn working_len(&self) -> usize {
        self.session.working_len()
    }

    pub fn visible_len(&self) -> usize {
        self.session.visible_len()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded_count
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    pub fn pending_bin(&self) -> &[FileRecord] {
        self.decisions.pending_bin()
    }

    pub fn stacked(&self) -> &[FileRecord] {
        self.decisions.stacked()
    }

    pub fn relocated(&self) -> &[FileRecord] {
        self.decisions.relocated()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Focus bookkeeping: when the identity at the cursor changes, cancel
    /// the in-flight computation and either serve the cache synchronously
    /// or publish an empty result and start computing.
    fn refresh_focus(&mut self) {
        let current_id = self.session.current().map(|r| r.id);
        if current_id == self.last_focus {
            return;
        }
        self.last_focus = current_id;
        self.emit(EngineEvent::FocusChanged { id: current_id });

        let Some(id) = current_id else {
            self.pump.cancel();
            return;
        };

        if let Some(cached) = self.session.suggestions(id) {
            let count = cached.len();
            self.pump.cancel();
            self.emit(EngineEvent::SuggestionsReady { id, count });
            return;
        }

        // Nothing cached: the UI must never show the previous file's
        // suggestions, so an empty set is published before computing.
        self.emit(EngineEvent::SuggestionsReady { id, count: 0 });

        let Some(focused) = self.session.get(id).cloned() else {
            return;
        };
        let window = self.session.window(self.thresholds.comparison_window);
        self.pump.focus(&focused, window);
    }
}
