//! Background suggestion computation with debounce and cancellation
//!
//! One worker task serves the whole session, so at most one computation is
//! logically in flight. Cancellation is a generation counter: every focus
//! change bumps it, and the worker compares its request's generation at the
//! debounce boundary, between detection rules, and before committing.

use crate::domain::{FileId, FileRecord};
use crate::error::{DesksweepError, Result};
use crate::suggest::{Suggestion, SuggestionThresholds, DETECT_RULES};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

enum SuggestRequest {
    Compute {
        focused: FileRecord,
        window: Vec<FileRecord>,
        generation: u64,
    },
    Shutdown,
}

/// A completed computation, delivered back to the coordinating context.
#[derive(Debug)]
pub struct SuggestionOutcome {
    pub file_id: FileId,
    pub generation: u64,
    pub suggestions: Vec<Suggestion>,
}

/// Synchronous handle for the coordinating loop: owns the runtime and the
/// worker, hands out computations via `focus`, and is polled for results.
pub struct SuggestionPump {
    runtime: tokio::runtime::Runtime,
    request_tx: mpsc::Sender<SuggestRequest>,
    outcome_rx: mpsc::Receiver<SuggestionOutcome>,
    generation: Arc<AtomicU64>,
    thresholds: SuggestionThresholds,
}

impl SuggestionPump {
    pub fn new(thresholds: SuggestionThresholds) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new().map_err(DesksweepError::Runtime)?;
        let (request_tx, request_rx) = mpsc::channel(32);
        let (outcome_tx, outcome_rx) = mpsc::channel(32);
        let generation = Arc::new(AtomicU64::new(0));

        let worker_generation = Arc::clone(&generation);
        let worker_thresholds = thresholds.clone();
        runtime.spawn(async move {
            worker(request_rx, outcome_tx, worker_generation, worker_thresholds).await;
        });

        Ok(SuggestionPump {
            runtime,
            request_tx,
            outcome_rx,
            generation,
            thresholds,
        })
    }

    /// Handle onto the pump's runtime, for sibling background work.
    pub fn runtime_handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn thresholds(&self) -> &SuggestionThresholds {
        &self.thresholds
    }

    /// Latest generation; only outcomes carrying it are current.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Starts a computation for a newly focused file, cancelling whatever
    /// was in flight. Returns the new generation.
    pub fn focus(&self, focused: &FileRecord, window: Vec<FileRecord>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let request = SuggestRequest::Compute {
            focused: focused.clone(),
            window,
            generation,
        };
        let _ = self.request_tx.blocking_send(request);

        generation
    }

    /// Cancels any in-flight computation without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    /// Non-blocking: the next completed, still-current outcome, if any.
    /// Outcomes from superseded generations are dropped silently.
    pub fn poll(&mut self) -> Option<SuggestionOutcome> {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if outcome.generation == self.current_generation() {
                return Some(outcome);
            }
        }
        None
    }

    pub fn shutdown(&self) {
        let _ = self.request_tx.blocking_send(SuggestRequest::Shutdown);
    }
}

async fn worker(
    mut request_rx: mpsc::Receiver<SuggestRequest>,
    outcome_tx: mpsc::Sender<SuggestionOutcome>,
    generation: Arc<AtomicU64>,
    thresholds: SuggestionThresholds,
) {
    while let Some(request) = request_rx.recv().await {
        match request {
            SuggestRequest::Compute {
                focused,
                window,
                generation: requested,
            } => {
                let is_current = || generation.load(Ordering::Relaxed) == requested;

                if !is_current() {
                    continue;
                }

                // Debounce: rapid navigation cancels before any work runs.
                tokio::time::sleep(Duration::from_millis(thresholds.debounce_ms)).await;
                if !is_current() {
                    continue;
                }

                let now = Utc::now();
                let mut suggestions = Vec::new();
                let mut abandoned = false;

                for rule in DETECT_RULES {
                    if !is_current() {
                        abandoned = true;
                        break;
                    }
                    if let Some(suggestion) = rule(&focused, &window, &thresholds, now) {
                        suggestions.push(suggestion);
                    }
                }

                if abandoned || !is_current() {
                    continue;
                }

                let outcome = SuggestionOutcome {
                    file_id: focused.id,
                    generation: requested,
                    suggestions,
                };
                // Full or closed channel means nobody wants the result;
                // stale results are discardable by contract.
                let _ = outcome_tx.try_send(outcome);
            }
            SuggestRequest::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileKind;
    use std::path::PathBuf;
    use std::thread;

    fn record(id: u64, name: &str, size: u64) -> FileRecord {
        let mut r = FileRecord::new(
            PathBuf::from(format!("/desk/{}", name)),
            size,
            Utc::now(),
            Utc::now(),
            FileKind::Other,
            None,
        );
        r.id = FileId(id);
        r
    }

    fn fast_thresholds() -> SuggestionThresholds {
        SuggestionThresholds {
            debounce_ms: 10,
            ..SuggestionThresholds::default()
        }
    }

    fn poll_until(pump: &mut SuggestionPump, attempts: usize) -> Option<SuggestionOutcome> {
        for _ in 0..attempts {
            if let Some(outcome) = pump.poll() {
                return Some(outcome);
            }
            thread::sleep(Duration::from_millis(20));
        }
        None
    }

    #[test]
    fn test_focus_eventually_delivers_outcome() {
        let mut pump = SuggestionPump::new(fast_thresholds()).unwrap();

        let mut a = record(1, "a.bin", 500);
        let mut b = record(2, "b.bin", 500);
        a.fingerprint = Some(42);
        b.fingerprint = Some(42);

        let generation = pump.focus(&a, vec![a.clone(), b]);

        let outcome = poll_until(&mut pump, 50).expect("outcome within timeout");
        assert_eq!(outcome.file_id, FileId(1));
        assert_eq!(outcome.generation, generation);
        assert_eq!(outcome.suggestions.len(), 1); // the duplicate
    }

    #[test]
    fn test_rapid_refocus_discards_stale_generation() {
        let mut pump = SuggestionPump::new(fast_thresholds()).unwrap();

        let a = record(1, "a.txt", 1);
        let b = record(2, "b.txt", 1);

        pump.focus(&a, vec![a.clone()]);
        let latest = pump.focus(&b, vec![b.clone()]);

        let outcome = poll_until(&mut pump, 50).expect("outcome within timeout");
        assert_eq!(outcome.file_id, FileId(2));
        assert_eq!(outcome.generation, latest);

        // Nothing else arrives for the superseded focus.
        thread::sleep(Duration::from_millis(60));
        assert!(pump.poll().is_none());
    }

    #[test]
    fn test_cancel_suppresses_pending_outcome() {
        let mut pump = SuggestionPump::new(fast_thresholds()).unwrap();

        let a = record(1, "a.txt", 1);
        pump.focus(&a, vec![a.clone()]);
        pump.cancel();

        assert!(poll_until(&mut pump, 10).is_none());
    }

    #[test]
    fn test_shutdown_is_quiet() {
        let pump = SuggestionPump::new(fast_thresholds()).unwrap();
        pump.shutdown();
    }
}
