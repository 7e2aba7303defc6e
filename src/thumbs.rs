//! Throttled background thumbnail fetching
//!
//! Preview generation is an external concern; this module only bounds it.
//! A two-permit semaphore keeps at most two requests running, requests are
//! idempotent per file, and results for files nobody cares about anymore
//! are simply dropped by the poller.

use crate::domain::{FileId, FileRecord, ThumbnailHandle};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// How many thumbnail requests may run concurrently.
const CONCURRENT_REQUESTS: usize = 2;

/// Generates a preview image for a file. Implementations may block; the
/// fetcher runs them on the blocking pool.
pub trait ThumbnailProvider: Send + Sync + 'static {
    fn generate(&self, record: &FileRecord) -> Option<ThumbnailHandle>;
}

/// Provider for contexts that render no previews.
#[derive(Debug, Default)]
pub struct NoThumbnails;

impl ThumbnailProvider for NoThumbnails {
    fn generate(&self, _record: &FileRecord) -> Option<ThumbnailHandle> {
        None
    }
}

pub struct ThumbnailFetcher {
    provider: Arc<dyn ThumbnailProvider>,
    semaphore: Arc<Semaphore>,
    handle: tokio::runtime::Handle,
    results_tx: mpsc::Sender<(FileId, Option<ThumbnailHandle>)>,
    results_rx: mpsc::Receiver<(FileId, Option<ThumbnailHandle>)>,
    in_flight: HashSet<FileId>,
}

impl ThumbnailFetcher {
    pub fn new(provider: Arc<dyn ThumbnailProvider>, handle: tokio::runtime::Handle) -> Self {
        let (results_tx, results_rx) = mpsc::channel(32);

        ThumbnailFetcher {
            provider,
            semaphore: Arc::new(Semaphore::new(CONCURRENT_REQUESTS)),
            handle,
            results_tx,
            results_rx,
            in_flight: HashSet::new(),
        }
    }

    /// Requests a thumbnail. No-op when one is already cached on the
    /// record or a request for this file is still in flight.
    pub fn request(&mut self, record: &FileRecord) {
        if record.thumbnail.is_some() || !self.in_flight.insert(record.id) {
            return;
        }

        let provider = Arc::clone(&self.provider);
        let semaphore = Arc::clone(&self.semaphore);
        let results_tx = self.results_tx.clone();
        let id = record.id;
        let record = record.clone();

        self.handle.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            let thumbnail = tokio::task::spawn_blocking(move || provider.generate(&record))
                .await
                .unwrap_or(None);
            let _ = results_tx.send((id, thumbnail)).await;
        });
    }

    /// Non-blocking: the next completed request, if any. Callers decide
    /// whether the file is still of interest; otherwise they drop it.
    pub fn poll(&mut self) -> Option<(FileId, Option<ThumbnailHandle>)> {
        match self.results_rx.try_recv() {
            Ok((id, thumbnail)) => {
                self.in_flight.remove(&id);
                Some((id, thumbnail))
            }
            Err(_) => None,
        }
    }
}
