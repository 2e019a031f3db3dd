use crate::result::{ScrapeResult, NOT_RUNNING};
use std::sync::Arc;
use tokio::sync::watch;

/// Holds the most recent [`ScrapeResult`].
///
/// Readers clone an `Arc` under a short read lock and never wait on a cycle in
/// progress; a result only becomes visible once it is fully assembled.
#[derive(Clone)]
pub struct ResultStore {
    tx: Arc<watch::Sender<Arc<ScrapeResult>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(ScrapeResult::no_data()));
        Self { tx: Arc::new(tx) }
    }

    pub fn read(&self) -> Arc<ScrapeResult> {
        self.tx.borrow().clone()
    }

    pub fn write(&self, result: ScrapeResult) {
        self.tx.send_replace(Arc::new(result));
    }

    /// Publishes `result` only if `accept` still holds once the write lock is
    /// taken. Returns whether the result was published.
    pub fn write_if(&self, result: ScrapeResult, accept: impl FnOnce() -> bool) -> bool {
        self.tx.send_if_modified(move |current| {
            if !accept() {
                return false;
            }
            *current = Arc::new(result);
            true
        })
    }

    /// Republishes the current snapshot flagged as no longer being refreshed.
    pub fn mark_stopped(&self) {
        self.tx.send_modify(|current| {
            let mut stopped = ScrapeResult::clone(current);
            stopped.error = Some(NOT_RUNNING.to_string());
            *current = Arc::new(stopped);
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ScrapeResult>> {
        self.tx.subscribe()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
