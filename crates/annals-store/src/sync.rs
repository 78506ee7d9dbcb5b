//! Fire-and-forget dispatch of sync batches.
//!
//! [`SyncHandle::dispatch`] returns immediately. Batches go down a channel
//! to a single worker thread that writes them one at a time, in dispatch
//! order, so the durable store only ever moves forward and has one writer.
//! Failures are logged and counted, never retried and never surfaced to the
//! turn. Until the worker catches up, the durable store lags the working
//! store by the batches still queued; [`SyncHandle::settle`] and
//! [`SyncHandle::settle_blocking`] wait for the queue to drain, for shutdown
//! and tests.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::durable::{DurableStore, SyncBatch};

/// Counters describing sync activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Batches handed to the store.
    pub dispatched: u64,
    /// Batches written successfully.
    pub completed: u64,
    /// Batches whose write failed.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    in_flight: u64,
    stats: SyncStats,
}

#[derive(Debug, Default)]
struct Tracker {
    state: Mutex<TrackerState>,
    idle: Condvar,
}

impl Tracker {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_add(1);
        state.stats.dispatched = state.stats.dispatched.saturating_add(1);
    }

    fn finish(&self, ok: bool) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if ok {
            state.stats.completed = state.stats.completed.saturating_add(1);
        } else {
            state.stats.failed = state.stats.failed.saturating_add(1);
        }
        drop(state);
        self.idle.notify_all();
    }

    fn wait_idle(&self) {
        let mut state = self.lock();
        while state.in_flight > 0 {
            state = self
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Dispatches sync batches to a durable store without blocking the caller.
///
/// Clones share the same queue and worker. The worker exits once every
/// handle is dropped and the queue is empty.
#[derive(Clone)]
pub struct SyncHandle {
    sender: mpsc::UnboundedSender<SyncBatch>,
    tracker: Arc<Tracker>,
}

impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandle")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl SyncHandle {
    /// Wrap a durable store and start its writer thread.
    ///
    /// If the thread cannot start, every dispatched batch is counted as
    /// failed.
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tracker = Arc::new(Tracker::default());
        let worker_tracker = Arc::clone(&tracker);
        if let Err(e) = std::thread::Builder::new()
            .name(String::from("annals-sync"))
            .spawn(move || drain(store.as_ref(), receiver, &worker_tracker))
        {
            tracing::warn!(error = %e, "Could not start sync writer");
        }
        Self { sender, tracker }
    }

    /// Current counters.
    pub fn stats(&self) -> SyncStats {
        self.tracker.lock().stats
    }

    /// Queue `batch` for the writer and return immediately.
    pub fn dispatch(&self, batch: SyncBatch) {
        self.tracker.start();
        if let Err(mpsc::error::SendError(batch)) = self.sender.send(batch) {
            tracing::warn!(turn = batch.turn, "Sync writer is gone, batch dropped");
            self.tracker.finish(false);
        }
    }

    /// Wait for every queued batch from async code.
    pub async fn settle(&self) {
        let tracker = Arc::clone(&self.tracker);
        if let Err(e) = tokio::task::spawn_blocking(move || tracker.wait_idle()).await {
            tracing::warn!(error = %e, "Waiting for sync batches failed");
        }
    }

    /// Wait for every queued batch from synchronous code.
    pub fn settle_blocking(&self) {
        self.tracker.wait_idle();
    }
}

/// Write batches in arrival order until every sender is gone.
fn drain(
    store: &dyn DurableStore,
    mut receiver: mpsc::UnboundedReceiver<SyncBatch>,
    tracker: &Tracker,
) {
    while let Some(batch) = receiver.blocking_recv() {
        let ok = match store.write_batch(&batch) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(turn = batch.turn, error = %e, "Persistence sync failed");
                false
            }
        };
        tracker.finish(ok);
    }
    tracing::debug!("Sync writer stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use annals_civ::Nation;
    use annals_types::{CultureTraits, NationId, WorldId};

    use super::*;
    use crate::durable::MemoryDurableStore;
    use crate::entity::{StoredEntity, nation_key};
    use crate::error::StoreError;

    fn batch(turn: u32) -> SyncBatch {
        SyncBatch {
            turn,
            ..SyncBatch::default()
        }
    }

    /// Holds up the first turn's write so a later batch could overtake it.
    struct SlowFirstTurn {
        inner: MemoryDurableStore,
    }

    impl DurableStore for SlowFirstTurn {
        fn write_batch(&self, batch: &SyncBatch) -> Result<(), StoreError> {
            if batch.turn == 1 {
                std::thread::sleep(Duration::from_millis(200));
            }
            self.inner.write_batch(batch)
        }
    }

    #[test]
    fn dispatch_outside_runtime_writes_in_order() {
        let store = Arc::new(MemoryDurableStore::new());
        let sync = SyncHandle::new(store.clone());
        sync.dispatch(batch(1));
        sync.dispatch(batch(2));
        sync.settle_blocking();
        assert_eq!(store.turns_written(), vec![1, 2]);
        assert_eq!(sync.stats().completed, 2);
    }

    #[tokio::test]
    async fn dispatch_inside_runtime_writes_in_order() {
        let store = Arc::new(MemoryDurableStore::new());
        let sync = SyncHandle::new(store.clone());
        sync.dispatch(batch(7));
        sync.dispatch(batch(8));
        sync.settle().await;
        assert_eq!(store.turns_written(), vec![7, 8]);
    }

    #[test]
    fn slow_batch_is_not_overtaken() {
        let store = Arc::new(SlowFirstTurn {
            inner: MemoryDurableStore::new(),
        });
        let sync = SyncHandle::new(store.clone());

        let mut nation = Nation::new(
            NationId::new(),
            "Akkad",
            CultureTraits::default(),
            WorldId::new(),
        );
        nation.resources.gold = 2;
        sync.dispatch(SyncBatch {
            turn: 1,
            year: -3960,
            upserts: vec![nation.clone().into()],
            deletes: Vec::new(),
        });
        nation.resources.gold = 4;
        sync.dispatch(SyncBatch {
            turn: 2,
            year: -3920,
            upserts: vec![nation.clone().into()],
            deletes: Vec::new(),
        });
        sync.settle_blocking();

        assert_eq!(store.inner.turns_written(), vec![1, 2]);
        let records = store.inner.records();
        assert!(matches!(
            records.get(&nation_key(nation.id)),
            Some(StoredEntity::Nation(stored)) if stored.resources.gold == 4
        ));
    }

    #[tokio::test]
    async fn failures_are_counted_not_raised() {
        let sync = SyncHandle::new(Arc::new(MemoryDurableStore::failing()));
        sync.dispatch(batch(1));
        sync.dispatch(batch(2));
        sync.settle().await;
        let stats = sync.stats();
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.completed, 0);
    }

    #[test]
    fn clones_share_one_queue() {
        let store = Arc::new(MemoryDurableStore::new());
        let sync = SyncHandle::new(store.clone());
        let other = sync.clone();
        sync.dispatch(batch(1));
        other.dispatch(batch(2));
        other.settle_blocking();
        assert_eq!(store.turns_written(), vec![1, 2]);
        assert_eq!(sync.stats().dispatched, 2);
    }
}
