//! The tick-based reconciler.
//!
//! Each tick classifies every registered block independently: external
//! reads and writes happen outside the store lock, only the in-memory
//! compare-and-merge holds it. A transport hiccup on one block is logged
//! and skipped; the remaining blocks still reconcile in the same tick.

use crate::adapter::ExternalBuffer;
use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use s7sim_core::{block_checksum, BlockStore, Reconciliation, SyncDecision};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Running totals across all ticks.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Ticks completed.
    pub ticks: u64,
    /// Blocks pulled from the external buffer.
    pub blocks_pulled: u64,
    /// Blocks pushed to the external buffer.
    pub blocks_pushed: u64,
    /// Same-tick double writes resolved in favor of the internal value.
    pub conflicts: u64,
    /// Blocks skipped because of a per-tick error.
    pub blocks_skipped: u64,
    /// The most recent per-block error, if any.
    pub last_error: Option<String>,
    /// When the last tick finished.
    pub last_tick_at: Option<Instant>,
}

/// The outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Blocks where only the external side changed.
    pub pulled: u32,
    /// Blocks where only the internal side changed.
    pub pushed: u32,
    /// Blocks where both sides changed (internal won).
    pub conflicts: u32,
    /// Blocks with no change on either side.
    pub unchanged: u32,
    /// Blocks skipped because of an error.
    pub skipped: u32,
}

impl TickSummary {
    /// True when the tick moved no data at all.
    pub fn is_quiet(&self) -> bool {
        self.pulled == 0 && self.pushed == 0 && self.conflicts == 0 && self.skipped == 0
    }

    fn record(&mut self, decision: SyncDecision) {
        match decision {
            SyncDecision::NoChange => self.unchanged += 1,
            SyncDecision::PullFromExternal => self.pulled += 1,
            SyncDecision::PushToExternal => self.pushed += 1,
            SyncDecision::Conflict => self.conflicts += 1,
        }
    }
}

/// Reconciles the authoritative store with the transport's block memory.
pub struct SyncEngine<B: ExternalBuffer> {
    store: Arc<BlockStore>,
    buffer: Arc<B>,
    stats: RwLock<SyncStats>,
}

impl<B: ExternalBuffer> SyncEngine<B> {
    /// Creates an engine over the given store and external buffer.
    pub fn new(store: Arc<BlockStore>, buffer: Arc<B>) -> Self {
        Self {
            store,
            buffer,
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// The store this engine reconciles.
    pub fn store(&self) -> &Arc<BlockStore> {
        &self.store
    }

    /// Registers every store block with the transport and seeds the
    /// external buffer with the store's current bytes.
    ///
    /// Afterwards both sync baselines match the seeded content, so the
    /// first tick observes no phantom change.
    pub fn register_all(&self) -> SyncResult<()> {
        for db_number in self.store.db_numbers() {
            let size = self.store.size_of(db_number).map_err(SyncError::Core)?;
            self.buffer.register_block(db_number, size)?;
            let bytes = self.store.read_bytes(db_number).map_err(SyncError::Core)?;
            self.buffer.write_block(db_number, &bytes)?;
            self.store
                .confirm_push(db_number, block_checksum(&bytes))
                .map_err(SyncError::Core)?;
            info!(db_number, size, "registered block with transport");
        }
        Ok(())
    }

    /// Runs one reconciliation pass over all blocks.
    ///
    /// Per-block errors are contained: the block is skipped for this tick
    /// with its baselines untouched, and the next tick retries naturally.
    pub fn tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();
        for db_number in self.store.db_numbers() {
            match self.sync_block(db_number) {
                Ok(decision) => summary.record(decision),
                Err(e) => {
                    warn!(db_number, error = %e, "block skipped this tick");
                    summary.skipped += 1;
                    self.stats.write().last_error = Some(e.to_string());
                }
            }
        }

        let mut stats = self.stats.write();
        stats.ticks += 1;
        stats.blocks_pulled += u64::from(summary.pulled);
        stats.blocks_pushed += u64::from(summary.pushed + summary.conflicts);
        stats.conflicts += u64::from(summary.conflicts);
        stats.blocks_skipped += u64::from(summary.skipped);
        stats.last_tick_at = Some(Instant::now());
        summary
    }

    /// Returns a copy of the running totals.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    fn sync_block(&self, db_number: u16) -> SyncResult<SyncDecision> {
        // External read outside the store lock: a slow transport call must
        // not stall local readers or writers.
        let external = self.buffer.read_block(db_number)?;
        let outcome = self.store.reconcile(db_number, &external)?;
        let decision = outcome.decision();

        match outcome {
            Reconciliation::NoChange => {}
            Reconciliation::Pulled { version } => {
                debug!(db_number, version, "pulled external write into store");
            }
            Reconciliation::PushNeeded {
                bytes,
                checksum,
                conflict,
            } => {
                if conflict {
                    warn!(
                        db_number,
                        "both sides changed in the same tick window; internal value wins"
                    );
                }
                // Write outside the lock; commit baselines only on success
                // so a failed push is retried next tick.
                self.buffer.write_block(db_number, &bytes)?;
                self.store
                    .confirm_push(db_number, checksum)
                    .map_err(SyncError::Core)?;
                debug!(db_number, "pushed internal bytes to external buffer");
            }
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryBuffer;

    fn setup(sizes: &[(u16, usize)]) -> (Arc<BlockStore>, Arc<MemoryBuffer>, SyncEngine<MemoryBuffer>) {
        let store = Arc::new(BlockStore::new());
        for (db, size) in sizes {
            store.register(*db, *size).unwrap();
        }
        let buffer = Arc::new(MemoryBuffer::new());
        let engine = SyncEngine::new(Arc::clone(&store), Arc::clone(&buffer));
        engine.register_all().unwrap();
        (store, buffer, engine)
    }

    #[test]
    fn register_all_seeds_external_buffer() {
        let store = Arc::new(BlockStore::new());
        store.register(1, 4).unwrap();
        store.mutate(1, &[1, 2, 3, 4]).unwrap();
        let buffer = Arc::new(MemoryBuffer::new());
        let engine = SyncEngine::new(Arc::clone(&store), Arc::clone(&buffer));
        engine.register_all().unwrap();

        assert_eq!(buffer.contents(1).unwrap(), vec![1, 2, 3, 4]);
        // Baselines were confirmed, so the first tick is quiet.
        assert!(engine.tick().is_quiet());
    }

    #[test]
    fn quiet_ticks_issue_no_writes() {
        let (_, buffer, engine) = setup(&[(1, 4)]);
        let writes_after_seed = buffer.write_count(1);
        for _ in 0..3 {
            let summary = engine.tick();
            assert!(summary.is_quiet());
            assert_eq!(summary.unchanged, 1);
        }
        assert_eq!(buffer.write_count(1), writes_after_seed);
    }

    #[test]
    fn pull_increments_version_exactly_once() {
        let (store, buffer, engine) = setup(&[(1, 4)]);
        let (_, version_before) = store.state(1).unwrap();
        buffer.client_write(1, &[1, 2, 3, 4]).unwrap();

        let summary = engine.tick();
        assert_eq!(summary.pulled, 1);
        assert_eq!(&store.read_bytes(1).unwrap()[..], &[1, 2, 3, 4]);
        let (_, version_after) = store.state(1).unwrap();
        assert_eq!(version_after, version_before + 1);
    }

    #[test]
    fn push_writes_internal_bytes_out() {
        let (store, buffer, engine) = setup(&[(1, 4)]);
        store.mutate(1, &[9, 8, 7, 6]).unwrap();

        let summary = engine.tick();
        assert_eq!(summary.pushed, 1);
        assert_eq!(buffer.contents(1).unwrap(), vec![9, 8, 7, 6]);
    }

    #[test]
    fn conflict_resolves_to_internal_value() {
        let (store, buffer, engine) = setup(&[(1, 4)]);
        store.mutate(1, &[5, 5, 5, 5]).unwrap();
        buffer.client_write(1, &[7, 7, 7, 7]).unwrap();

        let summary = engine.tick();
        assert_eq!(summary.conflicts, 1);
        assert_eq!(&store.read_bytes(1).unwrap()[..], &[5, 5, 5, 5]);
        assert_eq!(buffer.contents(1).unwrap(), vec![5, 5, 5, 5]);
        assert_eq!(engine.stats().conflicts, 1);
    }

    #[test]
    fn failed_push_retries_next_tick() {
        let (store, buffer, engine) = setup(&[(1, 4)]);
        store.mutate(1, &[1, 1, 1, 1]).unwrap();

        buffer.set_write_failure(1, true);
        let summary = engine.tick();
        assert_eq!(summary.skipped, 1);
        assert_eq!(buffer.contents(1).unwrap(), vec![0, 0, 0, 0]);

        buffer.set_write_failure(1, false);
        let summary = engine.tick();
        assert_eq!(summary.pushed, 1);
        assert_eq!(buffer.contents(1).unwrap(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn stats_accumulate_across_ticks() {
        let (store, buffer, engine) = setup(&[(1, 2)]);
        buffer.client_write(1, &[1, 0]).unwrap();
        engine.tick();
        store.mutate(1, &[2, 0]).unwrap();
        engine.tick();
        engine.tick();

        let stats = engine.stats();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.blocks_pulled, 1);
        assert_eq!(stats.blocks_pushed, 1);
        assert!(stats.last_tick_at.is_some());
    }
}
