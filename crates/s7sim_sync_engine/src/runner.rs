//! Background tick loop.

use crate::adapter::ExternalBuffer;
use crate::config::SyncConfig;
use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Drives a [`SyncEngine`] on a dedicated thread at a fixed interval.
///
/// The interval is measured tick-start to tick-start: the sleep after each
/// tick is shortened by however long the tick itself took.
pub struct SyncRunner {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyncRunner {
    /// Starts the tick loop on a new thread.
    pub fn spawn<B: ExternalBuffer + 'static>(
        engine: Arc<SyncEngine<B>>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let interval = config.tick_interval;

        let handle = thread::Builder::new()
            .name("s7sim-sync".into())
            .spawn(move || {
                info!(interval_ms = interval.as_millis() as u64, "sync loop started");
                while !stop_flag.load(Ordering::Relaxed) {
                    let started = Instant::now();
                    let summary = engine.tick();
                    if !summary.is_quiet() {
                        debug!(
                            pulled = summary.pulled,
                            pushed = summary.pushed,
                            conflicts = summary.conflicts,
                            skipped = summary.skipped,
                            "tick moved data"
                        );
                    }
                    if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                        thread::sleep(remaining);
                    }
                }
                info!("sync loop stopped");
            })
            .map_err(|e| SyncError::ThreadSpawn {
                message: e.to_string(),
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signals the loop to stop and waits for the in-flight tick to finish.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SyncRunner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryBuffer;
    use s7sim_core::BlockStore;
    use std::time::Duration;

    #[test]
    fn runner_ticks_until_shutdown() {
        let store = Arc::new(BlockStore::new());
        store.register(1, 4).unwrap();
        let buffer = Arc::new(MemoryBuffer::new());
        let engine = Arc::new(SyncEngine::new(store, Arc::clone(&buffer)));
        engine.register_all().unwrap();

        let config = SyncConfig::new().with_tick_interval(Duration::from_millis(10));
        let runner = SyncRunner::spawn(Arc::clone(&engine), config).unwrap();
        thread::sleep(Duration::from_millis(100));
        runner.shutdown();

        // ~10 ticks expected; allow wide margins for scheduler jitter.
        let ticks = engine.stats().ticks;
        assert!(ticks >= 2, "expected at least 2 ticks, saw {ticks}");
    }

    #[test]
    fn drop_stops_the_loop() {
        let store = Arc::new(BlockStore::new());
        store.register(1, 1).unwrap();
        let buffer = Arc::new(MemoryBuffer::new());
        let engine = Arc::new(SyncEngine::new(store, buffer));
        engine.register_all().unwrap();

        let config = SyncConfig::new().with_tick_interval(Duration::from_millis(10));
        let runner = SyncRunner::spawn(Arc::clone(&engine), config).unwrap();
        thread::sleep(Duration::from_millis(30));
        drop(runner);

        let ticks = engine.stats().ticks;
        thread::sleep(Duration::from_millis(50));
        assert_eq!(engine.stats().ticks, ticks);
    }
}
