//! Run command implementation.

use s7sim_core::{read_field, LayoutRegistry, SimulatorConfig};
use s7sim_sync_engine::{MemoryBuffer, SyncConfig, SyncEngine, SyncRunner};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Runs the simulator until the duration elapses or the process is killed.
pub fn run(
    config_path: &Path,
    interval_ms: u64,
    poll_ms: Option<u64>,
    duration_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SimulatorConfig::from_file(config_path)?;
    let (store, layouts) = config.build_store()?;
    info!(
        blocks = store.db_numbers().len(),
        config = %config_path.display(),
        "simulator configured"
    );

    let buffer = Arc::new(MemoryBuffer::new());
    let engine = Arc::new(SyncEngine::new(Arc::clone(&store), buffer));
    engine.register_all()?;

    let mut sync_config =
        SyncConfig::new().with_tick_interval(Duration::from_millis(interval_ms));
    if let Some(poll_ms) = poll_ms {
        sync_config = sync_config.with_poll_interval(Duration::from_millis(poll_ms));
    }
    let poll_interval = sync_config.poll_interval;
    let runner = SyncRunner::spawn(Arc::clone(&engine), sync_config)?;
    println!("Simulator running; press Ctrl-C to stop");

    let started = Instant::now();
    let deadline = duration_secs.map(|s| started + Duration::from_secs(s));

    loop {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break;
            }
        }

        match poll_interval {
            Some(interval) => {
                thread::sleep(interval);
                print_snapshot(&engine, &layouts);
            }
            // No polling requested: just wait out the duration (or forever).
            None => thread::sleep(Duration::from_millis(250)),
        }
    }

    runner.shutdown();
    let stats = engine.stats();
    println!();
    println!(
        "Stopped after {:.1}s: {} ticks, {} pulled, {} pushed, {} conflicts, {} skipped",
        started.elapsed().as_secs_f64(),
        stats.ticks,
        stats.blocks_pulled,
        stats.blocks_pushed,
        stats.conflicts,
        stats.blocks_skipped,
    );
    Ok(())
}

fn print_snapshot(engine: &SyncEngine<MemoryBuffer>, layouts: &LayoutRegistry) {
    let snapshot = engine.store().capture();
    for layout in layouts.iter() {
        let Some(block) = snapshot.block(layout.db_number()) else {
            continue;
        };
        println!("DB{} v{}", layout.db_number(), block.version());
        for field in layout.fields() {
            match read_field(layout.db_number(), block.bytes(), field) {
                Ok(value) => println!("  {:<24} = {}", field.name, value),
                Err(e) => println!("  {:<24} ! {}", field.name, e),
            }
        }
    }
}
