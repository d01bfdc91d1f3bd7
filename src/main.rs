/*!
 * Lock Order Demo
 *
 * Several threads contend for one simulated lock namespace. Each creates a
 * sequential marker, waits for its turn through the ordering engine, holds
 * the lock briefly and deletes its marker. The run fails if two threads ever
 * hold the lock at once or turns are granted out of sequence order.
 *
 * Environment variables:
 * - LOCK_ORDER_DEMO_THREADS: contending threads (default: 8)
 * - LOCK_ORDER_DEMO_ROUNDS: acquisitions per thread (default: 3)
 */

use anyhow::{anyhow, ensure, Context, Result};
use lock_order::{
    init_tracing, EngineConfig, LockOrderingEngine, MarkerId, MemoryNamespace, NotificationPump,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;
use tracing::info;

fn env_or(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    init_tracing();

    let threads = env_or("LOCK_ORDER_DEMO_THREADS", 8);
    let rounds = env_or("LOCK_ORDER_DEMO_ROUNDS", 3);
    info!(threads, rounds, "lock order demo starting");

    let namespace = Arc::new(MemoryNamespace::new("/locks/demo"));
    let (snapshot, receiver) = namespace.watch();
    let engine = Arc::new(
        LockOrderingEngine::with_config(EngineConfig::from_env(), snapshot)
            .context("failed to seed engine")?,
    );

    // Weak so dropping the namespace closes the channel and stops the pump
    let resync_ns: Weak<MemoryNamespace> = Arc::downgrade(&namespace);
    let resync_engine = Arc::clone(&engine);
    let pump = NotificationPump::new(Arc::clone(&engine))
        .with_resync(move || match resync_ns.upgrade() {
            Some(ns) => resync_engine.reseed(ns.children()).map(|_| ()),
            None => Ok(()),
        })
        .spawn(receiver)
        .context("failed to start notification pump")?;

    let held = Arc::new(AtomicBool::new(false));
    let grants = Arc::new(Mutex::new(Vec::new()));

    let workers: Vec<_> = (0..threads)
        .map(|worker| {
            let namespace = Arc::clone(&namespace);
            let engine = Arc::clone(&engine);
            let held = Arc::clone(&held);
            let grants = Arc::clone(&grants);

            thread::Builder::new()
                .name(format!("worker-{}", worker))
                .spawn(move || -> Result<()> {
                    let prefix = MemoryNamespace::client_prefix();
                    for _ in 0..rounds {
                        let path = namespace.create_sequential(&prefix);
                        let marker = MarkerId::from_path(&path)?;

                        engine.wait_turn(marker.clone(), None)?;

                        ensure!(
                            !held.swap(true, Ordering::SeqCst),
                            "mutual exclusion violated at {}",
                            marker
                        );
                        grants.lock().push(marker.sequence());
                        thread::sleep(Duration::from_millis(1));
                        held.store(false, Ordering::SeqCst);

                        namespace.delete(&path);
                    }
                    Ok(())
                })
        })
        .collect::<std::io::Result<_>>()?;

    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow!("worker thread panicked"))??;
    }

    drop(namespace);
    let pump_stats = pump
        .join()
        .map_err(|_| anyhow!("notification pump panicked"))?;

    let grants = grants.lock();
    ensure!(
        grants.windows(2).all(|w| w[0] < w[1]),
        "turns granted out of order: {:?}",
        *grants
    );

    info!(
        grants = grants.len(),
        engine = %serde_json::to_string(&engine.stats())?,
        pump = %serde_json::to_string(&pump_stats)?,
        "lock order demo finished"
    );
    Ok(())
}
