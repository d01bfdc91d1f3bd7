/*!
 * Namespace Integration Tests
 * Engine driven end-to-end by a simulated namespace through notification pumps
 */

use lock_order::monitoring::init_test_tracing;
use lock_order::{
    EngineConfig, EventKind, Listener, LockError, LockOrderingEngine, LockResult, MarkerId,
    MemoryNamespace, Notification, NotificationBroadcaster, NotificationPump, WorkloadProfile,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Records every notification it is handed
#[derive(Default)]
struct RecordingListener {
    seen: Mutex<Vec<(String, EventKind)>>,
    reject: bool,
}

impl Listener for RecordingListener {
    fn listen(&self, path: &str, kind: EventKind, _payload: &[u8]) -> LockResult<()> {
        self.seen.lock().push((path.to_string(), kind));
        if self.reject {
            return Err(LockError::MalformedPath(path.to_string()));
        }
        Ok(())
    }
}

/// Run `threads` x `rounds` acquisitions against a fresh namespace
///
/// Returns the sequence numbers in the order turns were granted.
fn contend(namespace: Arc<MemoryNamespace>, threads: usize, rounds: usize) -> Vec<u64> {
    let (snapshot, receiver) = namespace.watch();
    let engine = Arc::new(
        LockOrderingEngine::with_config(EngineConfig::contended(), snapshot).unwrap(),
    );
    let pump = NotificationPump::new(Arc::clone(&engine)).spawn(receiver).unwrap();

    let held = Arc::new(AtomicBool::new(false));
    let grants = Arc::new(Mutex::new(Vec::new()));

    let workers: Vec<_> = (0..threads)
        .map(|_| {
            let namespace = Arc::clone(&namespace);
            let engine = Arc::clone(&engine);
            let held = Arc::clone(&held);
            let grants = Arc::clone(&grants);
            thread::spawn(move || {
                let prefix = MemoryNamespace::client_prefix();
                for _ in 0..rounds {
                    let path = namespace.create_sequential(&prefix);
                    let marker = MarkerId::from_path(&path).unwrap();

                    engine
                        .wait_turn(marker.clone(), Some(Duration::from_secs(10)))
                        .unwrap();

                    assert!(!held.swap(true, Ordering::SeqCst), "two holders at once");
                    grants.lock().push(marker.sequence());
                    thread::yield_now();
                    held.store(false, Ordering::SeqCst);

                    assert!(namespace.delete(&path));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    drop(namespace);
    let stats = pump.join().unwrap();
    assert_eq!(stats.failed, 0);

    let grants = grants.lock().clone();
    assert_eq!(engine.stats().releases as usize, grants.len());
    assert_eq!(engine.waiter_count(), 0);
    grants
}

#[test]
#[serial]
fn test_contention_grants_in_sequence_order() {
    init_test_tracing();
    let grants = contend(Arc::new(MemoryNamespace::new("/locks/contention")), 8, 5);

    assert_eq!(grants.len(), 40);
    assert!(grants.windows(2).all(|w| w[0] < w[1]), "{grants:?}");
}

#[test]
#[serial]
fn test_duplicate_delivery_is_idempotent() {
    let namespace = Arc::new(MemoryNamespace::new("/locks/dupes").with_duplicate_delivery(true));
    let grants = contend(namespace, 4, 5);

    assert_eq!(grants.len(), 20);
    assert!(grants.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_watch_snapshot_seeds_engine() {
    let namespace = MemoryNamespace::new("/locks/seeded");
    let first = namespace.create_sequential("lock-");
    let second = namespace.create_sequential("lock-");

    let (snapshot, _receiver) = namespace.watch();
    let engine = LockOrderingEngine::new(snapshot).unwrap();

    assert_eq!(engine.minimum(), Some(MarkerId::from_path(&first).unwrap()));
    assert_eq!(engine.markers().len(), 2);
    assert!(!engine.is_minimum(&MarkerId::from_path(&second).unwrap()));
}

#[test]
fn test_pump_counts_failures_and_continues() {
    let broadcaster = NotificationBroadcaster::new(16);
    let listener = Arc::new(RecordingListener {
        reject: true,
        ..Default::default()
    });
    let pump = NotificationPump::new(Arc::clone(&listener))
        .spawn(broadcaster.subscribe())
        .unwrap();

    broadcaster.emit(Notification::created("/l/lock-0000000001"));
    broadcaster.emit(Notification::deleted("/l/lock-0000000001"));
    drop(broadcaster);

    let stats = pump.join().unwrap();
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.delivered, 0);
    assert_eq!(listener.seen.lock().len(), 2);
}

#[test]
fn test_pump_resyncs_after_lag() {
    let broadcaster = NotificationBroadcaster::new(2);
    let receiver = broadcaster.subscribe();

    for seq in 0..5 {
        broadcaster.emit(Notification::created(format!("/l/{}", MarkerId::format("lock-", seq))));
    }
    drop(broadcaster);

    let listener = Arc::new(RecordingListener::default());
    let resyncs = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&resyncs);

    let stats = NotificationPump::new(Arc::clone(&listener))
        .with_resync(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .spawn(receiver)
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(stats.lagged, 3);
    assert_eq!(stats.resyncs, 1);
    assert_eq!(stats.delivered, 2);
    assert_eq!(resyncs.load(Ordering::SeqCst), 1);

    let seen: Vec<_> = listener.seen.lock().iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(seen, vec!["/l/lock-0000000003", "/l/lock-0000000004"]);
}

#[test]
fn test_engine_reseed_as_resync_hook() {
    let namespace = Arc::new(MemoryNamespace::new("/locks/resync"));
    let holder = namespace.create_sequential("lock-");
    let mine = namespace.create_sequential("lock-");

    let (snapshot, _) = namespace.watch();
    let engine = LockOrderingEngine::new(snapshot).unwrap();
    let marker = MarkerId::from_path(&mine).unwrap();
    let handle = lock_order::WaiterHandle::new();
    engine.register_wait(marker.clone(), handle.clone()).unwrap();

    // The deletion notification is never delivered; a snapshot recovers it
    namespace.delete(&holder);
    assert_eq!(engine.reseed(namespace.children()).unwrap(), Some(marker));
    assert_eq!(handle.try_acquire(), Ok(true));
}

#[test]
fn test_payload_changes_are_ignored() {
    let namespace = MemoryNamespace::new("/locks/data");
    let (snapshot, mut receiver) = namespace.watch();
    let engine = LockOrderingEngine::new(snapshot).unwrap();

    let path = namespace.create_sequential("lock-");
    let name = MarkerId::from_path(&path).unwrap().to_string();
    assert!(namespace.set_data(&name, "owner=worker-1"));

    while let Ok(notification) = receiver.try_recv() {
        engine.notify(&notification).unwrap();
    }

    let stats = engine.stats();
    assert_eq!(stats.events_applied, 1);
    assert_eq!(stats.events_ignored, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_pump_releases_blocked_thread() {
    let namespace = Arc::new(MemoryNamespace::new("/locks/async"));
    let (snapshot, receiver) = namespace.watch();
    let engine = Arc::new(
        LockOrderingEngine::with_config(
            EngineConfig {
                shard_profile: WorkloadProfile::MediumContention,
                ..EngineConfig::default()
            },
            snapshot,
        )
        .unwrap(),
    );

    let pump = tokio::spawn(NotificationPump::new(Arc::clone(&engine)).run(receiver));

    let holder = namespace.create_sequential("lock-");
    let mine = namespace.create_sequential("lock-");
    let marker = MarkerId::from_path(&mine).unwrap();

    let waiter = {
        let engine = Arc::clone(&engine);
        tokio::task::spawn_blocking(move || engine.wait_turn(marker, Some(Duration::from_secs(5))))
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(namespace.delete(&holder));

    assert_eq!(waiter.await.unwrap(), Ok(()));

    drop(namespace);
    let stats = pump.await.unwrap();
    assert_eq!(stats.delivered, 3);
}
