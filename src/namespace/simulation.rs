/*!
 * Simulated Coordination Namespace
 *
 * In-process stand-in for the coordination service: sequential markers with a
 * global counter, explicit deletion, and change notifications through a
 * broadcast channel. Useful for the demo binary, tests and benches.
 */

use super::broadcast::NotificationBroadcaster;
use super::types::{EventKind, Notification};
use crate::markers::MarkerId;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Default)]
struct NamespaceInner {
    /// sequence -> marker name
    entries: BTreeMap<u64, String>,
    next_sequence: u64,
}

/// Simulation-based lock namespace
pub struct MemoryNamespace {
    root: String,
    inner: Mutex<NamespaceInner>,
    broadcaster: NotificationBroadcaster,
    duplicate_delivery: bool,
}

impl MemoryNamespace {
    /// Create a namespace rooted at `root` (e.g. `/locks/orders`)
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into().trim_end_matches('/').to_string();
        info!(root = %root, "lock namespace initialized (simulation mode)");
        Self {
            root,
            inner: Mutex::new(NamespaceInner::default()),
            broadcaster: NotificationBroadcaster::default(),
            duplicate_delivery: false,
        }
    }

    /// Deliver every notification twice, exercising at-least-once handling
    pub fn with_duplicate_delivery(mut self, enabled: bool) -> Self {
        self.duplicate_delivery = enabled;
        self
    }

    /// Per-client marker prefix, unique across clients
    pub fn client_prefix() -> String {
        format!("_c_{}-lock-", Uuid::new_v4().simple())
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Full path of a marker name
    pub fn path_of(&self, name: &str) -> String {
        format!("{}/{}", self.root, name)
    }

    /// Create the next sequential marker under `prefix`, returning its full path
    pub fn create_sequential(&self, prefix: &str) -> String {
        let mut inner = self.inner.lock();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let name = MarkerId::format(prefix, sequence);
        inner.entries.insert(sequence, name.clone());

        let path = self.path_of(&name);
        debug!(path = %path, "marker created");
        // Emitted under the lock so subscribers see changes in commit order
        self.publish(Notification::created(path.clone()));
        path
    }

    /// Delete a marker by full path or bare name. Returns `false` if absent.
    pub fn delete(&self, path_or_name: &str) -> bool {
        let Ok(marker) = MarkerId::from_path(path_or_name) else {
            return false;
        };

        let mut inner = self.inner.lock();
        match inner.entries.get(&marker.sequence()) {
            Some(name) if name == marker.as_str() => {
                inner.entries.remove(&marker.sequence());
            }
            _ => return false,
        }

        let path = self.path_of(marker.as_str());
        debug!(path = %path, "marker deleted");
        self.publish(Notification::deleted(path));
        true
    }

    /// Touch a marker's payload; produces a notification the engine ignores
    pub fn set_data(&self, name: &str, data: impl Into<bytes::Bytes>) -> bool {
        let inner = self.inner.lock();
        if !inner.entries.values().any(|n| n == name) {
            return false;
        }
        self.publish(Notification::new(self.path_of(name), EventKind::DataChanged).with_payload(data));
        true
    }

    /// Current marker names in sequence order
    pub fn children(&self) -> Vec<String> {
        self.inner.lock().entries.values().cloned().collect()
    }

    /// Snapshot membership and subscribe to later changes atomically
    pub fn watch(&self) -> (Vec<String>, broadcast::Receiver<Notification>) {
        let inner = self.inner.lock();
        let snapshot = inner.entries.values().cloned().collect();
        (snapshot, self.broadcaster.subscribe())
    }

    /// Subscribe without a snapshot
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.broadcaster.subscribe()
    }

    fn publish(&self, notification: Notification) {
        if self.duplicate_delivery {
            self.broadcaster.emit(notification.clone());
        }
        self.broadcaster.emit(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_creation() {
        let ns = MemoryNamespace::new("/locks/a/");
        let first = ns.create_sequential("lock-");
        let second = ns.create_sequential("lock-");

        assert_eq!(first, "/locks/a/lock-0000000000");
        assert_eq!(second, "/locks/a/lock-0000000001");
        assert_eq!(ns.children(), vec!["lock-0000000000", "lock-0000000001"]);
    }

    #[test]
    fn test_delete() {
        let ns = MemoryNamespace::new("/locks/a");
        let path = ns.create_sequential("lock-");

        assert!(ns.delete(&path));
        assert!(!ns.delete(&path));
        assert!(!ns.delete("garbage"));
        assert!(ns.children().is_empty());
    }

    #[test]
    fn test_watch_then_notifications() {
        let ns = MemoryNamespace::new("/locks/a");
        ns.create_sequential("lock-");

        let (snapshot, mut rx) = ns.watch();
        assert_eq!(snapshot, vec!["lock-0000000000"]);

        let path = ns.create_sequential("lock-");
        assert_eq!(rx.try_recv().unwrap(), Notification::created(path));
    }

    #[test]
    fn test_duplicate_delivery() {
        let ns = MemoryNamespace::new("/locks/a").with_duplicate_delivery(true);
        let mut rx = ns.subscribe();
        let path = ns.create_sequential("lock-");

        assert_eq!(rx.try_recv().unwrap().path, path);
        assert_eq!(rx.try_recv().unwrap().path, path);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_client_prefix_sorts_by_sequence() {
        let ns = MemoryNamespace::new("/locks/a");
        let a = ns.create_sequential(&MemoryNamespace::client_prefix());
        let b = ns.create_sequential(&MemoryNamespace::client_prefix());

        let a = MarkerId::from_path(&a).unwrap();
        let b = MarkerId::from_path(&b).unwrap();
        assert!(a < b);
    }
}
