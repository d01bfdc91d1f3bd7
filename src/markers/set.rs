/*!
 * Ordered Marker Set
 *
 * Current membership of the lock namespace as seen through notifications.
 * A `BTreeSet` under a `parking_lot::RwLock`: minimum is O(log n) and many
 * readers (release steps) proceed in parallel while inserts/removes serialize.
 */

use super::id::MarkerId;
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeSet;

/// Concurrent ordered set of markers
#[derive(Debug, Default)]
pub struct MarkerSet {
    inner: RwLock<BTreeSet<MarkerId>>,
}

impl MarkerSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set seeded with `markers`
    pub fn with_markers<I>(markers: I) -> Self
    where
        I: IntoIterator<Item = MarkerId>,
    {
        let set = Self::new();
        set.initialize(markers);
        set
    }

    /// Seed with a known starting membership
    ///
    /// Adds to whatever is already present; an empty iterator is a no-op.
    pub fn initialize<I>(&self, markers: I)
    where
        I: IntoIterator<Item = MarkerId>,
    {
        let mut iter = markers.into_iter().peekable();
        if iter.peek().is_none() {
            return;
        }
        self.inner.write().extend(iter);
    }

    /// Add a marker. Returns `false` if it was already present.
    pub fn insert(&self, id: MarkerId) -> bool {
        self.inner.write().insert(id)
    }

    /// Remove a marker. Returns `false` if it was absent.
    pub fn remove(&self, id: &MarkerId) -> bool {
        self.inner.write().remove(id)
    }

    /// Smallest marker by sequence order
    pub fn minimum(&self) -> Option<MarkerId> {
        self.inner.read().first().cloned()
    }

    /// Run `f` against the minimum while holding the read lock
    ///
    /// No insert or remove can land until `f` returns, so whatever `f` decides
    /// holds for the minimum it was given.
    pub fn with_minimum<R, F>(&self, f: F) -> R
    where
        F: FnOnce(Option<&MarkerId>) -> R,
    {
        let guard = self.inner.read();
        f(guard.first())
    }

    /// Atomically replace the whole membership
    pub fn replace<I>(&self, markers: I)
    where
        I: IntoIterator<Item = MarkerId>,
    {
        let fresh: BTreeSet<MarkerId> = markers.into_iter().collect();
        *self.inner.write() = fresh;
    }

    pub fn contains(&self, id: &MarkerId) -> bool {
        self.inner.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// All markers in ascending sequence order
    pub fn snapshot(&self) -> Vec<MarkerId> {
        self.inner.read().iter().cloned().collect()
    }

    /// Read access for callers that need several queries under one lock
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BTreeSet<MarkerId>> {
        self.inner.read()
    }
}
