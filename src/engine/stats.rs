/*!
 * Lock-Free Engine Statistics
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Created/Deleted notifications applied to the marker set
    pub events_applied: u64,
    /// Notifications of other kinds
    pub events_ignored: u64,
    /// Successful `register_wait` calls
    pub registrations: u64,
    /// Waiters signalled by the release step
    pub releases: u64,
    /// Waiters removed by their own thread (timeouts)
    pub deregistrations: u64,
    /// Waiters interrupted by `cancel_all`
    pub interrupted: u64,
}

/// Atomic counters backing [`EngineStats`]
///
/// Cache-line aligned so hot counters don't share a line with engine state.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicEngineStats {
    events_applied: AtomicU64,
    events_ignored: AtomicU64,
    registrations: AtomicU64,
    releases: AtomicU64,
    deregistrations: AtomicU64,
    interrupted: AtomicU64,
}

impl AtomicEngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_events_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_events_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_releases(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_deregistrations(&self) {
        self.deregistrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn add_interrupted(&self, count: u64) {
        self.interrupted.fetch_add(count, Ordering::Relaxed);
    }

    /// Snapshot of current counters
    ///
    /// Each value is exact but they are not read atomically as a group.
    pub fn snapshot(&self) -> EngineStats {
        EngineStats {
            events_applied: self.events_applied.load(Ordering::Acquire),
            events_ignored: self.events_ignored.load(Ordering::Acquire),
            registrations: self.registrations.load(Ordering::Acquire),
            releases: self.releases.load(Ordering::Acquire),
            deregistrations: self.deregistrations.load(Ordering::Acquire),
            interrupted: self.interrupted.load(Ordering::Acquire),
        }
    }
}
