/*!
 * Lock Ordering Engine
 *
 * Reconciles namespace notifications with local waiters. On every change the
 * engine looks at the minimum marker and, if a local thread is waiting on it,
 * removes that waiter and grants its permit.
 *
 * # Locking
 *
 * - `state` read side is held for the whole release step and across the
 *   check-and-insert of a registration; `cancel_all` takes the write side,
 *   so no release or registration straddles cancellation.
 * - The release step holds the marker set read lock while removing the
 *   waiter, so a released marker is the minimum at the moment of release.
 * - Lock order is always state -> marker set -> wait map shard.
 */

use super::stats::{AtomicEngineStats, EngineStats};
use crate::core::config::EngineConfig;
use crate::core::errors::{LockError, LockResult};
use crate::markers::{MarkerId, MarkerSet};
use crate::monitoring::WaitSpan;
use crate::namespace::{EventKind, Listener};
use crate::waiter::{WaitError, WaiterHandle};
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Lifecycle of one namespace instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Processing notifications and registrations
    Active,
    /// Torn down; notifications still update the marker set, nothing is released
    Cancelled,
}

/// Client-side ordering engine for one lock namespace
pub struct LockOrderingEngine {
    markers: MarkerSet,
    waiters: DashMap<MarkerId, WaiterHandle, RandomState>,
    state: RwLock<EngineState>,
    stats: AtomicEngineStats,
    config: EngineConfig,
}

impl LockOrderingEngine {
    /// Create an engine seeded with the namespace snapshot taken at watch time
    ///
    /// Entries may be bare marker names or full paths.
    pub fn new<I, S>(snapshot: I) -> LockResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(EngineConfig::default(), snapshot)
    }

    pub fn with_config<I, S>(config: EngineConfig, snapshot: I) -> LockResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seed = parse_snapshot(snapshot)?;
        let shards = config.shard_profile.shards();

        info!(
            markers = seed.len(),
            shards,
            "lock ordering engine initialized"
        );

        Ok(Self {
            markers: MarkerSet::with_markers(seed),
            waiters: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                shards,
            ),
            state: RwLock::new(EngineState::Active),
            stats: AtomicEngineStats::new(),
            config,
        })
    }

    /// Apply one namespace notification and attempt a release
    ///
    /// Kinds other than Created/Deleted are ignored. Returns the marker whose
    /// waiter was released by this call, if any.
    pub fn on_marker_event(&self, path: &str, kind: EventKind) -> LockResult<Option<MarkerId>> {
        if !kind.is_membership_change() {
            self.stats.inc_events_ignored();
            trace!(path, ?kind, "ignoring notification");
            return Ok(None);
        }

        let marker = MarkerId::from_path(path)?;
        let changed = match kind {
            EventKind::Created => self.markers.insert(marker.clone()),
            _ => self.markers.remove(&marker),
        };
        self.stats.inc_events_applied();
        trace!(marker = %marker, ?kind, changed, "marker set updated");

        Ok(self.release())
    }

    /// Register `handle` as waiting for `marker` to become the minimum
    ///
    /// Re-runs the release step afterwards, so a marker that became minimal
    /// before registration is released immediately.
    pub fn register_wait(&self, marker: MarkerId, handle: WaiterHandle) -> LockResult<()> {
        {
            let state = self.state.read();
            if *state == EngineState::Cancelled {
                return Err(LockError::Cancelled);
            }

            match self.waiters.entry(marker.clone()) {
                Entry::Occupied(_) => {
                    warn!(marker = %marker, "duplicate wait registration rejected");
                    return Err(LockError::DuplicateRegistration(marker.to_string()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(handle);
                }
            }
        }

        self.stats.inc_registrations();
        debug!(marker = %marker, "waiter registered");

        self.release();
        Ok(())
    }

    /// Remove a waiter's own registration (after a per-thread timeout)
    ///
    /// `None` means the entry was already taken by a release or by
    /// cancellation, and the handle has been or is about to be signalled.
    pub fn deregister(&self, marker: &MarkerId) -> Option<WaiterHandle> {
        let (_, handle) = self.waiters.remove(marker)?;
        self.stats.inc_deregistrations();
        debug!(marker = %marker, "waiter deregistered");
        Some(handle)
    }

    /// Register the calling thread for `marker` and block until it is the minimum
    ///
    /// `timeout` falls back to the configured default. On timeout the
    /// registration is removed before returning, unless a release won the race,
    /// in which case the turn is granted.
    pub fn wait_turn(&self, marker: MarkerId, timeout: Option<Duration>) -> LockResult<()> {
        let timeout = timeout.or(self.config.wait_timeout);
        let mut span = WaitSpan::new(&marker);
        let handle = WaiterHandle::new();
        self.register_wait(marker.clone(), handle.clone())?;

        let result = match handle.acquire(timeout) {
            Err(WaitError::Timeout) if self.deregister(&marker).is_some() => {
                Err(WaitError::Timeout)
            }
            // Entry was taken between timeout and removal; its signal is imminent
            Err(WaitError::Timeout) => handle.acquire(None),
            other => other,
        };

        span.record_outcome(match result {
            Ok(()) => "released",
            Err(WaitError::Timeout) => "timeout",
            Err(WaitError::Cancelled) => "cancelled",
        });
        result.map_err(LockError::from)
    }

    /// Interrupt every waiting thread and stop releasing
    ///
    /// Returns the number of waiters interrupted.
    pub fn cancel_all(&self) -> usize {
        {
            let mut state = self.state.write();
            if *state == EngineState::Active {
                info!("lock ordering engine cancelled");
            }
            *state = EngineState::Cancelled;
        }

        // Each shard is drained under its write lock
        let mut drained = Vec::new();
        self.waiters.retain(|marker, handle| {
            drained.push((marker.clone(), handle.clone()));
            false
        });

        for (marker, handle) in &drained {
            handle.interrupt();
            debug!(marker = %marker, "waiter interrupted");
        }

        self.stats.add_interrupted(drained.len() as u64);
        drained.len()
    }

    /// Replace the marker set with a fresh namespace snapshot
    ///
    /// Used after notifications were lost. The snapshot is validated before
    /// anything changes.
    pub fn reseed<I, S>(&self, snapshot: I) -> LockResult<Option<MarkerId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seed = parse_snapshot(snapshot)?;
        info!(markers = seed.len(), "marker set reseeded");
        self.markers.replace(seed);
        Ok(self.release())
    }

    /// Release step: signal the waiter bound to the current minimum, if local
    fn release(&self) -> Option<MarkerId> {
        let state = self.state.read();
        if *state == EngineState::Cancelled {
            return None;
        }

        let released = self
            .markers
            .with_minimum(|minimum| self.waiters.remove(minimum?));

        match released {
            Some((marker, handle)) => {
                handle.signal();
                self.stats.inc_releases();
                debug!(marker = %marker, "waiter released");
                Some(marker)
            }
            None => {
                trace!("minimum marker has no local waiter");
                None
            }
        }
    }

    /// Current minimum marker
    pub fn minimum(&self) -> Option<MarkerId> {
        self.markers.minimum()
    }

    /// Whether `marker` is currently the minimum
    pub fn is_minimum(&self, marker: &MarkerId) -> bool {
        self.markers.read().first() == Some(marker)
    }

    /// Known markers in ascending order
    pub fn markers(&self) -> Vec<MarkerId> {
        self.markers.snapshot()
    }

    pub fn is_waiting(&self, marker: &MarkerId) -> bool {
        self.waiters.contains_key(marker)
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    pub fn state(&self) -> EngineState {
        *self.state.read()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == EngineState::Cancelled
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Listener for LockOrderingEngine {
    fn listen(&self, path: &str, kind: EventKind, _payload: &[u8]) -> LockResult<()> {
        self.on_marker_event(path, kind).map(|_| ())
    }
}

impl std::fmt::Debug for LockOrderingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockOrderingEngine")
            .field("state", &self.state())
            .field("markers", &self.markers.len())
            .field("waiters", &self.waiters.len())
            .finish()
    }
}

fn parse_snapshot<I, S>(snapshot: I) -> LockResult<Vec<MarkerId>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    snapshot
        .into_iter()
        .map(|entry| MarkerId::from_path(entry.as_ref()))
        .collect()
}
