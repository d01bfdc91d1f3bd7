/*!
 * Notification Pump
 *
 * Drains a broadcast receiver into a `Listener`, either on a dedicated OS
 * thread (`spawn`) or as a future (`run`). Listener errors are logged and
 * counted, never fatal. A lagged receiver has lost notifications, so the
 * optional resync hook is invoked to rebuild membership from a snapshot.
 */

use super::traits::Listener;
use super::types::Notification;
use crate::core::errors::LockResult;
use crate::core::limits::PUMP_THREAD_NAME;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, warn};

/// Counters reported when a pump stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpStats {
    /// Notifications accepted by the listener
    pub delivered: u64,
    /// Notifications the listener rejected
    pub failed: u64,
    /// Notifications dropped because the receiver fell behind
    pub lagged: u64,
    /// Resync hook invocations
    pub resyncs: u64,
}

type ResyncHook = Box<dyn Fn() -> LockResult<()> + Send + Sync>;

/// Forwards notifications from a broadcast receiver to a listener
pub struct NotificationPump<L: Listener + ?Sized> {
    listener: Arc<L>,
    resync: Option<ResyncHook>,
}

impl<L: Listener + ?Sized + 'static> NotificationPump<L> {
    pub fn new(listener: Arc<L>) -> Self {
        Self {
            listener,
            resync: None,
        }
    }

    /// Hook run after the receiver lagged, typically reseeding from a snapshot
    pub fn with_resync<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> LockResult<()> + Send + Sync + 'static,
    {
        self.resync = Some(Box::new(hook));
        self
    }

    /// Run on a named OS thread until every sender is dropped
    pub fn spawn(
        self,
        mut receiver: broadcast::Receiver<Notification>,
    ) -> std::io::Result<JoinHandle<PumpStats>> {
        std::thread::Builder::new()
            .name(PUMP_THREAD_NAME.to_string())
            .spawn(move || {
                let mut stats = PumpStats::default();
                loop {
                    if !self.handle(receiver.blocking_recv(), &mut stats) {
                        break;
                    }
                }
                debug!(?stats, "notification pump stopped");
                stats
            })
    }

    /// Async equivalent of [`spawn`](Self::spawn) for tokio callers
    pub async fn run(self, mut receiver: broadcast::Receiver<Notification>) -> PumpStats {
        let mut stats = PumpStats::default();
        loop {
            let next = receiver.recv().await;
            if !self.handle(next, &mut stats) {
                break;
            }
        }
        debug!(?stats, "notification pump stopped");
        stats
    }

    /// Process one receive result. Returns `false` once the channel closed.
    fn handle(&self, next: Result<Notification, RecvError>, stats: &mut PumpStats) -> bool {
        match next {
            Ok(notification) => {
                match self.listener.notify(&notification) {
                    Ok(()) => stats.delivered += 1,
                    Err(e) => {
                        stats.failed += 1;
                        error!(path = %notification.path, error = %e, "listener rejected notification");
                    }
                }
                true
            }
            Err(RecvError::Lagged(skipped)) => {
                stats.lagged += skipped;
                warn!(skipped, "notification receiver lagged");
                if let Some(resync) = &self.resync {
                    stats.resyncs += 1;
                    if let Err(e) = resync() {
                        error!(error = %e, "resync after lag failed");
                    }
                }
                true
            }
            Err(RecvError::Closed) => false,
        }
    }
}
