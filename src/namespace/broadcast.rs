/*!
 * Notification Broadcaster
 * tokio broadcast channel fanning namespace notifications out to listeners
 */

use super::types::Notification;
use crate::core::limits::NOTIFICATION_CHANNEL_CAPACITY;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Lock-free MPMC fan-out of notifications
#[derive(Clone)]
pub struct NotificationBroadcaster {
    sender: Arc<broadcast::Sender<Notification>>,
}

impl NotificationBroadcaster {
    /// Create a broadcaster buffering up to `capacity` notifications per receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to all future notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Send to every subscriber. Returns the number of receivers reached.
    pub fn emit(&self, notification: Notification) -> usize {
        // No subscribers is fine
        self.sender.send(notification).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(NOTIFICATION_CHANNEL_CAPACITY)
    }
}
