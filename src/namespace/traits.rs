/*!
 * Namespace Traits
 */

use super::types::{EventKind, Notification};
use crate::core::errors::LockResult;

/// Receiver of namespace change notifications
///
/// Called asynchronously, possibly from several threads at once, at least
/// once per actual change.
pub trait Listener: Send + Sync {
    /// Handle one notification for `path`
    fn listen(&self, path: &str, kind: EventKind, payload: &[u8]) -> LockResult<()>;

    /// Handle a [`Notification`] value
    fn notify(&self, notification: &Notification) -> LockResult<()> {
        self.listen(&notification.path, notification.kind, &notification.payload)
    }
}
