/*!
 * Namespace Notification Types
 */

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Kind of change reported for a namespace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Entry was created
    Created,
    /// Entry was deleted (explicitly or by session expiry)
    Deleted,
    /// Entry payload changed
    DataChanged,
    /// Children of the entry changed
    ChildrenChanged,
    /// Anything else the service reports (session events, ...)
    Other,
}

impl EventKind {
    /// Whether this kind changes lock-marker membership
    #[inline]
    pub fn is_membership_change(self) -> bool {
        matches!(self, EventKind::Created | EventKind::Deleted)
    }
}

/// One change notification for a namespace entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Full entry path, e.g. `/locks/orders/lock-0000000003`
    pub path: String,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Bytes::is_empty")]
    pub payload: Bytes,
}

impl Notification {
    pub fn new(path: impl Into<String>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            payload: Bytes::new(),
        }
    }

    pub fn created(path: impl Into<String>) -> Self {
        Self::new(path, EventKind::Created)
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self::new(path, EventKind::Deleted)
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }
}
