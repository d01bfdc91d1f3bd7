/*!
 * Lock Order
 * Client-side ordering engine for sequential-marker distributed locks
 */

pub mod core;
pub mod engine;
pub mod markers;
pub mod monitoring;
pub mod namespace;
pub mod waiter;

// Re-exports
pub use crate::core::{EngineConfig, LockError, LockResult, WorkloadProfile};
pub use engine::{EngineState, EngineStats, LockOrderingEngine};
pub use markers::{MarkerId, MarkerSet};
pub use monitoring::init_tracing;
pub use namespace::{
    EventKind, Listener, MemoryNamespace, Notification, NotificationBroadcaster, NotificationPump,
    PumpStats,
};
pub use waiter::{BinarySemaphore, WaitError, WaiterHandle};
