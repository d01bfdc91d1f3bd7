/*!
 * Namespace Plumbing
 *
 * Notification types and the listener seam the engine plugs into, plus thin
 * glue for feeding notifications from a broadcast channel and an in-process
 * simulation of the coordination service.
 */

mod broadcast;
mod pump;
mod simulation;
mod traits;
mod types;

pub use broadcast::NotificationBroadcaster;
pub use pump::{NotificationPump, PumpStats};
pub use simulation::MemoryNamespace;
pub use traits::Listener;
pub use types::{EventKind, Notification};
