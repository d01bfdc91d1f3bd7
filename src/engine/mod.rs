/*!
 * Lock Ordering Engine
 *
 * Decides which local waiter (if any) may proceed whenever the namespace
 * membership changes or a new waiter registers.
 */

mod ordering;
mod stats;

pub use ordering::{EngineState, LockOrderingEngine};
pub use stats::{AtomicEngineStats, EngineStats};
