/*!
 * Waiters
 *
 * The blocking side of lock ordering: a capacity-1 semaphore that can be
 * released normally or interrupted, bound to the thread waiting on it.
 */

mod handle;
mod semaphore;

pub use handle::WaiterHandle;
pub use semaphore::{BinarySemaphore, PermitState, WaitError, WaitResult};
