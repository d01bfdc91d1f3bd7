/*!
 * Waiter Handle
 * Pairs a binary semaphore with the thread blocked on it
 */

use super::semaphore::{BinarySemaphore, WaitResult};
use std::sync::Arc;
use std::thread::{self, Thread};
use std::time::Duration;

/// Handle shared by a waiting thread and the engine
///
/// Cloning shares the same semaphore.
#[derive(Debug, Clone)]
pub struct WaiterHandle {
    semaphore: Arc<BinarySemaphore>,
    thread: Thread,
}

impl WaiterHandle {
    /// Create a handle bound to the calling thread
    pub fn new() -> Self {
        Self::for_thread(thread::current())
    }

    /// Create a handle bound to a specific thread
    pub fn for_thread(thread: Thread) -> Self {
        Self {
            semaphore: Arc::new(BinarySemaphore::new()),
            thread,
        }
    }

    pub fn semaphore(&self) -> &BinarySemaphore {
        &self.semaphore
    }

    /// The execution unit blocked on this handle
    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// Grant the permit (normal release)
    #[inline]
    pub fn signal(&self) -> bool {
        self.semaphore.release()
    }

    /// Interrupt the bound thread
    ///
    /// Cancels the semaphore and unparks the thread, so callers blocked in
    /// either `acquire` or `thread::park` observe it.
    pub fn interrupt(&self) -> bool {
        let cancelled = self.semaphore.cancel();
        self.thread.unpark();
        cancelled
    }

    /// Block until signalled, interrupted, or `timeout` elapses
    #[inline]
    pub fn acquire(&self, timeout: Option<Duration>) -> WaitResult<()> {
        self.semaphore.acquire(timeout)
    }

    #[inline]
    pub fn try_acquire(&self) -> WaitResult<bool> {
        self.semaphore.try_acquire()
    }

    /// Whether two handles share the same semaphore
    pub fn same_as(&self, other: &WaiterHandle) -> bool {
        Arc::ptr_eq(&self.semaphore, &other.semaphore)
    }
}

impl Default for WaiterHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waiter::WaitError;

    #[test]
    fn test_bound_to_current_thread() {
        let handle = WaiterHandle::new();
        assert_eq!(handle.thread().id(), thread::current().id());
    }

    #[test]
    fn test_clones_share_semaphore() {
        let handle = WaiterHandle::new();
        let engine_side = handle.clone();
        assert!(handle.same_as(&engine_side));
        assert!(!handle.same_as(&WaiterHandle::new()));

        engine_side.signal();
        assert_eq!(handle.try_acquire(), Ok(true));
    }

    #[test]
    fn test_interrupt_unparks_parked_thread() {
        let (tx, rx) = std::sync::mpsc::channel();

        let worker = thread::spawn(move || {
            let handle = WaiterHandle::new();
            tx.send(handle.clone()).unwrap();
            while handle.try_acquire() == Ok(false) {
                thread::park();
            }
            handle.try_acquire()
        });

        let handle = rx.recv().unwrap();
        assert!(handle.interrupt());
        assert_eq!(worker.join().unwrap(), Err(WaitError::Cancelled));
    }
}
