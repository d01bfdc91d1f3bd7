/*!
 * Binary Semaphore
 *
 * One-shot permit with a first-class cancelled state, built on
 * parking_lot::Condvar. Starts empty, holds at most one permit.
 */

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitError {
    #[error("Wait operation timed out")]
    Timeout,

    #[error("Wait was cancelled")]
    Cancelled,
}

/// Permit state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitState {
    /// No permit available, acquirers block
    Empty,
    /// One permit available
    Granted,
    /// Interrupted; every current and future acquire fails with `Cancelled`
    Cancelled,
}

/// Capacity-1 semaphore distinguishing release from interruption
#[repr(C, align(64))]
pub struct BinarySemaphore {
    state: Mutex<PermitState>,
    condvar: Condvar,
}

impl BinarySemaphore {
    /// Create an empty semaphore (zero permits)
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(PermitState::Empty),
            condvar: Condvar::new(),
        }
    }

    /// Make a permit available
    ///
    /// Returns `false` without changing anything if a permit is already
    /// available or the semaphore was cancelled.
    pub fn release(&self) -> bool {
        let mut state = self.state.lock();
        if *state != PermitState::Empty {
            return false;
        }
        *state = PermitState::Granted;
        self.condvar.notify_one();
        true
    }

    /// Interrupt all blocked and future acquirers
    ///
    /// Returns `false` if already cancelled. An unconsumed permit is discarded.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if *state == PermitState::Cancelled {
            return false;
        }
        *state = PermitState::Cancelled;
        self.condvar.notify_all();
        true
    }

    /// Block until a permit is available, cancelled, or `timeout` elapses
    pub fn acquire(&self, timeout: Option<Duration>) -> WaitResult<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();

        loop {
            match *state {
                PermitState::Granted => {
                    *state = PermitState::Empty;
                    return Ok(());
                }
                PermitState::Cancelled => return Err(WaitError::Cancelled),
                PermitState::Empty => {}
            }

            match deadline {
                Some(deadline) => {
                    if self.condvar.wait_until(&mut state, deadline).timed_out() {
                        // A release may have raced the timeout
                        return match *state {
                            PermitState::Granted => {
                                *state = PermitState::Empty;
                                Ok(())
                            }
                            PermitState::Cancelled => Err(WaitError::Cancelled),
                            PermitState::Empty => Err(WaitError::Timeout),
                        };
                    }
                }
                None => self.condvar.wait(&mut state),
            }
        }
    }

    /// Take a permit if one is available, without blocking
    pub fn try_acquire(&self) -> WaitResult<bool> {
        let mut state = self.state.lock();
        match *state {
            PermitState::Granted => {
                *state = PermitState::Empty;
                Ok(true)
            }
            PermitState::Cancelled => Err(WaitError::Cancelled),
            PermitState::Empty => Ok(false),
        }
    }

    /// Current state (diagnostics only, may be stale immediately)
    pub fn state(&self) -> PermitState {
        *self.state.lock()
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BinarySemaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinarySemaphore")
            .field("state", &self.state())
            .finish()
    }
}
