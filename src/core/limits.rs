/*!
 * Engine Limits and Constants
 *
 * Centralized location for thresholds and defaults used across the crate.
 */

use std::time::Duration;

// =============================================================================
// MARKERS
// =============================================================================

/// Digits in a coordination-service sequence suffix (`lock-0000000042`)
pub const SEQUENCE_WIDTH: usize = 10;

/// Longest sequence suffix accepted when parsing a marker
/// u64::MAX has 20 digits; anything longer cannot be a valid counter
pub const MAX_SEQUENCE_DIGITS: usize = 20;

// =============================================================================
// WAITING
// =============================================================================

/// Default per-thread wait timeout (None = block until released or cancelled)
pub const DEFAULT_WAIT_TIMEOUT: Option<Duration> = None;

/// Wait timeout preset for interactive callers
pub const INTERACTIVE_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Broadcast buffer for namespace notifications
/// [PERF] Large enough that a pump stalled for a scheduler tick does not lag
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 4096;

/// Thread name used by notification pumps
pub const PUMP_THREAD_NAME: &str = "lock-order-pump";
