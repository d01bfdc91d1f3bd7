/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::waiter::WaitError;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for engine operations
pub type LockResult<T> = Result<T, LockError>;

/// Lock ordering errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum LockError {
    #[error("Malformed notification path: {0:?}")]
    #[diagnostic(
        code(lock::malformed_path),
        help("The coordination service delivered a path without a trailing segment. This is a defect in the notification source.")
    )]
    MalformedPath(String),

    #[error("Invalid marker {marker:?}: {reason}")]
    #[diagnostic(
        code(lock::invalid_marker),
        help("Lock markers must end in a decimal sequence counter, e.g. lock-0000000042.")
    )]
    InvalidMarker { marker: String, reason: String },

    #[error("Marker {0} already has a registered waiter")]
    #[diagnostic(
        code(lock::duplicate_registration),
        help("Each marker belongs to exactly one acquiring thread. Check that markers are not reused.")
    )]
    DuplicateRegistration(String),

    #[error("Lock ordering engine has been cancelled")]
    #[diagnostic(
        code(lock::cancelled),
        help("The namespace instance is being torn down. Create a new engine to acquire again.")
    )]
    Cancelled,

    #[error("Wait failed: {0}")]
    #[diagnostic(code(lock::wait_failed))]
    Wait(#[from] WaitError),
}

impl LockError {
    /// Build an `InvalidMarker` error
    pub(crate) fn invalid_marker(marker: impl Into<String>, reason: impl Into<String>) -> Self {
        LockError::InvalidMarker {
            marker: marker.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is the designed cancellation outcome rather than a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            LockError::Cancelled | LockError::Wait(WaitError::Cancelled)
        )
    }
}
