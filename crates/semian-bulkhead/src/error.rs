//! Error types for the named-semaphore bulkhead.

use std::time::Duration;

/// Errors raised by bulkhead registration and acquisition.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BulkheadError {
    /// `sem_open`/`shm_open` (or their destroy counterparts) failed.
    #[error("syscall failed for bulkhead '{resource}': {message}")]
    Syscall { resource: String, message: String },

    /// No ticket became available within the requested timeout.
    #[error("timed out waiting for a bulkhead ticket on '{resource}' after {waited:?}")]
    Timeout { resource: String, waited: Duration },

    /// An invariant was violated — most commonly, re-registering a resource with
    /// incompatible `tickets`/`quota` options.
    #[error("internal invariant violated for bulkhead '{resource}': {message}")]
    Internal { resource: String, message: String },
}

impl BulkheadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BulkheadError::Timeout { .. })
    }

    pub fn is_syscall(&self) -> bool {
        matches!(self, BulkheadError::Syscall { .. })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, BulkheadError::Internal { .. })
    }
}

pub type Result<T> = std::result::Result<T, BulkheadError>;
