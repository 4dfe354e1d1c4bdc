//! The shared error taxonomy.
//!
//! [`SemianError`] is the umbrella error every component in this workspace returns,
//! so a composed protected resource doesn't need hand-written `From` impls for each
//! layer underneath it.
//!
//! # Taxonomy
//!
//! - [`SemianError::Syscall`] — an OS-level primitive (a named semaphore, mostly)
//!   failed to allocate or attach.
//! - [`SemianError::Timeout`] — a bulkhead wait expired before a ticket was granted.
//! - [`SemianError::Internal`] — an invariant was violated (incompatible re-registration,
//!   a state machine reaching an impossible transition).
//! - [`SemianError::OpenCircuit`] — a breaker denied admission.
//! - [`SemianError::ResourceBusy`] — the adapter-facing alias for bulkhead saturation;
//!   distinct from `Timeout` only in which surface raises it.
//! - [`SemianError::Application`] — the protected block's own error, passed through.
//!
//! An adapter-level error is modeled as the [`AdapterTagged`] trait rather than a
//! variant: an adapter wraps whichever of the variants above it raised and attaches
//! its `semian_identifier`, rather than this crate knowing about adapters at all.

use std::fmt;
use std::time::Duration;

/// The umbrella error type returned by bulkhead, breaker, and resource operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SemianError<E> {
    /// An OS-level primitive (named semaphore create/attach/destroy) failed.
    #[error("syscall failed for resource '{resource}': {message}")]
    Syscall {
        resource: String,
        message: String,
    },

    /// A bulkhead wait expired before a ticket was granted.
    #[error("timed out waiting for a bulkhead ticket on '{resource}' after {waited:?}")]
    Timeout {
        resource: String,
        waited: Duration,
    },

    /// An invariant was violated (e.g. incompatible re-registration options).
    #[error("internal invariant violated for '{resource}': {message}")]
    Internal {
        resource: String,
        message: String,
    },

    /// A circuit breaker denied admission.
    #[error("circuit '{resource}' is open")]
    OpenCircuit { resource: String },

    /// The adapter-facing alias for bulkhead saturation.
    #[error("resource '{resource}' is busy")]
    ResourceBusy { resource: String },

    /// The protected block raised its own error.
    #[error("application error: {0}")]
    Application(E),
}

impl<E> SemianError<E> {
    pub fn is_syscall(&self) -> bool {
        matches!(self, SemianError::Syscall { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SemianError::Timeout { .. })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, SemianError::Internal { .. })
    }

    pub fn is_open_circuit(&self) -> bool {
        matches!(self, SemianError::OpenCircuit { .. })
    }

    pub fn is_resource_busy(&self) -> bool {
        matches!(self, SemianError::ResourceBusy { .. })
    }

    pub fn is_application(&self) -> bool {
        matches!(self, SemianError::Application(_))
    }

    pub fn application_error(self) -> Option<E> {
        match self {
            SemianError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Breaker denial and bulkhead timeout never feed back into the breaker as
    /// errors, to avoid a self-reinforcing open state.
    pub fn counts_as_circuit_failure(&self) -> bool {
        !matches!(
            self,
            SemianError::OpenCircuit { .. } | SemianError::Timeout { .. } | SemianError::ResourceBusy { .. }
        )
    }

    pub fn map_application<F, T>(self, f: F) -> SemianError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            SemianError::Syscall { resource, message } => SemianError::Syscall { resource, message },
            SemianError::Timeout { resource, waited } => SemianError::Timeout { resource, waited },
            SemianError::Internal { resource, message } => SemianError::Internal { resource, message },
            SemianError::OpenCircuit { resource } => SemianError::OpenCircuit { resource },
            SemianError::ResourceBusy { resource } => SemianError::ResourceBusy { resource },
            SemianError::Application(e) => SemianError::Application(f(e)),
        }
    }
}

/// Carried by adapter-surfaced errors: the stable identifier of the adapter that
/// raised them.
pub trait AdapterTagged {
    fn semian_identifier(&self) -> &str;
}

/// A thin wrapper pairing any error with the adapter identifier that raised it,
/// for adapters that don't want to fold the tag into their own error enum.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{semian_identifier}] {source}")]
pub struct Tagged<E> {
    pub semian_identifier: String,
    #[source]
    pub source: E,
}

impl<E: fmt::Debug + fmt::Display> AdapterTagged for Tagged<E> {
    fn semian_identifier(&self) -> &str {
        &self.semian_identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, thiserror::Error)]
    #[error("boom")]
    struct TestError;

    const _: () = {
        const fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<SemianError<TestError>>();
    };

    #[test]
    fn open_circuit_and_timeout_do_not_count_as_circuit_failures() {
        let open: SemianError<TestError> = SemianError::OpenCircuit {
            resource: "db".into(),
        };
        let timeout: SemianError<TestError> = SemianError::Timeout {
            resource: "db".into(),
            waited: Duration::from_millis(50),
        };
        let busy: SemianError<TestError> = SemianError::ResourceBusy {
            resource: "db".into(),
        };
        assert!(!open.counts_as_circuit_failure());
        assert!(!timeout.counts_as_circuit_failure());
        assert!(!busy.counts_as_circuit_failure());
    }

    #[test]
    fn application_error_counts_as_circuit_failure() {
        let err: SemianError<TestError> = SemianError::Application(TestError);
        assert!(err.counts_as_circuit_failure());
        assert!(err.is_application());
    }

    #[test]
    fn map_application_transforms_only_the_application_variant() {
        let err: SemianError<String> = SemianError::Application("oops".to_string());
        let mapped = err.map_application(|s| s.len());
        assert_eq!(mapped.application_error(), Some(3));
    }

    #[test]
    fn tagged_exposes_semian_identifier() {
        let tagged = Tagged {
            semian_identifier: "mysql2".to_string(),
            source: TestError,
        };
        assert_eq!(tagged.semian_identifier(), "mysql2");
        assert!(tagged.to_string().contains("mysql2"));
    }
}
