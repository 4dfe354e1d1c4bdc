//! The contract a driver adapter (a database client, a queue consumer, an HTTP
//! client wrapper) implements to sit behind a [`crate::resource::ProtectedResource`].
//!
//! An adapter isn't a trait object this workspace dispatches through — it's a
//! naming and error-mapping convention. Concretely an adapter:
//!
//! - exposes a stable [`semian_identifier`](Adapter::semian_identifier), the name
//!   under which its resource is registered and logged;
//! - builds a [`ResourceConfig`](semian_resource::ResourceConfig) from its own
//!   connection options via [`semian_options`](Adapter::semian_options);
//! - declares which of its driver's error variants should trip the breaker, by
//!   implementing [`MarksCircuits`] on its own error type rather than this crate
//!   guessing;
//! - wraps every driver call through [`ProtectedResource::acquire`], and maps the
//!   two breaker/bulkhead-originated variants of the returned [`SemianError`] onto
//!   [`ResourceBusyError`] and [`CircuitOpenError`] so callers can match on a
//!   narrow, adapter-shaped error instead of the full umbrella enum.
//!
//! ```no_run
//! use semian::adapter::{Adapter, CircuitOpenError, ResourceBusyError};
//! use semian::core::MarksCircuits;
//! use semian::resource::{ProtectedResource, ResourceConfigBuilder, Scope};
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum PgError {
//!     #[error("connection refused")]
//!     ConnectionRefused,
//!     #[error("unique constraint violated")]
//!     UniqueViolation,
//! }
//!
//! impl MarksCircuits for PgError {
//!     fn marks_circuits(&self) -> bool {
//!         // A constraint violation is the caller's fault, not the database's.
//!         !matches!(self, PgError::UniqueViolation)
//!     }
//! }
//!
//! struct Postgres {
//!     resource: ProtectedResource,
//! }
//!
//! impl Adapter for Postgres {
//!     const IDENTIFIER: &'static str = "postgres";
//!
//!     fn resource(&self) -> &ProtectedResource {
//!         &self.resource
//!     }
//! }
//!
//! impl Postgres {
//!     fn connect(name: &str) -> Result<Self, semian_bulkhead::BulkheadError> {
//!         let config = ResourceConfigBuilder::new(name)
//!             .tickets(4)
//!             .timeout(Duration::from_millis(250))
//!             .error_threshold(5)
//!             .build()?;
//!         Ok(Self { resource: ProtectedResource::register(config)? })
//!     }
//!
//!     fn query(&self, sql: &str) -> Result<u64, CircuitOpenOrBusyOrApplication> {
//!         self.resource
//!             .acquire(None, Scope::Query, Self::IDENTIFIER, || {
//!                 run_query(sql)
//!             })
//!             .map_err(Into::into)
//!     }
//! }
//!
//! # fn run_query(_sql: &str) -> Result<u64, PgError> { Ok(0) }
//! # type CircuitOpenOrBusyOrApplication = semian::core::SemianError<PgError>;
//! ```

use semian_core::SemianError;
use semian_resource::ProtectedResource;

/// The stable identity and entry point a driver adapter exposes.
///
/// `IDENTIFIER` is what shows up in `tracing` spans, `state_change` events, and
/// as the `adapter` field on `busy`/`circuit_open` events — it should be the
/// driver's conventional name (`"mysql2"`, `"redis"`, `"postgres"`), not the
/// resource instance's name (that's `resource().name()`).
pub trait Adapter {
    /// The adapter's stable identifier, shared across every resource instance
    /// this adapter type registers.
    const IDENTIFIER: &'static str;

    /// The protected resource this adapter's calls are routed through.
    fn resource(&self) -> &ProtectedResource;
}

/// The bulkhead-saturation half of [`SemianError`], surfaced under the name an
/// adapter caller actually wants to match on.
///
/// Mirrors `SemianError::ResourceBusy`/`SemianError::Timeout`: both mean "no
/// ticket was available in time," just from the two different surfaces
/// (explicit bulkhead saturation vs. a timed wait expiring) that can raise it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("resource '{resource}' has no bulkhead ticket available")]
pub struct ResourceBusyError {
    pub resource: String,
}

/// The breaker-denial half of [`SemianError`], surfaced under the name an
/// adapter caller actually wants to match on.
#[derive(Debug, Clone, thiserror::Error)]
#[error("circuit '{resource}' is open")]
pub struct CircuitOpenError {
    pub resource: String,
}

/// An adapter-facing error: either the breaker/bulkhead denied the call, or the
/// driver's own call failed.
///
/// Adapters that want their own enum instead can pattern-match
/// [`SemianError`] directly and skip this type; it exists for adapters that
/// would rather re-export three concrete error types than the full umbrella.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError<E> {
    #[error(transparent)]
    Busy(#[from] ResourceBusyError),
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),
    #[error(transparent)]
    Application(E),
}

impl<E> From<SemianError<E>> for AdapterError<E> {
    fn from(err: SemianError<E>) -> Self {
        match err {
            SemianError::Timeout { resource, .. } | SemianError::ResourceBusy { resource } => {
                AdapterError::Busy(ResourceBusyError { resource })
            }
            SemianError::OpenCircuit { resource } => {
                AdapterError::CircuitOpen(CircuitOpenError { resource })
            }
            SemianError::Application(e) => AdapterError::Application(e),
            SemianError::Syscall { resource, message } | SemianError::Internal { resource, message } => {
                // Neither has a meaningful adapter-facing narrowing; callers that
                // need to distinguish these should match `SemianError` directly.
                AdapterError::CircuitOpen(CircuitOpenError {
                    resource: format!("{resource}: {message}"),
                })
            }
        }
    }
}
