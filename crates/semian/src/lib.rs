//! `semian` is a latency and fault-tolerance core: a cross-process counting-semaphore
//! bulkhead, a classical three-state circuit breaker, a PID-controlled adaptive
//! breaker, a dual breaker that runs both side by side, and a protected-resource
//! registry that ties a name's bulkhead and breaker together behind one `acquire`.
//!
//! Each pattern lives in its own crate and is re-exported here behind a matching
//! feature, the way a driver adapter picks just the pieces it needs.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! semian = { version = "0.1", features = ["resource"] }
//! ```
//!
//! ```rust,no_run
//! # #[cfg(feature = "resource")]
//! # {
//! use semian::resource::{ProtectedResource, ResourceConfigBuilder};
//! use std::time::Duration;
//!
//! # #[derive(Debug)]
//! # struct DbError;
//! # impl std::fmt::Display for DbError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "db error") }
//! # }
//! # impl semian::core::MarksCircuits for DbError {}
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResourceConfigBuilder::new("orders-db")
//!     .tickets(8)
//!     .timeout(Duration::from_millis(250))
//!     .error_threshold(5)
//!     .error_timeout(Duration::from_secs(30))
//!     .success_threshold(2)
//!     .build()?;
//! let resource = ProtectedResource::register(config)?;
//! resource.acquire(None, semian::resource::Scope::Query, "postgres", || {
//!     Ok::<_, DbError>(run_query())
//! })?;
//! # fn run_query() -> u64 { 42 }
//! # Ok(())
//! # }
//! # }
//! ```
//!
//! # Patterns
//!
//! - **Bulkhead** (`bulkhead` feature) — caps concurrent in-flight work against a
//!   named resource, rejecting fast once saturated.
//! - **Circuit breaker** (`circuitbreaker` feature) — classical closed/open/half-open
//!   FSM over a sliding window of recent errors.
//! - **Adaptive breaker** (`adaptive` feature) — a continuous rejection probability
//!   driven by a proportional controller over observed vs. ideal error rate.
//! - **Dual breaker** (`dual` feature) — runs both side by side; a selector decides
//!   which one actually gates admission, so the other can be evaluated in shadow.
//! - **Protected resource + registry** (`resource` feature) — composes a bulkhead and
//!   a breaker around a caller's block and keeps a process-wide, LRU-GC'd registry of
//!   them by name. This is the entry point most adapters use directly; see
//!   [`composition`] for worked examples.
//! - **Shared scope** (`shared-scope` feature) — an optional coordinator so multiple
//!   processes guarding the same dependency share one breaker's state instead of
//!   tripping independently.
//!
//! See [`composition`] for how these compose for common resource types, and
//! [`observability`] for the `tracing`/`metrics` feature surface every pattern shares.

pub mod adapter;
pub mod composition;
pub mod observability;
pub mod use_cases;

// Core is always available: `SemianError`, `MarksCircuits`, the event system.
pub use semian_core as core;

#[cfg(feature = "bulkhead")]
pub use semian_bulkhead as bulkhead;

#[cfg(feature = "circuitbreaker")]
pub use semian_circuitbreaker as circuitbreaker;

#[cfg(feature = "adaptive")]
pub use semian_adaptive as adaptive;

#[cfg(feature = "dual")]
pub use semian_dual as dual;

#[cfg(feature = "resource")]
pub use semian_resource as resource;

#[cfg(feature = "shared-scope")]
pub use semian_shared_scope as shared_scope;

/// Re-exports the handful of names almost every adapter needs, so
/// `use semian::prelude::*;` is usually enough.
pub mod prelude {
    pub use semian_core::{MarksCircuits, SemianError};

    #[cfg(feature = "resource")]
    pub use semian_resource::{ProtectedResource, Registry, ResourceConfigBuilder, ResourceEvent, Scope};

    #[cfg(feature = "bulkhead")]
    pub use semian_bulkhead::{Bulkhead, BulkheadConfigBuilder};

    #[cfg(feature = "circuitbreaker")]
    pub use semian_circuitbreaker::{CircuitBreaker, CircuitBreakerConfigBuilder};
}
