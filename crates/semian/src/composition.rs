//! # Composition Guide
//!
//! How a bulkhead, a breaker, and a resource registry actually compose for the
//! shapes adapters see in practice: a database client, a message queue worker,
//! and a registry shared by a pool of worker threads.

/// Composing a bulkhead and a classical breaker behind one resource.
pub mod database_client {
    //! # Database Client
    //!
    //! The common case: bound concurrent connections with a bulkhead, fail fast
    //! once the database is unhealthy with a breaker, and let
    //! [`ProtectedResource::acquire`](semian_resource::ProtectedResource::acquire)
    //! sequence the two — breaker admission first, then a timed bulkhead wait,
    //! then the query.
    //!
    //! ```no_run
    //! # #[cfg(feature = "resource")]
    //! # {
    //! use semian_resource::{ProtectedResource, ResourceConfigBuilder, Scope};
    //! use semian_core::MarksCircuits;
    //! use std::time::Duration;
    //!
    //! #[derive(Debug, thiserror::Error)]
    //! #[error("query failed")]
    //! struct QueryError;
    //! impl MarksCircuits for QueryError {}
    //!
    //! # fn example() -> Result<(), Box<dyn std::error::Error>> {
    //! let config = ResourceConfigBuilder::new("orders-db")
    //!     .tickets(8)
    //!     .timeout(Duration::from_millis(250))
    //!     .error_threshold(5)
    //!     .error_timeout(Duration::from_secs(30))
    //!     .success_threshold(2)
    //!     .build()?;
    //! let resource = ProtectedResource::register(config)?;
    //!
    //! let rows = resource.acquire(None, Scope::Query, "postgres", || {
    //!     Ok::<_, QueryError>(run_query("select 1"))
    //! })?;
    //! # fn run_query(_sql: &str) -> u64 { 1 }
    //! # Ok(())
    //! # }
    //! # }
    //! ```
    //!
    //! If the pool is saturated, `acquire` returns
    //! [`SemianError::Timeout`](semian_core::SemianError::Timeout) instead of blocking
    //! indefinitely — pass `Some(duration)` as the first argument to bound the wait
    //! shorter than the resource's configured bulkhead timeout for a specific call site.
}

/// Composing a bulkhead alone (no breaker) for work where occasional failures
/// are expected and shouldn't be held against the resource.
pub mod message_queue_worker {
    //! # Message Queue Worker
    //!
    //! A worker pulling jobs off a queue wants to cap how many run concurrently,
    //! but an individual job failing (a bad payload, a downstream 4xx) shouldn't
    //! trip a breaker the way a database outage should. Build a resource with
    //! `breaker(None)` and classify job errors with [`MarksCircuits`] so only the
    //! failure modes that matter feed an breaker if one is added later.
    //!
    //! ```no_run
    //! # #[cfg(feature = "resource")]
    //! # {
    //! use semian_resource::{ResourceConfigBuilder, Scope};
    //! use semian_core::MarksCircuits;
    //!
    //! #[derive(Debug, thiserror::Error)]
    //! enum JobError {
    //!     #[error("payload failed validation")]
    //!     BadPayload,
    //!     #[error("downstream service unreachable")]
    //!     DownstreamUnreachable,
    //! }
    //!
    //! impl MarksCircuits for JobError {
    //!     fn marks_circuits(&self) -> bool {
    //!         matches!(self, JobError::DownstreamUnreachable)
    //!     }
    //! }
    //!
    //! let config = ResourceConfigBuilder::new("webhook-delivery")
    //!     .tickets(16)
    //!     .without_circuit_breaker()
    //!     .build();
    //! # let _ = config;
    //! # }
    //! ```
    //!
    //! Swap `without_circuit_breaker()` for `error_threshold(..)` once the worker
    //! needs to back off a genuinely unhealthy downstream — the bulkhead sizing and
    //! the call site (`acquire(.., Scope::Query, "webhook", ..)`) don't change.
    use semian_core::MarksCircuits as _;
}

/// Sharing one process-wide registry across a pool of worker threads instead of
/// each owning its own resource instance.
pub mod worker_pool_registry {
    //! # Shared Registry
    //!
    //! A thread pool where every worker talks to the same named resource should
    //! share one [`Registry`](semian_resource::Registry) lookup rather than each
    //! worker registering its own `ProtectedResource` — otherwise each thread's
    //! bulkhead enforces its *own* ticket count, not the process-wide total.
    //!
    //! ```no_run
    //! # #[cfg(feature = "resource")]
    //! # {
    //! use semian_resource::{Registry, ResourceConfigBuilder, Scope};
    //! use semian_core::MarksCircuits;
    //! use std::sync::Arc;
    //!
    //! #[derive(Debug, thiserror::Error)]
    //! #[error("fetch failed")]
    //! struct FetchError;
    //! impl MarksCircuits for FetchError {}
    //!
    //! # fn example() -> Result<(), Box<dyn std::error::Error>> {
    //! let registry = Arc::new(Registry::new(Default::default()));
    //!
    //! let config = ResourceConfigBuilder::new("image-cdn")
    //!     .tickets(32)
    //!     .error_threshold(10)
    //!     .build()?;
    //!
    //! // Every worker thread calls `register` with the same name and compatible
    //! // options; only the first call actually constructs the resource, the rest
    //! // get back a clone of the same `Arc<ProtectedResource>`.
    //! let resource = registry.register(config)?;
    //! resource.acquire(None, Scope::Query, "cdn-client", || {
    //!     Ok::<_, FetchError>(fetch_image())
    //! })?;
    //! # fn fetch_image() -> Vec<u8> { Vec::new() }
    //! # Ok(())
    //! # }
    //! # }
    //! ```
    //!
    //! The registry periodically garbage-collects resources that haven't been
    //! used recently (see [`RegistryLimits`](semian_resource::RegistryLimits)), so
    //! long-lived processes that touch thousands of distinct resource names over
    //! their lifetime don't accumulate unbounded state.
}

/// Layering shared-scope coordination under a resource that already has a local
/// bulkhead and breaker.
pub mod shared_scope_composition {
    //! # Shared Scope
    //!
    //! `semian-shared-scope`'s [`SharedScopeClient`](semian_shared_scope::SharedScopeClient)
    //! is deliberately not wired behind [`ProtectedResource::acquire`] directly —
    //! local admission stays local (no network round-trip on the hot path), and an
    //! adapter that wants cross-process agreement reports outcomes to the shared
    //! client *in addition to* its local breaker, and consults
    //! [`get_open_states`](semian_shared_scope::SharedScopeClient::get_open_states)
    //! as an extra admission check before the local one runs.
    //!
    //! ```no_run
    //! # #[cfg(all(feature = "resource", feature = "shared-scope"))]
    //! # {
    //! use semian_shared_scope::{SharedScopeClient, WireState};
    //!
    //! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    //! let shared = SharedScopeClient::connect("/tmp/semian-shared-scope.sock");
    //! shared.register_resource("orders-db", 5, std::time::Duration::from_secs(30), 2).await?;
    //!
    //! if shared.get_state("orders-db").await? == WireState::Open {
    //!     // another process already tripped this circuit; skip the local attempt too
    //! }
    //! # Ok(())
    //! # }
    //! # }
    //! ```
}
