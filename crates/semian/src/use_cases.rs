//! # Use Cases
//!
//! Real-world scenarios for applying bulkheads, breakers, and shared scope.

/// Database client use cases
pub mod database {
    //! # Database Clients
    //!
    //! ```text
    //! Read Replicas
    //! ├─ Circuit breaker per replica (classical or adaptive; see composition::database_client)
    //! ├─ Bulkhead sized to the driver's own connection pool cap
    //! └─ Registry shared across worker threads so the ticket count is process-wide
    //!
    //! Write Path
    //! ├─ Circuit breaker tuned to a lower error threshold than reads (writes are rarer,
    //! │  so a handful of failures is a stronger signal)
    //! ├─ Bulkhead sized to the write pool, separate resource name from reads
    //! └─ Shared scope if multiple forked worker processes write through the same DB
    //! ```
}

/// Message queue use cases
pub mod message_queue {
    //! # Message Queue Workers
    //!
    //! ```text
    //! Consumer
    //! ├─ Bulkhead per queue/priority, sized to the consumer's concurrency limit
    //! ├─ No breaker (or a lenient one) on per-job failures; classify via MarksCircuits
    //! │  so only downstream-outage errors count, not bad-payload rejections
    //! └─ Circuit breaker on the downstream service a job's handler calls out to
    //!
    //! Publisher
    //! ├─ Circuit breaker for broker health (see composition::database_client, same shape)
    //! └─ Bulkhead for the publisher connection pool
    //! ```
}

/// Microservices use cases
pub mod microservices {
    //! # Microservices
    //!
    //! ```text
    //! Service-to-Service
    //! ├─ One protected resource per downstream dependency, named after it
    //! ├─ Dual breaker during a migration: run the adaptive breaker in shadow next to
    //! │  an already-trusted classical one, compare before cutting over
    //! └─ Bulkhead sized below the downstream's own known capacity, not above it
    //!
    //! Fleet-wide rollout
    //! ├─ Shared scope so every replica trips together once the first one sees enough
    //! │  failures, instead of each replica tripping independently N times over
    //! └─ Registry GC tuned to the rate new dependency names actually appear
    //! ```
}

/// Background job use cases
pub mod background_jobs {
    //! # Background Jobs
    //!
    //! ```text
    //! Job Execution
    //! ├─ Bulkhead per job type/priority so one noisy queue can't starve another
    //! ├─ Circuit breaker to pause dispatch to a dependency that's clearly down,
    //! │  rather than letting every worker thread individually time out on it
    //! └─ A resource's `error_timeout` tuned to how long the job scheduler can
    //!    tolerate a paused queue before operators need to be paged
    //! ```
}
