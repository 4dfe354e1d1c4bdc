//! Observability guide: the `tracing` and `metrics` feature surface every
//! pattern crate in this workspace shares.

/// Metrics documentation
pub mod metrics {
    //! # Metrics Guide
    //!
    //! Every pattern crate supports optional Prometheus-compatible metrics behind
    //! its own `metrics` feature, which this crate's `metrics` feature turns on
    //! for whichever pattern crates are enabled.
    //!
    //! ## Enabling Metrics
    //!
    //! ```toml
    //! [dependencies]
    //! semian = { version = "0.1", features = ["resource", "metrics"] }
    //! metrics = "0.24"
    //! metrics-exporter-prometheus = "0.16"
    //! ```
    //!
    //! ## Instance Naming
    //!
    //! Every metric carries the resource's registered name as a label, so two
    //! breakers guarding different resources ("orders-db" vs "payments-db")
    //! produce distinguishable series without any extra configuration.
    //!
    //! ```text
    //! semian_circuitbreaker_calls_rejected_total{circuitbreaker="orders-db"} 4
    //! semian_circuitbreaker_calls_rejected_total{circuitbreaker="payments-db"} 0
    //! ```
    //!
    //! ## Available Metrics by Pattern
    //!
    //! ### Circuit Breaker
    //!
    //! - `semian_circuitbreaker_calls_rejected_total{circuitbreaker}` — calls denied while open
    //! - `semian_circuitbreaker_failures_total{circuitbreaker}` — failures recorded
    //! - `semian_circuitbreaker_successes_total{circuitbreaker}` — successes recorded
    //! - `semian_circuitbreaker_state{circuitbreaker, state}` — current state gauge (1.0 when active)
    //!
    //! ### Adaptive Breaker
    //!
    //! - `semian_adaptive_rejection_probability{adaptive}` — current PID-controlled rejection probability gauge
    //! - `semian_adaptive_calls_rejected_total{adaptive}` — calls denied by the probabilistic gate
    //!
    //! ### Bulkhead
    //!
    //! - `semian_bulkhead_tickets_available{bulkhead}` — current free-ticket gauge
    //! - `semian_bulkhead_wait_timeouts_total{bulkhead}` — waits that expired before a ticket freed
    //!
    //! ### Resource / Registry
    //!
    //! - `semian_event_listener_panics_total{pattern, event_type}` — a listener
    //!   panicked while handling an event; the panic is caught so other listeners
    //!   still run, but this counter tells you one is misbehaving
    //! - `semian_registry_evictions_total{registry}` — idle resources garbage-collected
    //!
    //! ### Shared Scope
    //!
    //! - `semian_shared_scope_reconnects_total` — client reconnect attempts to the coordinator
    //! - `semian_shared_scope_queue_depth` — queued reports awaiting replay while degraded
    //!
    //! ## Example Prometheus Queries
    //!
    //! ```promql
    //! # Circuit breaker rejection rate
    //! rate(semian_circuitbreaker_calls_rejected_total[5m])
    //!
    //! # Bulkhead exhaustion
    //! semian_bulkhead_tickets_available == 0
    //!
    //! # Adaptive breaker currently shedding load
    //! semian_adaptive_rejection_probability > 0
    //! ```
    //!
    //! ## Alert Examples
    //!
    //! ```yaml
    //! - alert: CircuitBreakerOpen
    //!   expr: semian_circuitbreaker_state{state="open"} == 1
    //!   for: 1m
    //!
    //! - alert: SharedScopeDegraded
    //!   expr: semian_shared_scope_queue_depth > 0
    //!   for: 5m
    //! ```
}

/// Tracing documentation
pub mod tracing_guide {
    //! # Tracing Guide
    //!
    //! Enable structured logging with each pattern crate's `tracing` feature:
    //!
    //! ```toml
    //! [dependencies]
    //! semian = { version = "0.1", features = ["resource", "tracing"] }
    //! tracing-subscriber = "0.3"
    //! ```
    //!
    //! Each pattern logs at its key decision points:
    //!
    //! ```text
    //! DEBUG semian_circuitbreaker: call succeeded circuitbreaker="orders-db"
    //! WARN  semian_circuitbreaker: circuit opened from=Closed to=Open circuitbreaker="orders-db"
    //! WARN  semian_shared_scope: coordinator unreachable, degrading to local cache
    //! INFO  semian_shared_scope: client reconnected after 3 attempts
    //! ```
    //!
    //! A listener panicking is logged as a warning rather than propagated, so one
    //! misbehaving subscriber never takes down the breaker it's attached to; see
    //! [`events`] for the listener API this backs.
}

/// Event system documentation
pub mod events {
    //! # Event System Guide
    //!
    //! Every pattern crate exposes its own event enum (for example
    //! [`ResourceEvent`](semian_resource::ResourceEvent)'s `success`/`busy`/
    //! `circuit_open`/`state_change` vocabulary) through the shared
    //! [`EventListeners`](semian_core::EventListeners) collection, registered at
    //! config-build time:
    //!
    //! ```no_run
    //! # #[cfg(feature = "resource")]
    //! # {
    //! use semian_resource::{ResourceConfigBuilder, ResourceEvent};
    //!
    //! let config = ResourceConfigBuilder::new("orders-db")
    //!     .on_event(|event: &ResourceEvent| match event {
    //!         ResourceEvent::StateChange { state, .. } => {
    //!             println!("breaker transitioned to {state}");
    //!         }
    //!         ResourceEvent::CircuitOpen { adapter, .. } => {
    //!             eprintln!("{adapter} call rejected: circuit open");
    //!         }
    //!         _ => {}
    //!     })
    //!     .build();
    //! # let _ = config;
    //! # }
    //! ```
    //!
    //! A listener that panics doesn't stop delivery to the rest — the panic is
    //! caught, logged (with the `tracing` feature) and counted (with the
    //! `metrics` feature) as `semian_event_listener_panics_total`.
}
