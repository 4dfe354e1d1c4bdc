//! The event vocabulary a protected resource emits, mirroring the adapter-facing
//! subscription payload: `(event_kind, resource_name, scope, adapter_tag, extras)`.

use semian_core::ResilienceEvent;
use std::time::Instant;

/// Where in an adapter's call lifecycle a resource acquisition happened. Adapters
/// pick the scope that matches the driver entry point they wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Connection,
    Query,
    Ping,
    Execute,
}

impl Scope {
    fn label(self) -> &'static str {
        match self {
            Scope::Connection => "connection",
            Scope::Query => "query",
            Scope::Ping => "ping",
            Scope::Execute => "execute",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the four events a protected resource's acquisition can produce.
#[derive(Debug)]
pub enum ResourceEvent {
    /// The block ran to completion.
    Success {
        pattern_name: String,
        timestamp: Instant,
        scope: Scope,
        adapter: String,
        wait_time: std::time::Duration,
    },
    /// The bulkhead did not grant a ticket within the timeout.
    Busy {
        pattern_name: String,
        timestamp: Instant,
        scope: Scope,
        adapter: String,
    },
    /// The breaker denied admission before the bulkhead was even tried.
    CircuitOpen {
        pattern_name: String,
        timestamp: Instant,
        scope: Scope,
        adapter: String,
    },
    /// The breaker's state changed as a side effect of this resource's traffic.
    StateChange {
        pattern_name: String,
        timestamp: Instant,
        state: &'static str,
    },
}

impl ResourceEvent {
    /// The adapter-facing scope, when this event carries one (state changes are
    /// breaker-internal and have no associated call scope).
    pub fn scope(&self) -> Option<Scope> {
        match self {
            ResourceEvent::Success { scope, .. }
            | ResourceEvent::Busy { scope, .. }
            | ResourceEvent::CircuitOpen { scope, .. } => Some(*scope),
            ResourceEvent::StateChange { .. } => None,
        }
    }

    pub fn adapter(&self) -> Option<&str> {
        match self {
            ResourceEvent::Success { adapter, .. }
            | ResourceEvent::Busy { adapter, .. }
            | ResourceEvent::CircuitOpen { adapter, .. } => Some(adapter.as_str()),
            ResourceEvent::StateChange { .. } => None,
        }
    }

    pub fn wait_time(&self) -> Option<std::time::Duration> {
        match self {
            ResourceEvent::Success { wait_time, .. } => Some(*wait_time),
            _ => None,
        }
    }
}

impl ResilienceEvent for ResourceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ResourceEvent::Success { .. } => "success",
            ResourceEvent::Busy { .. } => "busy",
            ResourceEvent::CircuitOpen { .. } => "circuit_open",
            ResourceEvent::StateChange { .. } => "state_change",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ResourceEvent::Success { timestamp, .. }
            | ResourceEvent::Busy { timestamp, .. }
            | ResourceEvent::CircuitOpen { timestamp, .. }
            | ResourceEvent::StateChange { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            ResourceEvent::Success { pattern_name, .. }
            | ResourceEvent::Busy { pattern_name, .. }
            | ResourceEvent::CircuitOpen { pattern_name, .. }
            | ResourceEvent::StateChange { pattern_name, .. } => pattern_name,
        }
    }
}
