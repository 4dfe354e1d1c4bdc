//! Events emitted by the adaptive breaker.

use semian_core::ResilienceEvent;
use std::time::Instant;

/// Observability-only partial-open classification of the adaptive breaker's
/// current `rejection_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialOpenState {
    Closed,
    Open,
    HalfOpen,
}

impl PartialOpenState {
    pub fn from_rejection_rate(rate: f64) -> Self {
        if rate < 0.01 {
            PartialOpenState::Closed
        } else if rate >= 0.99 {
            PartialOpenState::Open
        } else {
            PartialOpenState::HalfOpen
        }
    }
}

#[derive(Debug, Clone)]
pub enum AdaptiveBreakerEvent {
    CallPermitted {
        pattern_name: String,
        timestamp: Instant,
        rejection_rate: f64,
    },
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
        rejection_rate: f64,
    },
    FailureRecorded {
        pattern_name: String,
        timestamp: Instant,
    },
    SuccessRecorded {
        pattern_name: String,
        timestamp: Instant,
    },
    HealthPingCompleted {
        pattern_name: String,
        timestamp: Instant,
        healthy: bool,
    },
    PartialOpenStateChanged {
        pattern_name: String,
        timestamp: Instant,
        from: PartialOpenState,
        to: PartialOpenState,
    },
}

impl ResilienceEvent for AdaptiveBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdaptiveBreakerEvent::CallPermitted { .. } => "call_permitted",
            AdaptiveBreakerEvent::CallRejected { .. } => "call_rejected",
            AdaptiveBreakerEvent::FailureRecorded { .. } => "failure_recorded",
            AdaptiveBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            AdaptiveBreakerEvent::HealthPingCompleted { .. } => "health_ping_completed",
            AdaptiveBreakerEvent::PartialOpenStateChanged { .. } => "partial_open_state_changed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            AdaptiveBreakerEvent::CallPermitted { timestamp, .. }
            | AdaptiveBreakerEvent::CallRejected { timestamp, .. }
            | AdaptiveBreakerEvent::FailureRecorded { timestamp, .. }
            | AdaptiveBreakerEvent::SuccessRecorded { timestamp, .. }
            | AdaptiveBreakerEvent::HealthPingCompleted { timestamp, .. }
            | AdaptiveBreakerEvent::PartialOpenStateChanged { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            AdaptiveBreakerEvent::CallPermitted { pattern_name, .. }
            | AdaptiveBreakerEvent::CallRejected { pattern_name, .. }
            | AdaptiveBreakerEvent::FailureRecorded { pattern_name, .. }
            | AdaptiveBreakerEvent::SuccessRecorded { pattern_name, .. }
            | AdaptiveBreakerEvent::HealthPingCompleted { pattern_name, .. }
            | AdaptiveBreakerEvent::PartialOpenStateChanged { pattern_name, .. } => pattern_name,
        }
    }
}
