//! Events emitted around every bulkhead acquisition attempt.

use semian_core::ResilienceEvent;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A ticket was granted.
    CallPermitted {
        pattern_name: String,
        timestamp: Instant,
        waited: Duration,
    },
    /// No ticket became available before the timeout elapsed.
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
        waited: Duration,
    },
    /// A held ticket was released.
    CallFinished {
        pattern_name: String,
        timestamp: Instant,
        held_for: Duration,
    },
}

impl ResilienceEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. }
            | BulkheadEvent::CallFinished { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { pattern_name, .. }
            | BulkheadEvent::CallRejected { pattern_name, .. }
            | BulkheadEvent::CallFinished { pattern_name, .. } => pattern_name,
        }
    }
}
