//! Builder for bulkhead registration options.

use crate::events::BulkheadEvent;
use crate::named_semaphore::{Permissions, Ticketing};
use semian_core::EventListeners;
use std::time::Duration;

/// How a bulkhead's ticket count is sized: a fixed count, or a quota applied
/// per registered worker (recomputed every time a worker registers or leaves).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TicketSizing {
    Tickets(u32),
    Quota(f64),
}

impl From<TicketSizing> for Ticketing {
    fn from(value: TicketSizing) -> Self {
        match value {
            TicketSizing::Tickets(n) => Ticketing::Tickets(n),
            TicketSizing::Quota(q) => Ticketing::Quota(q),
        }
    }
}

/// Resolved configuration for one bulkhead registration.
pub struct BulkheadConfig {
    pub name: String,
    pub sizing: TicketSizing,
    pub permissions: Permissions,
    pub default_timeout: Duration,
    pub(crate) event_listeners: EventListeners<BulkheadEvent>,
}

impl std::fmt::Debug for BulkheadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkheadConfig")
            .field("name", &self.name)
            .field("sizing", &self.sizing)
            .field("permissions", &format_args!("{:#o}", self.permissions))
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

/// Builds a [`BulkheadConfig`]. `tickets` and `quota` are mutually exclusive;
/// calling both is a programmer error caught at `build()` time.
pub struct BulkheadConfigBuilder {
    name: String,
    tickets: Option<u32>,
    quota: Option<f64>,
    permissions: Permissions,
    default_timeout: Duration,
    event_listeners: EventListeners<BulkheadEvent>,
}

impl BulkheadConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tickets: None,
            quota: None,
            permissions: 0o660,
            default_timeout: Duration::ZERO,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn tickets(mut self, tickets: u32) -> Self {
        self.tickets = Some(tickets);
        self
    }

    pub fn quota(mut self, quota: f64) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn on_call_permitted<F>(mut self, listener: F) -> Self
    where
        F: Fn(&BulkheadEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(semian_core::FnListener::new(
            move |event: &BulkheadEvent| {
                if matches!(event, BulkheadEvent::CallPermitted { .. }) {
                    listener(event);
                }
            },
        ));
        self
    }

    pub fn on_call_rejected<F>(mut self, listener: F) -> Self
    where
        F: Fn(&BulkheadEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(semian_core::FnListener::new(
            move |event: &BulkheadEvent| {
                if matches!(event, BulkheadEvent::CallRejected { .. }) {
                    listener(event);
                }
            },
        ));
        self
    }

    pub fn on_call_finished<F>(mut self, listener: F) -> Self
    where
        F: Fn(&BulkheadEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(semian_core::FnListener::new(
            move |event: &BulkheadEvent| {
                if matches!(event, BulkheadEvent::CallFinished { .. }) {
                    listener(event);
                }
            },
        ));
        self
    }

    pub fn build(self) -> Result<BulkheadConfig, crate::error::BulkheadError> {
        let sizing = match (self.tickets, self.quota) {
            (Some(t), None) => TicketSizing::Tickets(t),
            (None, Some(q)) => TicketSizing::Quota(q),
            (None, None) => TicketSizing::Tickets(1),
            (Some(_), Some(_)) => {
                return Err(crate::error::BulkheadError::Internal {
                    resource: self.name,
                    message: "tickets and quota are mutually exclusive".to_string(),
                })
            }
        };

        Ok(BulkheadConfig {
            name: self.name,
            sizing,
            permissions: self.permissions,
            default_timeout: self.default_timeout,
            event_listeners: self.event_listeners,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_single_ticket() {
        let config = BulkheadConfigBuilder::new("r").build().unwrap();
        assert_eq!(config.sizing, TicketSizing::Tickets(1));
    }

    #[test]
    fn tickets_and_quota_together_is_rejected() {
        let err = BulkheadConfigBuilder::new("r")
            .tickets(4)
            .quota(0.5)
            .build()
            .unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn quota_sizing_is_recorded() {
        let config = BulkheadConfigBuilder::new("r").quota(0.3).build().unwrap();
        assert_eq!(config.sizing, TicketSizing::Quota(0.3));
    }
}
