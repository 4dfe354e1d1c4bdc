//! Builder for classical circuit breaker configuration.

use crate::events::CircuitBreakerEvent;
use semian_core::{CircuitState, EventListeners, FnListener};
use std::time::Duration;

/// Resolved configuration for one circuit breaker instance.
pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) error_threshold: usize,
    pub(crate) error_timeout: Duration,
    pub(crate) success_threshold: usize,
    pub(crate) error_threshold_timeout: Duration,
    pub(crate) half_open_resource_timeout: Option<Duration>,
    pub(crate) windowed: bool,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl std::fmt::Debug for CircuitBreakerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("name", &self.name)
            .field("error_threshold", &self.error_threshold)
            .field("error_timeout", &self.error_timeout)
            .field("success_threshold", &self.success_threshold)
            .field("error_threshold_timeout", &self.error_threshold_timeout)
            .field("half_open_resource_timeout", &self.half_open_resource_timeout)
            .field("windowed", &self.windowed)
            .finish()
    }
}

impl CircuitBreakerConfig {
    pub fn builder(name: impl Into<String>) -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new(name)
    }
}

/// Builds a [`CircuitBreakerConfig`].
///
/// `error_threshold_timeout` defaults to `error_timeout`'s value at build time when
/// left unset — not a "windowless" mode. Set `windowed(false)` to disable
/// `error_threshold_timeout` eviction entirely, so any full error window trips the
/// breaker regardless of how long it took to fill.
pub struct CircuitBreakerConfigBuilder {
    name: String,
    error_threshold: usize,
    error_timeout: Duration,
    success_threshold: usize,
    error_threshold_timeout: Option<Duration>,
    half_open_resource_timeout: Option<Duration>,
    windowed: bool,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error_threshold: 5,
            error_timeout: Duration::from_secs(30),
            success_threshold: 1,
            error_threshold_timeout: None,
            half_open_resource_timeout: None,
            windowed: true,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn error_threshold(mut self, n: usize) -> Self {
        self.error_threshold = n;
        self
    }

    pub fn error_timeout(mut self, duration: Duration) -> Self {
        self.error_timeout = duration;
        self
    }

    pub fn success_threshold(mut self, n: usize) -> Self {
        self.success_threshold = n;
        self
    }

    pub fn error_threshold_timeout(mut self, duration: Duration) -> Self {
        self.error_threshold_timeout = Some(duration);
        self
    }

    pub fn half_open_resource_timeout(mut self, duration: Duration) -> Self {
        self.half_open_resource_timeout = Some(duration);
        self
    }

    pub fn windowed(mut self, windowed: bool) -> Self {
        self.windowed = windowed;
        self
    }

    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                    f();
                }
            }));
        self
    }

    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: self.name,
            error_threshold: self.error_threshold.max(1),
            error_timeout: self.error_timeout,
            success_threshold: self.success_threshold.max(1),
            error_threshold_timeout: self.error_threshold_timeout.unwrap_or(self.error_timeout),
            half_open_resource_timeout: self.half_open_resource_timeout,
            windowed: self.windowed,
            event_listeners: self.event_listeners,
        }
    }
}
