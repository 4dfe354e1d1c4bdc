//! Builder for adaptive breaker configuration.

use crate::events::AdaptiveBreakerEvent;
use crate::proportional_controller::ControllerConfig;
use semian_core::{EventListeners, FnListener};
use std::time::Duration;

pub struct AdaptiveBreakerConfig {
    pub(crate) name: String,
    pub(crate) controller: ControllerConfig,
    pub(crate) ping_interval: Option<Duration>,
    pub(crate) ping_timeout: Duration,
    pub(crate) ping_weight: f64,
    pub(crate) event_listeners: EventListeners<AdaptiveBreakerEvent>,
}

pub struct AdaptiveBreakerConfigBuilder {
    name: String,
    controller: ControllerConfig,
    ping_interval: Option<Duration>,
    ping_timeout: Duration,
    ping_weight: f64,
    event_listeners: EventListeners<AdaptiveBreakerEvent>,
}

impl AdaptiveBreakerConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controller: ControllerConfig::default(),
            ping_interval: None,
            ping_timeout: Duration::from_secs(1),
            ping_weight: 1.0,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn defensiveness(mut self, defensiveness: f64) -> Self {
        self.controller.defensiveness = defensiveness;
        self
    }

    pub fn window_size(mut self, duration: Duration) -> Self {
        self.controller.window_size = duration;
        self
    }

    pub fn sliding_interval(mut self, duration: Duration) -> Self {
        self.controller.sliding_interval = duration;
        self
    }

    pub fn initial_error_rate(mut self, rate: f64) -> Self {
        self.controller.initial_error_rate = rate;
        self
    }

    pub fn cap_value(mut self, cap: f64) -> Self {
        self.controller.cap_value = cap;
        self
    }

    /// Enables an out-of-band health ping on a background schedule, separate from
    /// request traffic. The ping interval; see `AdaptiveCircuitBreaker::spawn_health_ping`
    /// for wiring the predicate closure itself (it needs a `Core` to own the task).
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    pub fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// How much a health ping's outcome counts toward `observed_error_rate`,
    /// relative to an ordinary request (weight 1.0). Defaults to 1.0.
    pub fn ping_weight(mut self, weight: f64) -> Self {
        self.ping_weight = weight;
        self
    }

    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::events::PartialOpenState, crate::events::PartialOpenState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &AdaptiveBreakerEvent| {
                if let AdaptiveBreakerEvent::PartialOpenStateChanged { from, to, .. } = event {
                    f(*from, *to);
                }
            }));
        self
    }

    pub fn build(self) -> AdaptiveBreakerConfig {
        AdaptiveBreakerConfig {
            name: self.name,
            controller: self.controller,
            ping_interval: self.ping_interval,
            ping_timeout: self.ping_timeout,
            ping_weight: self.ping_weight,
            event_listeners: self.event_listeners,
        }
    }
}
