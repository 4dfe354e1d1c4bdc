//! Builder for a protected resource: the common bulkhead + breaker option set an
//! adapter fills in once per resource name.

use crate::events::ResourceEvent;
use semian_bulkhead::{BulkheadConfigBuilder, Permissions, TicketSizing};
use semian_circuitbreaker::CircuitBreakerConfigBuilder;
use semian_dual::{AlwaysClassical, BreakerSelector};
use semian_core::EventListeners;
use std::time::Duration;

/// Which breaker strategy (if any) guards this resource.
pub(crate) enum BreakerChoice {
    None,
    Classical,
    Adaptive,
    Dual(Box<dyn BreakerSelector>),
}

impl BreakerChoice {
    fn kind_label(&self) -> &'static str {
        match self {
            BreakerChoice::None => "none",
            BreakerChoice::Classical => "classical",
            BreakerChoice::Adaptive => "adaptive",
            BreakerChoice::Dual(_) => "dual",
        }
    }
}

/// A comparable snapshot of a resource's options, used by the registry to decide
/// whether a re-registration under an already-known name is compatible with the
/// first one (selectors and event listeners are intentionally excluded — they
/// aren't part of the resource's observable shape).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResourceFingerprint {
    bulkhead_enabled: bool,
    sizing: TicketSizing,
    permissions: Permissions,
    timeout: Duration,
    breaker_kind: &'static str,
    error_threshold: usize,
    error_timeout: Duration,
    success_threshold: usize,
    error_threshold_timeout: Option<Duration>,
    half_open_resource_timeout: Option<Duration>,
    windowed: bool,
}

/// Tunables for the adaptive controller, used standalone or as the adaptive half
/// of a dual breaker.
#[derive(Debug, Clone)]
pub struct AdaptiveOptions {
    pub defensiveness: f64,
    pub window_size: Duration,
    pub sliding_interval: Duration,
    pub initial_error_rate: f64,
    pub cap_value: f64,
    pub ping_interval: Option<Duration>,
    pub ping_timeout: Duration,
    pub ping_weight: f64,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            defensiveness: 5.0,
            window_size: Duration::from_secs(10),
            sliding_interval: Duration::from_secs(1),
            initial_error_rate: 0.0,
            cap_value: 0.10,
            ping_interval: None,
            ping_timeout: Duration::from_secs(1),
            ping_weight: 1.0,
        }
    }
}

/// Resolved configuration for one protected resource registration.
pub struct ResourceConfig {
    pub(crate) name: String,
    pub(crate) bulkhead_enabled: bool,
    pub(crate) sizing: TicketSizing,
    pub(crate) permissions: Permissions,
    pub(crate) timeout: Duration,
    pub(crate) breaker: BreakerChoice,
    pub(crate) error_threshold: usize,
    pub(crate) error_timeout: Duration,
    pub(crate) success_threshold: usize,
    pub(crate) error_threshold_timeout: Option<Duration>,
    pub(crate) half_open_resource_timeout: Option<Duration>,
    pub(crate) windowed: bool,
    pub(crate) adaptive: AdaptiveOptions,
    pub(crate) event_listeners: EventListeners<ResourceEvent>,
}

/// Builds a [`ResourceConfig`]. Bulkhead and circuit breaker are both on by
/// default with a single fixed ticket and the classical breaker's own defaults;
/// call `adaptive_circuit_breaker()` or `dual_circuit_breaker(selector)` to swap
/// the breaker strategy, or `without_circuit_breaker()`/`without_bulkhead()` to
/// drop a layer entirely.
pub struct ResourceConfigBuilder {
    name: String,
    bulkhead_enabled: bool,
    tickets: Option<u32>,
    quota: Option<f64>,
    permissions: Permissions,
    timeout: Duration,
    breaker: BreakerChoice,
    error_threshold: usize,
    error_timeout: Duration,
    success_threshold: usize,
    error_threshold_timeout: Option<Duration>,
    half_open_resource_timeout: Option<Duration>,
    windowed: bool,
    adaptive: AdaptiveOptions,
    event_listeners: EventListeners<ResourceEvent>,
}

impl ResourceConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bulkhead_enabled: true,
            tickets: None,
            quota: None,
            permissions: 0o660,
            timeout: Duration::ZERO,
            breaker: BreakerChoice::Classical,
            error_threshold: 5,
            error_timeout: Duration::from_secs(30),
            success_threshold: 1,
            error_threshold_timeout: None,
            half_open_resource_timeout: None,
            windowed: true,
            adaptive: AdaptiveOptions::default(),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn without_bulkhead(mut self) -> Self {
        self.bulkhead_enabled = false;
        self
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

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn without_circuit_breaker(mut self) -> Self {
        self.breaker = BreakerChoice::None;
        self
    }

    pub fn adaptive_circuit_breaker(mut self) -> Self {
        self.breaker = BreakerChoice::Adaptive;
        self
    }

    pub fn dual_circuit_breaker(mut self, selector: impl BreakerSelector + 'static) -> Self {
        self.breaker = BreakerChoice::Dual(Box::new(selector));
        self
    }

    /// Equivalent to `dual_circuit_breaker(AlwaysClassical)`, for callers who just
    /// want both breakers running and instrumented without picking a selector yet.
    pub fn dual_circuit_breaker_default(self) -> Self {
        self.dual_circuit_breaker(AlwaysClassical)
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

    pub fn adaptive_options(mut self, options: AdaptiveOptions) -> Self {
        self.adaptive = options;
        self
    }

    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ResourceEvent) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(semian_core::FnListener::new(listener));
        self
    }

    pub fn build(self) -> Result<ResourceConfig, semian_bulkhead::BulkheadError> {
        let sizing = match (self.tickets, self.quota) {
            (Some(t), None) => TicketSizing::Tickets(t),
            (None, Some(q)) => TicketSizing::Quota(q),
            (None, None) => TicketSizing::Tickets(1),
            (Some(_), Some(_)) => {
                return Err(semian_bulkhead::BulkheadError::Internal {
                    resource: self.name,
                    message: "tickets and quota are mutually exclusive".to_string(),
                })
            }
        };

        Ok(ResourceConfig {
            name: self.name,
            bulkhead_enabled: self.bulkhead_enabled,
            sizing,
            permissions: self.permissions,
            timeout: self.timeout,
            breaker: self.breaker,
            error_threshold: self.error_threshold,
            error_timeout: self.error_timeout,
            success_threshold: self.success_threshold,
            error_threshold_timeout: self.error_threshold_timeout,
            half_open_resource_timeout: self.half_open_resource_timeout,
            windowed: self.windowed,
            adaptive: self.adaptive,
            event_listeners: self.event_listeners,
        })
    }
}

impl ResourceConfig {
    /// Builds the resolved circuit breaker config this resource's classical (or
    /// dual-classical) breaker is constructed from.
    pub(crate) fn classical_builder(&self) -> CircuitBreakerConfigBuilder {
        let mut builder = CircuitBreakerConfigBuilder::new(&self.name)
            .error_threshold(self.error_threshold)
            .error_timeout(self.error_timeout)
            .success_threshold(self.success_threshold)
            .windowed(self.windowed);
        if let Some(timeout) = self.error_threshold_timeout {
            builder = builder.error_threshold_timeout(timeout);
        }
        if let Some(timeout) = self.half_open_resource_timeout {
            builder = builder.half_open_resource_timeout(timeout);
        }
        builder
    }

    pub(crate) fn bulkhead_builder(&self) -> BulkheadConfigBuilder {
        let mut builder = BulkheadConfigBuilder::new(&self.name).permissions(self.permissions);
        builder = match self.sizing {
            TicketSizing::Tickets(n) => builder.tickets(n),
            TicketSizing::Quota(q) => builder.quota(q),
        };
        builder.default_timeout(self.timeout)
    }

    pub(crate) fn adaptive_builder(&self) -> semian_adaptive::AdaptiveBreakerConfigBuilder {
        let mut builder = semian_adaptive::AdaptiveBreakerConfigBuilder::new(&self.name)
            .defensiveness(self.adaptive.defensiveness)
            .window_size(self.adaptive.window_size)
            .sliding_interval(self.adaptive.sliding_interval)
            .initial_error_rate(self.adaptive.initial_error_rate)
            .cap_value(self.adaptive.cap_value)
            .ping_timeout(self.adaptive.ping_timeout)
            .ping_weight(self.adaptive.ping_weight);
        if let Some(interval) = self.adaptive.ping_interval {
            builder = builder.ping_interval(interval);
        }
        builder
    }

    pub(crate) fn fingerprint(&self) -> ResourceFingerprint {
        ResourceFingerprint {
            bulkhead_enabled: self.bulkhead_enabled,
            sizing: self.sizing,
            permissions: self.permissions,
            timeout: self.timeout,
            breaker_kind: self.breaker.kind_label(),
            error_threshold: self.error_threshold,
            error_timeout: self.error_timeout,
            success_threshold: self.success_threshold,
            error_threshold_timeout: self.error_threshold_timeout,
            half_open_resource_timeout: self.half_open_resource_timeout,
            windowed: self.windowed,
        }
    }
}
