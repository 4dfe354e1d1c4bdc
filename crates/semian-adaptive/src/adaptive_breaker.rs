//! The adaptive breaker: the same public shape as the classical breaker, but
//! admission is a coin flip weighted by the proportional controller's
//! `rejection_rate` instead of a hard state machine.

use crate::config::AdaptiveBreakerConfig;
use crate::events::{AdaptiveBreakerEvent, PartialOpenState};
use crate::proportional_controller::ProportionalController;
use semian_core::{Core, MarksCircuits, SemianError};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::timeout as tokio_timeout;

/// A named adaptive (PID-controlled) circuit breaker.
pub struct AdaptiveCircuitBreaker {
    config: AdaptiveBreakerConfig,
    controller: Mutex<ProportionalController>,
    partial_open_state: Mutex<PartialOpenState>,
    last_update: Mutex<Option<Instant>>,
}

impl AdaptiveCircuitBreaker {
    pub fn new(config: AdaptiveBreakerConfig) -> Arc<Self> {
        let controller = ProportionalController::new(config.controller);
        Arc::new(Self {
            config,
            controller: Mutex::new(controller),
            partial_open_state: Mutex::new(PartialOpenState::Closed),
            last_update: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The observability-only classification of the current rejection rate.
    pub fn partial_open_state(&self) -> PartialOpenState {
        *self.partial_open_state.lock().unwrap()
    }

    pub fn rejection_rate(&self) -> f64 {
        self.controller.lock().unwrap().rejection_rate()
    }

    /// `request_allowed?` maps to `!should_reject?`.
    pub fn request_allowed(&self) -> bool {
        self.maybe_update();
        let controller = self.controller.lock().unwrap();
        let allowed = !controller.should_reject();
        let rate = controller.rejection_rate();
        drop(controller);

        self.refresh_partial_open_state(rate);

        let event = if allowed {
            AdaptiveBreakerEvent::CallPermitted {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                rejection_rate: rate,
            }
        } else {
            self.controller.lock().unwrap().record_rejected();
            AdaptiveBreakerEvent::CallRejected {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                rejection_rate: rate,
            }
        };
        self.config.event_listeners.emit(&event);
        allowed
    }

    pub fn mark_failed(&self) {
        self.controller.lock().unwrap().record_error();
        self.config.event_listeners.emit(&AdaptiveBreakerEvent::FailureRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    pub fn mark_success(&self) {
        self.controller.lock().unwrap().record_success();
        self.config.event_listeners.emit(&AdaptiveBreakerEvent::SuccessRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    /// Same as [`Self::mark_failed`], weighted by `weight` rather than 1.0.
    /// Used by the out-of-band health ping, where a ping outcome should count
    /// for more or less than an ordinary request per `ping_weight`.
    fn mark_failed_weighted(&self, weight: f64) {
        self.controller.lock().unwrap().record_error_weighted(weight);
        self.config.event_listeners.emit(&AdaptiveBreakerEvent::FailureRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    /// Same as [`Self::mark_success`], weighted by `weight` rather than 1.0.
    fn mark_success_weighted(&self, weight: f64) {
        self.controller.lock().unwrap().record_success_weighted(weight);
        self.config.event_listeners.emit(&AdaptiveBreakerEvent::SuccessRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    pub fn acquire<T, E, F>(&self, f: F) -> Result<T, SemianError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: MarksCircuits,
    {
        if !self.request_allowed() {
            return Err(SemianError::OpenCircuit {
                resource: self.config.name.clone(),
            });
        }

        match f() {
            Ok(value) => {
                self.mark_success();
                Ok(value)
            }
            Err(err) => {
                if err.marks_circuits() {
                    self.mark_failed();
                }
                Err(SemianError::Application(err))
            }
        }
    }

    pub fn reset(&self) {
        self.controller.lock().unwrap().reset();
        *self.partial_open_state.lock().unwrap() = PartialOpenState::Closed;
    }

    fn maybe_update(&self) {
        let interval = self.config.controller.sliding_interval;
        let now = Instant::now();
        let mut last_update = self.last_update.lock().unwrap();
        let due = match *last_update {
            None => true,
            Some(last) => now.duration_since(last) >= interval,
        };
        if due {
            self.controller.lock().unwrap().update();
            *last_update = Some(now);
        }
    }

    fn refresh_partial_open_state(&self, rejection_rate: f64) {
        let new_state = PartialOpenState::from_rejection_rate(rejection_rate);
        let mut current = self.partial_open_state.lock().unwrap();
        if *current != new_state {
            let from = *current;
            *current = new_state;
            drop(current);
            self.config
                .event_listeners
                .emit(&AdaptiveBreakerEvent::PartialOpenStateChanged {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    from,
                    to: new_state,
                });
        }
    }

    /// Schedules an out-of-band health ping on `core`, running `predicate` every
    /// `ping_interval` (as configured) and feeding its result into the controller
    /// as a success or error, independent of request traffic. No-ops if no
    /// `ping_interval` was configured.
    pub fn spawn_health_ping<F, Fut>(self: &Arc<Self>, core: &Arc<Core>, predicate: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let Some(interval) = self.config.ping_interval else {
            return;
        };
        let ping_timeout = self.config.ping_timeout;
        let ping_weight = self.config.ping_weight;
        let breaker = Arc::clone(self);

        core.spawn(move |shutdown| async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = ticker.tick() => {
                        let healthy = tokio_timeout(ping_timeout, predicate())
                            .await
                            .unwrap_or(false);
                        if healthy {
                            breaker.mark_success_weighted(ping_weight);
                        } else {
                            breaker.mark_failed_weighted(ping_weight);
                        }
                        breaker.config.event_listeners.emit(&AdaptiveBreakerEvent::HealthPingCompleted {
                            pattern_name: breaker.config.name.clone(),
                            timestamp: Instant::now(),
                            healthy,
                        });
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdaptiveBreakerConfigBuilder;

    #[derive(Debug)]
    struct Boom;
    impl MarksCircuits for Boom {}

    #[test]
    fn starts_closed_and_permits_calls() {
        let config = AdaptiveBreakerConfigBuilder::new("svc").build();
        let breaker = AdaptiveCircuitBreaker::new(config);
        assert_eq!(breaker.partial_open_state(), PartialOpenState::Closed);
        let result: Result<(), SemianError<Boom>> = breaker.acquire(|| Ok(()));
        assert!(result.is_ok());
    }

    #[test]
    fn reset_restores_closed_state() {
        let config = AdaptiveBreakerConfigBuilder::new("svc")
            .sliding_interval(Duration::from_nanos(1))
            .build();
        let breaker = AdaptiveCircuitBreaker::new(config);
        for _ in 0..50 {
            let _: Result<(), SemianError<Boom>> = breaker.acquire(|| Err(Boom));
        }
        breaker.reset();
        assert_eq!(breaker.rejection_rate(), 0.0);
        assert_eq!(breaker.partial_open_state(), PartialOpenState::Closed);
    }
}
