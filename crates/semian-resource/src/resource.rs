//! The protected resource: a bulkhead and a breaker, composed behind one `acquire`.

use crate::breaker_kind::BreakerKind;
use crate::config::{BreakerChoice, ResourceConfig};
use crate::events::{ResourceEvent, Scope};
use semian_adaptive::AdaptiveCircuitBreaker;
use semian_bulkhead::Bulkhead;
use semian_circuitbreaker::CircuitBreaker;
use semian_core::{Core, EventListeners, MarksCircuits, SemianError};
use semian_dual::DualBreaker;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A named resource protected by an optional bulkhead and an optional breaker.
///
/// `acquire` runs a block of the form `FnOnce() -> Result<T, E>` through the
/// sequence the adapter contract expects: the breaker gates admission first, the
/// bulkhead is timed second, then the block runs. Every step emits one of the
/// four resource-level events (`success`, `busy`, `circuit_open`, `state_change`)
/// in addition to whatever events the underlying bulkhead/breaker already emit.
pub struct ProtectedResource {
    name: String,
    bulkhead: Option<Bulkhead>,
    breaker: BreakerKind,
    created_at: Instant,
    last_use: Mutex<Instant>,
    event_listeners: EventListeners<ResourceEvent>,
}

impl ProtectedResource {
    /// Registers a new protected resource from `config`. This is the entry point
    /// adapters call once per resource name; subsequent calls with compatible
    /// options should go through a [`crate::registry::Registry`] instead.
    pub fn register(config: ResourceConfig) -> Result<Self, semian_bulkhead::BulkheadError> {
        let name = config.name.clone();
        let event_listeners = config.event_listeners.clone();

        let bulkhead = if config.bulkhead_enabled {
            Some(Bulkhead::register(config.bulkhead_builder().build()?)?)
        } else {
            None
        };

        let forward = event_listeners.clone();
        let hook_name = name.clone();
        let classical_builder = config.classical_builder().on_state_transition(move |_from, to| {
            forward.emit(&ResourceEvent::StateChange {
                pattern_name: hook_name.clone(),
                timestamp: Instant::now(),
                state: circuit_state_label(to),
            });
        });
        let adaptive_builder = config.adaptive_builder();

        let breaker = match config.breaker {
            BreakerChoice::None => BreakerKind::None,
            BreakerChoice::Classical => BreakerKind::Classical(CircuitBreaker::new(classical_builder.build())),
            BreakerChoice::Adaptive => {
                BreakerKind::Adaptive(AdaptiveCircuitBreaker::new(adaptive_builder.build()))
            }
            BreakerChoice::Dual(selector) => {
                let classical = CircuitBreaker::new(classical_builder.build());
                let adaptive = AdaptiveCircuitBreaker::new(adaptive_builder.build());
                BreakerKind::Dual(DualBreaker::new(classical, adaptive, selector))
            }
        };

        Ok(Self {
            name,
            bulkhead,
            breaker,
            created_at: Instant::now(),
            last_use: Mutex::new(Instant::now()),
            event_listeners,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_use(&self) -> Instant {
        *self.last_use.lock().unwrap()
    }

    pub fn bulkhead(&self) -> Option<&Bulkhead> {
        self.bulkhead.as_ref()
    }

    pub fn breaker_state_label(&self) -> &'static str {
        self.breaker.state_label()
    }

    /// Tickets this resource currently has in flight; `0` when it has no bulkhead.
    pub fn in_flight(&self) -> i64 {
        self.bulkhead.as_ref().map_or(0, |b| b.in_flight())
    }

    /// Whether the registry's LRU sweep may consider this resource idle: no
    /// tickets held and the breaker reports a resting state.
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0 && self.breaker.is_at_rest()
    }

    pub fn reset(&self) {
        self.breaker.reset();
    }

    /// Schedules this resource's out-of-band health ping on `core`, if it was
    /// registered with an adaptive (or dual) breaker that configured
    /// `ping_interval`. A no-op for a classical-only or breakerless resource,
    /// and a no-op if `ping_interval` was never set.
    pub fn spawn_health_ping<F, Fut>(&self, core: &Arc<Core>, predicate: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        if let Some(adaptive) = self.breaker.adaptive_handle() {
            adaptive.spawn_health_ping(core, predicate);
        }
    }

    /// Runs `f`, gated by the breaker's admission check and the bulkhead's ticket
    /// availability, following the adapter contract's sequence:
    /// 1. breaker admission (fail fast on `OpenCircuit`),
    /// 2. timed bulkhead acquisition (fail on `Timeout`),
    /// 3. run `f`, recording the outcome against the breaker.
    pub fn acquire<T, E, F>(
        &self,
        timeout: Option<Duration>,
        scope: Scope,
        adapter: &str,
        f: F,
    ) -> Result<T, SemianError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: MarksCircuits + std::fmt::Display,
    {
        *self.last_use.lock().unwrap() = Instant::now();

        if !self.breaker.request_allowed() {
            self.event_listeners.emit(&ResourceEvent::CircuitOpen {
                pattern_name: self.name.clone(),
                timestamp: Instant::now(),
                scope,
                adapter: adapter.to_string(),
            });
            return Err(SemianError::OpenCircuit {
                resource: self.name.clone(),
            });
        }

        let start = Instant::now();
        let ticket = match &self.bulkhead {
            Some(bulkhead) => match bulkhead.acquire(timeout) {
                Ok(ticket) => Some(ticket),
                Err(err) if err.is_timeout() => {
                    self.event_listeners.emit(&ResourceEvent::Busy {
                        pattern_name: self.name.clone(),
                        timestamp: Instant::now(),
                        scope,
                        adapter: adapter.to_string(),
                    });
                    return Err(SemianError::Timeout {
                        resource: self.name.clone(),
                        waited: start.elapsed(),
                    });
                }
                Err(err) => {
                    return Err(SemianError::Syscall {
                        resource: self.name.clone(),
                        message: err.to_string(),
                    })
                }
            },
            None => None,
        };
        let wait_time = start.elapsed();

        let result = f();
        drop(ticket);

        match result {
            Ok(value) => {
                self.breaker.mark_success();
                self.event_listeners.emit(&ResourceEvent::Success {
                    pattern_name: self.name.clone(),
                    timestamp: Instant::now(),
                    scope,
                    adapter: adapter.to_string(),
                    wait_time,
                });
                Ok(value)
            }
            Err(err) => {
                if err.marks_circuits() {
                    self.breaker.mark_failed(&err);
                }
                Err(SemianError::Application(err))
            }
        }
    }
}

fn circuit_state_label(state: semian_core::CircuitState) -> &'static str {
    match state {
        semian_core::CircuitState::Closed => "closed",
        semian_core::CircuitState::Open => "open",
        semian_core::CircuitState::HalfOpen => "half_open",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfigBuilder;

    #[derive(Debug)]
    struct Boom;
    impl MarksCircuits for Boom {}
    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }

    #[test]
    fn successful_call_updates_last_use_and_emits_success() {
        let name = format!("resource-test-success-{}", std::process::id());
        let config = ResourceConfigBuilder::new(&name).tickets(1).build().unwrap();
        let resource = ProtectedResource::register(config).unwrap();
        let result: Result<i32, SemianError<Boom>> =
            resource.acquire(None, Scope::Query, "test-adapter", || Ok(7));
        assert_eq!(result.unwrap(), 7);
        if let Some(bulkhead) = resource.bulkhead() {
            bulkhead.destroy();
        }
    }

    #[test]
    fn breaker_denial_short_circuits_before_bulkhead() {
        let name = format!("resource-test-denial-{}", std::process::id());
        let config = ResourceConfigBuilder::new(&name)
            .tickets(1)
            .error_threshold(1)
            .error_timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        let resource = ProtectedResource::register(config).unwrap();
        let _: Result<(), SemianError<Boom>> =
            resource.acquire(None, Scope::Query, "test-adapter", || Err(Boom));
        let result: Result<(), SemianError<Boom>> =
            resource.acquire(None, Scope::Query, "test-adapter", || Ok(()));
        assert!(matches!(result, Err(SemianError::OpenCircuit { .. })));
        if let Some(bulkhead) = resource.bulkhead() {
            bulkhead.destroy();
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn health_ping_feeds_the_adaptive_controller() {
        use crate::config::AdaptiveOptions;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration as StdDuration;

        let name = format!("resource-test-ping-{}", std::process::id());
        let config = ResourceConfigBuilder::new(&name)
            .without_bulkhead()
            .adaptive_circuit_breaker()
            .adaptive_options(AdaptiveOptions {
                ping_interval: Some(StdDuration::from_millis(5)),
                ping_timeout: StdDuration::from_millis(50),
                ..AdaptiveOptions::default()
            })
            .build()
            .unwrap();
        let resource = ProtectedResource::register(config).unwrap();

        let core = semian_core::Core::new();
        let pings = Arc::new(AtomicUsize::new(0));
        let pings_clone = Arc::clone(&pings);
        resource.spawn_health_ping(&core, move || {
            let pings = Arc::clone(&pings_clone);
            async move {
                pings.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        assert_eq!(core.task_count(), 1);
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        assert!(pings.load(Ordering::SeqCst) >= 1);
        core.shutdown();
    }

    #[test]
    fn idle_resource_with_closed_breaker_and_no_tickets_is_idle() {
        let name = format!("resource-test-idle-{}", std::process::id());
        let config = ResourceConfigBuilder::new(&name).tickets(1).build().unwrap();
        let resource = ProtectedResource::register(config).unwrap();
        assert!(resource.is_idle());
        if let Some(bulkhead) = resource.bulkhead() {
            bulkhead.destroy();
        }
    }
}
