//! The classical three-state breaker: a fixed-capacity window of error timestamps
//! drives closed→open, a timeout drives open→half-open, and a run of consecutive
//! successes drives half-open→closed.

use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use semian_core::{CircuitState, MarksCircuits, SemianError, SlidingWindow};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(any(feature = "tracing", feature = "metrics"))]
fn state_label(state: CircuitState) -> &'static str {
    match state {
        CircuitState::Closed => "closed",
        CircuitState::Open => "open",
        CircuitState::HalfOpen => "half_open",
    }
}

struct Inner {
    state: CircuitState,
    errors: SlidingWindow,
    successes: usize,
    last_error_at: Option<Instant>,
    last_error: Option<String>,
    last_state_change: Instant,
}

/// A named classical circuit breaker.
///
/// Wraps calls of the form `FnOnce() -> Result<T, E>`, where `E: MarksCircuits`
/// decides whether a given error should count toward the error window.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let capacity = config.error_threshold;
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                errors: SlidingWindow::new(capacity),
                successes: 0,
                last_error_at: None,
                last_error: None,
                last_state_change: Instant::now(),
            }),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    /// Runs `f` if the breaker currently allows it; records the outcome.
    /// `E: MarksCircuits` decides whether an `Err` return counts as a circuit
    /// failure (as opposed to an expected, non-breaker-worthy error).
    pub fn acquire<T, E, F>(&self, f: F) -> Result<T, SemianError<E>>
    where
        F: FnOnce(Option<Duration>) -> Result<T, E>,
        E: MarksCircuits,
    {
        if !self.request_allowed() {
            return Err(SemianError::OpenCircuit {
                resource: self.config.name.clone(),
            });
        }

        let resource_timeout = if self.state() == CircuitState::HalfOpen {
            self.config.half_open_resource_timeout
        } else {
            None
        };

        match f(resource_timeout) {
            Ok(value) => {
                self.mark_success();
                Ok(value)
            }
            Err(err) => {
                if err.marks_circuits() {
                    self.mark_failed(&err);
                }
                Err(SemianError::Application(err))
            }
        }
    }

    /// True when the state is closed or half-open; when open, re-evaluates the
    /// open→half-open timeout and transitions (returning true) if it has elapsed.
    pub fn request_allowed(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let allowed = match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if inner.last_state_change.elapsed() >= self.config.error_timeout {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    true
                } else {
                    false
                }
            }
        };

        let event = if allowed {
            CircuitBreakerEvent::CallPermitted {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                state: inner.state,
            }
        } else {
            CircuitBreakerEvent::CallRejected {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
            }
        };
        drop(inner);
        self.config.event_listeners.emit(&event);

        #[cfg(feature = "metrics")]
        if !allowed {
            counter!("semian_circuitbreaker_calls_rejected_total", "circuitbreaker" => self.config.name.clone())
                .increment(1);
        }

        allowed
    }

    /// Records a failure: pushes `now()`, evaluates the closed→open transition,
    /// and immediately re-opens if already half-open.
    pub fn mark_failed(&self, error: &impl std::fmt::Display) {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        inner.errors.push(now);
        inner.last_error_at = Some(now);
        inner.last_error = Some(error.to_string());

        let state = inner.state;
        self.config.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: now,
            state,
        });

        #[cfg(feature = "metrics")]
        counter!("semian_circuitbreaker_failures_total", "circuitbreaker" => self.config.name.clone())
            .increment(1);

        match state {
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open),
            _ => self.evaluate_open(&mut inner),
        }
    }

    /// Only meaningful in half-open: increments the success streak and, once
    /// `success_threshold` is reached, transitions to closed.
    pub fn mark_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        let state = inner.state;

        self.config.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            state,
        });

        #[cfg(feature = "metrics")]
        counter!("semian_circuitbreaker_successes_total", "circuitbreaker" => self.config.name.clone())
            .increment(1);

        if state == CircuitState::HalfOpen {
            inner.successes += 1;
            if inner.successes >= self.config.success_threshold {
                self.transition(&mut inner, CircuitState::Closed);
            }
        }
    }

    pub fn force_open(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.transition(&mut inner, CircuitState::Open);
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.transition(&mut inner, CircuitState::Closed);
    }

    fn evaluate_open(&self, inner: &mut Inner) {
        if inner.errors.size() < self.config.error_threshold {
            return;
        }

        if self.config.windowed {
            if let Some(first) = inner.errors.first() {
                if first.elapsed() > self.config.error_threshold_timeout {
                    return;
                }
            }
        }

        self.transition(inner, CircuitState::Open);
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        if inner.state == to {
            return;
        }
        let from = inner.state;
        inner.state = to;
        inner.last_state_change = Instant::now();
        inner.successes = 0;
        inner.errors.clear();

        self.config.event_listeners.emit(&CircuitBreakerEvent::StateTransition {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            from_state: from,
            to_state: to,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %self.config.name, from = state_label(from), to = state_label(to), "circuit state transition");

        #[cfg(feature = "metrics")]
        gauge!("semian_circuitbreaker_state", "circuitbreaker" => self.config.name.clone(), "state" => state_label(to)).set(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfigBuilder;

    #[derive(Debug)]
    struct Boom;
    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }
    impl MarksCircuits for Boom {}

    fn breaker(error_threshold: usize, error_timeout: Duration, success_threshold: usize) -> CircuitBreaker {
        CircuitBreaker::new(
            CircuitBreakerConfigBuilder::new("test")
                .error_threshold(error_threshold)
                .error_timeout(error_timeout)
                .success_threshold(success_threshold)
                .build(),
        )
    }

    #[test]
    fn trips_open_after_error_threshold_within_window() {
        let cb = breaker(3, Duration::from_secs(5), 2);
        for _ in 0..3 {
            let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        }
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn stays_closed_below_threshold() {
        let cb = breaker(3, Duration::from_secs(5), 2);
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn open_rejects_until_error_timeout_elapses() {
        let cb = breaker(1, Duration::from_millis(20), 1);
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        assert_eq!(cb.state(), CircuitState::Open);

        let result: Result<(), SemianError<Boom>> = cb.acquire(|_| Ok(()));
        assert!(matches!(result, Err(SemianError::OpenCircuit { .. })));

        std::thread::sleep(Duration::from_millis(30));
        let result: Result<(), SemianError<Boom>> = cb.acquire(|_| Ok(()));
        assert!(result.is_ok());
    }

    #[test]
    fn half_open_closes_after_success_threshold() {
        let cb = breaker(1, Duration::from_millis(10), 2);
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        std::thread::sleep(Duration::from_millis(15));

        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Ok(()));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Ok(()));
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn any_error_in_half_open_reopens_immediately() {
        let cb = breaker(1, Duration::from_millis(10), 3);
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        std::thread::sleep(Duration::from_millis(15));

        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Ok(()));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn error_threshold_timeout_resets_window_outside_it() {
        let cb = breaker(2, Duration::from_millis(20), 1);
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        std::thread::sleep(Duration::from_millis(30));
        let _: Result<(), SemianError<Boom>> = cb.acquire(|_| Err::<(), _>(Boom));
        // second error arrives after the first has aged out of the threshold window
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn unmarked_errors_do_not_advance_the_window() {
        #[derive(Debug)]
        struct Expected;
        impl MarksCircuits for Expected {
            fn marks_circuits(&self) -> bool {
                false
            }
        }

        let cb = breaker(1, Duration::from_secs(5), 1);
        let _: Result<(), SemianError<Expected>> = cb.acquire(|_| Err::<(), _>(Expected));
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
