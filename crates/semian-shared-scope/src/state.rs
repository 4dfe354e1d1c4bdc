//! Server-side breaker state machine, one instance per registered resource name.
//!
//! Mirrors the classical breaker's closed/open/half-open transitions
//! (`semian_circuitbreaker::circuit::CircuitBreaker`) minus the bulkhead-adjacent
//! bits a remote coordinator has no business knowing about: no resource timeout
//! override in half-open, no per-call event emission. Callers only ever see
//! whether a report changed the externally visible state.

use semian_core::{CircuitState, SlidingWindow};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct ResourceParams {
    pub error_threshold: usize,
    pub error_timeout: Duration,
    pub success_threshold: usize,
}

struct Inner {
    state: CircuitState,
    errors: SlidingWindow,
    successes: usize,
    last_error_at: Option<Instant>,
    last_state_change: Instant,
}

pub struct ResourceState {
    params: ResourceParams,
    inner: Mutex<Inner>,
}

impl ResourceState {
    pub fn new(params: ResourceParams) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                errors: SlidingWindow::new(params.error_threshold),
                successes: 0,
                last_error_at: None,
                last_state_change: Instant::now(),
            }),
            params,
        }
    }

    pub fn params(&self) -> ResourceParams {
        self.params
    }

    /// Current state, lazily applying the open→half-open timeout first.
    pub fn current_state(&self) -> CircuitState {
        let mut inner = self.inner.lock().unwrap();
        self.expire_locked(&mut inner);
        inner.state
    }

    /// Called by the background sweep; returns the new state if the open→
    /// half-open timeout just fired, `None` otherwise.
    pub fn maybe_expire(&self) -> Option<CircuitState> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.state;
        self.expire_locked(&mut inner);
        if inner.state != before {
            Some(inner.state)
        } else {
            None
        }
    }

    /// Records an error. Any error while half-open re-opens immediately,
    /// matching the local classical rule (spec open question (b): remote
    /// origin gets no special treatment).
    pub fn record_error(&self) -> CircuitState {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        inner.errors.push(now);
        inner.last_error_at = Some(now);

        match inner.state {
            CircuitState::HalfOpen => self.transition_locked(&mut inner, CircuitState::Open),
            _ => {
                if inner.errors.size() >= self.params.error_threshold {
                    let stays_in_window = inner
                        .errors
                        .first()
                        .map(|ts| ts.elapsed() <= self.params.error_timeout)
                        .unwrap_or(false);
                    if stays_in_window {
                        self.transition_locked(&mut inner, CircuitState::Open);
                    }
                }
            }
        }
        inner.state
    }

    /// Records a success. Only meaningful in half-open, where enough
    /// consecutive successes close the circuit again.
    pub fn record_success(&self) -> CircuitState {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == CircuitState::HalfOpen {
            inner.successes += 1;
            if inner.successes >= self.params.success_threshold {
                self.transition_locked(&mut inner, CircuitState::Closed);
            }
        }
        inner.state
    }

    fn expire_locked(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Open {
            if let Some(last_error_at) = inner.last_error_at {
                if last_error_at.elapsed() >= self.params.error_timeout {
                    self.transition_locked(inner, CircuitState::HalfOpen);
                }
            }
        }
    }

    fn transition_locked(&self, inner: &mut Inner, to: CircuitState) {
        if inner.state == to {
            return;
        }
        inner.state = to;
        inner.last_state_change = Instant::now();
        inner.successes = 0;
        inner.errors.clear();
    }
}
