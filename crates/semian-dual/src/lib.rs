//! Runs a classical and an adaptive breaker side by side for the same resource.
//!
//! Every outcome is recorded to both breakers regardless of which one is gating
//! admission; a selector predicate, evaluated per call, decides which breaker's
//! `request_allowed?` actually admits or rejects the call. This lets an operator
//! compare the two strategies live (shadow the adaptive breaker behind the
//! classical one, or vice versa) before switching which one is load-bearing.

use semian_adaptive::AdaptiveCircuitBreaker;
use semian_circuitbreaker::CircuitBreaker;
use semian_core::{CircuitState, MarksCircuits, SemianError};
use std::sync::Arc;

/// Which breaker is currently gating admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveBreaker {
    Classical,
    Adaptive,
}

/// A read-only view of both breakers' state, handed to the selector.
#[derive(Debug, Clone)]
pub struct DualSnapshot {
    pub classical_state: CircuitState,
    pub adaptive_rejection_rate: f64,
}

/// Selects which breaker gates admission for the next call.
pub trait BreakerSelector: Send + Sync {
    fn select(&self, snapshot: &DualSnapshot) -> ActiveBreaker;
}

impl<F> BreakerSelector for F
where
    F: Fn(&DualSnapshot) -> ActiveBreaker + Send + Sync,
{
    fn select(&self, snapshot: &DualSnapshot) -> ActiveBreaker {
        self(snapshot)
    }
}

impl BreakerSelector for Box<dyn BreakerSelector> {
    fn select(&self, snapshot: &DualSnapshot) -> ActiveBreaker {
        (**self).select(snapshot)
    }
}

/// Always selects the classical breaker.
pub struct AlwaysClassical;
impl BreakerSelector for AlwaysClassical {
    fn select(&self, _snapshot: &DualSnapshot) -> ActiveBreaker {
        ActiveBreaker::Classical
    }
}

/// Always selects the adaptive breaker.
pub struct AlwaysAdaptive;
impl BreakerSelector for AlwaysAdaptive {
    fn select(&self, _snapshot: &DualSnapshot) -> ActiveBreaker {
        ActiveBreaker::Adaptive
    }
}

/// A paired classical + adaptive breaker for one resource.
pub struct DualBreaker {
    classical: CircuitBreaker,
    adaptive: Arc<AdaptiveCircuitBreaker>,
    selector: Box<dyn BreakerSelector>,
}

impl DualBreaker {
    pub fn new(
        classical: CircuitBreaker,
        adaptive: Arc<AdaptiveCircuitBreaker>,
        selector: impl BreakerSelector + 'static,
    ) -> Self {
        Self {
            classical,
            adaptive,
            selector: Box::new(selector),
        }
    }

    pub fn classical(&self) -> &CircuitBreaker {
        &self.classical
    }

    pub fn adaptive(&self) -> &Arc<AdaptiveCircuitBreaker> {
        &self.adaptive
    }

    fn snapshot(&self) -> DualSnapshot {
        DualSnapshot {
            classical_state: self.classical.state(),
            adaptive_rejection_rate: self.adaptive.rejection_rate(),
        }
    }

    pub fn active_breaker(&self) -> ActiveBreaker {
        self.selector.select(&self.snapshot())
    }

    /// Whether the currently-selected breaker would admit a call right now.
    pub fn request_allowed(&self) -> bool {
        match self.active_breaker() {
            ActiveBreaker::Classical => self.classical.request_allowed(),
            ActiveBreaker::Adaptive => self.adaptive.request_allowed(),
        }
    }

    /// Runs `f` if the active breaker currently allows it. The outcome is fed to
    /// both breakers regardless of which one gated admission.
    pub fn acquire<T, E, F>(&self, f: F) -> Result<T, SemianError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: MarksCircuits + std::fmt::Display,
    {
        if !self.request_allowed() {
            return Err(SemianError::OpenCircuit {
                resource: self.classical.name().to_string(),
            });
        }

        match f() {
            Ok(value) => {
                self.classical.mark_success();
                self.adaptive.mark_success();
                Ok(value)
            }
            Err(err) => {
                if err.marks_circuits() {
                    self.classical.mark_failed(&err);
                    self.adaptive.mark_failed();
                }
                Err(SemianError::Application(err))
            }
        }
    }

    pub fn reset(&self) {
        self.classical.reset();
        self.adaptive.reset();
    }
}
