//! The breaker strategy a protected resource composes with its bulkhead.
//!
//! A resource is agnostic to which strategy guards it; this enum picks the right
//! admission check and outcome recording for whichever one [`crate::config::ResourceConfig`]
//! selected.

use semian_adaptive::AdaptiveCircuitBreaker;
use semian_circuitbreaker::CircuitBreaker;
use semian_core::CircuitState;
use semian_dual::DualBreaker;
use std::sync::Arc;

pub(crate) enum BreakerKind {
    None,
    Classical(CircuitBreaker),
    Adaptive(Arc<AdaptiveCircuitBreaker>),
    Dual(DualBreaker),
}

impl BreakerKind {
    pub(crate) fn request_allowed(&self) -> bool {
        match self {
            BreakerKind::None => true,
            BreakerKind::Classical(cb) => cb.request_allowed(),
            BreakerKind::Adaptive(ab) => ab.request_allowed(),
            BreakerKind::Dual(db) => db.request_allowed(),
        }
    }

    pub(crate) fn mark_success(&self) {
        match self {
            BreakerKind::None => {}
            BreakerKind::Classical(cb) => cb.mark_success(),
            BreakerKind::Adaptive(ab) => ab.mark_success(),
            BreakerKind::Dual(db) => {
                db.classical().mark_success();
                db.adaptive().mark_success();
            }
        }
    }

    pub(crate) fn mark_failed(&self, error: &impl std::fmt::Display) {
        match self {
            BreakerKind::None => {}
            BreakerKind::Classical(cb) => cb.mark_failed(error),
            BreakerKind::Adaptive(ab) => ab.mark_failed(),
            BreakerKind::Dual(db) => {
                db.classical().mark_failed(error);
                db.adaptive().mark_failed();
            }
        }
    }

    pub(crate) fn reset(&self) {
        match self {
            BreakerKind::None => {}
            BreakerKind::Classical(cb) => cb.reset(),
            BreakerKind::Adaptive(ab) => ab.reset(),
            BreakerKind::Dual(db) => db.reset(),
        }
    }

    /// A coarse "is this breaker currently in a non-resting state" check, used by
    /// the registry's LRU sweep to avoid evicting a resource whose breaker has
    /// open or degraded state worth keeping around.
    pub(crate) fn is_at_rest(&self) -> bool {
        match self {
            BreakerKind::None => true,
            BreakerKind::Classical(cb) => cb.state() == CircuitState::Closed,
            BreakerKind::Adaptive(ab) => ab.rejection_rate() < 0.01,
            BreakerKind::Dual(db) => {
                db.classical().state() == CircuitState::Closed && db.adaptive().rejection_rate() < 0.01
            }
        }
    }

    /// The adaptive handle backing this breaker, if any — `Adaptive` directly,
    /// or the adaptive half of a `Dual`. Used to wire the out-of-band health
    /// ping, which only the adaptive controller consumes.
    pub(crate) fn adaptive_handle(&self) -> Option<&Arc<AdaptiveCircuitBreaker>> {
        match self {
            BreakerKind::None | BreakerKind::Classical(_) => None,
            BreakerKind::Adaptive(ab) => Some(ab),
            BreakerKind::Dual(db) => Some(db.adaptive()),
        }
    }

    pub(crate) fn state_label(&self) -> &'static str {
        match self {
            BreakerKind::None => "disabled",
            BreakerKind::Classical(cb) => match cb.state() {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            },
            BreakerKind::Adaptive(ab) => match ab.partial_open_state() {
                semian_adaptive::PartialOpenState::Closed => "closed",
                semian_adaptive::PartialOpenState::Open => "open",
                semian_adaptive::PartialOpenState::HalfOpen => "half_open",
            },
            BreakerKind::Dual(db) => match db.classical().state() {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            },
        }
    }
}
