//! The feedback controller behind the adaptive breaker: a proportional control law
//! over an exponentially-smoothed "ideal" error rate, feeding a rejection
//! probability back into every admission check.

use rand::Rng;
use semian_core::estimators::DEFAULT_ALPHA;
use semian_core::ExponentialSmoother;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tunables for [`ProportionalController`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// How strongly the current rejection rate damps its own feedback.
    pub defensiveness: f64,
    /// How far back `update()` looks when computing the observed error rate.
    pub window_size: Duration,
    /// Expected call frequency of `update()`, used to derive the smoother's
    /// effective half-life in calls rather than wall-clock time.
    pub sliding_interval: Duration,
    /// Seed value for the "ideal" error rate smoother.
    pub initial_error_rate: f64,
    /// Upper bound the smoother's forecast is clamped to.
    pub cap_value: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            defensiveness: 5.0,
            window_size: Duration::from_secs(10),
            sliding_interval: Duration::from_secs(1),
            initial_error_rate: 0.0,
            cap_value: 0.10,
        }
    }
}

/// Tracks recent outcomes in three separate timestamped deques — successes,
/// errors, and rejections — and derives a `rejection_rate` via a proportional
/// control law: `p = (observed − ideal) − rejection_rate / defensiveness`,
/// `rejection_rate ← clamp(rejection_rate + p, 0, 1)`.
///
/// Rejections are tracked for introspection but never enter `observed_error_rate`:
/// mixing them into the same denominator as successes/errors would let a high
/// rejection rate dilute the very signal that drives it back down, a feedback
/// loop that damps itself instead of the error rate it's meant to track.
///
/// Each entry carries a weight alongside its timestamp so a health ping can
/// contribute more or less signal than an ordinary request (see `ping_weight`
/// on the adaptive breaker's config); `record_success`/`record_error`/
/// `record_rejected` are weight-1.0 convenience wrappers over the `_weighted`
/// variants.
pub struct ProportionalController {
    config: ControllerConfig,
    successes: VecDeque<(Instant, f64)>,
    errors: VecDeque<(Instant, f64)>,
    rejections: VecDeque<(Instant, f64)>,
    smoother: ExponentialSmoother,
    rejection_rate: f64,
    last_p_value: f64,
    last_update: Instant,
}

impl ProportionalController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            smoother: ExponentialSmoother::with_alpha(
                DEFAULT_ALPHA,
                config.cap_value,
                config.initial_error_rate,
            ),
            successes: VecDeque::new(),
            errors: VecDeque::new(),
            rejections: VecDeque::new(),
            rejection_rate: 0.0,
            last_p_value: 0.0,
            last_update: Instant::now(),
            config,
        }
    }

    pub fn record_success(&mut self) {
        self.record_success_weighted(1.0);
    }

    pub fn record_error(&mut self) {
        self.record_error_weighted(1.0);
    }

    pub fn record_rejected(&mut self) {
        self.record_rejected_weighted(1.0);
    }

    pub fn record_success_weighted(&mut self, weight: f64) {
        self.successes.push_back((Instant::now(), weight));
    }

    pub fn record_error_weighted(&mut self, weight: f64) {
        self.errors.push_back((Instant::now(), weight));
    }

    pub fn record_rejected_weighted(&mut self, weight: f64) {
        self.rejections.push_back((Instant::now(), weight));
    }

    fn prune(deque: &mut VecDeque<(Instant, f64)>, cutoff: Instant) {
        while let Some(&(ts, _)) = deque.front() {
            if ts < cutoff {
                deque.pop_front();
            } else {
                break;
            }
        }
    }

    fn weighted_sum(deque: &VecDeque<(Instant, f64)>) -> f64 {
        deque.iter().map(|(_, w)| w).sum()
    }

    /// Cleans entries older than `window_size` out of all three deques,
    /// recomputes the observed error rate, feeds it to the smoother, and
    /// updates `rejection_rate`.
    pub fn update(&mut self) {
        let cutoff = Instant::now()
            .checked_sub(self.config.window_size)
            .unwrap_or_else(Instant::now);
        Self::prune(&mut self.successes, cutoff);
        Self::prune(&mut self.errors, cutoff);
        Self::prune(&mut self.rejections, cutoff);

        let observed_error_rate = self.observed_error_rate();

        self.smoother.add_observation(observed_error_rate);
        let ideal_error_rate = self.smoother.forecast();

        let p = (observed_error_rate - ideal_error_rate) - self.rejection_rate / self.config.defensiveness;
        self.last_p_value = p;
        self.rejection_rate = (self.rejection_rate + p).clamp(0.0, 1.0);
        self.last_update = Instant::now();
    }

    pub fn should_reject(&self) -> bool {
        rand::rng().random::<f64>() < self.rejection_rate
    }

    pub fn rejection_rate(&self) -> f64 {
        self.rejection_rate
    }

    /// `errors / (errors + successes)`. Rejections never enter this formula.
    pub fn observed_error_rate(&self) -> f64 {
        let errors = Self::weighted_sum(&self.errors);
        let successes = Self::weighted_sum(&self.successes);
        let total = errors + successes;
        if total <= 0.0 {
            0.0
        } else {
            errors / total
        }
    }

    pub fn last_p_value(&self) -> f64 {
        self.last_p_value
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    pub fn reset(&mut self) {
        self.successes.clear();
        self.errors.clear();
        self.rejections.clear();
        self.smoother.reset(self.config.initial_error_rate);
        self.rejection_rate = 0.0;
        self.last_p_value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ControllerConfig {
        ControllerConfig {
            defensiveness: 5.0,
            window_size: Duration::from_secs(10),
            sliding_interval: Duration::from_millis(1),
            initial_error_rate: 0.01,
            cap_value: 0.10,
        }
    }

    #[test]
    fn converges_upward_under_sustained_errors() {
        let mut controller = ProportionalController::new(config());
        for _ in 0..20 {
            for _ in 0..84 {
                controller.record_success();
            }
            for _ in 0..16 {
                controller.record_error();
            }
            controller.update();
        }
        assert!(
            controller.rejection_rate() >= 0.60,
            "rejection_rate={}",
            controller.rejection_rate()
        );
    }

    #[test]
    fn recovers_when_errors_stop() {
        let mut controller = ProportionalController::new(config());
        for _ in 0..20 {
            for _ in 0..84 {
                controller.record_success();
            }
            for _ in 0..16 {
                controller.record_error();
            }
            controller.update();
        }
        for _ in 0..20 {
            for _ in 0..100 {
                controller.record_success();
            }
            controller.update();
        }
        assert!(controller.rejection_rate() < 0.05);
    }

    #[test]
    fn reset_clears_state() {
        let mut controller = ProportionalController::new(config());
        controller.record_error();
        controller.update();
        controller.reset();
        assert_eq!(controller.rejection_rate(), 0.0);
        assert_eq!(controller.observed_error_rate(), 0.0);
    }

    #[test]
    fn rejections_do_not_dilute_observed_error_rate() {
        let mut controller = ProportionalController::new(config());
        for _ in 0..5 {
            controller.record_error();
        }
        for _ in 0..5 {
            controller.record_success();
        }
        for _ in 0..1000 {
            controller.record_rejected();
        }
        assert_eq!(controller.observed_error_rate(), 0.5);
    }

    #[test]
    fn weighted_ping_outcomes_scale_their_contribution() {
        let mut controller = ProportionalController::new(config());
        controller.record_error_weighted(0.2);
        controller.record_success_weighted(0.2);
        assert_eq!(controller.observed_error_rate(), 0.5);
    }
}
