//! Streaming estimators used by the adaptive breaker's control loop.

/// Exponentially-smoothed forecast of a scalar series, capped at `cap_value`.
///
/// The default smoothing factor corresponds to a half-life of roughly ten
/// observations: `alpha = 1 - 0.5^(1/10) ≈ 0.0670`. The named default below uses
/// ≈0.078 directly; we
/// expose both the half-life knob and a raw-alpha constructor so callers can match
/// either derivation without the estimator caring which one produced its `alpha`.
#[derive(Debug, Clone)]
pub struct ExponentialSmoother {
    alpha: f64,
    cap_value: f64,
    value: f64,
}

/// Default smoothing factor used when a caller asks for "the spec default" directly,
/// rather than deriving alpha from a half-life.
pub const DEFAULT_ALPHA: f64 = 0.078;
/// Default ceiling on the smoothed value (the controller's `cap_value`).
pub const DEFAULT_CAP_VALUE: f64 = 0.10;

impl ExponentialSmoother {
    /// Builds a smoother with an explicit `alpha` in `(0.0, 1.0]`.
    pub fn with_alpha(alpha: f64, cap_value: f64, seed: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::MIN_POSITIVE, 1.0),
            cap_value,
            value: seed.min(cap_value).max(0.0),
        }
    }

    /// Derives `alpha` from a target half-life expressed in number of observations.
    pub fn with_half_life(half_life: f64, cap_value: f64, seed: f64) -> Self {
        let alpha = 1.0 - 0.5_f64.powf(1.0 / half_life.max(1.0));
        Self::with_alpha(alpha, cap_value, seed)
    }

    /// The spec's named default: `alpha ≈ 0.078`, `cap_value = 0.10`, seeded at 0.
    pub fn default_with_seed(seed: f64) -> Self {
        Self::with_alpha(DEFAULT_ALPHA, DEFAULT_CAP_VALUE, seed)
    }

    /// Folds a new observation into the smoothed value, clamped at `cap_value`.
    pub fn add_observation(&mut self, x: f64) -> f64 {
        self.value = (self.alpha * x + (1.0 - self.alpha) * self.value).min(self.cap_value);
        self.value
    }

    /// The current smoothed estimate.
    pub fn forecast(&self) -> f64 {
        self.value
    }

    /// Resets the smoother to `seed`.
    pub fn reset(&mut self, seed: f64) {
        self.value = seed.min(self.cap_value).max(0.0);
    }

    pub fn cap_value(&self) -> f64 {
        self.cap_value
    }
}

/// Sequential P² quantile estimator (Jain & Chlamtac, 1985) for a single target
/// quantile `q`, using five markers: min, `q/2`, `q`, `(1+q)/2`, max.
///
/// Produces an O(1)-memory running estimate of the q-quantile; needs the first five
/// observations to bootstrap before `quantile()` reflects the P² update rule.
#[derive(Debug, Clone)]
pub struct P2QuantileEstimator {
    q: f64,
    /// Marker heights.
    heights: [f64; 5],
    /// Marker positions (1-indexed conceptually, stored 0-indexed).
    positions: [f64; 5],
    /// Desired (possibly fractional) marker positions.
    desired: [f64; 5],
    /// Desired position increments per observation.
    increments: [f64; 5],
    count: usize,
    init_buf: Vec<f64>,
}

impl P2QuantileEstimator {
    /// Creates an estimator targeting quantile `q` in `(0.0, 1.0)`.
    pub fn new(q: f64) -> Self {
        let q = q.clamp(0.0001, 0.9999);
        Self {
            q,
            heights: [0.0; 5],
            positions: [1.0, 2.0, 3.0, 4.0, 5.0],
            desired: [1.0, 1.0 + 2.0 * q, 1.0 + 4.0 * q, 3.0 + 2.0 * q, 5.0],
            increments: [0.0, q / 2.0, q, (1.0 + q) / 2.0, 1.0],
            count: 0,
            init_buf: Vec::with_capacity(5),
        }
    }

    /// Folds a new observation into the estimator.
    pub fn observe(&mut self, x: f64) {
        self.count += 1;

        if self.init_buf.len() < 5 {
            self.init_buf.push(x);
            if self.init_buf.len() == 5 {
                self.init_buf.sort_by(|a, b| a.partial_cmp(b).unwrap());
                self.heights.copy_from_slice(&self.init_buf);
            }
            return;
        }

        // Find cell k such that heights[k] <= x < heights[k+1], clamping at the ends.
        let mut k = 0usize;
        if x < self.heights[0] {
            self.heights[0] = x;
            k = 0;
        } else if x >= self.heights[4] {
            self.heights[4] = x;
            k = 3;
        } else {
            for i in 0..4 {
                if self.heights[i] <= x && x < self.heights[i + 1] {
                    k = i;
                    break;
                }
            }
        }

        for i in (k + 1)..5 {
            self.positions[i] += 1.0;
        }
        for i in 0..5 {
            self.desired[i] += self.increments[i];
        }

        for i in 1..4 {
            let d = self.desired[i] - self.positions[i];
            let upper_gap = self.positions[i + 1] - self.positions[i];
            let lower_gap = self.positions[i] - self.positions[i - 1];
            if (d >= 1.0 && upper_gap > 1.0) || (d <= -1.0 && lower_gap > 1.0) {
                let d = if d >= 0.0 { 1.0 } else { -1.0 };
                let parabolic = self.parabolic_predict(i, d);
                let new_height = if self.heights[i - 1] < parabolic && parabolic < self.heights[i + 1] {
                    parabolic
                } else {
                    self.linear_predict(i, d)
                };
                self.heights[i] = new_height;
                self.positions[i] += d;
            }
        }
    }

    fn parabolic_predict(&self, i: usize, d: f64) -> f64 {
        let qi = self.heights[i];
        let qip1 = self.heights[i + 1];
        let qim1 = self.heights[i - 1];
        let ni = self.positions[i];
        let nip1 = self.positions[i + 1];
        let nim1 = self.positions[i - 1];

        qi + d / (nip1 - nim1)
            * ((ni - nim1 + d) * (qip1 - qi) / (nip1 - ni)
                + (nip1 - ni - d) * (qi - qim1) / (ni - nim1))
    }

    fn linear_predict(&self, i: usize, d: f64) -> f64 {
        let qi = self.heights[i];
        let target = if d > 0.0 {
            self.heights[i + 1]
        } else {
            self.heights[i - 1]
        };
        let target_pos = if d > 0.0 {
            self.positions[i + 1]
        } else {
            self.positions[i - 1]
        };
        qi + d * (target - qi) / (target_pos - self.positions[i])
    }

    /// The current estimate of the q-quantile.
    ///
    /// Before five observations have arrived, returns the best available order
    /// statistic from the bootstrap buffer.
    pub fn quantile(&self) -> f64 {
        if self.init_buf.len() < 5 {
            if self.init_buf.is_empty() {
                return 0.0;
            }
            let mut sorted = self.init_buf.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let idx = ((sorted.len() - 1) as f64 * self.q).round() as usize;
            return sorted[idx];
        }
        self.heights[2]
    }

    pub fn target_quantile(&self) -> f64 {
        self.q
    }

    pub fn observation_count(&self) -> usize {
        self.count
    }
}
