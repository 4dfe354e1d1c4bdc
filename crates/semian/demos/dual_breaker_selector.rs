//! Running a classical and an adaptive breaker side by side, with a selector
//! that shadows the adaptive breaker behind the classical one until its
//! rejection rate looks trustworthy.

use semian::dual::{ActiveBreaker, DualBreaker, DualSnapshot};
use semian_adaptive::{AdaptiveBreakerConfigBuilder, AdaptiveCircuitBreaker};
use semian_circuitbreaker::{CircuitBreaker, CircuitBreakerConfigBuilder};
use semian_core::MarksCircuits;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("upstream error")]
struct UpstreamError;
impl MarksCircuits for UpstreamError {}

/// Trusts the classical breaker until the adaptive one has seen enough
/// traffic to have a meaningful rejection rate, then hands it control.
fn graduated_cutover(snapshot: &DualSnapshot) -> ActiveBreaker {
    if snapshot.adaptive_rejection_rate > 0.0 {
        ActiveBreaker::Adaptive
    } else {
        ActiveBreaker::Classical
    }
}

fn main() {
    let classical = CircuitBreaker::new(
        CircuitBreakerConfigBuilder::new("search-backend")
            .error_threshold(5)
            .error_timeout(Duration::from_secs(30))
            .success_threshold(2)
            .build(),
    );
    let adaptive = AdaptiveCircuitBreaker::new(
        AdaptiveBreakerConfigBuilder::new("search-backend")
            .defensiveness(5.0)
            .build(),
    );

    let dual = DualBreaker::new(classical, adaptive, graduated_cutover);

    for _ in 0..3 {
        let result = dual.acquire(|| Err::<(), _>(UpstreamError));
        println!("active breaker: {:?}, result: {result:?}", dual.active_breaker());
    }
}
