//! Adaptive, PID-controlled circuit breaker.
//!
//! Rather than a hard three-state machine, admission is a probability: a
//! proportional controller tracks the gap between the observed error rate and an
//! exponentially-smoothed "ideal" error rate, and feeds the result into a
//! `rejection_rate` that every `request_allowed?` check samples against. An optional
//! out-of-band health ping can feed the same controller independent of request
//! traffic, via a background task owned by a [`semian_core::Core`] handle.
//!
//! ```
//! use semian_adaptive::{AdaptiveCircuitBreaker, AdaptiveBreakerConfigBuilder};
//! use semian_core::MarksCircuits;
//!
//! #[derive(Debug)]
//! struct DbError;
//! impl MarksCircuits for DbError {}
//!
//! let config = AdaptiveBreakerConfigBuilder::new("search-cache")
//!     .defensiveness(5.0)
//!     .build();
//! let breaker = AdaptiveCircuitBreaker::new(config);
//! let result = breaker.acquire(|| -> Result<i32, DbError> { Ok(7) });
//! assert!(result.is_ok());
//! ```

pub mod adaptive_breaker;
pub mod config;
pub mod events;
pub mod proportional_controller;

pub use adaptive_breaker::AdaptiveCircuitBreaker;
pub use config::{AdaptiveBreakerConfig, AdaptiveBreakerConfigBuilder};
pub use events::{AdaptiveBreakerEvent, PartialOpenState};
pub use proportional_controller::{ControllerConfig, ProportionalController};
