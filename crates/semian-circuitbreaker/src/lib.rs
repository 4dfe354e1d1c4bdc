//! Classical three-state circuit breaker.
//!
//! A fixed-capacity window of error timestamps (capacity `error_threshold`) drives
//! the closed→open transition once the window is full and its oldest entry is no
//! older than `error_threshold_timeout`. A timeout (`error_timeout`) drives open→
//! half-open; a run of `success_threshold` consecutive successes in half-open drives
//! half-open→closed, and any single error there re-opens immediately.
//!
//! ```
//! use semian_circuitbreaker::{CircuitBreaker, CircuitBreakerConfigBuilder};
//! use semian_core::MarksCircuits;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct DbError;
//! impl std::fmt::Display for DbError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "db error")
//!     }
//! }
//! impl MarksCircuits for DbError {}
//!
//! let config = CircuitBreakerConfigBuilder::new("payments-db")
//!     .error_threshold(5)
//!     .error_timeout(Duration::from_secs(30))
//!     .success_threshold(2)
//!     .build();
//! let breaker = CircuitBreaker::new(config);
//!
//! let result = breaker.acquire(|_timeout| -> Result<i32, DbError> { Ok(42) });
//! assert!(result.is_ok());
//! ```

pub mod circuit;
pub mod config;
pub mod events;

pub use circuit::CircuitBreaker;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use events::CircuitBreakerEvent;
pub use semian_core::CircuitState;
