//! A protected resource: a bulkhead and a breaker composed behind one `acquire`,
//! plus a process-wide registry that garbage-collects idle resources.
//!
//! This is the layer an adapter actually calls through — it owns the sequencing
//! the bulkhead and breaker crates don't know about each other for (breaker
//! admission first, timed bulkhead acquisition second, then the block), and emits
//! the four-event vocabulary (`success`, `busy`, `circuit_open`, `state_change`)
//! an adapter's subscription hook listens for.
//!
//! ```no_run
//! use semian_resource::{ProtectedResource, ResourceConfigBuilder};
//!
//! #[derive(Debug)]
//! struct DbError;
//! impl std::fmt::Display for DbError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "db error")
//!     }
//! }
//! impl semian_core::MarksCircuits for DbError {}
//!
//! let config = ResourceConfigBuilder::new("payments-db")
//!     .tickets(4)
//!     .error_threshold(3)
//!     .build()?;
//! let resource = ProtectedResource::register(config)?;
//! let result = resource.acquire(None, semian_resource::Scope::Query, "mysql2", || {
//!     Ok::<_, DbError>(42)
//! });
//! assert_eq!(result.unwrap(), 42);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod breaker_kind;
pub mod config;
pub mod error;
pub mod events;
pub mod registry;
pub mod resource;

pub use config::{AdaptiveOptions, ResourceConfig, ResourceConfigBuilder};
pub use error::{RegistryError, Result};
pub use events::{ResourceEvent, Scope};
pub use registry::{Registry, RegistryLimits};
pub use resource::ProtectedResource;
