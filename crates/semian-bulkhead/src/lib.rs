//! A cross-process counting-semaphore bulkhead.
//!
//! Where an in-process semaphore only bounds concurrency within one instance, this
//! bulkhead bounds concurrency across every process attached to the same named
//! resource — worker processes behind a load balancer, forked request handlers,
//! whatever else is hammering the same downstream dependency. Sizing is either a
//! fixed ticket count or a quota applied per registered worker, recomputed any time
//! a process joins or leaves.
//!
//! ```no_run
//! use semian_bulkhead::Bulkhead;
//! use std::time::Duration;
//!
//! let bulkhead = Bulkhead::with_tickets("payments-db", 4)?;
//! {
//!     let _ticket = bulkhead.acquire(Some(Duration::from_millis(250)))?;
//!     // call the protected resource
//! }
//! # Ok::<(), semian_bulkhead::BulkheadError>(())
//! ```

pub mod bulkhead;
pub mod config;
pub mod error;
pub mod events;
pub mod key;
pub mod named_semaphore;

pub use bulkhead::{Bulkhead, Ticket};
pub use config::{BulkheadConfig, BulkheadConfigBuilder, TicketSizing};
pub use error::{BulkheadError, Result};
pub use events::BulkheadEvent;
pub use named_semaphore::{Permissions, Ticketing};
