//! An optional coordinator for sharing classical breaker state across
//! processes over a unix domain socket.
//!
//! A protected resource's breaker is local-process by default; when multiple
//! processes guard the same downstream dependency (worker pools, forked
//! servers) they'd otherwise each trip their own circuit independently. This
//! crate's [`server::SharedScopeServer`] centralizes one classical breaker's
//! state per resource name, and [`client::SharedScopeClient`] is what a
//! process-local breaker talks to instead of its own in-memory state —
//! degrading to a local cache with queued reports if the coordinator becomes
//! unreachable, per the propagation policy the rest of this workspace follows
//! for syscall-level degraded modes.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use semian_shared_scope::client::SharedScopeClient;
//! use std::time::Duration;
//!
//! let client = SharedScopeClient::connect("/tmp/semian-shared-scope.sock");
//! client.register_resource("payments-db", 5, Duration::from_secs(30), 2).await?;
//! client.report_error("payments-db");
//! let state = client.get_state("payments-db").await?;
//! println!("payments-db is {state:?}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod state;

pub use client::{LinkState, SharedScopeClient};
pub use error::{Result, SharedScopeError};
pub use protocol::WireState;
pub use server::{Coordinator, SharedScopeServer};
