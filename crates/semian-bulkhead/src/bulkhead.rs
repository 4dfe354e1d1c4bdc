//! The public bulkhead handle: register once per resource, acquire per call.

use crate::config::{BulkheadConfig, BulkheadConfigBuilder};
use crate::error::{BulkheadError, Result};
use crate::events::BulkheadEvent;
use crate::named_semaphore::SemaphoreSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A registered cross-process bulkhead. Does not implement `Clone`; share one
/// instance behind an `Arc` (as the registry does) rather than registering
/// twice. Dropping it unregisters this process's worker slot — standing in for
/// the process exit-hook — which decrements `registered_workers` and, for a
/// quota-sized bulkhead, recomputes `max_tickets` for the workers still
/// attached. It does not tear down the underlying kernel objects; call
/// [`Bulkhead::destroy`] explicitly for that.
pub struct Bulkhead {
    config: BulkheadConfig,
    semaphores: Arc<SemaphoreSet>,
    in_flight: Arc<AtomicI64>,
}

impl Bulkhead {
    /// Registers (or attaches to) the named bulkhead described by `config`.
    pub fn register(config: BulkheadConfig) -> Result<Self> {
        let semaphores = SemaphoreSet::register(
            &config.name,
            config.sizing.into(),
            config.permissions,
        )?;
        Ok(Self {
            config,
            semaphores: Arc::new(semaphores),
            in_flight: Arc::new(AtomicI64::new(0)),
        })
    }

    /// Convenience constructor for a fixed-ticket bulkhead with default options.
    pub fn with_tickets(name: impl Into<String>, tickets: u32) -> Result<Self> {
        let config = BulkheadConfigBuilder::new(name).tickets(tickets).build()?;
        Self::register(config)
    }

    /// Acquires a ticket, blocking (synchronously) up to `timeout`, or the
    /// configured default timeout if `timeout` is `None`. Returns a guard that
    /// releases the ticket on drop.
    pub fn acquire(&self, timeout: Option<Duration>) -> Result<Ticket<'_>> {
        let effective_timeout = timeout.unwrap_or(self.config.default_timeout);
        let wait_for = if effective_timeout.is_zero() {
            None
        } else {
            Some(effective_timeout)
        };

        let start = Instant::now();
        match self.semaphores.acquire(wait_for) {
            Ok(()) => {
                let waited = start.elapsed();
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                self.config
                    .event_listeners
                    .emit(&BulkheadEvent::CallPermitted {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        waited,
                    });
                Ok(Ticket {
                    bulkhead: self,
                    acquired_at: Instant::now(),
                })
            }
            Err(err) => {
                self.config
                    .event_listeners
                    .emit(&BulkheadEvent::CallRejected {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        waited: start.elapsed(),
                    });
                Err(err)
            }
        }
    }

    /// Marks this process as no longer participating in the bulkhead, recomputing
    /// quota-based sizing for the remaining workers.
    pub fn unregister_worker(&self) -> Result<()> {
        self.semaphores.unregister_worker()
    }

    /// Tears down the underlying semaphore set and shared memory. Destructive:
    /// any other process still attached to this resource will fail its next syscall.
    pub fn destroy(&self) {
        self.semaphores.destroy();
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn key(&self) -> u32 {
        self.semaphores.key()
    }

    pub fn tickets(&self) -> i64 {
        self.semaphores.max_tickets()
    }

    pub fn registered_workers(&self) -> i64 {
        self.semaphores.registered_workers()
    }

    /// Tickets currently held by this process. Used by the registry's LRU sweep
    /// to avoid evicting a resource that is mid-call.
    pub fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// An acquired ticket. Releases automatically on drop and emits a `CallFinished`.
pub struct Ticket<'a> {
    bulkhead: &'a Bulkhead,
    acquired_at: Instant,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        self.bulkhead.semaphores.release();
        self.bulkhead.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.bulkhead
            .config
            .event_listeners
            .emit(&BulkheadEvent::CallFinished {
                pattern_name: self.bulkhead.config.name.clone(),
                timestamp: Instant::now(),
                held_for: self.acquired_at.elapsed(),
            });
    }
}
