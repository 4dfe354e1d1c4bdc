//! The cross-process counting semaphore a bulkhead is built on.
//!
//! Three kernel objects back one [`SemaphoreSet`]: a named counting semaphore whose
//! own value *is* `tickets_available`, a second named semaphore used as a binary
//! meta-lock, and a `shm_open` region holding the handful of counters (`max_tickets`,
//! `registered_workers`, `configured_tickets`, a quota bit pattern, and a
//! `pending_shrink` counter) that must be visible to every attached process.
//!
//! POSIX semaphores don't support decrementing their count without a matching
//! `sem_wait`, so a quota recomputation that *shrinks* `max_tickets` can't take
//! effect immediately — it instead increments `pending_shrink`, and each release
//! swallows one pending shrink instead of posting, draining capacity down as
//! in-flight calls complete. Growing is immediate: the delta is posted straight away.

use crate::error::BulkheadError;
use crate::key::{resource_key, semaphore_name};
use std::time::Duration;

/// Either a fixed ticket count or a worker-proportional quota.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ticketing {
    Tickets(u32),
    Quota(f64),
}

/// 9-bit POSIX permission mode, e.g. `0o660`.
pub type Permissions = u32;

#[cfg(unix)]
mod imp {
    use super::*;
    use std::ffi::CString;
    use std::io;
    use std::ptr;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

    #[repr(C)]
    struct SharedRegion {
        max_tickets: AtomicI64,
        registered_workers: AtomicI64,
        configured_tickets: AtomicI64,
        quota_bits: AtomicU64,
        pending_shrink: AtomicI64,
    }

    impl SharedRegion {
        fn quota(&self) -> Option<f64> {
            let bits = self.quota_bits.load(Ordering::SeqCst);
            if bits == 0 {
                None
            } else {
                Some(f64::from_bits(bits))
            }
        }
    }

    struct NamedSem {
        handle: *mut libc::sem_t,
        name: CString,
    }

    unsafe impl Send for NamedSem {}
    unsafe impl Sync for NamedSem {}

    impl NamedSem {
        fn open_or_create(name: &str, mode: u32, initial: u32) -> io::Result<Self> {
            let cname = CString::new(name).expect("semaphore name must not contain NUL");
            let handle = unsafe {
                libc::sem_open(
                    cname.as_ptr(),
                    libc::O_CREAT,
                    mode,
                    initial,
                )
            };
            if handle == libc::SEM_FAILED {
                return Err(io::Error::last_os_error());
            }
            Ok(Self {
                handle,
                name: cname,
            })
        }

        fn post(&self) {
            unsafe {
                libc::sem_post(self.handle);
            }
        }

        fn wait_timeout(&self, timeout: Option<Duration>) -> io::Result<bool> {
            match timeout {
                None => {
                    let rc = unsafe { libc::sem_wait(self.handle) };
                    if rc == 0 {
                        Ok(true)
                    } else {
                        Err(io::Error::last_os_error())
                    }
                }
                Some(dur) => {
                    let mut now = libc::timespec {
                        tv_sec: 0,
                        tv_nsec: 0,
                    };
                    unsafe {
                        libc::clock_gettime(libc::CLOCK_REALTIME, &mut now);
                    }
                    let mut deadline = now;
                    deadline.tv_sec += dur.as_secs() as libc::time_t;
                    deadline.tv_nsec += dur.subsec_nanos() as i64;
                    if deadline.tv_nsec >= 1_000_000_000 {
                        deadline.tv_sec += 1;
                        deadline.tv_nsec -= 1_000_000_000;
                    }

                    let rc = unsafe { libc::sem_timedwait(self.handle, &deadline) };
                    if rc == 0 {
                        Ok(true)
                    } else {
                        let err = io::Error::last_os_error();
                        if err.raw_os_error() == Some(libc::ETIMEDOUT) {
                            Ok(false)
                        } else {
                            Err(err)
                        }
                    }
                }
            }
        }

        fn destroy(&self) {
            unsafe {
                libc::sem_close(self.handle);
                libc::sem_unlink(self.name.as_ptr());
            }
        }
    }

    pub struct SemaphoreSet {
        key: u32,
        name: String,
        tickets: NamedSem,
        meta_lock: NamedSem,
        shared_name: CString,
        shared: *mut SharedRegion,
        destroyed: AtomicBool,
    }

    unsafe impl Send for SemaphoreSet {}
    unsafe impl Sync for SemaphoreSet {}

    impl SemaphoreSet {
        pub fn register(
            name: &str,
            ticketing: Ticketing,
            permissions: Permissions,
        ) -> Result<Self, BulkheadError> {
            let key = resource_key(name);
            let base = semaphore_name(None, key);
            let tickets_name = format!("{base}t");
            let meta_name = format!("{base}m");
            let shm_name = format!("{base}s");

            let shared_cname =
                CString::new(shm_name.clone()).expect("shm name must not contain NUL");

            let (created_fresh, fd) = unsafe {
                let excl_fd = libc::shm_open(
                    shared_cname.as_ptr(),
                    libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                    permissions,
                );
                if excl_fd >= 0 {
                    (true, excl_fd)
                } else {
                    let fd = libc::shm_open(shared_cname.as_ptr(), libc::O_RDWR, permissions);
                    if fd < 0 {
                        return Err(BulkheadError::Syscall {
                            resource: name.to_string(),
                            message: io::Error::last_os_error().to_string(),
                        });
                    }
                    (false, fd)
                }
            };

            let region_size = std::mem::size_of::<SharedRegion>();
            if created_fresh {
                let rc = unsafe { libc::ftruncate(fd, region_size as libc::off_t) };
                if rc != 0 {
                    let err = io::Error::last_os_error();
                    unsafe {
                        libc::close(fd);
                    }
                    return Err(BulkheadError::Syscall {
                        resource: name.to_string(),
                        message: err.to_string(),
                    });
                }
            }

            let mapped = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    region_size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    fd,
                    0,
                )
            };
            unsafe {
                libc::close(fd);
            }
            if mapped == libc::MAP_FAILED {
                return Err(BulkheadError::Syscall {
                    resource: name.to_string(),
                    message: io::Error::last_os_error().to_string(),
                });
            }
            let shared = mapped as *mut SharedRegion;

            let initial_tickets = if created_fresh {
                match ticketing {
                    Ticketing::Tickets(n) => n,
                    Ticketing::Quota(q) => (1.0 * q).ceil().max(1.0) as u32,
                }
            } else {
                0
            };

            let tickets = NamedSem::open_or_create(&tickets_name, permissions, initial_tickets)
                .map_err(|e| BulkheadError::Syscall {
                    resource: name.to_string(),
                    message: e.to_string(),
                })?;
            let meta_lock = NamedSem::open_or_create(&meta_name, permissions, 1).map_err(|e| {
                BulkheadError::Syscall {
                    resource: name.to_string(),
                    message: e.to_string(),
                }
            })?;

            let set = Self {
                key,
                name: name.to_string(),
                tickets,
                meta_lock,
                shared_name: shared_cname,
                shared,
                destroyed: AtomicBool::new(false),
            };

            set.with_meta_lock(|shared| {
                if created_fresh {
                    match ticketing {
                        Ticketing::Tickets(n) => {
                            shared.configured_tickets.store(n as i64, Ordering::SeqCst);
                            shared.max_tickets.store(n as i64, Ordering::SeqCst);
                            shared.quota_bits.store(0, Ordering::SeqCst);
                            shared.registered_workers.store(1, Ordering::SeqCst);
                        }
                        Ticketing::Quota(q) => {
                            shared.quota_bits.store(q.to_bits(), Ordering::SeqCst);
                            shared.registered_workers.store(1, Ordering::SeqCst);
                            let max = (q).ceil().max(1.0) as i64;
                            shared.max_tickets.store(max, Ordering::SeqCst);
                        }
                    }
                    Ok(())
                } else {
                    set.recompute_for_attach(shared, ticketing, name)
                }
            })?;

            Ok(set)
        }

        fn recompute_for_attach(
            &self,
            shared: &SharedRegion,
            ticketing: Ticketing,
            name: &str,
        ) -> Result<(), BulkheadError> {
            match (shared.quota(), ticketing) {
                (Some(_), Ticketing::Tickets(_)) | (None, Ticketing::Quota(_)) => {
                    return Err(BulkheadError::Internal {
                        resource: name.to_string(),
                        message: "tickets/quota mode mismatch on re-registration".to_string(),
                    });
                }
                _ => {}
            }

            let workers = shared.registered_workers.fetch_add(1, Ordering::SeqCst) + 1;

            if let Some(quota) = shared.quota() {
                let old_max = shared.max_tickets.load(Ordering::SeqCst);
                let new_max = ((workers as f64) * quota).ceil().max(1.0) as i64;
                shared.max_tickets.store(new_max, Ordering::SeqCst);
                self.apply_max_delta(shared, new_max - old_max);
            }
            Ok(())
        }

        fn apply_max_delta(&self, shared: &SharedRegion, delta: i64) {
            if delta > 0 {
                for _ in 0..delta {
                    self.tickets.post();
                }
            } else if delta < 0 {
                shared
                    .pending_shrink
                    .fetch_add(-delta, Ordering::SeqCst);
            }
        }

        fn with_meta_lock<T>(
            &self,
            f: impl FnOnce(&SharedRegion) -> Result<T, BulkheadError>,
        ) -> Result<T, BulkheadError> {
            self.meta_lock
                .wait_timeout(None)
                .map_err(|e| BulkheadError::Syscall {
                    resource: self.name.clone(),
                    message: e.to_string(),
                })?;
            let result = f(unsafe { &*self.shared });
            self.meta_lock.post();
            result
        }

        pub fn acquire(&self, timeout: Option<Duration>) -> Result<(), BulkheadError> {
            let start = std::time::Instant::now();
            let granted = self
                .tickets
                .wait_timeout(timeout)
                .map_err(|e| BulkheadError::Syscall {
                    resource: self.name.clone(),
                    message: e.to_string(),
                })?;
            if !granted {
                return Err(BulkheadError::Timeout {
                    resource: self.name.clone(),
                    waited: start.elapsed(),
                });
            }
            Ok(())
        }

        pub fn release(&self) {
            let _ = self.with_meta_lock(|shared| {
                let pending = shared.pending_shrink.load(Ordering::SeqCst);
                if pending > 0 {
                    shared.pending_shrink.fetch_sub(1, Ordering::SeqCst);
                } else {
                    self.tickets.post();
                }
                Ok(())
            });
        }

        pub fn unregister_worker(&self) -> Result<(), BulkheadError> {
            self.with_meta_lock(|shared| {
                let prev = shared.registered_workers.load(Ordering::SeqCst);
                let next = (prev - 1).max(0);
                shared.registered_workers.store(next, Ordering::SeqCst);

                if let Some(quota) = shared.quota() {
                    let old_max = shared.max_tickets.load(Ordering::SeqCst);
                    let new_max = ((next as f64) * quota).ceil().max(1.0) as i64;
                    shared.max_tickets.store(new_max, Ordering::SeqCst);
                    self.apply_max_delta(shared, new_max - old_max);
                }
                Ok(())
            })
        }

        pub fn destroy(&self) {
            self.destroyed.store(true, Ordering::SeqCst);
            self.tickets.destroy();
            self.meta_lock.destroy();
            unsafe {
                libc::shm_unlink(self.shared_name.as_ptr());
                libc::munmap(
                    self.shared as *mut libc::c_void,
                    std::mem::size_of::<SharedRegion>(),
                );
            }
        }

        pub fn key(&self) -> u32 {
            self.key
        }

        pub fn max_tickets(&self) -> i64 {
            unsafe { &*self.shared }.max_tickets.load(Ordering::SeqCst)
        }

        pub fn registered_workers(&self) -> i64 {
            unsafe { &*self.shared }
                .registered_workers
                .load(Ordering::SeqCst)
        }
    }

    impl Drop for SemaphoreSet {
        /// Stands in for the process exit-hook: unregisters this process's
        /// worker slot so quota-based sizing doesn't stay permanently inflated
        /// by processes that have gone away. Skipped if `destroy()` already
        /// tore the shared memory region down, since the meta-lock and counters
        /// it would touch no longer exist.
        fn drop(&mut self) {
            if !self.destroyed.load(Ordering::SeqCst) {
                let _ = self.unregister_worker();
            }
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use tokio::sync::Semaphore;

    static WARNED: AtomicBool = AtomicBool::new(false);

    /// In-process stand-in used on platforms without named counting semaphores.
    /// Acquire always grants immediately (no real admission control), matching
    /// the platform-fallback contract: the bulkhead no-ops and logs a one-shot
    /// warning instead of failing registration outright.
    pub struct SemaphoreSet {
        key: u32,
        semaphore: Semaphore,
        max_tickets: AtomicI64,
        registered_workers: AtomicI64,
    }

    impl SemaphoreSet {
        pub fn register(
            name: &str,
            ticketing: Ticketing,
            _permissions: Permissions,
        ) -> Result<Self, BulkheadError> {
            if !WARNED.swap(true, Ordering::SeqCst) {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    resource = name,
                    "named counting semaphores unavailable on this platform; bulkhead is a local no-op"
                );
            }
            let max = match ticketing {
                Ticketing::Tickets(n) => n as i64,
                Ticketing::Quota(q) => q.ceil().max(1.0) as i64,
            };
            Ok(Self {
                key: resource_key(name),
                semaphore: Semaphore::new(max as usize),
                max_tickets: AtomicI64::new(max),
                registered_workers: AtomicI64::new(1),
            })
        }

        pub fn acquire(&self, _timeout: Option<Duration>) -> Result<(), BulkheadError> {
            let _ = self.semaphore.try_acquire();
            Ok(())
        }

        pub fn release(&self) {}

        pub fn unregister_worker(&self) -> Result<(), BulkheadError> {
            self.registered_workers.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        pub fn destroy(&self) {}

        pub fn key(&self) -> u32 {
            self.key
        }

        pub fn max_tickets(&self) -> i64 {
            self.max_tickets.load(Ordering::SeqCst)
        }

        pub fn registered_workers(&self) -> i64 {
            self.registered_workers.load(Ordering::SeqCst)
        }
    }

    impl Drop for SemaphoreSet {
        fn drop(&mut self) {
            let _ = self.unregister_worker();
        }
    }
}

pub use imp::SemaphoreSet;

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn register_with_fixed_tickets_sets_max() {
        let name = format!("test-bulkhead-fixed-{}", std::process::id());
        let set = SemaphoreSet::register(&name, Ticketing::Tickets(3), 0o660).unwrap();
        assert_eq!(set.max_tickets(), 3);
        set.destroy();
    }

    #[test]
    fn acquire_and_release_round_trip() {
        let name = format!("test-bulkhead-acquire-{}", std::process::id());
        let set = SemaphoreSet::register(&name, Ticketing::Tickets(1), 0o660).unwrap();
        set.acquire(Some(Duration::from_millis(100))).unwrap();
        set.release();
        set.acquire(Some(Duration::from_millis(100))).unwrap();
        set.destroy();
    }

    #[test]
    fn acquire_times_out_when_saturated() {
        let name = format!("test-bulkhead-timeout-{}", std::process::id());
        let set = SemaphoreSet::register(&name, Ticketing::Tickets(1), 0o660).unwrap();
        set.acquire(Some(Duration::from_millis(50))).unwrap();
        let err = set
            .acquire(Some(Duration::from_millis(50)))
            .expect_err("should time out");
        assert!(err.is_timeout());
        set.destroy();
    }

    #[test]
    fn quota_recomputation_on_registration() {
        let name = format!("test-bulkhead-quota-{}", std::process::id());
        let first = SemaphoreSet::register(&name, Ticketing::Quota(0.25), 0o660).unwrap();
        assert_eq!(first.max_tickets(), 1);

        let second = SemaphoreSet::register(&name, Ticketing::Quota(0.25), 0o660).unwrap();
        let third = SemaphoreSet::register(&name, Ticketing::Quota(0.25), 0o660).unwrap();
        let fourth = SemaphoreSet::register(&name, Ticketing::Quota(0.25), 0o660).unwrap();
        let fifth = SemaphoreSet::register(&name, Ticketing::Quota(0.25), 0o660).unwrap();
        assert_eq!(fifth.max_tickets(), 2); // ceil(5 * 0.25) = 2

        first.destroy();
        second.destroy();
        third.destroy();
        fourth.destroy();
        fifth.destroy();
    }
}
