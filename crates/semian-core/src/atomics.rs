//! Typed atomic primitives.
//!
//! These back both in-process state (an `Arc`-shared breaker) and the fields that get
//! mirrored into a semaphore set's shared-memory slots by [`crate::semaphore_set`] users
//! in `semian-bulkhead`. Read/write of a single primitive is atomic on its own; any
//! compound read-modify-write that must be visible across processes is the caller's
//! responsibility to serialize behind a meta-lock.

use std::sync::atomic::{AtomicI64, AtomicU8, AtomicUsize, Ordering};

/// A process-local atomic integer counter with get/set/increment.
#[derive(Debug, Default)]
pub struct AtomicInteger {
    value: AtomicI64,
}

impl AtomicInteger {
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    pub fn set(&self, v: i64) {
        self.value.store(v, Ordering::SeqCst);
    }

    /// Adds `delta` and returns the new value.
    pub fn increment(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::SeqCst) + delta
    }

    /// Adds `delta` but never drives the value below `floor`; returns the new value.
    pub fn increment_floored(&self, delta: i64, floor: i64) -> i64 {
        let mut current = self.value.load(Ordering::SeqCst);
        loop {
            let next = (current + delta).max(floor);
            match self.value.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }
}

/// The fixed set of symbols a breaker's atomic enum-state can hold.
///
/// At minimum the set is `closed`, `open`, `half_open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn to_tag(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }

    fn from_tag(tag: u8) -> Self {
        match tag {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

/// An atomic cell holding one [`CircuitState`] at a time.
#[derive(Debug)]
pub struct AtomicEnumState {
    tag: AtomicU8,
}

impl AtomicEnumState {
    pub fn new(initial: CircuitState) -> Self {
        Self {
            tag: AtomicU8::new(initial.to_tag()),
        }
    }

    pub fn get(&self) -> CircuitState {
        CircuitState::from_tag(self.tag.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: CircuitState) {
        self.tag.store(state.to_tag(), Ordering::SeqCst);
    }

    /// Atomically transitions from `expected` to `new`, returning whether it happened.
    pub fn compare_and_set(&self, expected: CircuitState, new: CircuitState) -> bool {
        self.tag
            .compare_exchange(
                expected.to_tag(),
                new.to_tag(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

impl Default for AtomicEnumState {
    fn default() -> Self {
        Self::new(CircuitState::Closed)
    }
}

/// A single atomic boolean flag.
#[derive(Debug, Default)]
pub struct AtomicFlag {
    inner: AtomicUsize,
}

impl AtomicFlag {
    pub fn new(initial: bool) -> Self {
        Self {
            inner: AtomicUsize::new(initial as usize),
        }
    }

    pub fn get(&self) -> bool {
        self.inner.load(Ordering::SeqCst) != 0
    }

    pub fn set(&self, v: bool) {
        self.inner.store(v as usize, Ordering::SeqCst);
    }

    /// Sets to `true`, returning the previous value.
    pub fn test_and_set(&self) -> bool {
        self.inner.swap(1, Ordering::SeqCst) != 0
    }
}
