//! Core infrastructure shared by every semian-rs component: the sliding window and
//! atomic primitives the classical breaker is built from, the exponential smoother
//! and P² quantile estimator the adaptive breaker's controller is built from, the
//! event system every pattern emits through, the `MarksCircuits` capability, the
//! shared error taxonomy, and the `Core` handle that owns process-wide background
//! tasks.

pub mod atomics;
pub mod core_handle;
pub mod error;
pub mod estimators;
pub mod events;
pub mod marks_circuits;
pub mod sliding_window;

pub use atomics::{AtomicEnumState, AtomicFlag, AtomicInteger, CircuitState};
pub use core_handle::Core;
pub use error::{AdapterTagged, SemianError, Tagged};
pub use estimators::{ExponentialSmoother, P2QuantileEstimator};
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use marks_circuits::{MarksCircuits, MarksCircuitsFn};
pub use sliding_window::SlidingWindow;
