//! The "does this error count against the breaker" capability.
//!
//! Each raised error answers a duck-typed question, `marks_circuits?`, that defaults
//! to true and lets specific error types opt out. Modeled as a trait with a default
//! method, the same shape as a failure classifier keyed on the error value itself
//! rather than supplied at breaker-construction time, since admission is evaluated
//! per raised error instance, not per call site.

use std::sync::Arc;

/// Whether an error instance should advance a breaker's failure count.
///
/// The default implementation returns `true` — every error counts unless a type opts
/// out. Implement this for error types that carry expected, non-circuit-worthy
/// failures (e.g. a validation error surfaced through the same `Result` as transport
/// failures).
pub trait MarksCircuits {
    fn marks_circuits(&self) -> bool {
        true
    }
}

// Blanket-true for the common case of opaque error types (`anyhow::Error`, boxed
// errors) that can't reasonably implement the trait themselves.
impl MarksCircuits for std::io::Error {}
impl MarksCircuits for Box<dyn std::error::Error + Send + Sync> {}

/// A closure-based override of the `marks_circuits?` predicate, for callers who
/// configure the exception set at resource-construction time rather than on the
/// error type itself.
#[derive(Clone)]
pub struct MarksCircuitsFn<F> {
    f: Arc<F>,
}

impl<F> MarksCircuitsFn<F> {
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }

    pub fn call<E>(&self, error: &E) -> bool
    where
        F: Fn(&E) -> bool,
    {
        (self.f)(error)
    }
}

impl<F> std::fmt::Debug for MarksCircuitsFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarksCircuitsFn")
            .field("f", &"<closure>")
            .finish()
    }
}

/// Evaluates whether `error` should mark the circuit, preferring an explicit
/// predicate override (the resource's configured `exceptions` set) and falling back
/// to the error's own [`MarksCircuits`] impl.
pub fn evaluate<E: MarksCircuits>(error: &E, override_predicate: Option<&dyn Fn(&E) -> bool>) -> bool {
    match override_predicate {
        Some(pred) => pred(error),
        None => error.marks_circuits(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FatalError;
    impl MarksCircuits for FatalError {}

    #[derive(Debug)]
    struct ValidationError;
    impl MarksCircuits for ValidationError {
        fn marks_circuits(&self) -> bool {
            false
        }
    }

    #[test]
    fn default_impl_marks_the_circuit() {
        assert!(FatalError.marks_circuits());
    }

    #[test]
    fn opted_out_type_does_not_mark_the_circuit() {
        assert!(!ValidationError.marks_circuits());
    }

    #[test]
    fn override_predicate_takes_precedence() {
        let always_false: &dyn Fn(&FatalError) -> bool = &|_| false;
        assert!(!evaluate(&FatalError, Some(always_false)));
        assert!(evaluate(&FatalError, None));
    }
}
