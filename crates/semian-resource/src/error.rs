//! Errors raised by the registry on top of whatever the resource it wraps raises.

/// Errors specific to registry bookkeeping: incompatible re-registration, the
/// usual bulkhead/breaker registration failures, or neither.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// `register` was called again for a name already present with options that
    /// don't match the first registration.
    #[error("resource '{name}' is already registered with incompatible options")]
    IncompatibleOptions { name: String },

    /// Registering the underlying bulkhead or breaker failed.
    #[error(transparent)]
    Bulkhead(#[from] semian_bulkhead::BulkheadError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
