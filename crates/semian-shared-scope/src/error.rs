//! Error taxonomy for the shared-scope coordinator and its clients.

#[derive(Debug, thiserror::Error)]
pub enum SharedScopeError {
    #[error("i/o error talking to the shared-scope coordinator: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed shared-scope message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("shared-scope connection closed before a response arrived")]
    ConnectionClosed,

    #[error("shared-scope coordinator returned an error: {0}")]
    Remote(String),

    #[error("resource '{0}' is not registered with the shared-scope coordinator")]
    UnknownResource(String),
}

pub type Result<T> = std::result::Result<T, SharedScopeError>;
