//! Error types for refresh operations

/// Errors from launching or running the refresh actor.
///
/// Cycle-level failures are logged at the cycle boundary, never returned to
/// the scheduler; these only surface from `RefreshActor::try_cycle` and from
/// runner startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("proxy pool initialization failed: {0}")]
    ProxyInit(#[source] marketplace::Error),

    #[error("refresh runtime failed to start: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result alias for refresh operations.
pub type Result<T> = std::result::Result<T, Error>;
