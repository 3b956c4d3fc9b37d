//! Error taxonomy for the sync layer

use thiserror::Error;

/// Failures crossing the remote gateway boundary
///
/// `Transport` and `Server` are transient: the dispatcher retries them up to
/// its attempt bound. `Rejected` is permanent: the remote has refused the
/// payload and resubmitting the same bytes cannot succeed.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Network-level failure (DNS, connect, timeout, broken stream)
    #[error("transport error: {0}")]
    Transport(String),

    /// Server-side failure (5xx class): the remote may recover
    #[error("server error: status {0}")]
    Server(u16),

    /// Client-side rejection (4xx class / validation): retrying cannot help
    #[error("rejected by remote: status {0}")]
    Rejected(u16),
}

impl GatewayError {
    /// Whether retrying the same request can ever succeed
    pub fn is_permanent(&self) -> bool {
        matches!(self, GatewayError::Rejected(_))
    }
}

/// Failures from the local durable storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

/// Failures surfaced by snapshot reconciliation
///
/// Local storage errors are surfaced here (not swallowed): silently picking
/// a fallback snapshot risks regressing confirmed progress.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("local snapshot read failed: {0}")]
    Storage(#[from] StorageError),

    #[error("remote gateway failed: {0}")]
    Gateway(#[from] GatewayError),
}
