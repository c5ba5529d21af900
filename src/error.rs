use thiserror::Error;

/// Errors raised by the malicious-address stores and registry.
///
/// Detectors never return these: bad user input is scored, not rejected.
#[derive(Debug, Error)]
pub enum ShieldError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Risk level must be between 1 and 5, got {0}")]
    InvalidRiskLevel(u8),

    #[error("Remote store did not answer within {0} ms")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, ShieldError>;
