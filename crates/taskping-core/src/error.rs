//! Error type shared across TaskPing crates.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TaskPingError>;

#[derive(Debug, Error)]
pub enum TaskPingError {
    /// Configuration load/parse problems.
    #[error("config error: {0}")]
    Config(String),

    /// Delivery channel failure (HTTP error, API rejection, timeout).
    #[error("channel error: {0}")]
    Channel(String),

    /// Notification ledger / SQLite failure.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Task/user read model failure. Treated as catastrophic for a pass.
    #[error("read model error: {0}")]
    ReadModel(String),

    /// Data-integrity problem (unmapped enum value, malformed timestamp).
    #[error("data integrity error: {0}")]
    Data(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
