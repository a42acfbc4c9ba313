//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Print bridge unreachable
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for the print bridge
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Print bridge answered with a non-success status
    #[error("Print bridge rejected job ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Whether the bridge could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
