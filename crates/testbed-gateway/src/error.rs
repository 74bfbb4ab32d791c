//! Gateway Error Types

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors from the payment API boundary
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The remote API rejected the request; carries its own message
    #[error("Payment API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A refund was requested for a payment with no charge
    #[error("No charge found for payment intent {0}")]
    MissingCharge(String),

    /// Client misconfiguration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Only transport faults are worth retrying; API rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Network(_))
    }
}
