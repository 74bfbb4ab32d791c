//! Backend Error Types

use thiserror::Error;

use testbed_gateway::GatewayError;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors surfaced to the dashboard layer.
///
/// Text-parsing discrepancies are deliberately absent: parsers degrade to
/// default rows and never error.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The CLI subprocess could not run at all (not found, timeout)
    #[error("{0}")]
    Execution(String),

    /// The CLI subprocess ran but exited non-zero; carries its stderr or a
    /// generic exit-code message
    #[error("{0}")]
    CommandFailed(String),

    /// Direct gateway call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
