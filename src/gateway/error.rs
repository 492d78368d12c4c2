//! Gateway error types

use thiserror::Error;

/// Failure of a single backend exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Endpoint unreachable, timed out, or answered with a non-success status
    #[error("network error: {0}")]
    Network(String),
    /// Body did not match any recognized response shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Malformed(_) => "malformed",
        }
    }
}
