//! Crate-wide error type.

use crate::bridge::TransportError;
use crate::metadata::EncodingError;
use crate::types::AddressError;

/// Domain kind the core uses for node and network failures
pub const CLIENT_ERROR_KIND: &str = "client";

/// Errors surfaced to callers of the bridge and the call constructor.
///
/// Local errors (`Encoding`, `InvalidAddress`, `InsufficientAmount`,
/// `Config`) are raised before anything is sent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request cannot be represented in the wire format
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Malformed address or chain id
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// Amount does not cover storage deposit plus gas fee
    #[error("insufficient amount: need at least {need}, have {have}")]
    InsufficientAmount {
        /// Smallest acceptable amount
        need: u64,
        /// Amount given
        have: u64,
    },

    /// The core rejected the call
    #[error("{kind} error: {message}")]
    Domain {
        /// Domain tag, e.g. `client`
        kind: String,
        /// Human-readable message
        message: String,
    },

    /// The core itself faulted; the session must be recreated
    #[error("core fault: {0}")]
    CoreFault(String),

    /// The transport failed or returned something that is not an envelope
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The ledger collaborator failed
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Configuration could not be loaded or saved
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether retrying the same call later may succeed.
    ///
    /// Decided on the variant and the domain kind only.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Domain { kind, .. } => kind == CLIENT_ERROR_KIND,
            _ => false,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_follows_kind() {
        let client = Error::Domain {
            kind: "client".into(),
            message: "no healthy node available".into(),
        };
        let validation = Error::Domain {
            kind: "encoding".into(),
            message: "no healthy node available".into(),
        };
        assert!(client.is_retryable());
        assert!(!validation.is_retryable());
        assert!(Error::Transport(TransportError::TimedOut).is_retryable());
        assert!(!Error::CoreFault("boom".into()).is_retryable());
        assert!(!Error::InsufficientAmount { need: 2, have: 1 }.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::from(EncodingError::ZeroGasBudget);
        assert_eq!(
            err.to_string(),
            "encoding error: gas budget must be greater than zero"
        );
    }
}
