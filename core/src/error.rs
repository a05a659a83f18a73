//! Wallet-level errors.

use thiserror::Error;
use zkpocket_privacy::CryptoError;
use zkpocket_prover::WitnessError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The commitment tree moved between witness assembly and submission
    #[error("Merkle root changed before submission (expected {expected}, found {found})")]
    RootMismatch { expected: String, found: String },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Ledger transport or contract failure
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// The contract rejected the call
    #[error("Contract reverted: {0}")]
    Reverted(String),

    /// Public output needs an account to pay out to
    #[error("No public account to receive the public output")]
    NoPublicAccount,

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Secret storage error: {0}")]
    Secret(String),

    /// Receiver account has no shielded identity on the ledger
    #[error("Receiver {0} has no registered shielded identity")]
    UnknownReceiver(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Witness(#[from] WitnessError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl WalletError {
    pub fn store(err: anyhow::Error) -> Self {
        WalletError::Store(format!("{err:#}"))
    }

    pub fn secret(err: anyhow::Error) -> Self {
        WalletError::Secret(format!("{err:#}"))
    }

    /// Transport-level failures that a caller may retry as-is
    pub fn is_retryable(&self) -> bool {
        match self {
            WalletError::Timeout(_) | WalletError::Ledger(_) => true,
            WalletError::Witness(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(WalletError::Timeout("getRootTop".into()).is_retryable());
        assert!(WalletError::Ledger("connection reset".into()).is_retryable());
        assert!(!WalletError::Cancelled.is_retryable());
        assert!(!WalletError::Reverted("getUserPublicKeys".into()).is_retryable());
        assert!(!WalletError::NoPublicAccount.is_retryable());
        assert!(
            !WalletError::RootMismatch {
                expected: "1".into(),
                found: "2".into()
            }
            .is_retryable()
        );
        assert!(!WalletError::from(WitnessError::ProofVerificationFailed("fail".into())).is_retryable());
    }

    #[test]
    fn test_store_keeps_context_chain() {
        let err = anyhow::anyhow!("disk full").context("Failed to write note");
        assert_eq!(
            WalletError::store(err),
            WalletError::Store("Failed to write note: disk full".into())
        );
    }
}
