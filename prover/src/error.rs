//! Errors raised while assembling witnesses and producing proofs.

use num_bigint::BigUint;
use thiserror::Error;
use zkpocket_privacy::CryptoError;

/// Witness assembly and proof generation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WitnessError {
    /// Balance conservation would go negative
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: BigUint, required: BigUint },

    /// Local verification of a freshly generated proof failed
    #[error("Proof verification failed: {0}")]
    ProofVerificationFailed(String),

    /// Proof words are malformed or not on BN254
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// The prover service could not be reached or answered with an error
    #[error("Prover error: {0}")]
    Prover(String),

    /// Witness inputs are inconsistent
    #[error("Invalid witness input: {0}")]
    InvalidInput(String),

    /// Witness could not be encoded as JSON
    #[error("Witness encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl WitnessError {
    /// Transport failures may be retried; everything else is fatal
    pub fn is_retryable(&self) -> bool {
        matches!(self, WitnessError::Prover(_))
    }
}

/// Result type for witness operations
pub type Result<T> = std::result::Result<T, WitnessError>;
