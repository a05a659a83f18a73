//! Error types for the shielded primitives.

use thiserror::Error;

/// Errors raised by field, curve, encryption and note operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Point is not on the curve, or no y exists for the requested x
    #[error("Invalid curve point: {0}")]
    InvalidCurvePoint(String),

    /// On the curve but outside the prime-order subgroup
    #[error("Point is not in the prime-order subgroup: {0}")]
    NotInSubgroup(String),

    /// Operation needs affine coordinates but got the point at infinity
    #[error("Point at infinity has no affine coordinates")]
    PointAtInfinity,

    /// Value has no square root in the field
    #[error("No square root exists in the field")]
    NoSquareRoot,

    /// Operands belong to fields with different moduli
    #[error("Field elements have different moduli")]
    FieldMismatch,

    /// Division or inversion of zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Malformed hexadecimal input
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    /// Value is not reduced below the modulus
    #[error("Value is not a canonical field element: {0}")]
    NonCanonical(String),

    /// Scalar outside `[1, order)`
    #[error("Invalid scalar: {0}")]
    InvalidScalar(String),

    /// Unknown transaction type tag
    #[error("Invalid pocket type: {0}")]
    InvalidPocketType(String),

    /// Shielded public key whose `ena` does not re-derive
    #[error("Invalid public key: ena does not match (pkOwn, pkEnc)")]
    InvalidPublicKey,

    /// Commitment recomputation mismatch
    #[error("Note integrity error: commitment {0} does not match its opening")]
    NoteIntegrity(String),

    /// Public-key encryption takes 1 to 3 plaintext elements
    #[error("Invalid plaintext count: expected 1 to 3, got {0}")]
    PlaintextArity(usize),

    /// Field hash takes 1 to 3 inputs
    #[error("Invalid hash input count: expected 1 to 3, got {0}")]
    HashArity(usize),

    /// Malformed address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Result type for shielded primitives
pub type Result<T> = std::result::Result<T, CryptoError>;
