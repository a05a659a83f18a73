//! Note Commitments
//!
//! ```text
//! cm = H(open, bal, addr)
//! ```
//!
//! `open` is a random blinding value and `addr` the owner's shielded address.
//! The commitment is the leaf stored in the ledger's Merkle tree.

use std::fmt;

use crate::field::FieldElement;
use crate::hash::FieldHasher;

/// A note commitment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Commitment(pub FieldElement);

impl Commitment {
    pub fn from_field(f: FieldElement) -> Self {
        Self(f)
    }

    pub fn to_field(&self) -> &FieldElement {
        &self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_prefixed_hex())
    }
}

/// Commitment scheme over the suite hash
pub struct CommitmentScheme<'a> {
    hasher: &'a dyn FieldHasher,
}

impl<'a> CommitmentScheme<'a> {
    pub fn new(hasher: &'a dyn FieldHasher) -> Self {
        Self { hasher }
    }

    pub fn commit(&self, open: &FieldElement, bal: &FieldElement, addr: &FieldElement) -> Commitment {
        Commitment(self.hasher.hash3(open, bal, addr))
    }

    /// Whether `(open, bal, addr)` opens `cm`
    pub fn verify(
        &self,
        cm: &Commitment,
        open: &FieldElement,
        bal: &FieldElement,
        addr: &FieldElement,
    ) -> bool {
        &self.commit(open, bal, addr) == cm
    }
}
