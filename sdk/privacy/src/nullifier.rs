//! Nullifiers
//!
//! ```text
//! sn = H(cm, sk)
//! ```
//!
//! Publishing `sn` spends the note behind `cm`. The ledger's nullifier
//! registry is the only source of truth for spent state.

use std::fmt;

use crate::commitment::Commitment;
use crate::field::FieldElement;
use crate::hash::FieldHasher;

/// A nullifier - unique tag for a spent note
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nullifier(pub FieldElement);

impl Nullifier {
    /// Derive the nullifier of `cm` under the owner's secret
    pub fn derive(hasher: &dyn FieldHasher, cm: &Commitment, sk: &FieldElement) -> Self {
        Self(hasher.hash2(cm.to_field(), sk))
    }

    pub fn to_field(&self) -> &FieldElement {
        &self.0
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_prefixed_hex())
    }
}
