//! Merkle Inclusion Data
//!
//! The commitment tree lives on the ledger; the client only holds the root
//! and the sibling hashes for one leaf.
//!
//! ```text
//!                    Root
//!                   /    \
//!                 H01    H23
//!                /  \   /   \
//!               H0  H1 H2   H3
//!               |   |   |    |
//!              C0  C1  C2   C3  (Note Commitments)
//! ```
//!
//! Bit `i` of the leaf index is the direction at level `i`
//! (0 = current node is the left child).

use num_bigint::BigUint;

use crate::field::{FieldElement, pad_hex, FIELD_HEX_WIDTH};
use crate::hash::FieldHasher;

/// Tree depth of the on-chain commitment tree
pub const TREE_DEPTH: usize = 32;

/// Root, sibling hashes and leaf index consumed by the witness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePath {
    pub root: FieldElement,
    /// Sibling hashes from leaf to root
    pub siblings: Vec<FieldElement>,
    pub index: u64,
}

impl MerklePath {
    pub fn new(root: FieldElement, siblings: Vec<FieldElement>, index: u64) -> Self {
        Self {
            root,
            siblings,
            index,
        }
    }

    /// Position bits, leaf level first
    pub fn path_bits(&self) -> Vec<bool> {
        (0..self.siblings.len())
            .map(|i| i < 64 && (self.index >> i) & 1 == 1)
            .collect()
    }

    /// Direction bits packed as a 64-digit hex string
    pub fn direction(&self) -> String {
        pad_hex(&BigUint::from(self.index), FIELD_HEX_WIDTH)
    }

    /// Fold `leaf` up the path
    pub fn compute_root(&self, hasher: &dyn FieldHasher, leaf: &FieldElement) -> FieldElement {
        let mut current = leaf.clone();
        for (sibling, is_right) in self.siblings.iter().zip(self.path_bits()) {
            current = if is_right {
                hasher.hash2(sibling, &current)
            } else {
                hasher.hash2(&current, sibling)
            };
        }
        current
    }

    /// Whether this path proves inclusion of `leaf` under `self.root`
    pub fn verify(&self, hasher: &dyn FieldHasher, leaf: &FieldElement) -> bool {
        self.compute_root(hasher, leaf) == self.root
    }
}
