//! Shielded Notes
//!
//! A note is value addressed to a shielded address and committed in the
//! ledger's append-only tree.
//!
//! ```text
//! Note = {
//!     open:     field,     // blinding value
//!     bal:      field,     // amount, or packed token id for NFTs
//!     addr:     field,     // owner ena
//!     cm:       field,     // H(open, bal, addr)
//!     idx:      u64,       // leaf position in the commitment tree
//!     token:    address,
//!     is_spent: bool,      // false -> true only
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::commitment::{Commitment, CommitmentScheme};
use crate::error::{CryptoError, Result};
use crate::field::{Field, FieldElement};
use crate::hash::FieldHasher;
use crate::nullifier::Nullifier;

/// Token class a note belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[default]
    Ft,
    Nft,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::Ft, TokenKind::Nft];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Ft => "ft",
            TokenKind::Nft => "nft",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ft" => Ok(TokenKind::Ft),
            "nft" => Ok(TokenKind::Nft),
            other => Err(CryptoError::InvalidPocketType(other.to_string())),
        }
    }
}

/// A decrypted, validated note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub open: FieldElement,
    pub bal: FieldElement,
    pub addr: FieldElement,
    pub cm: Commitment,
    pub idx: u64,
    pub token_address: Address,
    pub is_spent: bool,
    pub kind: TokenKind,
}

impl Note {
    /// Build a note and compute its commitment
    pub fn new(
        hasher: &dyn FieldHasher,
        open: FieldElement,
        bal: FieldElement,
        addr: FieldElement,
        idx: u64,
        token_address: Address,
        kind: TokenKind,
    ) -> Self {
        let cm = CommitmentScheme::new(hasher).commit(&open, &bal, &addr);
        Self {
            open,
            bal,
            addr,
            cm,
            idx,
            token_address,
            is_spent: false,
            kind,
        }
    }

    /// Build a note from decrypted parts, rejecting it if `cm` does not open
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        hasher: &dyn FieldHasher,
        open: FieldElement,
        bal: FieldElement,
        addr: FieldElement,
        cm: Commitment,
        idx: u64,
        token_address: Address,
        kind: TokenKind,
    ) -> Result<Self> {
        let note = Self {
            open,
            bal,
            addr,
            cm,
            idx,
            token_address,
            is_spent: false,
            kind,
        };
        note.validate(hasher)?;
        Ok(note)
    }

    /// Zero-balance note owned by `addr` at index 0 with a fresh opening
    ///
    /// Consumed by the circuit when the sender has no real note to spend.
    pub fn placeholder<R: Rng + ?Sized>(
        hasher: &dyn FieldHasher,
        field: &Field,
        addr: FieldElement,
        token_address: Address,
        kind: TokenKind,
        rng: &mut R,
    ) -> Self {
        Self::new(hasher, field.random(rng), field.zero(), addr, 0, token_address, kind)
    }

    pub fn is_valid(&self, hasher: &dyn FieldHasher) -> bool {
        CommitmentScheme::new(hasher).verify(&self.cm, &self.open, &self.bal, &self.addr)
    }

    pub fn validate(&self, hasher: &dyn FieldHasher) -> Result<()> {
        if !self.is_valid(hasher) {
            return Err(CryptoError::NoteIntegrity(self.cm.to_string()));
        }
        Ok(())
    }

    pub fn nullifier(&self, hasher: &dyn FieldHasher, sk: &FieldElement) -> Nullifier {
        Nullifier::derive(hasher, &self.cm, sk)
    }

    /// One-way transition to spent
    pub fn mark_spent(&mut self) {
        self.is_spent = true;
    }

    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            idx: self.idx,
            open: self.open.to_padded_hex(),
            bal: self.bal.to_padded_hex(),
            addr: self.addr.to_padded_hex(),
            cm: self.cm.to_field().to_padded_hex(),
            token_address: self.token_address,
            is_spent: self.is_spent,
            kind: self.kind,
        }
    }
}

/// Persisted note row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub idx: u64,
    pub open: String,
    pub bal: String,
    pub addr: String,
    pub cm: String,
    #[serde(rename = "tokenAddress")]
    pub token_address: Address,
    #[serde(rename = "isSpent")]
    pub is_spent: bool,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl NoteRecord {
    /// Parse a stored row back into a note, re-checking its commitment
    pub fn into_note(self, hasher: &dyn FieldHasher, field: &Field) -> Result<Note> {
        let mut note = Note::from_parts(
            hasher,
            field.from_hex(&self.open)?,
            field.from_hex(&self.bal)?,
            field.from_hex(&self.addr)?,
            Commitment(field.from_hex(&self.cm)?),
            self.idx,
            self.token_address,
            self.kind,
        )?;
        note.is_spent = self.is_spent;
        Ok(note)
    }
}
