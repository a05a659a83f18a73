//! zkpocket Privacy SDK
//!
//! Field, curve and note primitives behind a shielded "pocket" balance.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        zkTransfer                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐ │
//! │  │  Nullifier   │  │  Commitment  │  │  pCT (user+auditor)   │ │
//! │  │  H(cm, sk)   │  │  H(o, v, a)  │  │  sCT (own balance)    │ │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘ │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │  Pocket { privBal, pubInBal, pubOutBal }                 │   │
//! │  │  new_ena = old_ena + old_note + pubIn - priv - pubOut    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod address;
pub mod commitment;
pub mod curve;
pub mod encryption;
pub mod error;
pub mod field;
pub mod hash;
pub mod keys;
pub mod merkle;
pub mod note;
pub mod nullifier;
pub mod pocket;
pub mod suite;

pub use address::Address;
pub use commitment::{Commitment, CommitmentScheme};
pub use curve::{AffinePoint, CurveKind, MontgomeryCurve, Point, RawAffinePoint};
pub use encryption::{
    PkeOutput, PublicKeyCiphertext, PublicKeyEncryption, RawPublicKeyCiphertext,
    RawSymmetricCiphertext, SymmetricCiphertext, SymmetricKeyEncryption, View,
};
pub use error::{CryptoError, Result};
pub use field::{Field, FieldElement};
pub use hash::{FieldHasher, Mimc7};
pub use keys::{AuditKey, RawAuditKey, RawUserKey, RawUserPublicKey, UserKey, UserPublicKey};
pub use merkle::{MerklePath, TREE_DEPTH};
pub use note::{Note, NoteRecord, TokenKind};
pub use nullifier::Nullifier;
pub use pocket::{Leg, Pocket, PocketFields, TxType};
pub use suite::CryptoSuite;
