//! Balance and Note Encryption
//!
//! Two schemes share the commitment hash:
//!
//! ```text
//! Symmetric (running encrypted balance, keyed by the user secret):
//!   Enc(m)      = (r, H(sk, r) + m)
//!   Dec(r, ct)  = ct - H(sk, r)
//!
//! Public-key (new note contents, user + auditor):
//!   c0   = r*G
//!   K    = k*G
//!   c1   = K + r*pkEnc            (user recovers K = c1 - sk*c0)
//!   c2   = K + r*apk              (auditor recovers K = c2 - ask*c0)
//!   c3_i = m_i + H(K.x, i)
//! ```
//!
//! Neither scheme authenticates its ciphertext. A wrong key yields garbage
//! plaintext, which callers detect through the note commitment.

use num_bigint::BigUint;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::curve::{AffinePoint, MontgomeryCurve, Point, RawAffinePoint};
use crate::error::{CryptoError, Result};
use crate::field::{Field, FieldElement};
use crate::hash::FieldHasher;

/// Public-key encryption carries at most this many plaintext elements
pub const MAX_PLAINTEXTS: usize = 3;

/// Symmetric ciphertext (sCT)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricCiphertext {
    pub r: FieldElement,
    pub ct: FieldElement,
}

impl SymmetricCiphertext {
    /// The `r = ct = 0` sentinel of an account that never held a balance
    pub fn empty(field: &Field) -> Self {
        Self {
            r: field.zero(),
            ct: field.zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_zero() && self.ct.is_zero()
    }

    pub fn to_raw(&self) -> RawSymmetricCiphertext {
        RawSymmetricCiphertext {
            r: self.r.to_padded_hex(),
            ct: self.ct.to_padded_hex(),
        }
    }

    pub fn parse(field: &Field, raw: &RawSymmetricCiphertext) -> Result<Self> {
        Ok(Self {
            r: field.from_hex(&raw.r)?,
            ct: field.from_hex(&raw.ct)?,
        })
    }
}

/// Wire shape of an sCT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSymmetricCiphertext {
    pub r: String,
    pub ct: String,
}

/// Additive one-time pad keyed by `H(sk, r)`
pub struct SymmetricKeyEncryption<'a> {
    hasher: &'a dyn FieldHasher,
    sk: &'a FieldElement,
}

impl<'a> SymmetricKeyEncryption<'a> {
    pub fn new(hasher: &'a dyn FieldHasher, sk: &'a FieldElement) -> Self {
        Self { hasher, sk }
    }

    pub fn encrypt<R: Rng + ?Sized>(&self, msg: &FieldElement, rng: &mut R) -> SymmetricCiphertext {
        let r = msg.field().random(rng);
        let pad = self.hasher.hash2(self.sk, &r);
        SymmetricCiphertext { ct: &pad + msg, r }
    }

    pub fn decrypt(&self, sct: &SymmetricCiphertext) -> FieldElement {
        let pad = self.hasher.hash2(self.sk, &sct.r);
        &sct.ct - &pad
    }
}

/// Public-key ciphertext (pCT)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyCiphertext {
    pub c0: AffinePoint,
    pub c1: AffinePoint,
    pub c2: AffinePoint,
    pub c3: Vec<FieldElement>,
}

impl PublicKeyCiphertext {
    /// `[c0.x, c0.y, c1.x, c1.y, c2.x, c2.y, c3...]`
    pub fn to_list(&self) -> Vec<FieldElement> {
        let mut out = Vec::with_capacity(6 + self.c3.len());
        for p in [&self.c0, &self.c1, &self.c2] {
            out.push(p.x.clone());
            out.push(p.y.clone());
        }
        out.extend(self.c3.iter().cloned());
        out
    }

    pub fn to_raw(&self) -> RawPublicKeyCiphertext {
        RawPublicKeyCiphertext {
            c0: self.c0.to_raw(),
            c1: self.c1.to_raw(),
            c2: self.c2.to_raw(),
            c3: self.c3.iter().map(FieldElement::to_padded_hex).collect(),
        }
    }

    /// Validate a ciphertext received from the ledger
    pub fn parse(curve: &MontgomeryCurve, raw: &RawPublicKeyCiphertext) -> Result<Self> {
        if raw.c3.is_empty() || raw.c3.len() > MAX_PLAINTEXTS {
            return Err(CryptoError::PlaintextArity(raw.c3.len()));
        }
        let field = curve.field();
        Ok(Self {
            c0: curve.parse_point(&raw.c0)?,
            c1: curve.parse_point(&raw.c1)?,
            c2: curve.parse_point(&raw.c2)?,
            c3: raw
                .c3
                .iter()
                .map(|s| field.from_hex(s))
                .collect::<Result<_>>()?,
        })
    }
}

/// Wire shape of a pCT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPublicKeyCiphertext {
    pub c0: RawAffinePoint,
    pub c1: RawAffinePoint,
    pub c2: RawAffinePoint,
    pub c3: Vec<String>,
}

/// Which recipient is decrypting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Recover `K` through `c1`
    User,
    /// Recover `K` through `c2`
    Auditor,
}

/// Ciphertext plus the randomness the proof system needs as witness
#[derive(Debug, Clone)]
pub struct PkeOutput {
    pub ciphertext: PublicKeyCiphertext,
    /// Scalar behind `c0 = r*G`
    pub r: FieldElement,
    /// Shared point `K = k*G`
    pub k: AffinePoint,
}

/// Dual-recipient ElGamal-style encryption
pub struct PublicKeyEncryption<'a> {
    curve: &'a MontgomeryCurve,
    hasher: &'a dyn FieldHasher,
}

impl<'a> PublicKeyEncryption<'a> {
    pub fn new(curve: &'a MontgomeryCurve, hasher: &'a dyn FieldHasher) -> Self {
        Self { curve, hasher }
    }

    /// Encrypt 1 to 3 field elements to a user encryption key and the auditor
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        apk: &AffinePoint,
        pk_enc: &AffinePoint,
        msgs: &[FieldElement],
        rng: &mut R,
    ) -> Result<PkeOutput> {
        if msgs.is_empty() || msgs.len() > MAX_PLAINTEXTS {
            return Err(CryptoError::PlaintextArity(msgs.len()));
        }
        let curve = self.curve;
        let r = curve.random_scalar(rng);
        let k = curve.random_scalar(rng);

        let c0 = curve.base_point_mul(r.value());
        let big_k = curve.base_point_mul(k.value());
        let user_share = curve.scalar_mul(&Point::Affine(pk_enc.clone()), r.value());
        let audit_share = curve.scalar_mul(&Point::Affine(apk.clone()), r.value());
        let c1 = curve.add(&big_k, &user_share);
        let c2 = curve.add(&big_k, &audit_share);

        let big_k = big_k.into_affine()?;
        let c3 = msgs
            .iter()
            .enumerate()
            .map(|(i, m)| m + &self.mask(&big_k.x, i))
            .collect();

        Ok(PkeOutput {
            ciphertext: PublicKeyCiphertext {
                c0: c0.into_affine()?,
                c1: c1.into_affine()?,
                c2: c2.into_affine()?,
                c3,
            },
            r,
            k: big_k,
        })
    }

    /// Recover the plaintext with a user or auditor secret scalar
    pub fn decrypt(
        &self,
        ct: &PublicKeyCiphertext,
        sk: &FieldElement,
        view: View,
    ) -> Result<Vec<FieldElement>> {
        let curve = self.curve;
        let shared = curve.scalar_mul(&Point::Affine(ct.c0.clone()), sk.value());
        let chosen = match view {
            View::User => &ct.c1,
            View::Auditor => &ct.c2,
        };
        let big_k = curve.sub(&Point::Affine(chosen.clone()), &shared).into_affine()?;

        Ok(ct
            .c3
            .iter()
            .enumerate()
            .map(|(i, c)| c - &self.mask(&big_k.x, i))
            .collect())
    }

    /// `H(K.x, i)`: the index is its own hash input, never added to `K.x`
    fn mask(&self, kx: &FieldElement, i: usize) -> FieldElement {
        let idx = kx.field().reduce(BigUint::from(i));
        self.hasher.hash2(kx, &idx)
    }
}
