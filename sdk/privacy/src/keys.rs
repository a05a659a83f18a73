//! Shielded Identities
//!
//! ```text
//! sk     random scalar in [1, order)
//! pkOwn  = H(sk)
//! pkEnc  = sk * G
//! ena    = H(pkOwn, pkEnc.x, pkEnc.y)        (shielded address)
//! ```
//!
//! Auditor keys are plain curve keypairs without an `ena`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::curve::{AffinePoint, RawAffinePoint};
use crate::error::{CryptoError, Result};
use crate::field::FieldElement;
use crate::suite::CryptoSuite;

/// Public half of a user identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPublicKey {
    pub ena: FieldElement,
    pub pk_own: FieldElement,
    pub pk_enc: AffinePoint,
}

impl UserPublicKey {
    fn derive(suite: &CryptoSuite, sk: &FieldElement) -> Result<Self> {
        let hasher = suite.hasher();
        let pk_own = hasher.hash1(sk);
        let pk_enc = suite.curve().public_point(sk)?;
        let ena = hasher.hash3(&pk_own, &pk_enc.x, &pk_enc.y);
        Ok(Self { ena, pk_own, pk_enc })
    }

    /// Recompute `ena` from `(pkOwn, pkEnc)`
    pub fn verify(&self, suite: &CryptoSuite) -> Result<()> {
        let ena = suite
            .hasher()
            .hash3(&self.pk_own, &self.pk_enc.x, &self.pk_enc.y);
        if ena != self.ena {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(())
    }

    /// Parse a public key from the ledger or a contact list
    pub fn parse(suite: &CryptoSuite, raw: &RawUserPublicKey) -> Result<Self> {
        let field = suite.field();
        let pk = Self {
            ena: field.from_hex(&raw.ena)?,
            pk_own: field.from_hex(&raw.pk_own)?,
            pk_enc: suite.curve().parse_point(&raw.pk_enc)?,
        };
        pk.verify(suite)?;
        Ok(pk)
    }

    pub fn to_raw(&self) -> RawUserPublicKey {
        RawUserPublicKey {
            ena: self.ena.to_padded_hex(),
            pk_own: self.pk_own.to_padded_hex(),
            pk_enc: self.pk_enc.to_raw(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUserPublicKey {
    pub ena: String,
    #[serde(rename = "pkOwn")]
    pub pk_own: String,
    #[serde(rename = "pkEnc")]
    pub pk_enc: RawAffinePoint,
}

/// Full user identity
#[derive(Clone, PartialEq, Eq)]
pub struct UserKey {
    pub pk: UserPublicKey,
    pub sk: FieldElement,
}

impl UserKey {
    pub fn key_gen<R: Rng + ?Sized>(suite: &CryptoSuite, rng: &mut R) -> Result<Self> {
        let sk = suite.curve().random_scalar(rng);
        Self::recover_from_user_sk(suite, sk)
    }

    /// Rebuild the public identity from the secret alone
    pub fn recover_from_user_sk(suite: &CryptoSuite, sk: FieldElement) -> Result<Self> {
        suite.curve().check_scalar(&sk)?;
        let pk = UserPublicKey::derive(suite, &sk)?;
        Ok(Self { pk, sk })
    }

    pub fn to_raw(&self) -> RawUserKey {
        RawUserKey {
            pk: self.pk.to_raw(),
            sk: self.sk.to_padded_hex(),
        }
    }

    /// Parse a stored key, re-deriving the public half from `sk`
    pub fn parse(suite: &CryptoSuite, raw: &RawUserKey) -> Result<Self> {
        let sk = suite.field().from_hex(&raw.sk)?;
        let key = Self::recover_from_user_sk(suite, sk)?;
        if key.pk != UserPublicKey::parse(suite, &raw.pk)? {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(key)
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKey")
            .field("pk", &self.pk)
            .field("sk", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUserKey {
    pub pk: RawUserPublicKey,
    pub sk: String,
}

/// Auditor keypair
#[derive(Clone, PartialEq, Eq)]
pub struct AuditKey {
    pub pk: AffinePoint,
    pub sk: FieldElement,
}

impl AuditKey {
    pub fn key_gen<R: Rng + ?Sized>(suite: &CryptoSuite, rng: &mut R) -> Result<Self> {
        let sk = suite.curve().random_scalar(rng);
        Self::from_sk(suite, sk)
    }

    pub fn from_sk(suite: &CryptoSuite, sk: FieldElement) -> Result<Self> {
        suite.curve().check_scalar(&sk)?;
        let pk = suite.curve().public_point(&sk)?;
        Ok(Self { pk, sk })
    }

    pub fn to_raw(&self) -> RawAuditKey {
        RawAuditKey {
            pk: self.pk.to_raw(),
            sk: self.sk.to_padded_hex(),
        }
    }

    pub fn parse(suite: &CryptoSuite, raw: &RawAuditKey) -> Result<Self> {
        let key = Self::from_sk(suite, suite.field().from_hex(&raw.sk)?)?;
        if key.pk != suite.curve().parse_point(&raw.pk)? {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(key)
    }
}

impl std::fmt::Debug for AuditKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditKey")
            .field("pk", &self.pk)
            .field("sk", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAuditKey {
    pub pk: RawAffinePoint,
    pub sk: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn suite() -> CryptoSuite {
        CryptoSuite::new(CurveKind::BabyJubjub).unwrap()
    }

    #[test]
    fn test_key_gen_derivation() {
        let suite = suite();
        let mut rng = StdRng::seed_from_u64(1);
        let key = UserKey::key_gen(&suite, &mut rng).unwrap();

        assert_eq!(key.pk.pk_own, suite.hasher().hash1(&key.sk));
        assert!(suite.curve().is_on_curve(&key.pk.pk_enc));
        key.pk.verify(&suite).unwrap();
    }

    #[test]
    fn test_recover_from_sk() {
        let suite = suite();
        let mut rng = StdRng::seed_from_u64(2);
        let key = UserKey::key_gen(&suite, &mut rng).unwrap();
        let recovered = UserKey::recover_from_user_sk(&suite, key.sk.clone()).unwrap();
        assert_eq!(recovered, key, "recovery should rebuild the same identity");
    }

    #[test]
    fn test_tampered_ena_is_invalid() {
        let suite = suite();
        let mut rng = StdRng::seed_from_u64(3);
        let mut pk = UserKey::key_gen(&suite, &mut rng).unwrap().pk;
        pk.ena = &pk.ena + &suite.field().one();
        assert_eq!(pk.verify(&suite).unwrap_err(), CryptoError::InvalidPublicKey);
    }

    #[test]
    fn test_zero_sk_rejected() {
        let suite = suite();
        let err = UserKey::recover_from_user_sk(&suite, suite.field().zero()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidScalar(_)));
    }

    #[test]
    fn test_user_key_json() {
        let suite = suite();
        let mut rng = StdRng::seed_from_u64(4);
        let key = UserKey::key_gen(&suite, &mut rng).unwrap();

        let json = serde_json::to_string(&key.to_raw()).unwrap();
        assert!(json.contains("\"pkOwn\""));
        let raw: RawUserKey = serde_json::from_str(&json).unwrap();
        assert_eq!(UserKey::parse(&suite, &raw).unwrap(), key);
    }

    #[test]
    fn test_audit_key() {
        let suite = suite();
        let mut rng = StdRng::seed_from_u64(5);
        let key = AuditKey::key_gen(&suite, &mut rng).unwrap();
        assert_eq!(key.pk, suite.curve().public_point(&key.sk).unwrap());
        assert_eq!(AuditKey::parse(&suite, &key.to_raw()).unwrap(), key);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let suite = suite();
        let mut rng = StdRng::seed_from_u64(6);
        let key = UserKey::key_gen(&suite, &mut rng).unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains(&key.sk.to_hex()));
    }
}
