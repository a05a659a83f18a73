//! Groth16 proofs over BN254 as exchanged with the prover and the contract.
//!
//! ```text
//! A = [a0, a1]                      G1
//! B = [[b00, b01], [b10, b11]]      G2, each pair is (c1, c0)
//! C = [c0, c1]                      G1
//! ```
//!
//! The contract takes the eight words flattened in that order.

use std::future::Future;

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use log::{debug, info};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use zkpocket_privacy::TokenKind;
use zkpocket_privacy::field::{FIELD_HEX_WIDTH, pad_hex, parse_hex};

use crate::error::{Result, WitnessError};
use crate::witness::SnarkInput;

/// Status string the verifier reports on success
pub const VERIFY_SUCCESS: &str = "success";

/// Proof as returned by the prover service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProof {
    pub a: [String; 2],
    pub b: [[String; 2]; 2],
    pub c: [String; 2],
}

/// A validated proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub a: [BigUint; 2],
    pub b: [[BigUint; 2]; 2],
    pub c: [BigUint; 2],
}

fn fq(v: &BigUint) -> Result<Fq> {
    let modulus = BigUint::from_bytes_be(&Fq::MODULUS.to_bytes_be());
    if v >= &modulus {
        return Err(WitnessError::MalformedProof(format!(
            "word {} exceeds the base field",
            v.to_str_radix(16)
        )));
    }
    Ok(Fq::from_be_bytes_mod_order(&v.to_bytes_be()))
}

fn word(s: &str) -> Result<BigUint> {
    parse_hex(s).map_err(|e| WitnessError::MalformedProof(e.to_string()))
}

impl Proof {
    /// Parse and check every point against BN254
    pub fn parse(raw: &RawProof) -> Result<Self> {
        let proof = Self {
            a: [word(&raw.a[0])?, word(&raw.a[1])?],
            b: [
                [word(&raw.b[0][0])?, word(&raw.b[0][1])?],
                [word(&raw.b[1][0])?, word(&raw.b[1][1])?],
            ],
            c: [word(&raw.c[0])?, word(&raw.c[1])?],
        };
        proof.validate()?;
        Ok(proof)
    }

    fn validate(&self) -> Result<()> {
        let g1 = |p: &[BigUint; 2], name: &str| -> Result<()> {
            let point = G1Affine::new_unchecked(fq(&p[0])?, fq(&p[1])?);
            if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
                return Err(WitnessError::MalformedProof(format!("{name} is not a G1 point")));
            }
            Ok(())
        };
        g1(&self.a, "A")?;
        g1(&self.c, "C")?;

        let x = Fq2::new(fq(&self.b[0][1])?, fq(&self.b[0][0])?);
        let y = Fq2::new(fq(&self.b[1][1])?, fq(&self.b[1][0])?);
        let b = G2Affine::new_unchecked(x, y);
        if !b.is_on_curve() || !b.is_in_correct_subgroup_assuming_on_curve() {
            return Err(WitnessError::MalformedProof("B is not a G2 point".into()));
        }
        Ok(())
    }

    /// Eight `0x`-prefixed 64-digit words in contract order
    pub fn to_words(&self) -> Vec<String> {
        [
            &self.a[0],
            &self.a[1],
            &self.b[0][0],
            &self.b[0][1],
            &self.b[1][0],
            &self.b[1][1],
            &self.c[0],
            &self.c[1],
        ]
        .into_iter()
        .map(|w| format!("0x{}", pad_hex(w, FIELD_HEX_WIDTH)))
        .collect()
    }
}

/// External prover / verifier
pub trait ProofClient: Send + Sync {
    fn run_proof(
        &self,
        kind: TokenKind,
        witness_json: &str,
    ) -> impl Future<Output = Result<RawProof>> + Send;

    /// Returns the verifier's status line
    fn run_verify(
        &self,
        kind: TokenKind,
        proof: &RawProof,
        witness_json: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Prove, then verify the same witness locally before returning the proof
pub async fn generate_proof<P: ProofClient>(
    client: &P,
    kind: TokenKind,
    input: &SnarkInput,
) -> Result<Proof> {
    let witness_json = input.to_snark_json()?;
    debug!("requesting {kind} proof ({} witness bytes)", witness_json.len());

    let raw = client.run_proof(kind, &witness_json).await?;
    let status = client.run_verify(kind, &raw, &witness_json).await?;
    if status != VERIFY_SUCCESS {
        return Err(WitnessError::ProofVerificationFailed(status));
    }
    let proof = Proof::parse(&raw)?;
    info!("{kind} proof generated and verified");
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    fn to_hex(f: &Fq) -> String {
        hex::encode(f.into_bigint().to_bytes_be())
    }

    /// Generator points laid out the way the prover returns them
    fn generator_proof() -> RawProof {
        let g1 = G1Affine::generator();
        let g2 = G2Affine::generator();
        let (g1x, g1y) = (to_hex(&g1.x), to_hex(&g1.y));
        RawProof {
            a: [g1x.clone(), g1y.clone()],
            b: [
                [to_hex(&g2.x.c1), to_hex(&g2.x.c0)],
                [to_hex(&g2.y.c1), to_hex(&g2.y.c0)],
            ],
            c: [g1x, g1y],
        }
    }

    #[test]
    fn test_parse_valid_points() {
        let proof = Proof::parse(&generator_proof()).unwrap();
        let words = proof.to_words();
        assert_eq!(words.len(), 8);
        assert!(words.iter().all(|w| w.len() == 66 && w.starts_with("0x")));
    }

    #[test]
    fn test_rejects_off_curve_a() {
        let mut raw = generator_proof();
        raw.a[1] = "0x05".into();
        assert!(matches!(Proof::parse(&raw), Err(WitnessError::MalformedProof(_))));
    }

    #[test]
    fn test_rejects_swapped_b_pairs() {
        let mut raw = generator_proof();
        raw.b[0].swap(0, 1);
        assert!(Proof::parse(&raw).is_err());
    }

    #[test]
    fn test_rejects_non_hex() {
        let mut raw = generator_proof();
        raw.c[0] = "xyz".into();
        assert!(Proof::parse(&raw).is_err());
    }
}
