//! Proof-system witness and its JSON codec.
//!
//! The prover consumes a flat JSON object. Every numeric value is 64-digit
//! zero-padded lowercase hex, points are `{"0": x, "1": y}` and indexed
//! sequences are objects keyed by decimal index. Keys are emitted sorted.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use zkpocket_privacy::{
    AffinePoint, Commitment, FieldElement, MerklePath, Nullifier, PocketFields,
    PublicKeyCiphertext, SymmetricCiphertext, UserKey, UserPublicKey,
};

use crate::error::{Result, WitnessError};

/// Keys involved in one transfer
#[derive(Debug, Clone)]
pub struct WitnessKeys {
    pub auditor_pk: AffinePoint,
    pub sender: UserKey,
    pub receiver: UserPublicKey,
}

#[derive(Debug, Clone)]
pub struct WitnessCiphertexts {
    /// Sender's encrypted balance before the transfer (fungible only)
    pub old_sct: Option<SymmetricCiphertext>,
    /// Sender's encrypted balance after the transfer (fungible only)
    pub new_sct: Option<SymmetricCiphertext>,
    pub new_pct: PublicKeyCiphertext,
}

#[derive(Debug, Clone)]
pub struct WitnessCommitments {
    pub old_cm: Commitment,
    pub new_cm: Commitment,
}

#[derive(Debug, Clone)]
pub struct WitnessOpenings {
    pub old_open: FieldElement,
    pub new_open: FieldElement,
}

#[derive(Debug, Clone)]
pub struct WitnessBalance {
    pub pocket: PocketFields,
    pub old_cm_bal: FieldElement,
}

/// Encryption randomness the circuit re-derives
#[derive(Debug, Clone)]
pub struct WitnessAux {
    pub new_r: FieldElement,
    pub new_k: AffinePoint,
}

/// Complete witness for one zkTransfer
#[derive(Debug, Clone)]
pub struct SnarkInput {
    pub keys: WitnessKeys,
    pub ciphertexts: WitnessCiphertexts,
    pub merkle: MerklePath,
    pub nullifier: Nullifier,
    pub commitments: WitnessCommitments,
    pub opens: WitnessOpenings,
    pub balance: WitnessBalance,
    pub aux: WitnessAux,
}

fn scalar(f: &FieldElement) -> Value {
    Value::String(f.to_padded_hex())
}

fn point(p: &AffinePoint) -> Value {
    indexed([&p.x, &p.y])
}

fn indexed<'a>(items: impl IntoIterator<Item = &'a FieldElement>) -> Value {
    let map: Map<String, Value> = items
        .into_iter()
        .enumerate()
        .map(|(i, f)| (i.to_string(), scalar(f)))
        .collect();
    Value::Object(map)
}

impl SnarkInput {
    /// Whether this witness carries the fungible-token balance legs
    pub fn is_fungible(&self) -> bool {
        self.ciphertexts.old_sct.is_some() && self.ciphertexts.new_sct.is_some()
    }

    /// Witness as an ordered key/value map
    pub fn to_snark_map(&self) -> BTreeMap<&'static str, Value> {
        let pct = &self.ciphertexts.new_pct;
        let sender = &self.keys.sender;
        let receiver = &self.keys.receiver;

        let mut input = BTreeMap::new();
        input.insert("CT", indexed(&pct.c3));
        input.insert("G_r", point(&pct.c0));
        input.insert("K_a", point(&pct.c2));
        input.insert("K_u", point(&pct.c1));
        input.insert("addr", scalar(&sender.pk.ena));
        input.insert("addr_r", scalar(&receiver.ena));
        input.insert("apk", point(&self.keys.auditor_pk));
        input.insert("cm", scalar(self.commitments.old_cm.to_field()));
        input.insert("cm_", scalar(self.commitments.new_cm.to_field()));
        input.insert("direction", Value::String(self.merkle.direction()));
        input.insert("du", scalar(&self.opens.old_open));
        input.insert("du_", scalar(&self.opens.new_open));
        input.insert("dv", scalar(&self.balance.old_cm_bal));
        input.insert("dv_", scalar(&self.balance.pocket.priv_bal));
        input.insert("intermediateHashes", indexed(&self.merkle.siblings));
        input.insert("k", point(&self.aux.new_k));
        input.insert("k_b", scalar(&sender.pk.pk_own));
        input.insert("k_b_", scalar(&receiver.pk_own));
        input.insert("k_u", point(&sender.pk.pk_enc));
        input.insert("k_u_", point(&receiver.pk_enc));
        input.insert("pv", scalar(&self.balance.pocket.pub_in_bal));
        input.insert("pv_", scalar(&self.balance.pocket.pub_out_bal));
        input.insert("r", scalar(&self.aux.new_r));
        input.insert("rt", scalar(&self.merkle.root));
        input.insert("sk", scalar(&sender.sk));
        input.insert("sn", scalar(self.nullifier.to_field()));

        if let (Some(old), Some(new)) = (&self.ciphertexts.old_sct, &self.ciphertexts.new_sct) {
            input.insert("cin", indexed([&old.r, &old.ct]));
            input.insert("cout", indexed([&new.r, &new.ct]));
        }
        input
    }

    /// Witness JSON handed to the prover
    pub fn to_snark_json(&self) -> Result<String> {
        encode_witness(&self.to_snark_map())
    }
}

fn encode_witness<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| WitnessError::Encoding(e.to_string()))
}
