//! zkTransfer call payload
//!
//! ```text
//! args = [ proof[8], inputs[..], receiverEoa, tokenAddress? ]
//!
//! inputs = rt, sn, ena, pkOwn, pkEnc.x, pkEnc.y, cm,
//!          [newsCT.r, newsCT.ct]        (fungible only)
//!          pubIn, pubOut,
//!          c0.x, c0.y, c1.x, c1.y, c2.x, c2.y, c3...
//! ```
//!
//! Every word is `0x` + 64 hex digits. The token address is only passed for
//! fungible transfers; NFT legs already carry it.

use serde::Serialize;
use serde_json::Value;
use zkpocket_privacy::{
    Address, Commitment, FieldElement, Nullifier, PublicKeyCiphertext, SymmetricCiphertext,
    UserPublicKey,
};

use crate::proof::Proof;
use crate::witness::SnarkInput;

/// Everything the contract needs besides the proof's private witness
#[derive(Debug, Clone)]
pub struct ZkTransferParam {
    pub proof: Proof,
    pub rt: FieldElement,
    pub sn: Nullifier,
    pub sender_pk: UserPublicKey,
    pub cm: Commitment,
    pub new_sct: Option<SymmetricCiphertext>,
    pub pub_bal: [FieldElement; 2],
    pub new_pct: PublicKeyCiphertext,
    pub receiver_eoa: Option<Address>,
    pub token_address: Address,
}

/// Ordered contract arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractArgs {
    pub proof: Vec<String>,
    pub inputs: Vec<String>,
    pub receiver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
}

impl ContractArgs {
    /// Positional argument list
    pub fn to_values(&self) -> Vec<Value> {
        let mut args = vec![
            Value::from(self.proof.clone()),
            Value::from(self.inputs.clone()),
            Value::from(self.receiver.clone()),
        ];
        if let Some(token) = &self.token_address {
            args.push(Value::from(token.clone()));
        }
        args
    }
}

impl ZkTransferParam {
    pub fn from_input(
        proof: Proof,
        input: &SnarkInput,
        receiver_eoa: Option<Address>,
        token_address: Address,
    ) -> Self {
        let pocket = &input.balance.pocket;
        Self {
            proof,
            rt: input.merkle.root.clone(),
            sn: input.nullifier.clone(),
            sender_pk: input.keys.sender.pk.clone(),
            cm: input.commitments.new_cm.clone(),
            new_sct: input.ciphertexts.new_sct.clone(),
            pub_bal: [pocket.pub_in_bal.clone(), pocket.pub_out_bal.clone()],
            new_pct: input.ciphertexts.new_pct.clone(),
            receiver_eoa,
            token_address,
        }
    }

    /// Public inputs in verifier order
    pub fn inputs(&self) -> Vec<String> {
        let mut words: Vec<&FieldElement> = vec![
            &self.rt,
            self.sn.to_field(),
            &self.sender_pk.ena,
            &self.sender_pk.pk_own,
            &self.sender_pk.pk_enc.x,
            &self.sender_pk.pk_enc.y,
            self.cm.to_field(),
        ];
        if let Some(sct) = &self.new_sct {
            words.push(&sct.r);
            words.push(&sct.ct);
        }
        words.extend(self.pub_bal.iter());

        let pct = self.new_pct.to_list();
        words
            .into_iter()
            .map(FieldElement::to_prefixed_hex)
            .chain(pct.iter().map(FieldElement::to_prefixed_hex))
            .collect()
    }

    pub fn to_contract_args(&self) -> ContractArgs {
        ContractArgs {
            proof: self.proof.to_words(),
            inputs: self.inputs(),
            receiver: self.receiver_eoa.unwrap_or(Address::ZERO).to_string(),
            token_address: self
                .new_sct
                .as_ref()
                .map(|_| self.token_address.to_string()),
        }
    }
}
