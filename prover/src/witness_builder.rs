//! Witness builder for zkTransfer proofs
//!
//! Combines keys, a pocket, the note being consumed and chain state read by
//! the caller into a [`SnarkInput`]. Pure: all ledger I/O happens before.
//!
//! ```text
//! sn        = H(oldCm, sk)
//! newEnaBal = oldEnaBal + oldNoteBal + pubIn - privBal - pubOut    (>= 0)
//! newpCT    = PKE.Enc(apk, receiver, [newOpen, privBal, receiverEna])
//! newsCT    = SKE.Enc(newEnaBal)
//! newCm     = H(newOpen, privBal, receiverEna)
//! ```

use num_bigint::BigUint;
use rand::Rng;
use zkpocket_privacy::{
    Address, AffinePoint, CommitmentScheme, CryptoSuite, FieldElement, MerklePath, Note,
    Nullifier, Pocket, PocketFields, PublicKeyEncryption, SymmetricCiphertext,
    SymmetricKeyEncryption, TokenKind, UserKey, UserPublicKey,
};

use crate::error::{Result, WitnessError};
use crate::witness::{
    SnarkInput, WitnessAux, WitnessBalance, WitnessCiphertexts, WitnessCommitments, WitnessKeys,
    WitnessOpenings,
};

/// Keys supplied by the caller
#[derive(Debug, Clone)]
pub struct TransferKeys {
    pub auditor_pk: AffinePoint,
    pub sender: UserKey,
    pub receiver: UserPublicKey,
}

/// Ledger state read before assembly
#[derive(Debug, Clone)]
pub struct ChainState {
    pub root: FieldElement,
    /// Sibling hashes for the consumed note's leaf
    pub siblings: Vec<FieldElement>,
    /// Sender's current encrypted balance (fungible only)
    pub old_sct: Option<SymmetricCiphertext>,
}

/// The note to spend, or a zero-balance placeholder at index 0
pub fn old_note_or_placeholder<R: Rng + ?Sized>(
    suite: &CryptoSuite,
    sender: &UserKey,
    note: Option<&Note>,
    token_address: Address,
    kind: TokenKind,
    rng: &mut R,
) -> Note {
    match note {
        Some(n) => n.clone(),
        None => Note::placeholder(
            suite.hasher(),
            suite.field(),
            sender.pk.ena.clone(),
            token_address,
            kind,
            rng,
        ),
    }
}

/// `oldEnaBal + oldNoteBal + pubIn - privBal - pubOut`
pub fn conserve_balance(
    old_ena_bal: &BigUint,
    old_note_bal: &BigUint,
    pocket: &Pocket,
) -> Result<BigUint> {
    let available = old_ena_bal + old_note_bal + pocket.pub_in_bal.amount();
    let required = pocket.priv_bal.amount() + pocket.pub_out_bal.amount();
    if available < required {
        return Err(WitnessError::InsufficientBalance {
            available,
            required,
        });
    }
    Ok(available - required)
}

pub struct WitnessBuilder<'a> {
    suite: &'a CryptoSuite,
}

impl<'a> WitnessBuilder<'a> {
    pub fn new(suite: &'a CryptoSuite) -> Self {
        Self { suite }
    }

    /// Fungible-token witness with encrypted-balance legs
    pub fn build_ft<R: Rng + ?Sized>(
        &self,
        keys: &TransferKeys,
        pocket: &Pocket,
        old_note: &Note,
        chain: ChainState,
        rng: &mut R,
    ) -> Result<SnarkInput> {
        let field = self.suite.field();
        let hasher = self.suite.hasher();
        let senc = SymmetricKeyEncryption::new(hasher, &keys.sender.sk);

        let old_sct = chain
            .old_sct
            .clone()
            .unwrap_or_else(|| SymmetricCiphertext::empty(field));
        let old_ena_bal = if old_sct.is_empty() {
            field.zero()
        } else {
            senc.decrypt(&old_sct)
        };

        let new_ena_bal = conserve_balance(old_ena_bal.value(), old_note.bal.value(), pocket)?;
        let new_ena_bal = field.from_canonical(new_ena_bal)?;
        let pocket_fields = pocket.to_fields(field)?;
        let new_sct = senc.encrypt(&new_ena_bal, rng);

        let mut input = self.assemble(keys, pocket_fields, old_note, chain, rng)?;
        input.ciphertexts.old_sct = Some(old_sct);
        input.ciphertexts.new_sct = Some(new_sct);
        Ok(input)
    }

    /// NFT witness: pocket legs are packed with the token address
    pub fn build_nft<R: Rng + ?Sized>(
        &self,
        keys: &TransferKeys,
        pocket: &Pocket,
        token_address: &Address,
        old_note: &Note,
        chain: ChainState,
        rng: &mut R,
    ) -> Result<SnarkInput> {
        let pocket_fields = pocket.serialize(token_address, self.suite.field())?;
        self.assemble(keys, pocket_fields, old_note, chain, rng)
    }

    fn assemble<R: Rng + ?Sized>(
        &self,
        keys: &TransferKeys,
        pocket: PocketFields,
        old_note: &Note,
        chain: ChainState,
        rng: &mut R,
    ) -> Result<SnarkInput> {
        let field = self.suite.field();
        let hasher = self.suite.hasher();

        keys.receiver.verify(self.suite)?;
        if !self.suite.curve().is_on_curve(&keys.auditor_pk) {
            return Err(WitnessError::InvalidInput("auditor key is not on the curve".into()));
        }
        old_note.validate(hasher)?;

        let sn = Nullifier::derive(hasher, &old_note.cm, &keys.sender.sk);
        let new_open = field.random(rng);

        let pke = PublicKeyEncryption::new(self.suite.curve(), hasher);
        let enc = pke.encrypt(
            &keys.auditor_pk,
            &keys.receiver.pk_enc,
            &[new_open.clone(), pocket.priv_bal.clone(), keys.receiver.ena.clone()],
            rng,
        )?;
        let new_cm = CommitmentScheme::new(hasher).commit(
            &new_open,
            &pocket.priv_bal,
            &keys.receiver.ena,
        );

        Ok(SnarkInput {
            keys: WitnessKeys {
                auditor_pk: keys.auditor_pk.clone(),
                sender: keys.sender.clone(),
                receiver: keys.receiver.clone(),
            },
            ciphertexts: WitnessCiphertexts {
                old_sct: None,
                new_sct: None,
                new_pct: enc.ciphertext,
            },
            merkle: MerklePath::new(chain.root, chain.siblings, old_note.idx),
            nullifier: sn,
            commitments: WitnessCommitments {
                old_cm: old_note.cm.clone(),
                new_cm,
            },
            opens: WitnessOpenings {
                old_open: old_note.open.clone(),
                new_open,
            },
            balance: WitnessBalance {
                pocket,
                old_cm_bal: old_note.bal.clone(),
            },
            aux: WitnessAux {
                new_r: enc.r,
                new_k: enc.k,
            },
        })
    }
}
