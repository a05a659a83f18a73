//! Transfer orchestration
//!
//! Every flow follows the same path:
//!
//! ```text
//! [approve on the token contract, for public deposits]
//! getAPK, getRootTop, getMerklePath(idx), [getCiphertext]
//!     -> WitnessBuilder -> generate_proof (prove + verify)
//!     -> getRootTop again (RootMismatch if moved)
//!     -> zkTransfer / zkTransferNft through the CallContext
//! ```

use log::{info, warn};
use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;
use zkpocket_privacy::{
    Address, AffinePoint, CryptoError, CryptoSuite, FieldElement, Leg, Note, Pocket, SymmetricCiphertext,
    SymmetricKeyEncryption, TokenKind, TxType, UserKey, UserPublicKey,
};
use zkpocket_prover::{
    ChainState, ProofClient, TransferKeys, WitnessBuilder, WitnessError, ZkTransferParam,
    generate_proof, old_note_or_placeholder,
};

use crate::deadline::{CallContext, SubmitOutcome};
use crate::error::{Result, WalletError};
use crate::ledger::Ledger;
use crate::storage::{NoteStore, SecretStore};
use crate::sync::{NoteSynchronizer, SyncReport};

/// A user's view of the shielded pool
pub struct Wallet<L: Ledger, P: ProofClient, S: NoteStore> {
    suite: CryptoSuite,
    ledger: L,
    prover: P,
    store: S,
    key: UserKey,
    /// Public account receiving withdrawals
    eoa: Option<Address>,
}

impl<L: Ledger, P: ProofClient, S: NoteStore> Wallet<L, P, S> {
    pub fn new(suite: CryptoSuite, ledger: L, prover: P, store: S, key: UserKey, eoa: Option<Address>) -> Self {
        Self {
            suite,
            ledger,
            prover,
            store,
            key,
            eoa,
        }
    }

    /// Rebuild the identity from a stored secret
    pub fn from_secret_store(
        suite: CryptoSuite,
        ledger: L,
        prover: P,
        store: S,
        secrets: &dyn SecretStore,
        eoa: Option<Address>,
    ) -> Result<Self> {
        let secret = secrets
            .load_secret()
            .map_err(WalletError::secret)?
            .ok_or_else(|| WalletError::Secret("no secret stored".into()))?;
        let sk = suite.field().from_hex(&secret)?;
        let key = UserKey::recover_from_user_sk(&suite, sk)?;
        Ok(Self::new(suite, ledger, prover, store, key, eoa))
    }

    pub fn suite(&self) -> &CryptoSuite {
        &self.suite
    }

    pub fn key(&self) -> &UserKey {
        &self.key
    }

    pub fn public_key(&self) -> &UserPublicKey {
        &self.key.pk
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn synchronizer(&self) -> NoteSynchronizer<'_, L, S> {
        NoteSynchronizer::new(&self.suite, &self.ledger, &self.store)
    }

    pub async fn sync(&self, ctx: &CallContext) -> Result<Vec<SyncReport>> {
        self.synchronizer().sync_all(ctx, &self.key).await
    }

    pub async fn sync_transactions(&self, ctx: &CallContext, kind: TokenKind, tx_hashes: &[String]) -> Result<SyncReport> {
        self.synchronizer()
            .sync_transactions(ctx, &self.key, kind, tx_hashes)
            .await
    }

    /// Stored unspent notes of one class
    pub fn unspent_notes(&self, kind: TokenKind) -> Result<Vec<Note>> {
        let records = self.store.unspent_notes(kind).map_err(WalletError::store)?;
        records
            .into_iter()
            .map(|r| Ok(r.into_note(self.suite.hasher(), self.suite.field())?))
            .collect()
    }

    /// Flag a stored note spent; `false` if it already was or is unknown
    pub fn set_spent(&self, note: &Note) -> Result<bool> {
        self.store
            .set_spent(note.kind, &note.cm.to_field().to_padded_hex())
            .map_err(WalletError::store)
    }

    async fn encrypted_balance(&self, ctx: &CallContext, token: &Address) -> Result<SymmetricCiphertext> {
        let ena = self.key.pk.ena.to_padded_hex();
        let raw = ctx
            .run("getCiphertext", self.ledger.get_ciphertext(token, &ena))
            .await?;
        Ok(SymmetricCiphertext::parse(self.suite.field(), &raw)?)
    }

    /// Decrypted on-chain balance for `token`; 0 when never funded
    pub async fn private_balance(&self, ctx: &CallContext, token: &Address) -> Result<BigUint> {
        let sct = self.encrypted_balance(ctx, token).await?;
        if sct.is_empty() {
            return Ok(BigUint::default());
        }
        let bal = SymmetricKeyEncryption::new(self.suite.hasher(), &self.key.sk).decrypt(&sct);
        Ok(bal.into_value())
    }

    pub async fn auditor_key(&self, ctx: &CallContext) -> Result<AffinePoint> {
        let raw = ctx.run("getAPK", self.ledger.get_apk()).await?;
        Ok(self.suite.curve().parse_point(&raw)?)
    }

    /// Validated shielded identity registered for a public account
    pub async fn lookup_receiver(&self, ctx: &CallContext, eoa: &Address) -> Result<UserPublicKey> {
        let raw = ctx
            .run("getUserPublicKeys", self.ledger.get_user_public_keys(eoa))
            .await?
            .ok_or_else(|| WalletError::UnknownReceiver(eoa.to_string()))?;
        Ok(UserPublicKey::parse(&self.suite, &raw)?)
    }

    /// Publish this wallet's public key
    pub async fn register(&self, ctx: &CallContext) -> Result<SubmitOutcome> {
        let raw = self.key.pk.to_raw();
        ctx.submit("registerUser", self.ledger.register_user(&raw)).await
    }

    /// Public funds into the encrypted balance
    pub async fn charge<R: Rng + ?Sized>(
        &self,
        ctx: &CallContext,
        token: Address,
        amount: BigUint,
        rng: &mut R,
    ) -> Result<SubmitOutcome> {
        let pocket = Pocket::from_type(TxType::Charge, amount);
        let receiver = self.key.pk.clone();
        self.transact(ctx, TokenKind::Ft, pocket, token, None, receiver, self.eoa, rng)
            .await
    }

    /// Encrypted balance out to the wallet's public account
    pub async fn withdraw<R: Rng + ?Sized>(
        &self,
        ctx: &CallContext,
        token: Address,
        amount: BigUint,
        rng: &mut R,
    ) -> Result<SubmitOutcome> {
        let pocket = Pocket::from_type(TxType::Withdraw, amount);
        let receiver = self.key.pk.clone();
        self.transact(ctx, TokenKind::Ft, pocket, token, None, receiver, self.eoa, rng)
            .await
    }

    /// New private note for a registered receiver, paid from the encrypted balance
    pub async fn private_transfer<R: Rng + ?Sized>(
        &self,
        ctx: &CallContext,
        token: Address,
        amount: BigUint,
        receiver_eoa: Address,
        rng: &mut R,
    ) -> Result<SubmitOutcome> {
        let receiver = self.lookup_receiver(ctx, &receiver_eoa).await?;
        let pocket = Pocket::from_type(TxType::Transfer, amount);
        self.transact(ctx, TokenKind::Ft, pocket, token, None, receiver, Some(receiver_eoa), rng)
            .await
    }

    /// Fold a received note into the encrypted balance
    pub async fn receive_note<R: Rng + ?Sized>(
        &self,
        ctx: &CallContext,
        note: &Note,
        rng: &mut R,
    ) -> Result<SubmitOutcome> {
        if note.kind != TokenKind::Ft {
            return Err(WitnessError::InvalidInput(
                "only fungible notes fold into the encrypted balance".into(),
            )
            .into());
        }
        let pocket = Pocket::from_type(TxType::Update, note.bal.value().clone());
        let receiver = self.key.pk.clone();
        self.transact(
            ctx,
            TokenKind::Ft,
            pocket,
            note.token_address,
            Some(note),
            receiver,
            self.eoa,
            rng,
        )
        .await
    }

    /// Move an NFT between public and private ownership
    ///
    /// Private-to-private sends to `receiver_eoa`'s shielded identity; the other
    /// types keep the note with this wallet and use `receiver_eoa` as the public
    /// destination.
    #[allow(clippy::too_many_arguments)]
    pub async fn transfer_nft<R: Rng + ?Sized>(
        &self,
        ctx: &CallContext,
        tx_type: TxType,
        token: Address,
        token_id: BigUint,
        note: Option<&Note>,
        receiver_eoa: Option<Address>,
        rng: &mut R,
    ) -> Result<SubmitOutcome> {
        if !tx_type.is_nft() {
            return Err(CryptoError::InvalidPocketType(tx_type.to_string()).into());
        }
        let receiver = match (tx_type, receiver_eoa) {
            (TxType::NftPrivateToPrivate, Some(eoa)) => self.lookup_receiver(ctx, &eoa).await?,
            (TxType::NftPrivateToPrivate, None) => {
                return Err(WalletError::UnknownReceiver(Address::ZERO.to_string()));
            }
            _ => self.key.pk.clone(),
        };
        let pocket = Pocket::from_type(tx_type, token_id);
        self.transact(ctx, TokenKind::Nft, pocket, token, note, receiver, receiver_eoa, rng)
            .await
    }

    /// Approve the pool to pull a public deposit held by a token contract
    async fn approve_deposit(
        &self,
        ctx: &CallContext,
        kind: TokenKind,
        pocket: &Pocket,
        token: &Address,
    ) -> Result<Option<SubmitOutcome>> {
        let Leg::Value(amount) = &pocket.pub_in_bal else {
            return Ok(None);
        };
        if token.is_zero() {
            return Ok(None);
        }
        let outcome = match kind {
            TokenKind::Ft if amount.is_zero() => return Ok(None),
            TokenKind::Ft => ctx.submit("approve", self.ledger.approve_erc20(token, amount)).await?,
            TokenKind::Nft => ctx.submit("approve", self.ledger.approve_nft(token, amount)).await?,
        };
        Ok(Some(outcome))
    }

    #[allow(clippy::too_many_arguments)]
    async fn transact<R: Rng + ?Sized>(
        &self,
        ctx: &CallContext,
        kind: TokenKind,
        pocket: Pocket,
        token: Address,
        note: Option<&Note>,
        receiver: UserPublicKey,
        receiver_eoa: Option<Address>,
        rng: &mut R,
    ) -> Result<SubmitOutcome> {
        if pays_out(kind, &pocket.pub_out_bal) && receiver_eoa.is_none() {
            return Err(WalletError::NoPublicAccount);
        }
        if let Some(SubmitOutcome::Skipped) = self.approve_deposit(ctx, kind, &pocket, &token).await? {
            return Ok(SubmitOutcome::Skipped);
        }

        let field = self.suite.field();

        let auditor_pk = self.auditor_key(ctx).await?;
        let root_hex = ctx.run("getRootTop", self.ledger.get_root_top()).await?;
        let root = field.from_hex(&root_hex)?;

        let old_note = old_note_or_placeholder(&self.suite, &self.key, note, token, kind, rng);
        let siblings = ctx
            .run("getMerklePath", self.ledger.get_merkle_path(old_note.idx))
            .await?
            .iter()
            .map(|s| field.from_hex(s))
            .collect::<std::result::Result<Vec<FieldElement>, _>>()?;

        let old_sct = match kind {
            TokenKind::Ft => Some(self.encrypted_balance(ctx, &token).await?),
            TokenKind::Nft => None,
        };

        let keys = TransferKeys {
            auditor_pk,
            sender: self.key.clone(),
            receiver,
        };
        let chain = ChainState {
            root: root.clone(),
            siblings,
            old_sct,
        };
        let builder = WitnessBuilder::new(&self.suite);
        let input = match kind {
            TokenKind::Ft => builder.build_ft(&keys, &pocket, &old_note, chain, rng)?,
            TokenKind::Nft => builder.build_nft(&keys, &pocket, &token, &old_note, chain, rng)?,
        };

        let proof = ctx
            .run("generateProof", async {
                generate_proof(&self.prover, kind, &input)
                    .await
                    .map_err(WalletError::from)
            })
            .await?;
        let args = ZkTransferParam::from_input(proof, &input, receiver_eoa, token).to_contract_args();

        let current = ctx.run("getRootTop", self.ledger.get_root_top()).await?;
        let current = field.from_hex(&current)?;
        if current != root {
            warn!("commitment root moved from {root} to {current} while proving");
            return Err(WalletError::RootMismatch {
                expected: root.to_padded_hex(),
                found: current.to_padded_hex(),
            });
        }

        let outcome = match kind {
            TokenKind::Ft => {
                let value = if token.is_zero() {
                    pocket.pub_in_bal.amount()
                } else {
                    BigUint::default()
                };
                ctx.submit("zkTransfer", self.ledger.submit_zk_transfer(&args, &value))
                    .await?
            }
            TokenKind::Nft => {
                ctx.submit("zkTransferNft", self.ledger.submit_zk_transfer_nft(&args))
                    .await?
            }
        };
        if let SubmitOutcome::Submitted { tx_hash } = &outcome {
            info!("{kind} transfer submitted: {tx_hash}");
        }
        Ok(outcome)
    }
}

/// Whether the pocket sends anything to a public account
fn pays_out(kind: TokenKind, pub_out: &Leg) -> bool {
    match (kind, pub_out) {
        (_, Leg::NoToken) => false,
        (TokenKind::Ft, Leg::Value(v)) => !v.is_zero(),
        (TokenKind::Nft, Leg::Value(_)) => true,
    }
}
