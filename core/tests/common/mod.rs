//! In-memory ledger and prover doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ark_bn254::{Fq, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use rand::SeedableRng;
use rand::rngs::StdRng;
use zkpocket_core::ledger::RawZkTransferEvent;
use zkpocket_core::{CallContext, Ledger, MemoryNoteStore, Result, Wallet, WalletError};
use zkpocket_privacy::{
    Address, AuditKey, CryptoSuite, CurveKind, RawAffinePoint, RawSymmetricCiphertext,
    RawUserPublicKey, TokenKind, TREE_DEPTH, UserKey,
};
use zkpocket_prover::{ContractArgs, ProofClient, RawProof, WitnessError};

pub const ROOT: &str = "1111111111111111111111111111111111111111111111111111111111111111";

fn strip(word: &str) -> String {
    word.trim_start_matches("0x").to_string()
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub method: &'static str,
    pub args: ContractArgs,
    pub value: BigUint,
}

/// Allowance granted to the pool on a token contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub standard: &'static str,
    pub token: Address,
    pub value: BigUint,
}

#[derive(Default)]
struct LedgerState {
    block: u64,
    leaves: u64,
    roots: VecDeque<String>,
    apk: Option<RawAffinePoint>,
    ciphertexts: HashMap<(Address, String), RawSymmetricCiphertext>,
    nullified: HashSet<String>,
    users: HashMap<Address, RawUserPublicKey>,
    events: Vec<(u64, TokenKind, String, RawZkTransferEvent)>,
    event_queries: Vec<(TokenKind, u64, u64)>,
    submissions: Vec<Submission>,
    approvals: Vec<Approval>,
    head_delay: Option<Duration>,
}

/// Pool contract double that applies submissions to its own state
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MockLedger {
    pub fn new(apk: RawAffinePoint) -> Self {
        let ledger = Self::default();
        {
            let mut s = ledger.state.lock().unwrap();
            s.apk = Some(apk);
            s.roots.push_back(ROOT.to_string());
        }
        ledger
    }

    /// Queue root values; the last one stays
    pub fn push_root(&self, root: &str) {
        self.state.lock().unwrap().roots.push_back(root.to_string());
    }

    pub fn register(&self, eoa: Address, pk: RawUserPublicKey) {
        self.state.lock().unwrap().users.insert(eoa, pk);
    }

    pub fn nullify(&self, sn: &str) {
        self.state.lock().unwrap().nullified.insert(strip(sn));
    }

    pub fn advance(&self, blocks: u64) {
        self.state.lock().unwrap().block += blocks;
    }

    pub fn block(&self) -> u64 {
        self.state.lock().unwrap().block
    }

    pub fn delay_head(&self, delay: Duration) {
        self.state.lock().unwrap().head_delay = Some(delay);
    }

    /// Append a raw event in a new block
    pub fn emit(&self, kind: TokenKind, tx_hash: &str, event: RawZkTransferEvent) {
        let mut s = self.state.lock().unwrap();
        s.block += 1;
        let block = s.block;
        s.events.push((block, kind, tx_hash.to_string(), event));
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn approvals(&self) -> Vec<Approval> {
        self.state.lock().unwrap().approvals.clone()
    }

    fn approve(&self, standard: &'static str, token: &Address, value: &BigUint) -> String {
        let mut s = self.state.lock().unwrap();
        s.approvals.push(Approval {
            standard,
            token: *token,
            value: value.clone(),
        });
        format!("0xapprove{}", s.approvals.len())
    }

    pub fn event_queries(&self) -> Vec<(TokenKind, u64, u64)> {
        self.state.lock().unwrap().event_queries.clone()
    }

    fn apply(&self, method: &'static str, kind: TokenKind, args: &ContractArgs, value: &BigUint) -> String {
        let mut s = self.state.lock().unwrap();
        let inputs = &args.inputs;
        let sn = strip(&inputs[1]);
        let ena = strip(&inputs[2]);
        let cm = inputs[6].clone();

        if let Some(token) = &args.token_address {
            let token: Address = token.parse().unwrap();
            s.ciphertexts.insert(
                (token, ena),
                RawSymmetricCiphertext {
                    r: strip(&inputs[7]),
                    ct: strip(&inputs[8]),
                },
            );
        }
        s.nullified.insert(sn);

        s.leaves += 1;
        s.block += 1;
        let tx_hash = format!("0x{:064x}", s.submissions.len() + 1);
        let event = RawZkTransferEvent {
            ct: inputs[inputs.len() - 9..].to_vec(),
            com: cm,
            token_address: args
                .token_address
                .as_deref()
                .map(|t| t.parse().unwrap())
                .unwrap_or(Address::ZERO),
            index: s.leaves.to_string(),
        };
        let block = s.block;
        s.events.push((block, kind, tx_hash.clone(), event));
        s.submissions.push(Submission {
            method,
            args: args.clone(),
            value: value.clone(),
        });
        tx_hash
    }
}

impl Ledger for MockLedger {
    async fn get_root_top(&self) -> Result<String> {
        let mut s = self.state.lock().unwrap();
        if s.roots.len() > 1 {
            Ok(s.roots.pop_front().unwrap())
        } else {
            Ok(s.roots.front().cloned().unwrap_or_default())
        }
    }

    async fn get_merkle_path(&self, _index: u64) -> Result<Vec<String>> {
        Ok(vec!["0".repeat(64); TREE_DEPTH])
    }

    async fn get_ciphertext(&self, token: &Address, ena: &str) -> Result<RawSymmetricCiphertext> {
        let s = self.state.lock().unwrap();
        Ok(s.ciphertexts
            .get(&(*token, strip(ena)))
            .cloned()
            .unwrap_or(RawSymmetricCiphertext {
                r: "0".into(),
                ct: "0".into(),
            }))
    }

    async fn get_apk(&self) -> Result<RawAffinePoint> {
        self.state
            .lock()
            .unwrap()
            .apk
            .clone()
            .ok_or_else(|| WalletError::Ledger("auditor not registered".into()))
    }

    async fn is_nullified(&self, sn: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().nullified.contains(&strip(sn)))
    }

    async fn get_user_public_keys(&self, eoa: &Address) -> Result<Option<RawUserPublicKey>> {
        Ok(self.state.lock().unwrap().users.get(eoa).cloned())
    }

    async fn block_number(&self) -> Result<u64> {
        let delay = self.state.lock().unwrap().head_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.block())
    }

    async fn zk_transfer_events(&self, kind: TokenKind, from: u64, to: u64) -> Result<Vec<RawZkTransferEvent>> {
        let mut s = self.state.lock().unwrap();
        s.event_queries.push((kind, from, to));
        Ok(s.events
            .iter()
            .filter(|(block, k, _, _)| *k == kind && (from..=to).contains(block))
            .map(|(_, _, _, e)| e.clone())
            .collect())
    }

    async fn zk_transfer_events_for_tx(&self, kind: TokenKind, tx_hash: &str) -> Result<Vec<RawZkTransferEvent>> {
        let s = self.state.lock().unwrap();
        Ok(s.events
            .iter()
            .filter(|(_, k, tx, _)| *k == kind && tx == tx_hash)
            .map(|(_, _, _, e)| e.clone())
            .collect())
    }

    async fn submit_zk_transfer(&self, args: &ContractArgs, value: &BigUint) -> Result<String> {
        Ok(self.apply("zkTransfer", TokenKind::Ft, args, value))
    }

    async fn submit_zk_transfer_nft(&self, args: &ContractArgs) -> Result<String> {
        Ok(self.apply("zkTransferNft", TokenKind::Nft, args, &BigUint::default()))
    }

    async fn register_user(&self, pk: &RawUserPublicKey) -> Result<String> {
        let mut s = self.state.lock().unwrap();
        s.users.insert(Address::ZERO, pk.clone());
        Ok("0xregister".into())
    }

    async fn approve_erc20(&self, token: &Address, amount: &BigUint) -> Result<String> {
        Ok(self.approve("erc20", token, amount))
    }

    async fn approve_nft(&self, token: &Address, token_id: &BigUint) -> Result<String> {
        Ok(self.approve("erc721", token, token_id))
    }
}

fn fq_hex(f: &Fq) -> String {
    hex::encode(f.into_bigint().to_bytes_be())
}

/// BN254 generators laid out the way the prover returns them
pub fn generator_proof() -> RawProof {
    let g1 = G1Affine::generator();
    let g2 = G2Affine::generator();
    RawProof {
        a: [fq_hex(&g1.x), fq_hex(&g1.y)],
        b: [
            [fq_hex(&g2.x.c1), fq_hex(&g2.x.c0)],
            [fq_hex(&g2.y.c1), fq_hex(&g2.y.c0)],
        ],
        c: [fq_hex(&g1.x), fq_hex(&g1.y)],
    }
}

/// Prover double; answers with generator points
#[derive(Clone)]
pub struct MockProver {
    pub status: String,
    pub delay: Option<Duration>,
    pub witnesses: Arc<Mutex<Vec<String>>>,
}

impl Default for MockProver {
    fn default() -> Self {
        Self {
            status: "success".into(),
            delay: None,
            witnesses: Arc::default(),
        }
    }
}

impl ProofClient for MockProver {
    async fn run_proof(&self, _kind: TokenKind, witness_json: &str) -> std::result::Result<RawProof, WitnessError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.witnesses.lock().unwrap().push(witness_json.to_string());
        Ok(generator_proof())
    }

    async fn run_verify(
        &self,
        _kind: TokenKind,
        _proof: &RawProof,
        _witness_json: &str,
    ) -> std::result::Result<String, WitnessError> {
        Ok(self.status.clone())
    }
}

pub type TestWallet = Wallet<MockLedger, MockProver, MemoryNoteStore>;

pub struct Harness {
    pub suite: CryptoSuite,
    pub ledger: MockLedger,
    pub auditor: AuditKey,
    pub rng: StdRng,
}

impl Harness {
    pub fn new(seed: u64) -> Self {
        let suite = CryptoSuite::new(CurveKind::BabyJubjub).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let auditor = AuditKey::key_gen(&suite, &mut rng).unwrap();
        let ledger = MockLedger::new(auditor.pk.to_raw());
        Self {
            suite,
            ledger,
            auditor,
            rng,
        }
    }

    pub fn wallet(&mut self, eoa: Address) -> TestWallet {
        self.wallet_with(eoa, MockProver::default())
    }

    pub fn wallet_with(&mut self, eoa: Address, prover: MockProver) -> TestWallet {
        let key = UserKey::key_gen(&self.suite, &mut self.rng).unwrap();
        self.ledger.register(eoa, key.pk.to_raw());
        Wallet::new(
            self.suite.clone(),
            self.ledger.clone(),
            prover,
            MemoryNoteStore::new(),
            key,
            Some(eoa),
        )
    }
}

impl Harness {
    /// Wallet with a shielded identity but no public account
    pub fn wallet_without_account(&mut self) -> TestWallet {
        let key = UserKey::key_gen(&self.suite, &mut self.rng).unwrap();
        Wallet::new(
            self.suite.clone(),
            self.ledger.clone(),
            MockProver::default(),
            MemoryNoteStore::new(),
            key,
            None,
        )
    }
}

pub fn eoa(byte: u8) -> Address {
    Address([byte; 20])
}

pub fn ctx() -> CallContext {
    CallContext::new()
}
