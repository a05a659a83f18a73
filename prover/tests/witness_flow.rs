use std::sync::Mutex;

use ark_bn254::{Fq, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use zkpocket_privacy::{
    Address, AuditKey, CryptoSuite, CurveKind, Pocket, SymmetricKeyEncryption, TREE_DEPTH,
    TokenKind, TxType, UserKey,
};
use zkpocket_prover::{
    ChainState, ProofClient, RawProof, SnarkInput, TransferKeys, WitnessBuilder, WitnessError,
    ZkTransferParam, generate_proof, old_note_or_placeholder,
};

fn fq(f: &Fq) -> String {
    hex::encode(f.into_bigint().to_bytes_be())
}

fn generator_proof() -> RawProof {
    let g1 = G1Affine::generator();
    let g2 = G2Affine::generator();
    RawProof {
        a: [fq(&g1.x), fq(&g1.y)],
        b: [[fq(&g2.x.c1), fq(&g2.x.c0)], [fq(&g2.y.c1), fq(&g2.y.c0)]],
        c: [fq(&g1.x), fq(&g1.y)],
    }
}

struct CannedProver {
    status: &'static str,
    seen: Mutex<Vec<(TokenKind, String)>>,
}

impl CannedProver {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ProofClient for CannedProver {
    async fn run_proof(&self, kind: TokenKind, witness_json: &str) -> Result<RawProof, WitnessError> {
        self.seen.lock().unwrap().push((kind, witness_json.to_string()));
        Ok(generator_proof())
    }

    async fn run_verify(&self, _kind: TokenKind, _proof: &RawProof, _witness_json: &str) -> Result<String, WitnessError> {
        Ok(self.status.to_string())
    }
}

struct Fixture {
    suite: CryptoSuite,
    rng: StdRng,
    keys: TransferKeys,
}

fn fixture() -> Fixture {
    let suite = CryptoSuite::new(CurveKind::BabyJubjub).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let auditor = AuditKey::key_gen(&suite, &mut rng).unwrap();
    let sender = UserKey::key_gen(&suite, &mut rng).unwrap();
    let receiver = UserKey::key_gen(&suite, &mut rng).unwrap();
    let keys = TransferKeys {
        auditor_pk: auditor.pk,
        sender,
        receiver: receiver.pk,
    };
    Fixture { suite, rng, keys }
}

fn chain(suite: &CryptoSuite) -> ChainState {
    let f = suite.field();
    ChainState {
        root: f.from_u64(77),
        siblings: vec![f.zero(); TREE_DEPTH],
        old_sct: None,
    }
}

fn ft_input(fx: &mut Fixture, pocket: &Pocket, funded: u64) -> SnarkInput {
    let mut state = chain(&fx.suite);
    if funded > 0 {
        let senc = SymmetricKeyEncryption::new(fx.suite.hasher(), &fx.keys.sender.sk);
        state.old_sct = Some(senc.encrypt(&fx.suite.field().from_u64(funded), &mut fx.rng));
    }
    let note = old_note_or_placeholder(
        &fx.suite,
        &fx.keys.sender,
        None,
        Address::ZERO,
        TokenKind::Ft,
        &mut fx.rng,
    );
    WitnessBuilder::new(&fx.suite)
        .build_ft(&fx.keys, pocket, &note, state, &mut fx.rng)
        .unwrap()
}

fn keys_of(json: &str) -> Vec<String> {
    let value: Value = serde_json::from_str(json).unwrap();
    value.as_object().unwrap().keys().cloned().collect()
}

#[test]
fn fungible_witness_carries_balance_ciphertexts() {
    let mut fx = fixture();
    let input = ft_input(&mut fx, &Pocket::from_type(TxType::Transfer, 30u64), 100);
    assert!(input.is_fungible());

    let keys = keys_of(&input.to_snark_json().unwrap());
    assert_eq!(keys.len(), 28);
    assert!(keys.contains(&"cin".to_string()));
    assert!(keys.contains(&"cout".to_string()));

    let senc = SymmetricKeyEncryption::new(fx.suite.hasher(), &fx.keys.sender.sk);
    let new_sct = input.ciphertexts.new_sct.as_ref().unwrap();
    assert_eq!(senc.decrypt(new_sct), fx.suite.field().from_u64(70));
}

#[test]
fn nft_witness_omits_balance_ciphertexts() {
    let mut fx = fixture();
    let token = Address([0x33; 20]);
    let note = old_note_or_placeholder(&fx.suite, &fx.keys.sender, None, token, TokenKind::Nft, &mut fx.rng);
    let input = WitnessBuilder::new(&fx.suite)
        .build_nft(
            &fx.keys,
            &Pocket::from_type(TxType::NftPublicToPrivate, 12u64),
            &token,
            &note,
            chain(&fx.suite),
            &mut fx.rng,
        )
        .unwrap();
    assert!(!input.is_fungible());

    let value: Value = serde_json::from_str(&input.to_snark_json().unwrap()).unwrap();
    let map = value.as_object().unwrap();
    assert_eq!(map.len(), 26);
    assert!(!map.contains_key("cin"));
    assert_eq!(map["dv_"], Value::String(format!("{}{}{:0>22}", "00", "33".repeat(20), "c")));
    assert_eq!(map["intermediateHashes"].as_object().unwrap().len(), TREE_DEPTH);
}

#[test]
fn tampered_receiver_is_rejected() {
    let mut fx = fixture();
    fx.keys.receiver.ena = fx.suite.field().from_u64(1);
    let note = old_note_or_placeholder(
        &fx.suite,
        &fx.keys.sender,
        None,
        Address::ZERO,
        TokenKind::Ft,
        &mut fx.rng,
    );
    let res = WitnessBuilder::new(&fx.suite).build_ft(
        &fx.keys,
        &Pocket::from_type(TxType::Charge, 1u64),
        &note,
        chain(&fx.suite),
        &mut fx.rng,
    );
    assert!(matches!(res, Err(WitnessError::Crypto(_))));
}

#[tokio::test]
async fn proof_is_generated_then_laid_out_for_the_contract() {
    let mut fx = fixture();
    let input = ft_input(&mut fx, &Pocket::from_type(TxType::Charge, 9u64), 0);
    let prover = CannedProver::new("success");

    let proof = generate_proof(&prover, TokenKind::Ft, &input).await.unwrap();
    assert_eq!(prover.seen.lock().unwrap()[0].0, TokenKind::Ft);

    let receiver = Address([0x44; 20]);
    let args = ZkTransferParam::from_input(proof, &input, Some(receiver), Address::ZERO).to_contract_args();
    assert_eq!(args.proof.len(), 8);
    assert_eq!(args.inputs.len(), 20);
    assert_eq!(args.inputs[0], input.merkle.root.to_prefixed_hex());
    assert_eq!(args.inputs[1], input.nullifier.to_field().to_prefixed_hex());
    assert_eq!(args.inputs[6], input.commitments.new_cm.to_field().to_prefixed_hex());
    assert_eq!(args.inputs[9], format!("0x{:064x}", 9));
    assert_eq!(args.inputs[10], format!("0x{:064x}", 0));
    assert_eq!(args.receiver, receiver.to_string());
    assert_eq!(args.token_address, Some(Address::ZERO.to_string()));
}

#[tokio::test]
async fn rejected_verification_yields_no_proof() {
    let mut fx = fixture();
    let input = ft_input(&mut fx, &Pocket::from_type(TxType::Charge, 9u64), 0);
    let prover = CannedProver::new("invalid proof");

    let err = generate_proof(&prover, TokenKind::Ft, &input).await.unwrap_err();
    assert_eq!(err, WitnessError::ProofVerificationFailed("invalid proof".into()));
}
