use std::env;
use std::fs;

use anyhow::{Context, Result, anyhow, bail};
use zkpocket_config::PocketConfig;
use zkpocket_core::ledger::types::word_to_hex;
use zkpocket_core::{
    CallContext, EncryptedFileSecretStore, HttpTransport, RocksNoteStore, SecretStore,
    ShieldedPoolContract, Wallet,
};
use zkpocket_privacy::{
    Address, AuditKey, CryptoSuite, PublicKeyCiphertext, PublicKeyEncryption, RawAffinePoint,
    RawPublicKeyCiphertext, TokenKind, UserKey, View,
};
use zkpocket_prover::{HttpProofClient, ProverClientConfig};

type CliWallet = Wallet<ShieldedPoolContract<HttpTransport>, HttpProofClient, RocksNoteStore>;

const PASSPHRASE_VAR: &str = "ZKP_PASSPHRASE";

fn secret_store(config: &PocketConfig) -> Result<EncryptedFileSecretStore> {
    let passphrase = env::var(PASSPHRASE_VAR)
        .map_err(|_| anyhow!("{PASSPHRASE_VAR} must be set to open the secret file"))?;
    Ok(EncryptedFileSecretStore::new(&config.storage.secret_path, passphrase))
}

fn eoa(config: &PocketConfig) -> Result<Option<Address>> {
    config
        .ledger
        .from
        .as_deref()
        .map(|s| s.parse().context("Invalid ledger.from address"))
        .transpose()
}

fn open_wallet(config: &PocketConfig) -> Result<CliWallet> {
    let suite = CryptoSuite::new(config.curve.kind)?;
    let contract: Address = config
        .ledger
        .contract_address
        .parse()
        .context("Invalid ledger.contract_address")?;
    let from = eoa(config)?;

    let transport = HttpTransport::new(&config.ledger.rpc_url, contract, from, config.call_timeout())?;
    let prover = HttpProofClient::new(ProverClientConfig {
        base_url: config.prover.url.clone(),
        proof_timeout: config.proof_timeout(),
    })?;
    let store = RocksNoteStore::open(&config.storage.db_path)
        .with_context(|| format!("Failed to open note database at {}", config.storage.db_path))?;

    let wallet = Wallet::from_secret_store(
        suite,
        ShieldedPoolContract::new(transport),
        prover,
        store,
        &secret_store(config)?,
        from,
    )?;
    Ok(wallet)
}

fn save_key(config: &PocketConfig, key: &UserKey) -> Result<()> {
    let secrets = secret_store(config)?;
    secrets.store_secret(&key.sk.to_padded_hex())?;
    println!("✅ Wrote encrypted secret to {}", secrets.path().display());
    println!("🔑 Public key:");
    println!("{}", serde_json::to_string_pretty(&key.pk.to_raw())?);
    Ok(())
}

pub fn keygen(config: &PocketConfig) -> Result<()> {
    let secrets = secret_store(config)?;
    if secrets.path().exists() {
        bail!(
            "Secret file {} already exists. Remove it first or point ZKP_SECRET_PATH elsewhere.",
            secrets.path().display()
        );
    }

    println!("🔐 Generating new user key...");
    let suite = CryptoSuite::new(config.curve.kind)?;
    let key = UserKey::key_gen(&suite, &mut rand::thread_rng())?;
    save_key(config, &key)
}

pub fn recover(config: &PocketConfig, sk: &str) -> Result<()> {
    let suite = CryptoSuite::new(config.curve.kind)?;
    let sk = suite.field().from_hex(&word_to_hex(sk)?)?;
    let key = UserKey::recover_from_user_sk(&suite, sk)?;
    save_key(config, &key)
}

pub fn audit_keygen(config: &PocketConfig) -> Result<()> {
    let suite = CryptoSuite::new(config.curve.kind)?;
    let key = AuditKey::key_gen(&suite, &mut rand::thread_rng())?;
    println!("{}", serde_json::to_string_pretty(&key.to_raw())?);
    Ok(())
}

/// Auditor view of `[c0.x, c0.y, c1.x, c1.y, c2.x, c2.y, c3...]`
pub fn decrypt_audit(config: &PocketConfig, sk: &str, words: &[String]) -> Result<()> {
    if words.len() < 7 {
        bail!("expected at least 7 ciphertext words, got {}", words.len());
    }
    let words = words
        .iter()
        .map(|w| word_to_hex(w))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let point = |i: usize| RawAffinePoint {
        x: words[i].clone(),
        y: words[i + 1].clone(),
    };
    let raw = RawPublicKeyCiphertext {
        c0: point(0),
        c1: point(2),
        c2: point(4),
        c3: words[6..].to_vec(),
    };

    let suite = CryptoSuite::new(config.curve.kind)?;
    let auditor = AuditKey::from_sk(&suite, suite.field().from_hex(&word_to_hex(sk)?)?)?;
    let ct = PublicKeyCiphertext::parse(suite.curve(), &raw)?;
    let plain = PublicKeyEncryption::new(suite.curve(), suite.hasher()).decrypt(&ct, &auditor.sk, View::Auditor)?;

    for (label, value) in ["open", "bal", "addr"].iter().zip(&plain) {
        println!("{label:>5}: {}", value.to_padded_hex());
    }
    Ok(())
}

pub async fn balance(config: &PocketConfig, token: Option<&str>) -> Result<()> {
    let token: Address = match token {
        Some(t) => t.parse().context("Invalid token address")?,
        None => Address::ZERO,
    };
    let wallet = open_wallet(config)?;
    let ctx = CallContext::with_timeout(config.call_timeout());
    let bal = wallet.private_balance(&ctx, &token).await?;
    println!("💰 Private balance of {}: {}", token, bal);
    Ok(())
}

pub async fn sync(config: &PocketConfig) -> Result<()> {
    let wallet = open_wallet(config)?;
    let ctx = CallContext::new();

    for report in wallet.sync(&ctx).await? {
        match report.range {
            Some((from, to)) => println!(
                "🔄 {} [{from}, {to}]: {} events, {} stored, {} newly spent",
                report.kind, report.events, report.notes_stored, report.newly_spent
            ),
            None => println!("✅ {} notes up to date", report.kind),
        }
    }

    for kind in TokenKind::ALL {
        let notes = wallet.unspent_notes(kind)?;
        println!("{} unspent {} notes", notes.len(), kind);
        for note in notes {
            println!(
                "  #{:<6} {} bal={} token={}",
                note.idx,
                note.cm,
                note.bal.to_hex(),
                note.token_address
            );
        }
    }
    Ok(())
}

pub async fn register(config: &PocketConfig) -> Result<()> {
    let wallet = open_wallet(config)?;
    let ctx = CallContext::with_timeout(config.call_timeout());
    match wallet.register(&ctx).await?.tx_hash() {
        Some(tx) => println!("✅ Registered public key in {}", tx),
        None => println!("⚠️  Registration skipped: context cancelled"),
    }
    Ok(())
}

pub fn config_sample(path: Option<&str>) -> Result<()> {
    let sample = PocketConfig::generate_sample();
    match path {
        Some(path) => {
            fs::write(path, &sample).with_context(|| format!("Failed to write {path}"))?;
            println!("✅ Wrote sample config to {}", path);
        }
        None => print!("{}", sample),
    }
    Ok(())
}
