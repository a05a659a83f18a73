//! Storage for the user's secret scalar.
//!
//! The file store follows the Argon2id + ChaCha20Poly1305 layout:
//! `[SALT (32)][NONCE (12)][CIPHERTEXT + TAG]`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result, anyhow};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, OsRng};
use chacha20poly1305::{AeadCore, ChaCha20Poly1305, KeyInit};
use rand::RngCore;

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// Holds the user secret as hex
pub trait SecretStore: Send + Sync {
    fn load_secret(&self) -> Result<Option<String>>;

    fn store_secret(&self, secret_hex: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySecretStore {
    secret: RwLock<Option<String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn load_secret(&self) -> Result<Option<String>> {
        Ok(self
            .secret
            .read()
            .map_err(|_| anyhow!("secret lock poisoned"))?
            .clone())
    }

    fn store_secret(&self, secret_hex: &str) -> Result<()> {
        *self
            .secret
            .write()
            .map_err(|_| anyhow!("secret lock poisoned"))? = Some(secret_hex.to_string());
        Ok(())
    }
}

/// derive encryption key from passphrase using Argon2id
fn derive_key(salt: &[u8; SALT_LEN], passphrase: &str) -> Result<[u8; KEY_LEN]> {
    let params = Params::new(
        2 * 1024, // 2MB memory
        1,        // 1 iteration
        4,        // 4 parallelism
        Some(KEY_LEN),
    )
    .map_err(|e| anyhow!("invalid argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("key derivation failed: {e}"))?;
    Ok(key)
}

fn encrypt(passphrase: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let key = derive_key(&salt, passphrase)?;

    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let cipher = ChaCha20Poly1305::new(&key.into());
    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| anyhow!("encryption failed: {}", e))?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt(passphrase: &str, encrypted: &[u8]) -> Result<Vec<u8>> {
    if encrypted.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(anyhow!("encrypted secret too short"));
    }
    let salt: [u8; SALT_LEN] = encrypted[..SALT_LEN].try_into()?;
    let nonce: [u8; NONCE_LEN] = encrypted[SALT_LEN..SALT_LEN + NONCE_LEN].try_into()?;
    let ciphertext = &encrypted[SALT_LEN + NONCE_LEN..];

    let key = derive_key(&salt, passphrase)?;
    let cipher = ChaCha20Poly1305::new(&key.into());
    cipher
        .decrypt(&nonce.into(), ciphertext)
        .map_err(|_| anyhow!("decryption failed - wrong passphrase?"))
}

/// Passphrase-encrypted secret on disk
pub struct EncryptedFileSecretStore {
    path: PathBuf,
    passphrase: String,
}

impl EncryptedFileSecretStore {
    pub fn new(path: impl AsRef<Path>, passphrase: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            passphrase: passphrase.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretStore for EncryptedFileSecretStore {
    fn load_secret(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let encrypted = fs::read(&self.path)
            .with_context(|| format!("Failed to read secret file: {}", self.path.display()))?;
        let plain = decrypt(&self.passphrase, &encrypted)?;
        let secret = String::from_utf8(plain).context("Secret file is not UTF-8")?;
        Ok(Some(secret))
    }

    fn store_secret(&self, secret_hex: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let encrypted = encrypt(&self.passphrase, secret_hex.as_bytes())?;
        fs::write(&self.path, encrypted)
            .with_context(|| format!("Failed to write secret file: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let store = MemorySecretStore::new();
        assert_eq!(store.load_secret().unwrap(), None);
        store.store_secret("0abc").unwrap();
        assert_eq!(store.load_secret().unwrap().as_deref(), Some("0abc"));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys").join("secret.bin");
        let store = EncryptedFileSecretStore::new(&path, "correct horse");

        assert_eq!(store.load_secret().unwrap(), None);
        store.store_secret("deadbeef").unwrap();
        assert_eq!(store.load_secret().unwrap().as_deref(), Some("deadbeef"));

        let raw = fs::read(&path).unwrap();
        assert_eq!(raw.len(), SALT_LEN + NONCE_LEN + 8 + TAG_LEN);
        assert!(!raw.windows(8).any(|w| w == b"deadbeef"));
    }

    #[test]
    fn test_wrong_passphrase() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.bin");
        EncryptedFileSecretStore::new(&path, "right").store_secret("01").unwrap();

        let err = EncryptedFileSecretStore::new(&path, "wrong")
            .load_secret()
            .unwrap_err();
        assert!(err.to_string().contains("wrong passphrase"));
    }

    #[test]
    fn test_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.bin");
        fs::write(&path, [0u8; 10]).unwrap();
        assert!(EncryptedFileSecretStore::new(&path, "x").load_secret().is_err());
    }
}
