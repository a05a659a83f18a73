//! zkpocket Configuration
//!
//! Handles loading configuration from:
//! 1. ZKP_CONFIG env var (explicit path)
//! 2. ./config.toml (current directory)
//! 3. ~/.zkpocket/config.toml (user home)
//!
//! Environment variables take precedence over TOML config. The loaded
//! [`PocketConfig`] is passed to constructors; there is no global instance.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use zkpocket_privacy::CurveKind;

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".zkpocket";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_CONTRACT: &str = "0x0000000000000000000000000000000000000000";
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROVER_URL: &str = "http://127.0.0.1:8090";
const DEFAULT_PROOF_TIMEOUT_SECS: u64 = 120;
const DEFAULT_DB_PATH: &str = "./zkpocket-db";
const DEFAULT_SECRET_PATH: &str = "./zkpocket-secret.bin";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocketConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub curve: CurveConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Ledger node and pool contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Shielded pool contract address
    #[serde(default = "default_contract")]
    pub contract_address: String,
    /// Public account that signs submissions
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.into(),
            contract_address: DEFAULT_CONTRACT.into(),
            from: None,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
        }
    }
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.into()
}
fn default_contract() -> String {
    DEFAULT_CONTRACT.into()
}
fn default_call_timeout() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

/// Curve parameter set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveConfig {
    #[serde(default)]
    pub kind: CurveKind,
}

/// Prover service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    #[serde(default = "default_prover_url")]
    pub url: String,
    #[serde(default = "default_proof_timeout")]
    pub proof_timeout_secs: u64,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PROVER_URL.into(),
            proof_timeout_secs: DEFAULT_PROOF_TIMEOUT_SECS,
        }
    }
}

fn default_prover_url() -> String {
    DEFAULT_PROVER_URL.into()
}
fn default_proof_timeout() -> u64 {
    DEFAULT_PROOF_TIMEOUT_SECS
}

/// Local persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Encrypted user secret file
    #[serde(default = "default_secret_path")]
    pub secret_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.into(),
            secret_path: DEFAULT_SECRET_PATH.into(),
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.into()
}
fn default_secret_path() -> String {
    DEFAULT_SECRET_PATH.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Variable lookup; the process environment outside tests
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Set field from a variable if present
fn env_string(lookup: Lookup, key: &str, field: &mut String) {
    if let Some(v) = lookup(key) {
        *field = v;
    }
}

/// Set Option<String> from a variable if present
fn env_option_string(lookup: Lookup, key: &str, field: &mut Option<String>) {
    if let Some(v) = lookup(key) {
        *field = Some(v);
    }
}

/// Set field from a variable if present and parseable
fn env_parse<T: std::str::FromStr>(lookup: Lookup, key: &str, field: &mut T) {
    if let Some(v) = lookup(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl PocketConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("ZKP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("ZKP_CONFIG points to missing file: {}", path.display());
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(&|key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides(&mut self, lookup: Lookup) {
        // Ledger
        env_string(lookup, "ZKP_RPC_URL", &mut self.ledger.rpc_url);
        env_string(lookup, "ZKP_CONTRACT", &mut self.ledger.contract_address);
        env_option_string(lookup, "ZKP_FROM", &mut self.ledger.from);
        env_parse(lookup, "ZKP_CALL_TIMEOUT_SECS", &mut self.ledger.call_timeout_secs);

        // Curve
        env_parse(lookup, "ZKP_CURVE", &mut self.curve.kind);

        // Prover
        env_string(lookup, "ZKP_PROVER_URL", &mut self.prover.url);
        env_parse(lookup, "ZKP_PROOF_TIMEOUT_SECS", &mut self.prover.proof_timeout_secs);

        // Storage
        env_string(lookup, "ZKP_DB_PATH", &mut self.storage.db_path);
        env_string(lookup, "ZKP_SECRET_PATH", &mut self.storage.secret_path);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.ledger.from = Some(DEFAULT_CONTRACT.into());
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger.call_timeout_secs)
    }

    pub fn proof_timeout(&self) -> Duration {
        Duration::from_secs(self.prover.proof_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
