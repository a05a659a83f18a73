//! Ledger wire shapes and their validated forms.

use num_bigint::BigUint;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use zkpocket_privacy::field::{FIELD_HEX_WIDTH, pad_hex};
use zkpocket_privacy::{
    Address, Commitment, CryptoError, CryptoSuite, PublicKeyCiphertext, RawAffinePoint,
    RawPublicKeyCiphertext,
};

/// Contract events carrying new notes
pub const EVENT_ZK_TRANSFER: &str = "LogZkTransfer";
pub const EVENT_ZK_TRANSFER_NFT: &str = "LogZkTransferNft";

/// Parse a contract word: `0x`-prefixed hex or a decimal string
pub fn parse_word(s: &str) -> Result<BigUint, CryptoError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => Ok(BigUint::default()),
        Some(digits) => BigUint::from_str_radix(digits, 16),
        None => BigUint::from_str_radix(s, 10),
    };
    parsed.map_err(|_| CryptoError::InvalidHex(s.to_string()))
}

/// Contract word as unprefixed 64-digit hex
pub fn word_to_hex(s: &str) -> Result<String, CryptoError> {
    Ok(pad_hex(&parse_word(s)?, FIELD_HEX_WIDTH))
}

/// Event arguments as decoded by the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawZkTransferEvent {
    /// `[c0.x, c0.y, c1.x, c1.y, c2.x, c2.y, c3...]`
    pub ct: Vec<String>,
    /// New note commitment
    pub com: String,
    #[serde(rename = "tokenAddress")]
    pub token_address: Address,
    /// Leaf count after inserting `com`
    pub index: String,
}

/// A decoded `LogZkTransfer` / `LogZkTransferNft`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZkTransferEvent {
    pub pct: PublicKeyCiphertext,
    pub cm: Commitment,
    pub token_address: Address,
    pub index: u64,
}

impl ZkTransferEvent {
    pub fn parse(suite: &CryptoSuite, raw: &RawZkTransferEvent) -> Result<Self, CryptoError> {
        if raw.ct.len() < 7 {
            return Err(CryptoError::PlaintextArity(raw.ct.len().saturating_sub(6)));
        }
        let words = raw
            .ct
            .iter()
            .map(|w| word_to_hex(w))
            .collect::<Result<Vec<_>, _>>()?;
        let point = |i: usize| RawAffinePoint {
            x: words[i].clone(),
            y: words[i + 1].clone(),
        };
        let pct = PublicKeyCiphertext::parse(
            suite.curve(),
            &RawPublicKeyCiphertext {
                c0: point(0),
                c1: point(2),
                c2: point(4),
                c3: words[6..].to_vec(),
            },
        )?;

        let index = parse_word(&raw.index)?;
        let index = u64::try_from(index)
            .map_err(|_| CryptoError::NonCanonical(format!("event index {}", raw.index)))?;

        Ok(Self {
            pct,
            cm: Commitment(suite.field().from_canonical(parse_word(&raw.com)?)?),
            token_address: raw.token_address,
            index,
        })
    }

    /// Tree position of the new note; `None` for the impossible index 0
    pub fn leaf_index(&self) -> Option<u64> {
        self.index.checked_sub(1)
    }
}
