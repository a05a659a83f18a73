//! Pockets
//!
//! Every transaction applies a three-way balance delta:
//!
//! ```text
//! Pocket = { privBal, pubInBal, pubOutBal }
//!
//! privBal    value moved into the new (private) note
//! pubInBal   value entering from the public balance
//! pubOutBal  value leaving to the public balance
//! ```
//!
//! NFT legs that carry no token id hold [`Leg::NoToken`].

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{CryptoError, Result};
use crate::field::{Field, FieldElement, pad_hex, parse_hex};

/// Hex digits reserved for the value in a packed `token || value` leg
pub const PACKED_VALUE_HEX_WIDTH: usize = 22;

/// Transaction type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Charge,
    Withdraw,
    Transfer,
    Update,
    FtPublicToPrivate,
    FtPrivateToPrivate,
    FtPrivateToPublic,
    NftPublicToPrivate,
    NftPrivateToPrivate,
    NftPrivateToPublic,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Charge => "CHARGE",
            TxType::Withdraw => "WITHDRAW",
            TxType::Transfer => "TRANSFER",
            TxType::Update => "UPDATE",
            TxType::FtPublicToPrivate => "FT_PUBLIC_TO_PRIVATE",
            TxType::FtPrivateToPrivate => "FT_PRIVATE_TO_PRIVATE",
            TxType::FtPrivateToPublic => "FT_PRIVATE_TO_PUBLIC",
            TxType::NftPublicToPrivate => "NFT_PUBLIC_TO_PRIVATE",
            TxType::NftPrivateToPrivate => "NFT_PRIVATE_TO_PRIVATE",
            TxType::NftPrivateToPublic => "NFT_PRIVATE_TO_PUBLIC",
        }
    }

    pub fn is_nft(&self) -> bool {
        matches!(
            self,
            TxType::NftPublicToPrivate | TxType::NftPrivateToPrivate | TxType::NftPrivateToPublic
        )
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "CHARGE" => TxType::Charge,
            "WITHDRAW" => TxType::Withdraw,
            "TRANSFER" => TxType::Transfer,
            "UPDATE" => TxType::Update,
            "FT_PUBLIC_TO_PRIVATE" => TxType::FtPublicToPrivate,
            "FT_PRIVATE_TO_PRIVATE" => TxType::FtPrivateToPrivate,
            "FT_PRIVATE_TO_PUBLIC" => TxType::FtPrivateToPublic,
            "NFT_PUBLIC_TO_PRIVATE" => TxType::NftPublicToPrivate,
            "NFT_PRIVATE_TO_PRIVATE" => TxType::NftPrivateToPrivate,
            "NFT_PRIVATE_TO_PUBLIC" => TxType::NftPrivateToPublic,
            other => return Err(CryptoError::InvalidPocketType(other.to_string())),
        })
    }
}

/// One pocket leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leg {
    Value(BigUint),
    /// NFT "no token id" sentinel (`-1` on the wire)
    NoToken,
}

impl Leg {
    pub fn zero() -> Self {
        Leg::Value(BigUint::zero())
    }

    /// Amount for balance arithmetic; the sentinel counts as zero
    pub fn amount(&self) -> BigUint {
        match self {
            Leg::Value(v) => v.clone(),
            Leg::NoToken => BigUint::zero(),
        }
    }

    /// Leg as a field element, rejecting amounts `>= p`
    pub fn to_field(&self, field: &Field) -> Result<FieldElement> {
        field.from_canonical(self.amount())
    }

    /// `token || pad22(value)`, or zero for the sentinel
    pub fn pack(&self, token: &Address, field: &Field) -> Result<FieldElement> {
        match self {
            Leg::NoToken => Ok(field.zero()),
            Leg::Value(v) => {
                let digits = pad_hex(v, PACKED_VALUE_HEX_WIDTH);
                if digits.len() > PACKED_VALUE_HEX_WIDTH {
                    return Err(CryptoError::NonCanonical(format!(
                        "token id {digits} exceeds {PACKED_VALUE_HEX_WIDTH} hex digits"
                    )));
                }
                field.from_canonical(parse_hex(&format!("{}{digits}", token.to_hex()))?)
            }
        }
    }
}

impl From<u64> for Leg {
    fn from(v: u64) -> Self {
        Leg::Value(BigUint::from(v))
    }
}

impl From<BigUint> for Leg {
    fn from(v: BigUint) -> Self {
        Leg::Value(v)
    }
}

/// Balance delta of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pocket {
    pub priv_bal: Leg,
    pub pub_in_bal: Leg,
    pub pub_out_bal: Leg,
}

/// Pocket legs as field elements, in witness order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PocketFields {
    pub priv_bal: FieldElement,
    pub pub_in_bal: FieldElement,
    pub pub_out_bal: FieldElement,
}

impl Pocket {
    pub fn new(priv_bal: impl Into<Leg>, pub_in_bal: impl Into<Leg>, pub_out_bal: impl Into<Leg>) -> Self {
        Self {
            priv_bal: priv_bal.into(),
            pub_in_bal: pub_in_bal.into(),
            pub_out_bal: pub_out_bal.into(),
        }
    }

    /// Canonical triple for a transaction type
    pub fn from_type(tx_type: TxType, value: impl Into<BigUint>) -> Self {
        let v = Leg::Value(value.into());
        let z = Leg::zero;
        let none = || Leg::NoToken;
        match tx_type {
            TxType::Charge => Self::new(z(), v, z()),
            TxType::Withdraw => Self::new(z(), z(), v),
            TxType::Transfer => Self::new(v, z(), z()),
            TxType::Update => Self::new(z(), z(), z()),
            TxType::FtPublicToPrivate => Self::new(v.clone(), v, z()),
            TxType::FtPrivateToPrivate => Self::new(v, z(), z()),
            TxType::FtPrivateToPublic => Self::new(z(), z(), v),
            TxType::NftPublicToPrivate => Self::new(v.clone(), v, none()),
            TxType::NftPrivateToPrivate => Self::new(v, none(), none()),
            TxType::NftPrivateToPublic => Self::new(none(), none(), v),
        }
    }

    /// Like [`Pocket::from_type`] but from a wire tag
    pub fn from_tag(tag: &str, value: impl Into<BigUint>) -> Result<Self> {
        Ok(Self::from_type(tag.parse()?, value))
    }

    /// `[pubInBal, pubOutBal]`
    pub fn to_pub(&self) -> [&Leg; 2] {
        [&self.pub_in_bal, &self.pub_out_bal]
    }

    /// Plain amounts for the fungible path
    pub fn to_fields(&self, field: &Field) -> Result<PocketFields> {
        Ok(PocketFields {
            priv_bal: self.priv_bal.to_field(field)?,
            pub_in_bal: self.pub_in_bal.to_field(field)?,
            pub_out_bal: self.pub_out_bal.to_field(field)?,
        })
    }

    /// Packed `token || value` legs for the NFT path
    pub fn serialize(&self, token: &Address, field: &Field) -> Result<PocketFields> {
        Ok(PocketFields {
            priv_bal: self.priv_bal.pack(token, field)?,
            pub_in_bal: self.pub_in_bal.pack(token, field)?,
            pub_out_bal: self.pub_out_bal.pack(token, field)?,
        })
    }
}
