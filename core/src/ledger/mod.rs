//! Ledger access
//!
//! [`Ledger`] is everything the wallet needs from the chain. Values cross
//! this boundary in wire form (unprefixed 64-digit hex and `Raw*` shapes) and
//! are validated by the caller against its curve suite.

pub mod contract;
pub mod transport;
pub mod types;

use std::future::Future;

use num_bigint::BigUint;
use zkpocket_privacy::{
    Address, RawAffinePoint, RawSymmetricCiphertext, RawUserPublicKey, TokenKind,
};
use zkpocket_prover::ContractArgs;

use crate::error::Result;

pub use contract::ShieldedPoolContract;
pub use transport::{HttpTransport, Transport};
pub use types::{RawZkTransferEvent, ZkTransferEvent};

pub trait Ledger: Send + Sync {
    /// Current commitment tree root
    fn get_root_top(&self) -> impl Future<Output = Result<String>> + Send;

    /// Sibling hashes for leaf `index`, leaf level first
    fn get_merkle_path(&self, index: u64) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Encrypted balance of `ena` for `token` (`r = ct = 0` when never funded)
    fn get_ciphertext(
        &self,
        token: &Address,
        ena: &str,
    ) -> impl Future<Output = Result<RawSymmetricCiphertext>> + Send;

    /// Auditor public key
    fn get_apk(&self) -> impl Future<Output = Result<RawAffinePoint>> + Send;

    fn is_nullified(&self, sn: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Registered shielded identity of a public account, if any
    fn get_user_public_keys(
        &self,
        eoa: &Address,
    ) -> impl Future<Output = Result<Option<RawUserPublicKey>>> + Send;

    fn block_number(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Note events in the inclusive block range `[from, to]`
    fn zk_transfer_events(
        &self,
        kind: TokenKind,
        from: u64,
        to: u64,
    ) -> impl Future<Output = Result<Vec<RawZkTransferEvent>>> + Send;

    /// Note events emitted by one transaction
    fn zk_transfer_events_for_tx(
        &self,
        kind: TokenKind,
        tx_hash: &str,
    ) -> impl Future<Output = Result<Vec<RawZkTransferEvent>>> + Send;

    /// Fungible transfer; `value` is attached native currency
    fn submit_zk_transfer(
        &self,
        args: &ContractArgs,
        value: &BigUint,
    ) -> impl Future<Output = Result<String>> + Send;

    fn submit_zk_transfer_nft(&self, args: &ContractArgs) -> impl Future<Output = Result<String>> + Send;

    fn register_user(&self, pk: &RawUserPublicKey) -> impl Future<Output = Result<String>> + Send;

    /// Let the pool pull `amount` of an ERC-20 token from the sender
    fn approve_erc20(
        &self,
        token: &Address,
        amount: &BigUint,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Let the pool take custody of one ERC-721 token
    fn approve_nft(
        &self,
        token: &Address,
        token_id: &BigUint,
    ) -> impl Future<Output = Result<String>> + Send;
}
