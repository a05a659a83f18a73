//! Shielded pool contract bindings over a [`Transport`].

use log::{debug, info};
use num_bigint::BigUint;
use serde_json::{Value, json};
use zkpocket_privacy::{
    Address, RawAffinePoint, RawSymmetricCiphertext, RawUserPublicKey, TokenKind,
};
use zkpocket_prover::ContractArgs;

use crate::error::{Result, WalletError};
use crate::ledger::Ledger;
use crate::ledger::transport::Transport;
use crate::ledger::types::{
    EVENT_ZK_TRANSFER, EVENT_ZK_TRANSFER_NFT, RawZkTransferEvent, parse_word, word_to_hex,
};

fn event_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Ft => EVENT_ZK_TRANSFER,
        TokenKind::Nft => EVENT_ZK_TRANSFER_NFT,
    }
}

/// `0x` + 64 hex digits, the contract's word encoding
fn prefixed(hex: &str) -> Result<String> {
    Ok(format!("0x{}", word_to_hex(&format!("0x{hex}")).map_err(bad_word)?))
}

/// `0x`-prefixed minimal hex, the node's integer encoding
fn quantity(value: &BigUint) -> String {
    format!("0x{}", value.to_str_radix(16))
}

fn bad_word(e: impl std::fmt::Display) -> WalletError {
    WalletError::Ledger(format!("malformed contract word: {e}"))
}

fn as_word(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => word_to_hex(s).map_err(bad_word),
        Value::Number(n) => word_to_hex(&n.to_string()).map_err(bad_word),
        other => Err(bad_word(other)),
    }
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| WalletError::Ledger(format!("{what}: expected an array, got {value}")))
}

fn as_pair(value: &Value, what: &str) -> Result<RawAffinePoint> {
    match as_array(value, what)?.as_slice() {
        [x, y] => Ok(RawAffinePoint {
            x: as_word(x)?,
            y: as_word(y)?,
        }),
        other => Err(WalletError::Ledger(format!(
            "{what}: expected 2 words, got {}",
            other.len()
        ))),
    }
}

fn events_from(value: Value, what: &str) -> Result<Vec<RawZkTransferEvent>> {
    serde_json::from_value(value).map_err(|e| WalletError::Ledger(format!("{what}: {e}")))
}

/// The pool contract, reached through any [`Transport`]
pub struct ShieldedPoolContract<T: Transport> {
    transport: T,
}

impl<T: Transport> ShieldedPoolContract<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Ledger for ShieldedPoolContract<T> {
    async fn get_root_top(&self) -> Result<String> {
        let value = self.transport.call("getRootTop", vec![]).await?;
        as_word(&value)
    }

    async fn get_merkle_path(&self, index: u64) -> Result<Vec<String>> {
        let value = self.transport.call("getMerklePath", vec![json!(index)]).await?;
        as_array(&value, "getMerklePath")?.iter().map(as_word).collect()
    }

    async fn get_ciphertext(&self, token: &Address, ena: &str) -> Result<RawSymmetricCiphertext> {
        let value = self
            .transport
            .call("getCiphertext", vec![json!(token), json!(prefixed(ena)?)])
            .await?;
        // The contract returns (ct, r)
        match as_array(&value, "getCiphertext")?.as_slice() {
            [ct, r] => Ok(RawSymmetricCiphertext {
                r: as_word(r)?,
                ct: as_word(ct)?,
            }),
            other => Err(WalletError::Ledger(format!(
                "getCiphertext: expected 2 words, got {}",
                other.len()
            ))),
        }
    }

    async fn get_apk(&self) -> Result<RawAffinePoint> {
        let value = self.transport.call("getAPK", vec![]).await?;
        // Either [x, y] or [[x, y]]
        match as_array(&value, "getAPK")?.as_slice() {
            [inner @ Value::Array(_)] => as_pair(inner, "getAPK"),
            _ => as_pair(&value, "getAPK"),
        }
    }

    async fn is_nullified(&self, sn: &str) -> Result<bool> {
        let value = self
            .transport
            .call("isNullified", vec![json!(prefixed(sn)?)])
            .await?;
        value
            .as_bool()
            .ok_or_else(|| WalletError::Ledger(format!("isNullified: expected a bool, got {value}")))
    }

    async fn get_user_public_keys(&self, eoa: &Address) -> Result<Option<RawUserPublicKey>> {
        let value = match self.transport.call("getUserPublicKeys", vec![json!(eoa)]).await {
            Ok(v) => v,
            Err(WalletError::Reverted(e)) => {
                debug!("getUserPublicKeys({eoa}) reverted, treating as unregistered: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let fields = as_array(&value, "getUserPublicKeys")?;
        let [ena, pk_own, pk_enc] = fields.as_slice() else {
            return Err(WalletError::Ledger(format!(
                "getUserPublicKeys: expected 3 fields, got {}",
                fields.len()
            )));
        };
        let ena = as_word(ena)?;
        if parse_word(&ena).map_err(bad_word)? == BigUint::default() {
            return Ok(None);
        }
        Ok(Some(RawUserPublicKey {
            ena,
            pk_own: as_word(pk_own)?,
            pk_enc: as_pair(pk_enc, "getUserPublicKeys.pkEnc")?,
        }))
    }

    async fn block_number(&self) -> Result<u64> {
        let value = self.transport.rpc("eth_blockNumber", json!([])).await?;
        let word = match &value {
            Value::String(s) => parse_word(s).map_err(bad_word)?,
            Value::Number(n) => parse_word(&n.to_string()).map_err(bad_word)?,
            other => return Err(bad_word(other)),
        };
        u64::try_from(word).map_err(|_| WalletError::Ledger(format!("block number {value} out of range")))
    }

    async fn zk_transfer_events(&self, kind: TokenKind, from: u64, to: u64) -> Result<Vec<RawZkTransferEvent>> {
        let event = event_name(kind);
        let value = self
            .transport
            .rpc(
                "zkp_getEvents",
                json!([{
                    "address": self.transport.contract(),
                    "event": event,
                    "fromBlock": from,
                    "toBlock": to,
                }]),
            )
            .await?;
        events_from(value, event)
    }

    async fn zk_transfer_events_for_tx(&self, kind: TokenKind, tx_hash: &str) -> Result<Vec<RawZkTransferEvent>> {
        let event = event_name(kind);
        let value = self
            .transport
            .rpc(
                "zkp_getTransactionEvents",
                json!([{
                    "address": self.transport.contract(),
                    "event": event,
                    "txHash": tx_hash,
                }]),
            )
            .await?;
        events_from(value, event)
    }

    async fn submit_zk_transfer(&self, args: &ContractArgs, value: &BigUint) -> Result<String> {
        let tx = self.transport.send("zkTransfer", args.to_values(), value).await?;
        info!("zkTransfer submitted: {tx}");
        Ok(tx)
    }

    async fn submit_zk_transfer_nft(&self, args: &ContractArgs) -> Result<String> {
        let tx = self
            .transport
            .send("zkTransferNft", args.to_values(), &BigUint::default())
            .await?;
        info!("zkTransferNft submitted: {tx}");
        Ok(tx)
    }

    async fn register_user(&self, pk: &RawUserPublicKey) -> Result<String> {
        let args = vec![
            json!(prefixed(&pk.ena)?),
            json!(prefixed(&pk.pk_own)?),
            json!([prefixed(&pk.pk_enc.x)?, prefixed(&pk.pk_enc.y)?]),
        ];
        let tx = self
            .transport
            .send("registerUser", args, &BigUint::default())
            .await?;
        info!("registerUser submitted: {tx}");
        Ok(tx)
    }

    async fn approve_erc20(&self, token: &Address, amount: &BigUint) -> Result<String> {
        let tx = self
            .transport
            .send_to(
                *token,
                "approve",
                vec![json!(self.transport.contract()), json!(quantity(amount))],
                &BigUint::default(),
            )
            .await?;
        info!("approve({token}, {amount}) submitted: {tx}");
        Ok(tx)
    }

    async fn approve_nft(&self, token: &Address, token_id: &BigUint) -> Result<String> {
        let tx = self
            .transport
            .send_to(
                *token,
                "approve",
                vec![json!(self.transport.contract()), json!(quantity(token_id))],
                &BigUint::default(),
            )
            .await?;
        info!("approve({token}, #{token_id}) submitted: {tx}");
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Sent = (Address, String, Vec<Value>, BigUint);

    /// Canned responses keyed by contract method
    #[derive(Default)]
    struct CannedTransport {
        calls: HashMap<&'static str, Value>,
        sent: Mutex<Vec<Sent>>,
        unreachable: bool,
    }

    impl Transport for CannedTransport {
        async fn call(&self, method: &str, _args: Vec<Value>) -> Result<Value> {
            if self.unreachable {
                return Err(WalletError::Ledger(format!("{method}: connection refused")));
            }
            self.calls
                .get(method)
                .cloned()
                .ok_or_else(|| WalletError::Reverted(format!("execution reverted: {method}")))
        }

        async fn send_to(&self, to: Address, method: &str, args: Vec<Value>, value: &BigUint) -> Result<String> {
            self.sent
                .lock()
                .unwrap()
                .push((to, method.to_string(), args, value.clone()));
            Ok("0xtx".into())
        }

        async fn rpc(&self, method: &str, _params: Value) -> Result<Value> {
            match method {
                "eth_blockNumber" => Ok(json!("0x1f")),
                _ => Ok(json!([])),
            }
        }

        fn contract(&self) -> Address {
            Address([0x77; 20])
        }
    }

    #[tokio::test]
    async fn test_decimal_words_and_ct_order() {
        let mut calls = HashMap::new();
        calls.insert("getRootTop", json!("255"));
        calls.insert("getCiphertext", json!(["10", "11"]));
        calls.insert("getAPK", json!([["1", "2"]]));
        let contract = ShieldedPoolContract::new(CannedTransport {
            calls,
            ..Default::default()
        });

        assert!(contract.get_root_top().await.unwrap().ends_with("ff"));
        let sct = contract.get_ciphertext(&Address::ZERO, "01").await.unwrap();
        assert!(sct.ct.ends_with("0a"));
        assert!(sct.r.ends_with("0b"));
        let apk = contract.get_apk().await.unwrap();
        assert!(apk.x.ends_with("01") && apk.y.ends_with("02"));
        assert_eq!(contract.block_number().await.unwrap(), 31);
    }

    #[tokio::test]
    async fn test_unregistered_user() {
        let mut calls = HashMap::new();
        calls.insert("getUserPublicKeys", json!(["0x0", "0x0", ["0x0", "0x0"]]));
        let contract = ShieldedPoolContract::new(CannedTransport {
            calls,
            ..Default::default()
        });
        assert_eq!(contract.get_user_public_keys(&Address::ZERO).await.unwrap(), None);

        let reverting = ShieldedPoolContract::new(CannedTransport::default());
        assert_eq!(reverting.get_user_public_keys(&Address::ZERO).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_outage_is_not_unregistered() {
        let contract = ShieldedPoolContract::new(CannedTransport {
            unreachable: true,
            ..Default::default()
        });
        let err = contract.get_user_public_keys(&Address::ZERO).await.unwrap_err();
        assert!(matches!(err, WalletError::Ledger(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_approvals_target_the_token_contract() {
        let contract = ShieldedPoolContract::new(CannedTransport::default());
        let token = Address([0x55; 20]);
        contract.approve_erc20(&token, &BigUint::from(250u32)).await.unwrap();
        contract.approve_nft(&token, &BigUint::from(7u32)).await.unwrap();

        let sent = contract.transport().sent.lock().unwrap();
        let pool = json!(Address([0x77; 20]));
        for (to, method, args, value) in sent.iter() {
            assert_eq!(*to, token);
            assert_eq!(method, "approve");
            assert_eq!(args[0], pool);
            assert_eq!(*value, BigUint::default());
        }
        assert_eq!(sent[0].2[1], json!("0xfa"));
        assert_eq!(sent[1].2[1], json!("0x7"));
    }

    #[tokio::test]
    async fn test_register_user_pads_words() {
        let contract = ShieldedPoolContract::new(CannedTransport::default());
        let pk = RawUserPublicKey {
            ena: "ab".into(),
            pk_own: "cd".into(),
            pk_enc: RawAffinePoint {
                x: "1".into(),
                y: "2".into(),
            },
        };
        contract.register_user(&pk).await.unwrap();

        let sent = contract.transport().sent.lock().unwrap();
        let (to, method, args, _) = &sent[0];
        assert_eq!(*to, Address([0x77; 20]));
        assert_eq!(method, "registerUser");
        let ena = args[0].as_str().unwrap();
        assert_eq!(ena.len(), 66);
        assert!(ena.ends_with("ab"));
        assert_eq!(args[2].as_array().unwrap().len(), 2);
    }
}
