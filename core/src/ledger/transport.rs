//! JSON transport to the ledger gateway.
//!
//! ```text
//! call  -> zkp_call            [{ to, method, args }]                -> value
//! send  -> zkp_sendTransaction [{ from, to, method, args, value }]   -> tx hash
//!          (`to` is the pool, or a token contract for approvals)
//! rpc   -> any node method     params                                -> value
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use zkpocket_privacy::Address;

use crate::error::{Result, WalletError};

pub trait Transport: Send + Sync {
    /// Read-only contract call
    fn call(&self, method: &str, args: Vec<Value>) -> impl Future<Output = Result<Value>> + Send;

    /// State-changing call on any contract; returns the transaction hash
    fn send_to(
        &self,
        to: Address,
        method: &str,
        args: Vec<Value>,
        value: &BigUint,
    ) -> impl Future<Output = Result<String>> + Send;

    /// State-changing call on the pool contract
    fn send(
        &self,
        method: &str,
        args: Vec<Value>,
        value: &BigUint,
    ) -> impl Future<Output = Result<String>> + Send {
        self.send_to(self.contract(), method, args, value)
    }

    /// Raw node request
    fn rpc(&self, method: &str, params: Value) -> impl Future<Output = Result<Value>> + Send;

    /// Address of the pool contract this transport targets
    fn contract(&self) -> Address;
}

/// Node error code for a reverted execution
const EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// JSON-RPC 2.0 over HTTP
pub struct HttpTransport {
    url: String,
    contract: Address,
    from: Option<Address>,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: &str, contract: Address, from: Option<Address>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::Ledger(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            url: url.to_string(),
            contract,
            from,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("rpc #{id} {method}");

        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|e| WalletError::Ledger(format!("{method}: {e}")))?;

        if !response.status().is_success() {
            return Err(WalletError::Ledger(format!(
                "{method}: node returned {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Ledger(format!("{method}: invalid response: {e}")))?;

        if let Some(err) = body.error {
            return Err(rpc_failure(method, &err));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }
}

/// Reverts are answers from the contract; anything else is the node failing
fn rpc_failure(method: &str, err: &RpcError) -> WalletError {
    let detail = format!("{method}: {} ({})", err.message, err.code);
    if err.code == EXECUTION_REVERTED || err.message.to_ascii_lowercase().contains("revert") {
        WalletError::Reverted(detail)
    } else {
        WalletError::Ledger(detail)
    }
}

impl Transport for HttpTransport {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.request(
            "zkp_call",
            json!([{ "to": self.contract, "method": method, "args": args }]),
        )
        .await
    }

    async fn send_to(&self, to: Address, method: &str, args: Vec<Value>, value: &BigUint) -> Result<String> {
        let from = self
            .from
            .ok_or_else(|| WalletError::Ledger("no sender account configured".into()))?;
        let result = self
            .request(
                "zkp_sendTransaction",
                json!([{
                    "from": from,
                    "to": to,
                    "method": method,
                    "args": args,
                    "value": format!("0x{}", value.to_str_radix(16)),
                }]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::Ledger(format!("{method}: expected a transaction hash")))
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        self.request(method, params).await
    }

    fn contract(&self) -> Address {
        self.contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_error(code: i64, message: &str) -> RpcError {
        RpcError {
            code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_revert_is_told_apart_from_node_failure() {
        assert!(matches!(
            rpc_failure("zkp_call", &rpc_error(3, "execution reverted")),
            WalletError::Reverted(_)
        ));
        assert!(matches!(
            rpc_failure("zkp_call", &rpc_error(-32000, "VM Exception: Revert")),
            WalletError::Reverted(_)
        ));
        assert_eq!(
            rpc_failure("zkp_call", &rpc_error(-32603, "header not found")),
            WalletError::Ledger("zkp_call: header not found (-32603)".into())
        );
    }
}
