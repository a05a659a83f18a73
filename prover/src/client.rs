//! Prover Service Client
//!
//! HTTP client for the external SNARK prover/verifier.
//!
//! ```text
//! POST {base}/v1/{ft|nft}/prove    { witness }          -> RawProof
//! POST {base}/v1/{ft|nft}/verify   { proof, witness }   -> { lastmsg }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};
use zkpocket_privacy::TokenKind;

use crate::error::{Result, WitnessError};
use crate::proof::{ProofClient, RawProof};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the prover client
#[derive(Debug, Clone)]
pub struct ProverClientConfig {
    /// Base URL of the prover service (e.g., "http://localhost:8090")
    pub base_url: String,
    /// Timeout for a single prove or verify call
    pub proof_timeout: Duration,
}

impl Default for ProverClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            proof_timeout: Duration::from_secs(120),
        }
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ProveRequest<'a> {
    pub witness: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest<'a> {
    pub proof: &'a RawProof,
    pub witness: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub lastmsg: String,
}

/// API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Success { data: T },
    Error { message: String, code: Option<String> },
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        match self {
            ApiResponse::Success { data } => Ok(data),
            ApiResponse::Error { message, code } => Err(WitnessError::Prover(format!(
                "({}): {}",
                code.unwrap_or_else(|| "unknown".to_string()),
                message
            ))),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the prover service
pub struct HttpProofClient {
    config: ProverClientConfig,
    client: reqwest::Client,
}

impl HttpProofClient {
    pub fn new(config: ProverClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.proof_timeout)
            .build()
            .map_err(|e| WitnessError::Prover(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, kind: TokenKind, action: &str) -> String {
        format!(
            "{}/v1/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            kind,
            action
        )
    }

    async fn post<B: Serialize, T: for<'de> Deserialize<'de>>(&self, url: &str, body: &B) -> Result<T> {
        let call = async {
            let response = self
                .client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| WitnessError::Prover(format!("failed to reach prover: {e}")))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(WitnessError::Prover(format!("prover returned {status}: {body}")));
            }

            let api: ApiResponse<T> = response
                .json()
                .await
                .map_err(|e| WitnessError::Prover(format!("failed to parse prover response: {e}")))?;
            api.into_result()
        };

        match timeout(self.config.proof_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("prover call to {} timed out after {:?}", url, self.config.proof_timeout);
                Err(WitnessError::Prover(format!(
                    "timed out after {:?}",
                    self.config.proof_timeout
                )))
            }
        }
    }
}

impl ProofClient for HttpProofClient {
    async fn run_proof(&self, kind: TokenKind, witness_json: &str) -> Result<RawProof> {
        let url = self.url(kind, "prove");
        debug!("POST {}", url);
        self.post(&url, &ProveRequest { witness: witness_json }).await
    }

    async fn run_verify(&self, kind: TokenKind, proof: &RawProof, witness_json: &str) -> Result<String> {
        let url = self.url(kind, "verify");
        debug!("POST {}", url);
        let response: VerifyResponse = self
            .post(
                &url,
                &VerifyRequest {
                    proof,
                    witness: witness_json,
                },
            )
            .await?;
        Ok(response.lastmsg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let client = HttpProofClient::new(ProverClientConfig {
            base_url: "http://prover:8090/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.url(TokenKind::Nft, "prove"), "http://prover:8090/v1/nft/prove");
    }

    #[test]
    fn test_verify_request_body() {
        let proof = RawProof {
            a: ["1".into(), "2".into()],
            b: [["3".into(), "4".into()], ["5".into(), "6".into()]],
            c: ["7".into(), "8".into()],
        };
        let body = serde_json::to_value(VerifyRequest {
            proof: &proof,
            witness: "{}",
        })
        .unwrap();
        assert_eq!(body["witness"], "{}");
        assert_eq!(body["proof"]["b"][1][0], "5");
    }

    #[test]
    fn test_api_response_decoding() {
        let ok: ApiResponse<VerifyResponse> =
            serde_json::from_str(r#"{"status":"success","data":{"lastmsg":"success"}}"#).unwrap();
        assert_eq!(ok.into_result().unwrap().lastmsg, "success");

        let err: ApiResponse<VerifyResponse> =
            serde_json::from_str(r#"{"status":"error","message":"bad witness","code":null}"#).unwrap();
        assert_eq!(
            err.into_result().unwrap_err(),
            WitnessError::Prover("(unknown): bad witness".into())
        );
    }
}
