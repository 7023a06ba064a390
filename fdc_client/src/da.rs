//! Proof fetcher against the Data-Availability Layer.
//!
//! Two-tier polling. The outer loop is the bounded retry budget: any error
//! (unreachable service, non-200, undecodable body) abandons the current
//! attempt and restarts the whole fetch after a delay. The inner loop is the
//! expected wait state: a well-formed response without the payload field
//! means the proof is still being assembled, so we just ask again. The two
//! must stay separate — folding "not ready" into the error path would abandon
//! valid in-progress rounds, and folding errors into the wait state would
//! hammer a broken service forever.

use log::{debug, info, warn};
use serde::Serialize;
use tokio::time::sleep;

use crate::config::FdcConfig;
use crate::error::FdcError;
use crate::types::{EncodedAttestation, Proof, RoundId};

const PROOF_PATH: &str = "/api/v1/fdc/proof-by-request-round";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofRequest<'a> {
    round_id: u64,
    request_payload_hex: &'a str,
}

pub struct DaLayerClient {
    cfg: FdcConfig,
    client: reqwest::Client,
}

impl DaLayerClient {
    pub fn new(cfg: &FdcConfig) -> Result<Self, FdcError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .map_err(|e| FdcError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            cfg: cfg.clone(),
            client,
        })
    }

    /// Fetch the proof for a finalized round, retrying the whole operation
    /// up to the configured budget. Exhaustion yields `ProofRetrieval`
    /// carrying the attempt count; no request is sent after the final
    /// failure.
    pub async fn fetch_proof(
        &self,
        round_id: RoundId,
        request: &EncodedAttestation,
    ) -> Result<Proof, FdcError> {
        let attempts = self.cfg.proof_retry_attempts.max(1);
        let mut last_error = String::from("no attempts made");
        for attempt in 1..=attempts {
            match self.poll_until_ready(round_id, request).await {
                Ok(proof) => {
                    info!(
                        "proof for round {round_id} retrieved ({} merkle elements)",
                        proof.merkle_proof_elements.len()
                    );
                    return Ok(proof);
                }
                Err(err) => {
                    warn!("proof retrieval attempt {attempt}/{attempts} failed: {err}");
                    last_error = err;
                    if attempt < attempts {
                        sleep(self.cfg.proof_retry_delay).await;
                    }
                }
            }
        }
        Err(FdcError::ProofRetrieval {
            attempts,
            last_error,
        })
    }

    /// One outer attempt: repeat the request until the payload is populated.
    /// Unbounded on purpose — "not yet computed" is not a failure.
    async fn poll_until_ready(
        &self,
        round_id: RoundId,
        request: &EncodedAttestation,
    ) -> Result<Proof, String> {
        loop {
            let proof = self.request_proof(round_id, request).await?;
            if proof.is_ready() {
                return Ok(proof);
            }
            debug!("round {round_id} proof not assembled yet");
            sleep(self.cfg.proof_poll_interval).await;
        }
    }

    async fn request_proof(
        &self,
        round_id: RoundId,
        request: &EncodedAttestation,
    ) -> Result<Proof, String> {
        let url = format!("{}{PROOF_PATH}", self.cfg.da_layer_url.trim_end_matches('/'));
        let body = ProofRequest {
            round_id: round_id.0,
            request_payload_hex: request.as_hex(),
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("proof request failed: {e}"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("proof response unreadable: {e}"))?;
        if !status.is_success() {
            return Err(format!(
                "proof endpoint returned status {}: {text}",
                status.as_u16()
            ));
        }
        serde_json::from_str(&text).map_err(|e| format!("undecodable proof response: {e}"))
    }
}
