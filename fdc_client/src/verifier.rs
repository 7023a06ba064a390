//! Request Encoder: client of the attestation verifier service.
//!
//! One synchronous call per attestation attempt; no retry here — if the
//! caller wants a retry policy it wraps this itself. The filter and shape
//! descriptor are not validated locally, correctness is the verifier's job.

use log::info;
use serde::Deserialize;

use crate::config::FdcConfig;
use crate::error::FdcError;
use crate::types::{EncodedAttestation, EncodingRequest};

const PREPARE_PATH: &str = "/verifier/web2/JsonApi/prepareRequest";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    encoded_payload: Option<String>,
}

pub struct VerifierClient {
    cfg: FdcConfig,
    client: reqwest::Client,
}

impl VerifierClient {
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

    /// POST the source parameters to the verifier's prepare endpoint and
    /// return the encoded attestation, or `Encoding` on any failure.
    pub async fn prepare_request(
        &self,
        request: &EncodingRequest,
    ) -> Result<EncodedAttestation, FdcError> {
        let url = self.join(PREPARE_PATH);
        info!("preparing attestation request for {}", request.source_url);
        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.cfg.verifier_api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| FdcError::Encoding(format!("verifier request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FdcError::Encoding(format!("verifier response unreadable: {e}")))?;
        if !status.is_success() {
            return Err(FdcError::Encoding(format!(
                "verifier returned status {status}: {body}"
            )));
        }

        let parsed: PrepareResponse = serde_json::from_str(&body)
            .map_err(|e| FdcError::Encoding(format!("undecodable verifier response: {e}")))?;
        if !parsed.status.eq_ignore_ascii_case("valid") {
            return Err(FdcError::Encoding(format!(
                "verifier rejected request: status {:?}",
                parsed.status
            )));
        }
        let payload = parsed.encoded_payload.ok_or_else(|| {
            FdcError::Encoding("verifier response missing encodedPayload".to_string())
        })?;
        EncodedAttestation::from_hex(&payload)
            .map_err(|e| FdcError::Encoding(format!("verifier returned malformed payload: {e}")))
    }

    fn join(&self, path: &str) -> String {
        let base = self.cfg.verifier_url.trim_end_matches('/');
        format!("{base}{path}")
    }
}
