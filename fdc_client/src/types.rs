//! Data model for one attestation attempt.
//!
//! An [`EncodingRequest`] is built once, exchanged at the verifier for an
//! [`EncodedAttestation`], which is submitted on-chain once and yields a
//! [`RoundId`]. The round id and the encoded request together key the
//! [`Proof`] lookup against the Data-Availability Layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FdcError;

/// Source parameters sent to the verifier's prepare endpoint.
///
/// Immutable once built; the filter and shape descriptor are passed through
/// verbatim — validating them is the verifier's job, not ours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncodingRequest {
    pub source_url: String,
    pub http_method: String,
    pub headers: serde_json::Value,
    pub query_params: serde_json::Value,
    pub body: serde_json::Value,
    /// Post-processing filter (jq expression) applied by validators to the
    /// fetched document before encoding.
    pub post_process_filter: String,
    /// ABI signature describing the shape of the attested result.
    pub result_shape_descriptor: String,
}

impl EncodingRequest {
    /// Build a GET request with empty headers/params/body.
    pub fn get(source_url: impl Into<String>, filter: impl Into<String>, shape: impl Into<String>) -> Self {
        let empty = serde_json::Value::Object(serde_json::Map::new());
        Self {
            source_url: source_url.into(),
            http_method: "GET".to_string(),
            headers: empty.clone(),
            query_params: empty.clone(),
            body: empty,
            post_process_filter: filter.into(),
            result_shape_descriptor: shape.into(),
        }
    }
}

/// Opaque encoded attestation returned by the verifier.
///
/// Doubles as the on-chain submission payload and as the correlation key for
/// proof retrieval. Stored as normalized lowercase 0x-hex.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EncodedAttestation(String);

impl EncodedAttestation {
    pub fn from_hex(hex_str: &str) -> Result<Self, FdcError> {
        let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        if stripped.is_empty() {
            return Err(FdcError::Decode("encoded attestation is empty".to_string()));
        }
        hex::decode(stripped)
            .map_err(|e| FdcError::Decode(format!("encoded attestation is not valid hex: {e}")))?;
        Ok(Self(format!("0x{}", stripped.to_ascii_lowercase())))
    }

    /// The payload as `0x`-prefixed lowercase hex.
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    pub fn bytes(&self) -> Vec<u8> {
        // Validated on construction.
        hex::decode(&self.0[2..]).unwrap_or_default()
    }
}

impl fmt::Display for EncodedAttestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Voting round identifier, derived from the submission block timestamp and
/// the protocol's epoch constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl RoundId {
    /// floor((block_timestamp - epoch_start) / epoch_duration).
    ///
    /// Must match the network's own round numbering exactly; an off-by-one
    /// here means polling the wrong round forever.
    pub fn derive(block_timestamp: u64, epoch_start: u64, epoch_duration: u64) -> Result<Self, FdcError> {
        if epoch_duration == 0 {
            return Err(FdcError::Decode("voting epoch duration is zero".to_string()));
        }
        if block_timestamp < epoch_start {
            return Err(FdcError::Submission(format!(
                "block timestamp {block_timestamp} precedes voting epoch start {epoch_start}"
            )));
        }
        Ok(Self((block_timestamp - epoch_start) / epoch_duration))
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Attestation proof as served by the Data-Availability Layer.
///
/// Pending while `payload_hex` is absent; once the availability layer has
/// assembled the proof the payload is populated and the value never changes
/// again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_hex: Option<String>,
    #[serde(default)]
    pub attestation_type_tag: String,
    /// Ordered Merkle proof elements, leaf to root, as 0x-hex bytes32 words.
    #[serde(default)]
    pub merkle_proof_elements: Vec<String>,
}

impl Proof {
    pub fn is_ready(&self) -> bool {
        self.payload_hex.is_some()
    }
}
