//! Client configuration.
//!
//! Every endpoint, credential, contract address and timing knob lives on
//! [`FdcConfig`]; components borrow it at construction and nothing reads
//! globals. The polling defaults are the protocol's fixed intervals; tests
//! shrink them to run the same code paths in milliseconds.

use std::time::Duration;

use crate::error::FdcError;

#[derive(Debug, Clone)]
pub struct FdcConfig {
    /// Base URL of the attestation verifier service.
    pub verifier_url: String,
    /// API key sent with every verifier request.
    pub verifier_api_key: String,
    /// Base URL of the Data-Availability Layer.
    pub da_layer_url: String,
    /// JSON-RPC endpoint of the chain node.
    pub rpc_url: String,
    /// FDC Hub contract address (attestation submission target).
    pub fdc_hub_address: String,
    /// Fee configuration contract address.
    pub fee_config_address: String,
    /// Relay contract address (finality predicate + epoch constants).
    pub relay_address: String,
    /// Unlocked node account submissions are sent from.
    pub submit_account: String,
    /// FDC protocol id used by the finality predicate.
    pub protocol_id: u64,
    /// Per-request timeout for the HTTP clients.
    pub http_timeout: Duration,
    /// Interval between finality predicate polls.
    pub finality_poll_interval: Duration,
    /// Optional hard ceiling on the finality wait. `None` (the default)
    /// waits indefinitely: finality timing is owned by external validator
    /// consensus, so no fixed timeout is safe to bake in.
    pub finality_deadline: Option<Duration>,
    /// Interval between transaction receipt polls.
    pub receipt_poll_interval: Duration,
    /// Outer proof-retrieval retry budget.
    pub proof_retry_attempts: u32,
    /// Delay between outer proof-retrieval attempts.
    pub proof_retry_delay: Duration,
    /// Delay between inner not-yet-ready proof polls.
    pub proof_poll_interval: Duration,
}

impl FdcConfig {
    pub const DEFAULT_PROTOCOL_ID: u64 = 200;
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_FINALITY_POLL_SECS: u64 = 30;
    pub const DEFAULT_RECEIPT_POLL_SECS: u64 = 2;
    pub const DEFAULT_PROOF_RETRY_ATTEMPTS: u32 = 10;
    pub const DEFAULT_PROOF_RETRY_DELAY_SECS: u64 = 20;
    pub const DEFAULT_PROOF_POLL_SECS: u64 = 10;

    /// Read the configuration from `FDC_*` environment variables.
    ///
    /// Endpoints, the API key, contract addresses and the submit account are
    /// required; everything else falls back to the protocol defaults.
    pub fn from_env() -> Result<Self, FdcError> {
        let cfg = Self {
            verifier_url: require_env("FDC_VERIFIER_URL")?,
            verifier_api_key: require_env("FDC_VERIFIER_API_KEY")?,
            da_layer_url: require_env("FDC_DA_LAYER_URL")?,
            rpc_url: require_env("FDC_RPC_URL")?,
            fdc_hub_address: require_env("FDC_HUB_ADDRESS")?,
            fee_config_address: require_env("FDC_FEE_CONFIG_ADDRESS")?,
            relay_address: require_env("FDC_RELAY_ADDRESS")?,
            submit_account: require_env("FDC_SUBMIT_ACCOUNT")?,
            protocol_id: optional_env("FDC_PROTOCOL_ID")?.unwrap_or(Self::DEFAULT_PROTOCOL_ID),
            http_timeout: Duration::from_secs(
                optional_env("FDC_HTTP_TIMEOUT_SECS")?.unwrap_or(Self::DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            finality_poll_interval: Duration::from_secs(
                optional_env("FDC_FINALITY_POLL_SECS")?.unwrap_or(Self::DEFAULT_FINALITY_POLL_SECS),
            ),
            finality_deadline: optional_env("FDC_FINALITY_DEADLINE_SECS")?.map(Duration::from_secs),
            receipt_poll_interval: Duration::from_secs(
                optional_env("FDC_RECEIPT_POLL_SECS")?.unwrap_or(Self::DEFAULT_RECEIPT_POLL_SECS),
            ),
            proof_retry_attempts: optional_env("FDC_PROOF_RETRY_ATTEMPTS")?
                .unwrap_or(Self::DEFAULT_PROOF_RETRY_ATTEMPTS),
            proof_retry_delay: Duration::from_secs(
                optional_env("FDC_PROOF_RETRY_DELAY_SECS")?
                    .unwrap_or(Self::DEFAULT_PROOF_RETRY_DELAY_SECS),
            ),
            proof_poll_interval: Duration::from_secs(
                optional_env("FDC_PROOF_POLL_SECS")?.unwrap_or(Self::DEFAULT_PROOF_POLL_SECS),
            ),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), FdcError> {
        for (name, value) in [
            ("verifier_url", &self.verifier_url),
            ("da_layer_url", &self.da_layer_url),
            ("rpc_url", &self.rpc_url),
        ] {
            if value.trim().is_empty() {
                return Err(FdcError::Config(format!("{name} is empty")));
            }
        }
        for (name, value) in [
            ("fdc_hub_address", &self.fdc_hub_address),
            ("fee_config_address", &self.fee_config_address),
            ("relay_address", &self.relay_address),
            ("submit_account", &self.submit_account),
        ] {
            if !is_address(value) {
                return Err(FdcError::Config(format!(
                    "{name} is not a 0x-prefixed 20-byte address: {value:?}"
                )));
            }
        }
        if self.proof_retry_attempts == 0 {
            return Err(FdcError::Config("proof_retry_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn require_env(name: &str) -> Result<String, FdcError> {
    let value = std::env::var(name).map_err(|_| FdcError::Config(format!("{name} is not set")))?;
    if value.trim().is_empty() {
        return Err(FdcError::Config(format!("{name} is empty")));
    }
    Ok(value)
}

/// An unset variable falls back to the default; a set-but-unparsable value
/// is a configuration error, never a silent fallback.
fn optional_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, FdcError> {
    match std::env::var(name) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| FdcError::Config(format!("{name} has unparsable value {raw:?}"))),
    }
}

pub(crate) fn is_address(value: &str) -> bool {
    let Some(hex_part) = value.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Fast-polling configuration used across the crate's test suites.
#[cfg(test)]
pub(crate) fn test_config() -> FdcConfig {
    FdcConfig {
        verifier_url: "http://localhost:8000".to_string(),
        verifier_api_key: "test-key".to_string(),
        da_layer_url: "http://localhost:8001".to_string(),
        rpc_url: "http://localhost:8545".to_string(),
        fdc_hub_address: format!("0x{}", "11".repeat(20)),
        fee_config_address: format!("0x{}", "22".repeat(20)),
        relay_address: format!("0x{}", "33".repeat(20)),
        submit_account: format!("0x{}", "44".repeat(20)),
        protocol_id: FdcConfig::DEFAULT_PROTOCOL_ID,
        http_timeout: Duration::from_secs(1),
        finality_poll_interval: Duration::from_millis(10),
        finality_deadline: None,
        receipt_poll_interval: Duration::from_millis(10),
        proof_retry_attempts: 3,
        proof_retry_delay: Duration::from_millis(10),
        proof_poll_interval: Duration::from_millis(10),
    }
}
