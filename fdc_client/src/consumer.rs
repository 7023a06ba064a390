//! Proof delivery to a destination contract.
//!
//! Sits outside the core request/poll/fetch client: it hands a ready proof
//! (Merkle elements plus the attested payload) to a state-mutating contract
//! method. The contract re-verifies the proof against the round's commitment
//! itself — the client performs no verification of its own.

use ethereum_types::U256;
use log::info;

use crate::chain::{abi, ChainClient};
use crate::config::FdcConfig;
use crate::error::FdcError;
use crate::types::Proof;

#[derive(Debug)]
pub struct ProofConsumer {
    chain: ChainClient,
    contract_address: String,
    /// Canonical signature of the delivery method, e.g.
    /// `verifyAndDeliver(bytes32[],bytes)`.
    method_signature: String,
}

impl ProofConsumer {
    pub fn new(
        cfg: &FdcConfig,
        contract_address: impl Into<String>,
        method_signature: impl Into<String>,
    ) -> Result<Self, FdcError> {
        let contract_address = contract_address.into();
        if !crate::config::is_address(&contract_address) {
            return Err(FdcError::Config(format!(
                "consumer contract is not a 0x-prefixed 20-byte address: {contract_address:?}"
            )));
        }
        Ok(Self {
            chain: ChainClient::new(cfg)?,
            contract_address,
            method_signature: method_signature.into(),
        })
    }

    /// Submit `{merkle proof, payload}` to the destination contract and wait
    /// for the transaction to mine. Requires a ready proof.
    pub async fn deliver(&self, proof: &Proof) -> Result<String, FdcError> {
        let payload_hex = proof
            .payload_hex
            .as_deref()
            .ok_or_else(|| FdcError::Submission("proof payload is not populated".to_string()))?;
        let payload = hex::decode(payload_hex.trim_start_matches("0x"))
            .map_err(|e| FdcError::Decode(format!("proof payload is not hex: {e}")))?;
        let calldata = abi::call_with_proof(
            &self.method_signature,
            &proof.merkle_proof_elements,
            &payload,
        )
        .map_err(FdcError::Decode)?;

        let tx_hash = self
            .chain
            .send_transaction(&self.contract_address, calldata, U256::zero())
            .await?;
        self.chain.wait_for_receipt(&tx_hash).await?;
        info!("proof delivered to {}: tx {tx_hash}", self.contract_address);
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ready_proof() -> Proof {
        Proof {
            payload_hex: Some("0xbb".to_string()),
            attestation_type_tag: "JsonApi".to_string(),
            merkle_proof_elements: vec![format!("0x{}", "01".repeat(32))],
        }
    }

    fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    #[tokio::test]
    async fn deliver_sends_calldata_and_waits_for_receipt() {
        let server = MockServer::start().await;
        let selector = hex::encode(abi::selector("verifyAndDeliver(bytes32[],bytes)"));
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("eth_sendTransaction"))
            .and(body_string_contains(&selector))
            .respond_with(rpc_result(json!("0xfeed")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("eth_getTransactionReceipt"))
            .respond_with(rpc_result(json!({"status": "0x1", "blockNumber": "0x10"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = test_config();
        cfg.rpc_url = server.uri();
        let consumer = ProofConsumer::new(
            &cfg,
            format!("0x{}", "55".repeat(20)),
            "verifyAndDeliver(bytes32[],bytes)",
        )
        .unwrap();
        let tx = consumer.deliver(&ready_proof()).await.unwrap();
        assert_eq!(tx, "0xfeed");
    }

    #[test]
    fn malformed_contract_address_is_rejected() {
        let cfg = test_config();
        let unprefixed = "55".repeat(20);
        for bad in ["0x1234", unprefixed.as_str(), ""] {
            let err = ProofConsumer::new(&cfg, bad, "verifyAndDeliver(bytes32[],bytes)")
                .unwrap_err();
            assert!(matches!(err, FdcError::Config(_)));
        }
    }

    #[tokio::test]
    async fn pending_proof_is_rejected() {
        let cfg = test_config();
        let consumer = ProofConsumer::new(
            &cfg,
            format!("0x{}", "55".repeat(20)),
            "verifyAndDeliver(bytes32[],bytes)",
        )
        .unwrap();
        let pending = Proof {
            payload_hex: None,
            attestation_type_tag: "JsonApi".to_string(),
            merkle_proof_elements: vec![],
        };
        let err = consumer.deliver(&pending).await.unwrap_err();
        assert!(matches!(err, FdcError::Submission(_)));
    }
}
