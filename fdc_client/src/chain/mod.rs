//! JSON-RPC chain client: attestation submission, round derivation inputs
//! and the finality predicate.
//!
//! Calls are raw `eth_*` JSON-RPC with hand-built calldata; signing is left
//! to the node (`eth_sendTransaction` from an unlocked account).

pub mod abi;

use std::time::Instant;

use ethereum_types::U256;
use log::{debug, info};
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::config::FdcConfig;
use crate::error::FdcError;
use crate::types::{EncodedAttestation, RoundId};

const GET_REQUEST_FEE_SIG: &str = "getRequestFee(bytes)";
const REQUEST_ATTESTATION_SIG: &str = "requestAttestation(bytes)";
const IS_FINALIZED_SIG: &str = "isFinalized(uint256,uint256)";
const EPOCH_START_SIG: &str = "firstVotingRoundStartTs()";
const EPOCH_DURATION_SIG: &str = "votingEpochDurationSeconds()";

/// The slice of a transaction receipt the client cares about.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
}

#[derive(Debug)]
pub struct ChainClient {
    cfg: FdcConfig,
    client: reqwest::Client,
}

impl ChainClient {
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

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, FdcError> {
        debug!("rpc {method}");
        let response = self
            .client
            .post(&self.cfg.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1,
            }))
            .send()
            .await
            .map_err(|e| FdcError::Rpc(format!("{method}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FdcError::Rpc(format!("{method}: {e}")))?;
        if !status.is_success() {
            return Err(FdcError::Rpc(format!("{method}: http status {status}: {body}")));
        }
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| FdcError::Decode(format!("{method}: invalid json response: {e}")))?;
        if let Some(err) = parsed.get("error") {
            if !err.is_null() {
                return Err(FdcError::Rpc(format!("{method}: node returned error: {err}")));
            }
        }
        parsed
            .get("result")
            .cloned()
            .ok_or_else(|| FdcError::Decode(format!("{method}: response missing result")))
    }

    async fn eth_call(&self, to: &str, data: String) -> Result<String, FdcError> {
        let result = self
            .rpc("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| FdcError::Decode("eth_call result is not a string".to_string()))
    }

    /// Quote the exact fee the hub requires for this encoded attestation.
    pub async fn request_fee(&self, request: &EncodedAttestation) -> Result<U256, FdcError> {
        let data = abi::call_with_bytes(GET_REQUEST_FEE_SIG, &request.bytes());
        let result = self.eth_call(&self.cfg.fee_config_address, data).await?;
        let fee = abi::decode_u256(&result).map_err(FdcError::Decode)?;
        debug!("request fee quoted: {fee}");
        Ok(fee)
    }

    /// Submit the encoded attestation to the hub with the quoted fee
    /// attached. Rejection surfaces as `Submission` and is not retried.
    pub async fn submit_attestation(
        &self,
        request: &EncodedAttestation,
        fee: U256,
    ) -> Result<String, FdcError> {
        let data = abi::call_with_bytes(REQUEST_ATTESTATION_SIG, &request.bytes());
        let hub = self.cfg.fdc_hub_address.clone();
        let tx_hash = self.send_transaction(&hub, data, fee).await?;
        info!("attestation submitted: tx {tx_hash}, fee {fee}");
        Ok(tx_hash)
    }

    /// `eth_sendTransaction` from the configured account; the node signs.
    pub async fn send_transaction(
        &self,
        to: &str,
        data: String,
        value: U256,
    ) -> Result<String, FdcError> {
        let result = self
            .rpc(
                "eth_sendTransaction",
                json!([{
                    "from": self.cfg.submit_account,
                    "to": to,
                    "value": format!("0x{value:x}"),
                    "data": data,
                }]),
            )
            .await
            .map_err(|e| FdcError::Submission(e.to_string()))?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| FdcError::Submission("transaction hash missing from response".to_string()))
    }

    /// Poll until the transaction is mined; a reverted receipt is a
    /// `Submission` failure.
    pub async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, FdcError> {
        loop {
            let result = self
                .rpc("eth_getTransactionReceipt", json!([tx_hash]))
                .await
                .map_err(|e| FdcError::Submission(e.to_string()))?;
            if result.is_null() {
                debug!("tx {tx_hash} not yet mined");
                sleep(self.cfg.receipt_poll_interval).await;
                continue;
            }
            if result.get("status").and_then(Value::as_str) == Some("0x0") {
                return Err(FdcError::Submission(format!("transaction {tx_hash} reverted")));
            }
            let block_number = result
                .get("blockNumber")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    FdcError::Submission(format!("receipt for {tx_hash} missing blockNumber"))
                })
                .and_then(|s| hex_quantity(s).map_err(FdcError::Submission))?;
            return Ok(TxReceipt {
                transaction_hash: tx_hash.to_string(),
                block_number,
            });
        }
    }

    pub async fn block_timestamp(&self, block_number: u64) -> Result<u64, FdcError> {
        let result = self
            .rpc(
                "eth_getBlockByNumber",
                json!([format!("0x{block_number:x}"), false]),
            )
            .await?;
        result
            .get("timestamp")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                FdcError::Decode(format!("block {block_number} response missing timestamp"))
            })
            .and_then(|s| hex_quantity(s).map_err(FdcError::Decode))
    }

    /// The two on-chain constants the round derivation depends on:
    /// voting epoch start timestamp and epoch duration in seconds.
    pub async fn voting_epoch(&self) -> Result<(u64, u64), FdcError> {
        let start_result = self
            .eth_call(&self.cfg.relay_address, abi::call_no_args(EPOCH_START_SIG))
            .await?;
        let start = abi::decode_u64(&start_result).map_err(FdcError::Decode)?;
        let duration_result = self
            .eth_call(&self.cfg.relay_address, abi::call_no_args(EPOCH_DURATION_SIG))
            .await?;
        let duration = abi::decode_u64(&duration_result).map_err(FdcError::Decode)?;
        debug!("voting epoch: start {start}, duration {duration}");
        Ok((start, duration))
    }

    /// Read-only finality predicate on the relay.
    pub async fn is_finalized(&self, protocol_id: u64, round_id: RoundId) -> Result<bool, FdcError> {
        let data = abi::call_with_u256_pair(
            IS_FINALIZED_SIG,
            U256::from(protocol_id),
            U256::from(round_id.0),
        );
        let result = self.eth_call(&self.cfg.relay_address, data).await?;
        abi::decode_bool(&result).map_err(FdcError::Decode)
    }

    /// Poll the finality predicate until it reports true.
    ///
    /// Unbounded by default: finality timing is owned by the validator set,
    /// so the only ceiling is the caller-configured deadline, which surfaces
    /// as `FinalityTimeout`.
    pub async fn await_finalization(&self, round_id: RoundId) -> Result<(), FdcError> {
        let started = Instant::now();
        loop {
            if self.is_finalized(self.cfg.protocol_id, round_id).await? {
                info!("round {round_id} finalized");
                return Ok(());
            }
            if let Some(deadline) = self.cfg.finality_deadline {
                if started.elapsed() >= deadline {
                    return Err(FdcError::FinalityTimeout { round_id: round_id.0 });
                }
            }
            debug!("round {round_id} not finalized, polling again");
            sleep(self.cfg.finality_poll_interval).await;
        }
    }
}

fn hex_quantity(value: &str) -> Result<u64, String> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(stripped, 16).map_err(|e| format!("invalid hex quantity {value:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn word(value: u64) -> String {
        format!("0x{value:064x}")
    }

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    async fn client_for(server: &MockServer) -> ChainClient {
        let mut cfg = test_config();
        cfg.rpc_url = server.uri();
        ChainClient::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn request_fee_decodes_quoted_value() {
        let server = MockServer::start().await;
        let fee_selector = hex::encode(abi::selector(GET_REQUEST_FEE_SIG));
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains(&fee_selector))
            .respond_with(rpc_result(json!(word(10))))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let encoded = EncodedAttestation::from_hex("0xaa").unwrap();
        let fee = client.request_fee(&encoded).await.unwrap();
        assert_eq!(fee, U256::from(10));
    }

    #[tokio::test]
    async fn node_error_surfaces_as_rpc_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "execution reverted"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let encoded = EncodedAttestation::from_hex("0xaa").unwrap();
        let err = client.request_fee(&encoded).await.unwrap_err();
        assert!(matches!(err, FdcError::Rpc(_)));
    }

    #[tokio::test]
    async fn rejected_submission_is_submission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("eth_sendTransaction"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "insufficient funds for gas * price + value"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let encoded = EncodedAttestation::from_hex("0xaa").unwrap();
        let err = client
            .submit_attestation(&encoded, U256::from(10))
            .await
            .unwrap_err();
        assert!(matches!(err, FdcError::Submission(_)));
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn receipt_wait_polls_until_mined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("eth_getTransactionReceipt"))
            .respond_with(rpc_result(Value::Null))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("eth_getTransactionReceipt"))
            .respond_with(rpc_result(json!({"status": "0x1", "blockNumber": "0x64"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let receipt = client.wait_for_receipt("0xdead").await.unwrap();
        assert_eq!(receipt.block_number, 100);
        assert_eq!(receipt.transaction_hash, "0xdead");
    }

    #[tokio::test]
    async fn reverted_receipt_is_submission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(rpc_result(json!({"status": "0x0", "blockNumber": "0x64"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.wait_for_receipt("0xdead").await.unwrap_err();
        assert!(matches!(err, FdcError::Submission(_)));
        assert!(err.to_string().contains("reverted"));
    }

    #[tokio::test]
    async fn finality_wait_returns_only_after_predicate_true() {
        let server = MockServer::start().await;
        let finalized_selector = hex::encode(abi::selector(IS_FINALIZED_SIG));
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains(&finalized_selector))
            .respond_with(rpc_result(json!(word(0))))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains(&finalized_selector))
            .respond_with(rpc_result(json!(word(1))))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.await_finalization(RoundId(7)).await.unwrap();
        // Three predicate calls: false, false, true.
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn finality_deadline_produces_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(rpc_result(json!(word(0))))
            .mount(&server)
            .await;

        let mut cfg = test_config();
        cfg.rpc_url = server.uri();
        cfg.finality_deadline = Some(Duration::from_millis(30));
        let client = ChainClient::new(&cfg).unwrap();
        let err = client.await_finalization(RoundId(7)).await.unwrap_err();
        assert!(matches!(err, FdcError::FinalityTimeout { round_id: 7 }));
    }

    #[tokio::test]
    async fn voting_epoch_reads_both_constants() {
        let server = MockServer::start().await;
        let start_selector = hex::encode(abi::selector(EPOCH_START_SIG));
        let duration_selector = hex::encode(abi::selector(EPOCH_DURATION_SIG));
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains(&start_selector))
            .respond_with(rpc_result(json!(word(1000))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains(&duration_selector))
            .respond_with(rpc_result(json!(word(90))))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let (start, duration) = client.voting_epoch().await.unwrap();
        assert_eq!((start, duration), (1000, 90));
    }

    #[test]
    fn hex_quantity_parsing() {
        assert_eq!(hex_quantity("0x64").unwrap(), 100);
        assert_eq!(hex_quantity("0x0").unwrap(), 0);
        assert!(hex_quantity("0x").is_err());
        assert!(hex_quantity("nope").is_err());
    }
}
