//! Sequential orchestration of one attestation flow.
//!
//! Every phase must complete (or exhaust its budget) before the next starts;
//! there is no parallelism across phases or across flows. Each phase is a
//! typed call on one of the clients and errors propagate unchanged, so a
//! caller can tell exactly which phase failed from the error variant.

use log::info;

use crate::chain::ChainClient;
use crate::config::FdcConfig;
use crate::da::DaLayerClient;
use crate::error::FdcError;
use crate::types::{EncodedAttestation, EncodingRequest, Proof, RoundId};
use crate::verifier::VerifierClient;

/// Result of a completed flow: the round the attestation landed in, the
/// verified proof, and the hub submission transaction.
#[derive(Debug, Clone)]
pub struct AttestationOutcome {
    pub round_id: RoundId,
    pub proof: Proof,
    pub encoded_request: EncodedAttestation,
    pub submission_tx: String,
}

pub struct AttestationFlow {
    verifier: VerifierClient,
    chain: ChainClient,
    da: DaLayerClient,
}

impl AttestationFlow {
    pub fn new(cfg: FdcConfig) -> Result<Self, FdcError> {
        cfg.validate()?;
        Ok(Self {
            verifier: VerifierClient::new(&cfg)?,
            chain: ChainClient::new(&cfg)?,
            da: DaLayerClient::new(&cfg)?,
        })
    }

    /// Drive the full request → submit → finality → proof sequence.
    pub async fn run(&self, request: &EncodingRequest) -> Result<AttestationOutcome, FdcError> {
        // Phase 1: exchange source parameters for an encoded attestation.
        let encoded = self.verifier.prepare_request(request).await?;

        // Phase 2: submit on-chain with the exact quoted fee, then derive
        // the voting round from the submission block timestamp.
        let fee = self.chain.request_fee(&encoded).await?;
        let tx_hash = self.chain.submit_attestation(&encoded, fee).await?;
        let receipt = self.chain.wait_for_receipt(&tx_hash).await?;
        let timestamp = self.chain.block_timestamp(receipt.block_number).await?;
        let (epoch_start, epoch_duration) = self.chain.voting_epoch().await?;
        let round_id = RoundId::derive(timestamp, epoch_start, epoch_duration)?;
        info!("attestation landed in voting round {round_id}");

        // Phase 3: wait for validator consensus on the round.
        self.chain.await_finalization(round_id).await?;

        // Phase 4: fetch the assembled proof from the availability layer.
        let proof = self.da.fetch_proof(round_id, &encoded).await?;

        Ok(AttestationOutcome {
            round_id,
            proof,
            encoded_request: encoded,
            submission_tx: tx_hash,
        })
    }
}
