use thiserror::Error;

/// Error taxonomy for the attestation client, one variant per phase.
///
/// Only proof retrieval is retried internally; every other failure
/// propagates to the caller unchanged.
#[derive(Debug, Error)]
pub enum FdcError {
    /// Invalid or incomplete client configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The verifier service rejected or failed the encoding request.
    /// Never retried at this layer.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// On-chain submission was rejected or the transaction reverted.
    /// Never retried.
    #[error("submission error: {0}")]
    Submission(String),

    /// The caller-imposed finality deadline elapsed before the round
    /// finalized. Only produced when a deadline is configured; the native
    /// behavior is to wait indefinitely.
    #[error("finality timeout: round {round_id} did not finalize in time")]
    FinalityTimeout { round_id: u64 },

    /// The bounded proof-retrieval retry budget was exhausted.
    #[error("proof retrieval failed after {attempts} attempts: {last_error}")]
    ProofRetrieval { attempts: u32, last_error: String },

    /// JSON-RPC transport failure outside the retried proof phase.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// A response payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}
