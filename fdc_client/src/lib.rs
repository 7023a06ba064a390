//! Client for the Flare Data Connector attestation protocol.
//!
//! The protocol itself — verifier service, FDC Hub contract, validator
//! voting, Data-Availability Layer — is already deployed; this crate drives
//! the client side of one attestation flow:
//!
//! 1. build an encoding request and exchange it at the verifier for an
//!    ABI-encoded attestation request,
//! 2. submit that payload to the hub with the quoted fee and derive the
//!    voting round from the submission block timestamp,
//! 3. poll the relay's finality predicate until validator consensus commits
//!    the round,
//! 4. fetch the Merkle proof from the availability layer under a bounded
//!    retry budget, and hand it to a consuming contract.
//!
//! [`AttestationFlow`] composes the phases; the per-phase clients
//! ([`verifier::VerifierClient`], [`chain::ChainClient`],
//! [`da::DaLayerClient`]) are usable on their own.

pub mod chain;
pub mod config;
pub mod consumer;
pub mod da;
pub mod error;
pub mod flow;
pub mod types;
pub mod verifier;

pub use config::FdcConfig;
pub use consumer::ProofConsumer;
pub use error::FdcError;
pub use flow::{AttestationFlow, AttestationOutcome};
pub use types::{EncodedAttestation, EncodingRequest, Proof, RoundId};
