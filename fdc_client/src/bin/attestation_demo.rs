//! End-to-end demo: attest a JSON API value and feed the proof to a
//! consuming contract.
//!
//! Endpoints, keys and contract addresses come from `FDC_*` environment
//! variables (see `FdcConfig::from_env`); the source parameters and the
//! destination contract come from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use fdc_client::{AttestationFlow, EncodingRequest, FdcConfig, ProofConsumer};

#[derive(Parser)]
#[command(name = "attestation_demo", version, about = "Run one FDC attestation flow end to end")]
struct Cli {
    /// Source URL the validators will fetch
    #[arg(long, env = "FDC_SOURCE_URL")]
    url: String,

    /// Post-processing jq filter applied to the fetched document
    #[arg(long, default_value = ".")]
    filter: String,

    /// ABI signature describing the attested result shape
    #[arg(long, default_value = "uint256")]
    shape: String,

    /// Destination contract the proof is delivered to; skipped when absent
    #[arg(long, env = "FDC_CONSUMER_ADDRESS")]
    consumer: Option<String>,

    /// Delivery method signature on the destination contract
    #[arg(long, default_value = "verifyAndDeliver(bytes32[],bytes)")]
    consumer_method: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cfg = FdcConfig::from_env().context("loading FDC configuration")?;
    let request = EncodingRequest::get(&cli.url, &cli.filter, &cli.shape);

    let flow = AttestationFlow::new(cfg.clone())?;
    let outcome = flow.run(&request).await.context("attestation flow failed")?;

    println!("round:        {}", outcome.round_id);
    println!("submission:   {}", outcome.submission_tx);
    println!(
        "proof:        {} merkle elements, payload {}",
        outcome.proof.merkle_proof_elements.len(),
        outcome.proof.payload_hex.as_deref().unwrap_or("<missing>")
    );

    if let Some(consumer_address) = cli.consumer {
        let consumer = ProofConsumer::new(&cfg, consumer_address, &cli.consumer_method)?;
        let tx = consumer
            .deliver(&outcome.proof)
            .await
            .context("proof delivery failed")?;
        println!("delivery tx:  {tx}");
    }

    Ok(())
}
