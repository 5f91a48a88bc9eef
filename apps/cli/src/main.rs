//! Dropcraft CLI
//!
//! Command-line interface for the cumulative Merkle-distributor operator.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use dropcraft_chain::{ChainClient, ChainConfig};
use dropcraft_core::parse_address;
use dropcraft_engine::{
    fee_bps_from_percent, EngineConfig, ProofBundle, ProofQuery, RoundEngine,
};
use dropcraft_keystore::load_or_generate_signer;
use dropcraft_logging::LogLevel;
use dropcraft_settings::{default_settings_path, Settings};
use dropcraft_store::{StoreClient, StoreConfig};

/// Dropcraft - Cumulative Merkle distribution operator
#[derive(Parser)]
#[command(name = "dropcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the operator config file
    #[arg(short, long, default_value_os_t = default_settings_path())]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and publish the next distribution round
    Generate {
        /// Override the RPC endpoint from the config
        #[arg(long)]
        rpc_url: Option<String>,

        /// Override the operator fee percent (e.g. 10.0)
        #[arg(long)]
        fee: Option<f64>,

        /// Override the blob store gateway
        #[arg(long)]
        gateway: Option<String>,

        /// Override the signer keyfile
        #[arg(long)]
        keyfile: Option<PathBuf>,
    },

    /// Generate a Merkle proof for a published row
    Proof {
        /// Select a row by index in the published values
        #[arg(long, conflicts_with_all = ["address", "list"])]
        index: Option<usize>,

        /// Select a row by recipient address
        #[arg(long, conflicts_with = "list")]
        address: Option<String>,

        /// List all published rows instead of writing a proof
        #[arg(long)]
        list: bool,

        /// Output file (defaults to output_file from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Submit a claim from a previously generated proof file
    Claim {
        /// Path to the proof.json artifact
        #[arg(long)]
        proof_file: PathBuf,
    },

    /// Show the distributor's published state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dropcraft_logging::init(LogLevel::from_verbose(cli.verbose));

    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading config {:?}", cli.config))?;

    match cli.command {
        Commands::Generate {
            rpc_url,
            fee,
            gateway,
            keyfile,
        } => {
            let mut settings = settings;
            if let Some(url) = rpc_url {
                settings.rpc_url = url;
            }
            if let Some(fee) = fee {
                settings.operator_fee = fee;
            }
            if let Some(gateway) = gateway {
                settings.ipfs_gateway = gateway;
            }
            if let Some(keyfile) = keyfile {
                settings.keyfile = Some(keyfile);
            }
            generate(&settings).await?;
        }
        Commands::Proof {
            index,
            address,
            list,
            output,
        } => {
            proof(&settings, index, address, list, output).await?;
        }
        Commands::Claim { proof_file } => {
            claim(&settings, &proof_file).await?;
        }
        Commands::Status => {
            status(&settings).await?;
        }
    }

    Ok(())
}

/// Build the round engine from settings. `with_signer` controls whether a
/// keyfile is loaded; read-only commands skip it.
fn build_engine(settings: &Settings, with_signer: bool) -> Result<RoundEngine> {
    if settings.distributor_addr.is_empty() {
        bail!("config: distributor_addr is required");
    }
    if settings.wrapper_addr.is_empty() {
        bail!("config: wrapper_addr is required");
    }

    let distributor = parse_address(&settings.distributor_addr)
        .context("config: distributor_addr is not a valid address")?;
    let wrapper = parse_address(&settings.wrapper_addr)
        .context("config: wrapper_addr is not a valid address")?;
    if !settings.token_addr.is_empty() {
        info!(
            "token_addr {} is informational; the distributor's token list is authoritative",
            settings.token_addr
        );
    }

    let chain_config = ChainConfig::live(settings.rpc_url.clone(), distributor, wrapper);
    let chain = match (&settings.keyfile, with_signer) {
        (Some(keyfile), true) => {
            let signer = load_or_generate_signer(keyfile).context("loading signer keyfile")?;
            ChainClient::with_signer(chain_config, signer)?
        }
        _ => ChainClient::new(chain_config)?,
    };

    let store = StoreClient::new(StoreConfig::live(settings.ipfs_gateway.clone()));

    let engine_config = EngineConfig {
        fee_bps: fee_bps_from_percent(settings.operator_fee)?,
        ..EngineConfig::default()
    };

    Ok(RoundEngine::new(chain, store, engine_config))
}

async fn generate(settings: &Settings) -> Result<()> {
    let engine = build_engine(settings, true)?;

    info!("Starting distribution round...");
    let artifact = engine.generate().await?;

    println!("Distribution Round Published");
    println!("============================");
    println!("Root:       {}", artifact.root);
    println!("CID:        {}", artifact.cid);
    println!("Snapshot:   block {}", artifact.block_number);
    println!("Claims:     {}", artifact.claim_count);
    for (token, total) in &artifact.total_distributed {
        println!("Total:      {} => {}", token, total);
    }

    match &artifact.tx {
        Some(tx) => {
            println!("Tx:         {} (block {})", tx.tx_hash, tx.block_number);
        }
        None => {
            eprintln!("\x1b[33mWARNING: no signer configured.\x1b[0m");
            println!(
                "Submit manually: setMerkleRoot({}, \"{}\")",
                artifact.root, artifact.cid
            );
        }
    }

    Ok(())
}

async fn proof(
    settings: &Settings,
    index: Option<usize>,
    address: Option<String>,
    list: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let engine = build_engine(settings, false)?;

    if list {
        let rows = engine.leaves().await?;

        println!("Published Distribution Rows");
        println!("===========================");
        println!("{:<6} {:<14} {:<14} {:<30}", "Index", "Recipient", "Token", "Cumulative");
        println!("{}", "-".repeat(66));
        for (i, claim) in &rows {
            println!(
                "{:<6} {:<14} {:<14} {:<30}",
                i,
                shorten(&dropcraft_core::addr_hex(&claim.recipient)),
                shorten(&dropcraft_core::addr_hex(&claim.token)),
                claim.amount
            );
        }
        println!("\n{} row(s)", rows.len());
        return Ok(());
    }

    let query = match (index, address) {
        (Some(i), None) => ProofQuery::Index(i),
        (None, Some(addr)) => ProofQuery::Recipient(
            parse_address(&addr).context("--address is not a valid address")?,
        ),
        _ => bail!("specify one of --index, --address or --list"),
    };

    let bundle = engine.proof(&query).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(&settings.output_file));
    std::fs::write(&path, serde_json::to_string_pretty(&bundle)?)
        .with_context(|| format!("writing {:?}", path))?;

    println!("Proof written to {:?}", path);
    println!("Recipient:  {}", bundle.recipient);
    println!("Token:      {}", bundle.token);
    println!("Amount:     {}", bundle.amount);
    println!("Root:       {}", bundle.merkle_root);
    println!("Siblings:   {}", bundle.proof.len());

    Ok(())
}

async fn claim(settings: &Settings, proof_file: &PathBuf) -> Result<()> {
    let engine = build_engine(settings, true)?;

    let raw = std::fs::read_to_string(proof_file)
        .with_context(|| format!("reading {:?}", proof_file))?;
    let bundle: ProofBundle =
        serde_json::from_str(&raw).with_context(|| format!("parsing {:?}", proof_file))?;

    info!(
        "Submitting claim for {} ({} of {})",
        bundle.recipient, bundle.amount, bundle.token
    );
    let outcome = engine.submit_claim(&bundle).await?;

    println!("Claim confirmed");
    println!("Tx:     {}", outcome.tx_hash);
    println!("Block:  {}", outcome.block_number);

    Ok(())
}

async fn status(settings: &Settings) -> Result<()> {
    let engine = build_engine(settings, false)?;
    let chain = engine.chain();

    let state = chain.distribution_state().await?;
    let block = chain.block_number().await?;
    let tokens = chain.tokens().await?;
    let supply = chain.wrapper_total_supply(block).await?;

    println!("Distributor Status");
    println!("==================");
    println!("Block:          {}", block);
    if state.is_genesis() {
        println!("Round:          none published yet");
    } else {
        println!("Root:           {}", state.root);
        println!("CID:            {}", state.cid);
        println!("Last processed: block {}", state.last_processed_block);
    }
    println!("Wrapper supply: {}", supply);
    println!("Tokens:         {}", tokens.len());
    for token in &tokens {
        println!("  {}", dropcraft_core::addr_hex(token));
    }

    Ok(())
}

/// Shorten a 0x-hex string for table output.
fn shorten(hex: &str) -> String {
    if hex.len() > 12 {
        format!("{}...", &hex[..12])
    } else {
        hex.to_string()
    }
}
