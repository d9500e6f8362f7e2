//! CLI for interacting with sealed-bid auctions.
//!
//! This binary provides commands for:
//! - Registering assets and creating auctions
//! - Sealing and committing bids (real or decoy)
//! - Revealing commitments with their recorded openings
//! - Finalizing auctions and withdrawing refunds
//! - Querying auction state
//!
//! Commit prints the generated secret; keep it, the reveal window needs
//! it back. A commitment cannot be opened without its secret.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::HttpClientBuilder;
use jsonrpsee::rpc_params;
use rand::rngs::OsRng;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use blindbid_client::{seal_reserve, BidBuilder};
use blindbid_types::{compute_reserve_commitment, Salt};

#[derive(Parser)]
#[command(name = "blindbid-cli")]
#[command(about = "CLI for sealed-bid auctions")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an asset
    CreateAsset {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        media_uri: String,
    },

    /// Create a new auction for a registered asset
    CreateAuction {
        /// Sender address (hex); becomes the seller
        #[arg(long)]
        sender: String,

        #[arg(long)]
        asset_id: u64,

        /// Start of the bidding window (unix timestamp)
        #[arg(long)]
        start_time: u64,

        /// Length of the bidding window (seconds)
        #[arg(long)]
        bidding_duration: u64,

        /// Length of the reveal window (seconds)
        #[arg(long)]
        reveal_duration: u64,

        /// Hidden reserve price
        #[arg(long)]
        reserve: u64,

        /// Reserve salt (hex, 32 bytes); generated and printed if omitted
        #[arg(long)]
        salt: Option<String>,
    },

    /// Seal a bid and submit its commitment
    Commit {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        #[arg(long)]
        auction_id: u64,

        /// Hidden bid value
        #[arg(long)]
        value: u64,

        /// Submit a decoy instead of a real bid
        #[arg(long)]
        fake: bool,

        /// Deposit to lock (upper bound on the hidden value)
        #[arg(long)]
        deposit: u64,
    },

    /// Reveal every commitment submitted by the sender
    Reveal {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        #[arg(long)]
        auction_id: u64,

        /// Openings in submission order, each "value:fake:secret-hex"
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,
    },

    /// Finalize an auction by revealing the reserve price
    Finalize {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        #[arg(long)]
        auction_id: u64,

        #[arg(long)]
        reserve: u64,

        /// Reserve salt (hex, 32 bytes)
        #[arg(long)]
        salt: String,
    },

    /// Withdraw the sender's pending returns
    Withdraw {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        #[arg(long)]
        auction_id: u64,
    },

    /// Get auction details
    GetAuction {
        #[arg(long)]
        auction_id: u64,
    },

    /// List all auctions
    ListAuctions,

    /// List auctions currently accepting commitments
    OpenAuctions,

    /// Get an account's withdrawable balance
    PendingBalance {
        #[arg(long)]
        auction_id: u64,

        /// Account address (hex)
        #[arg(long)]
        account: String,
    },

    /// Get the finalization record
    Outcome {
        #[arg(long)]
        auction_id: u64,
    },

    /// Advance the simulated chain by one block
    AdvanceBlock,

    /// Set the simulated timestamp
    SetTimestamp {
        #[arg(long)]
        timestamp: u64,
    },
}

#[derive(Serialize)]
struct CreateAssetParams {
    sender: String,
    name: String,
    description: String,
    media_uri: String,
}

#[derive(Serialize)]
struct CreateAuctionParams {
    sender: String,
    asset_id: u64,
    start_time: u64,
    bidding_duration: u64,
    reveal_duration: u64,
    reserve_commitment: String,
}

#[derive(Serialize)]
struct CommitParams {
    sender: String,
    auction_id: u64,
    commitment: String,
    deposit: u64,
}

#[derive(Serialize)]
struct RevealEntryRpc {
    value: u64,
    fake: bool,
    secret: String,
}

#[derive(Serialize)]
struct RevealParams {
    sender: String,
    auction_id: u64,
    entries: Vec<RevealEntryRpc>,
}

#[derive(Serialize)]
struct FinalizeParams {
    sender: String,
    auction_id: u64,
    reserve: u64,
    salt: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc)?;

    match cli.command {
        Commands::CreateAsset {
            sender,
            name,
            description,
            media_uri,
        } => {
            let params = CreateAssetParams {
                sender,
                name,
                description,
                media_uri,
            };
            let asset_id: u64 = client.request("asset_create", rpc_params![params]).await?;
            println!("Asset registered with ID {asset_id}");
        }

        Commands::CreateAuction {
            sender,
            asset_id,
            start_time,
            bidding_duration,
            reveal_duration,
            reserve,
            salt,
        } => {
            let (commitment, salt) = match salt {
                Some(hex_salt) => {
                    let salt = parse_hex32(&hex_salt)?;
                    (compute_reserve_commitment(reserve, &salt), salt)
                }
                None => seal_reserve(reserve, &mut OsRng),
            };

            let params = CreateAuctionParams {
                sender,
                asset_id,
                start_time,
                bidding_duration,
                reveal_duration,
                reserve_commitment: commitment.to_string(),
            };
            let auction_id: u64 = client.request("auction_create", rpc_params![params]).await?;

            println!("Auction created with ID {auction_id}");
            println!("Reserve commitment: {commitment}");
            println!("Reserve salt (needed to finalize): {}", hex::encode(salt));
        }

        Commands::Commit {
            sender,
            auction_id,
            value,
            fake,
            deposit,
        } => {
            let prepared = BidBuilder::new(value)
                .fake(fake)
                .deposit(deposit)
                .build(&mut OsRng)?;

            let params = CommitParams {
                sender,
                auction_id,
                commitment: prepared.commitment.to_string(),
                deposit,
            };
            let sequence: u32 = client.request("auction_commit", rpc_params![params]).await?;
            info!("Commitment stored at sequence {}", sequence);

            println!("Commitment submitted at sequence {sequence}");
            println!("Opening (keep private, reveal with --entry):");
            println!(
                "  {}:{}:{}",
                prepared.value,
                prepared.fake,
                hex::encode(prepared.secret)
            );
        }

        Commands::Reveal {
            sender,
            auction_id,
            entries,
        } => {
            let entries = entries
                .iter()
                .map(|raw| parse_entry(raw))
                .collect::<Result<Vec<_>>>()?;
            let params = RevealParams {
                sender,
                auction_id,
                entries,
            };
            let report: Value = client.request("auction_reveal", rpc_params![params]).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Finalize {
            sender,
            auction_id,
            reserve,
            salt,
        } => {
            // Validate locally before submitting
            parse_hex32(&salt)?;
            let params = FinalizeParams {
                sender,
                auction_id,
                reserve,
                salt,
            };
            let outcome: Value = client
                .request("auction_finalize", rpc_params![params])
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Withdraw { sender, auction_id } => {
            let amount: u64 = client
                .request("auction_withdraw", rpc_params![sender, auction_id])
                .await?;
            println!("Withdrew {amount}");
        }

        Commands::GetAuction { auction_id } => {
            let auction: Value = client
                .request("query_getAuction", rpc_params![auction_id])
                .await?;
            println!("{}", serde_json::to_string_pretty(&auction)?);
        }

        Commands::ListAuctions => {
            let auctions: Value = client.request("query_listAuctions", rpc_params![]).await?;
            println!("{}", serde_json::to_string_pretty(&auctions)?);
        }

        Commands::OpenAuctions => {
            let auctions: Value = client.request("query_openAuctions", rpc_params![]).await?;
            println!("{}", serde_json::to_string_pretty(&auctions)?);
        }

        Commands::PendingBalance {
            auction_id,
            account,
        } => {
            let balance: u64 = client
                .request("query_pendingBalance", rpc_params![auction_id, account])
                .await?;
            println!("{balance}");
        }

        Commands::Outcome { auction_id } => {
            let outcome: Value = client
                .request("query_getOutcome", rpc_params![auction_id])
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::AdvanceBlock => {
            let block: Value = client.request("admin_advanceBlock", rpc_params![]).await?;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }

        Commands::SetTimestamp { timestamp } => {
            let _: bool = client
                .request("admin_setTimestamp", rpc_params![timestamp])
                .await?;
            println!("Timestamp set to {timestamp}");
        }
    }

    Ok(())
}

fn parse_hex32(s: &str) -> Result<Salt> {
    let bytes = hex::decode(s.trim_start_matches("0x")).context("invalid hex")?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("expected 32 bytes of hex"))
}

fn parse_entry(raw: &str) -> Result<RevealEntryRpc> {
    let mut parts = raw.splitn(3, ':');
    let value = parts
        .next()
        .ok_or_else(|| anyhow!("missing value in entry {raw:?}"))?
        .parse::<u64>()
        .context("entry value must be an integer")?;
    let fake = parts
        .next()
        .ok_or_else(|| anyhow!("missing fake flag in entry {raw:?}"))?
        .parse::<bool>()
        .context("entry fake flag must be true or false")?;
    let secret = parts
        .next()
        .ok_or_else(|| anyhow!("missing secret in entry {raw:?}"))?;
    parse_hex32(secret)?;

    Ok(RevealEntryRpc {
        value,
        fake,
        secret: secret.to_string(),
    })
}
