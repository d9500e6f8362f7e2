//! Mock chain host for local testing of the blind auction engine.
//!
//! This provides a JSON-RPC server that simulates the ordered host ledger
//! the engine expects: one lock serializes every operation, a simulated
//! clock drives the phase machine, and an in-memory bank receives
//! withdrawals.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use tracing::info;

use blindbid_engine::handlers::{self, CallContext, PaymentSink};
use blindbid_engine::queries::{self, AuctionQuery, AuctionQueryResponse};
use blindbid_engine::{GenesisConfig, LedgerState, TransferError};
use blindbid_types::{Address, Commitment, RevealEntry};

mod types;
use types::*;

/// External balance book. Withdrawn funds land here.
#[derive(Debug, Default)]
struct Bank {
    balances: HashMap<Address, u64>,
}

impl Bank {
    fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl PaymentSink for Bank {
    fn transfer(&mut self, to: &Address, amount: u64) -> Result<(), TransferError> {
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

/// Shared chain state.
struct ChainState {
    /// Engine ledger
    ledger: LedgerState,
    /// External balances withdrawals land in
    bank: Bank,
    /// Current block height (simulated)
    block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    timestamp: u64,
}

impl ChainState {
    fn new() -> Self {
        Self {
            ledger: LedgerState::new(),
            bank: Bank::default(),
            block_height: 0,
            timestamp: 0,
        }
    }

    fn advance_block(&mut self) {
        self.block_height += 1;
        self.timestamp += 12; // ~12 second blocks
    }

    fn context(&self, sender: Address, value: u64) -> CallContext {
        CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
            value,
        }
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait BlindAuctionApi {
    // ============ Admin Methods ============

    /// Initialize the chain with a genesis config, replacing any prior
    /// state.
    #[method(name = "admin_init")]
    async fn admin_init(
        &self,
        config: GenesisConfig,
        initial_timestamp: Option<u64>,
    ) -> Result<bool, ErrorObjectOwned>;

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    // ============ Registry Methods ============

    /// Register an asset.
    #[method(name = "asset_create")]
    async fn asset_create(&self, params: CreateAssetParams) -> Result<u64, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Create a new auction for a registered asset.
    #[method(name = "auction_create")]
    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned>;

    /// Submit a sealed commitment with its deposit.
    #[method(name = "auction_commit")]
    async fn auction_commit(&self, params: CommitParams) -> Result<u32, ErrorObjectOwned>;

    /// Open every commitment the sender submitted.
    #[method(name = "auction_reveal")]
    async fn auction_reveal(&self, params: RevealParams)
        -> Result<RevealReportRpc, ErrorObjectOwned>;

    /// Finalize an auction by revealing the reserve price.
    #[method(name = "auction_finalize")]
    async fn auction_finalize(
        &self,
        params: FinalizeParams,
    ) -> Result<AuctionOutcomeRpc, ErrorObjectOwned>;

    /// Withdraw the sender's pending returns into the bank.
    #[method(name = "auction_withdraw")]
    async fn auction_withdraw(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<u64, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get asset by ID.
    #[method(name = "query_getAsset")]
    async fn query_get_asset(&self, asset_id: u64) -> Result<Option<AssetRpc>, ErrorObjectOwned>;

    /// List all registered assets.
    #[method(name = "query_listAssets")]
    async fn query_list_assets(&self) -> Result<Vec<AssetRpc>, ErrorObjectOwned>;

    /// Get auction by ID, including live state.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned>;

    /// List all auctions.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned>;

    /// List auctions currently accepting commitments.
    #[method(name = "query_openAuctions")]
    async fn query_open_auctions(&self) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned>;

    /// List auctions awaiting finalize.
    #[method(name = "query_finalizableAuctions")]
    async fn query_finalizable_auctions(&self) -> Result<Vec<u64>, ErrorObjectOwned>;

    /// Get one bidder's commitments for an auction.
    #[method(name = "query_getBids")]
    async fn query_get_bids(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Vec<SealedBidRpc>, ErrorObjectOwned>;

    /// Get an account's withdrawable balance.
    #[method(name = "query_pendingBalance")]
    async fn query_pending_balance(
        &self,
        auction_id: u64,
        account: String,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Get the current highest valid bid.
    #[method(name = "query_highestBid")]
    async fn query_highest_bid(&self, auction_id: u64) -> Result<u64, ErrorObjectOwned>;

    /// Get the current leader, if any.
    #[method(name = "query_highestBidder")]
    async fn query_highest_bidder(
        &self,
        auction_id: u64,
    ) -> Result<Option<String>, ErrorObjectOwned>;

    /// Whether finalize has run.
    #[method(name = "query_ended")]
    async fn query_ended(&self, auction_id: u64) -> Result<bool, ErrorObjectOwned>;

    /// Get the finalization record.
    #[method(name = "query_getOutcome")]
    async fn query_get_outcome(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionOutcomeRpc>, ErrorObjectOwned>;

    /// Get an account's bank balance (funds already withdrawn).
    #[method(name = "query_bankBalance")]
    async fn query_bank_balance(&self, account: String) -> Result<u64, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new())),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }
}

#[async_trait]
impl BlindAuctionApiServer for MockChainServer {
    async fn admin_init(
        &self,
        config: GenesisConfig,
        initial_timestamp: Option<u64>,
    ) -> Result<bool, ErrorObjectOwned> {
        let ledger = LedgerState::from_genesis(&config)
            .map_err(|e| Self::rpc_error(&format!("Invalid genesis config: {}", e)))?;

        let mut state = self.state.write();
        state.ledger = ledger;
        state.bank = Bank::default();
        state.block_height = 0;
        state.timestamp = initial_timestamp.unwrap_or(0);

        info!(
            "Chain initialized with {} genesis asset(s)",
            state.ledger.assets.len()
        );
        Ok(true)
    }

    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.timestamp = timestamp;
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn asset_create(&self, params: CreateAssetParams) -> Result<u64, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender), 0);

        let asset_id = handlers::handle_create_asset(
            &mut state.ledger,
            &ctx,
            params.name.clone(),
            params.description,
            params.media_uri,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to create asset: {}", e)))?;

        info!("Asset {} registered as {}", params.name, asset_id);
        Ok(asset_id)
    }

    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender), 0);
        let reserve_commitment = Commitment(parse_hex32(&params.reserve_commitment)?);

        let auction_id = handlers::handle_create_auction(
            &mut state.ledger,
            &ctx,
            params.asset_id,
            params.start_time,
            params.bidding_duration,
            params.reveal_duration,
            reserve_commitment,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to create auction: {}", e)))?;

        info!("Created auction {}", auction_id);
        Ok(auction_id)
    }

    async fn auction_commit(&self, params: CommitParams) -> Result<u32, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender), params.deposit);
        let commitment = Commitment(parse_hex32(&params.commitment)?);

        let sequence =
            handlers::handle_commit(&mut state.ledger, &ctx, params.auction_id, commitment)
                .map_err(|e| Self::rpc_error(&format!("Failed to commit: {}", e)))?;

        info!(
            "Commitment {} stored for auction {} by {}",
            sequence, params.auction_id, params.sender
        );
        Ok(sequence)
    }

    async fn auction_reveal(
        &self,
        params: RevealParams,
    ) -> Result<RevealReportRpc, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender), 0);

        let mut entries = Vec::with_capacity(params.entries.len());
        for entry in &params.entries {
            entries.push(RevealEntry {
                value: entry.value,
                fake: entry.fake,
                secret: parse_hex32(&entry.secret)?,
            });
        }

        let report = handlers::handle_reveal(&mut state.ledger, &ctx, params.auction_id, &entries)
            .map_err(|e| Self::rpc_error(&format!("Failed to reveal: {}", e)))?;

        info!(
            "Reveal of {} entries for auction {} by {}",
            entries.len(),
            params.auction_id,
            params.sender
        );
        Ok(report.into())
    }

    async fn auction_finalize(
        &self,
        params: FinalizeParams,
    ) -> Result<AuctionOutcomeRpc, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender), 0);
        let salt = parse_hex32(&params.salt)?;

        let record = handlers::handle_finalize(
            &mut state.ledger,
            &ctx,
            params.auction_id,
            params.reserve,
            &salt,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to finalize: {}", e)))?;

        info!("Auction {} finalized: {:?}", params.auction_id, record.outcome);
        Ok(record.into())
    }

    async fn auction_withdraw(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<u64, ErrorObjectOwned> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let ctx = CallContext {
            sender: parse_address(&sender),
            block_height: state.block_height,
            timestamp: state.timestamp,
            value: 0,
        };

        let amount =
            handlers::handle_withdraw(&mut state.ledger, &ctx, auction_id, &mut state.bank)
                .map_err(|e| Self::rpc_error(&format!("Failed to withdraw: {}", e)))?;

        info!("Withdrawal of {} by {}", amount, sender);
        Ok(amount)
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn query_get_asset(&self, asset_id: u64) -> Result<Option<AssetRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.ledger.get_asset(asset_id).map(AssetRpc::from))
    }

    async fn query_list_assets(&self) -> Result<Vec<AssetRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        match queries::handle_query(&state.ledger, AuctionQuery::ListAssets) {
            AuctionQueryResponse::AssetList(assets) => {
                Ok(assets.iter().map(AssetRpc::from).collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .ledger
            .get_auction(auction_id)
            .map(|a| AuctionRpc::from_auction(a, state.timestamp)))
    }

    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        let mut auctions: Vec<AuctionRpc> = state
            .ledger
            .auctions
            .values()
            .map(|a| AuctionRpc::from_auction(a, state.timestamp))
            .collect();
        auctions.sort_by_key(|a| a.auction_id);
        Ok(auctions)
    }

    async fn query_open_auctions(&self) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_open_auctions(&state.ledger, state.timestamp)
            .into_iter()
            .map(AuctionSummaryRpc::from)
            .collect())
    }

    async fn query_finalizable_auctions(&self) -> Result<Vec<u64>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_finalizable_auctions(
            &state.ledger,
            state.timestamp,
        ))
    }

    async fn query_get_bids(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Vec<SealedBidRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        let query = AuctionQuery::GetBids {
            auction_id,
            bidder: parse_address(&bidder),
        };
        match queries::handle_query(&state.ledger, query) {
            AuctionQueryResponse::Bids(bids) => Ok(bids.iter().map(SealedBidRpc::from).collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn query_pending_balance(
        &self,
        auction_id: u64,
        account: String,
    ) -> Result<u64, ErrorObjectOwned> {
        let state = self.state.read();
        let query = AuctionQuery::PendingBalance {
            auction_id,
            account: parse_address(&account),
        };
        match queries::handle_query(&state.ledger, query) {
            AuctionQueryResponse::Balance(amount) => Ok(amount),
            _ => Ok(0),
        }
    }

    async fn query_highest_bid(&self, auction_id: u64) -> Result<u64, ErrorObjectOwned> {
        let state = self.state.read();
        match queries::handle_query(&state.ledger, AuctionQuery::HighestBid { auction_id }) {
            AuctionQueryResponse::HighestBid(amount) => Ok(amount),
            _ => Ok(0),
        }
    }

    async fn query_highest_bidder(
        &self,
        auction_id: u64,
    ) -> Result<Option<String>, ErrorObjectOwned> {
        let state = self.state.read();
        match queries::handle_query(&state.ledger, AuctionQuery::HighestBidder { auction_id }) {
            AuctionQueryResponse::HighestBidder(bidder) => Ok(bidder.map(hex::encode)),
            _ => Ok(None),
        }
    }

    async fn query_ended(&self, auction_id: u64) -> Result<bool, ErrorObjectOwned> {
        let state = self.state.read();
        match queries::handle_query(&state.ledger, AuctionQuery::Ended { auction_id }) {
            AuctionQueryResponse::Ended(ended) => Ok(ended),
            _ => Ok(false),
        }
    }

    async fn query_get_outcome(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionOutcomeRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        match queries::handle_query(&state.ledger, AuctionQuery::GetOutcome { auction_id }) {
            AuctionQueryResponse::Outcome(record) => Ok(record.map(AuctionOutcomeRpc::from)),
            _ => Ok(None),
        }
    }

    async fn query_bank_balance(&self, account: String) -> Result<u64, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.bank.balance(&parse_address(&account)))
    }
}

fn parse_address(s: &str) -> Address {
    let mut addr = [0u8; 32];
    if let Ok(bytes) = hex::decode(s.trim_start_matches("0x")) {
        let len = bytes.len().min(32);
        addr[..len].copy_from_slice(&bytes[..len]);
    }
    addr
}

fn parse_hex32(s: &str) -> Result<[u8; 32], ErrorObjectOwned> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| MockChainServer::rpc_error(&format!("Invalid hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| MockChainServer::rpc_error("Expected 32 bytes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blindbid_chain=info".parse().unwrap())
                .add_directive("jsonrpsee=warn".parse().unwrap()),
        )
        .init();

    let addr: SocketAddr = "127.0.0.1:9944".parse()?;

    info!("Starting mock chain server on {}", addr);

    let server = Server::builder().build(addr).await?;
    let handle = server.start(MockChainServer::new().into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
