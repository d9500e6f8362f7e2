//! Query handlers for the auction engine.
//!
//! These functions provide read-only access to ledger state.

use serde::{Deserialize, Serialize};

use blindbid_types::{
    Address, Asset, AuctionConfig, AuctionOutcome, AuctionPhase, SealedBid,
};

use crate::state::{Auction, LedgerState};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get asset details by ID.
    GetAsset { asset_id: u64 },

    /// Get all registered assets.
    ListAssets,

    /// Get auction configuration by ID.
    GetAuction { auction_id: u64 },

    /// Get all auctions (paginated).
    ListAuctions { offset: u64, limit: u64 },

    /// Get one bidder's commitments for an auction.
    GetBids { auction_id: u64, bidder: Address },

    /// Get an account's withdrawable balance.
    PendingBalance { auction_id: u64, account: Address },

    /// Get the current highest valid bid.
    HighestBid { auction_id: u64 },

    /// Get the current leader, if any.
    HighestBidder { auction_id: u64 },

    /// Whether finalize has run.
    Ended { auction_id: u64 },

    /// Get the finalization record.
    GetOutcome { auction_id: u64 },

    /// Derive the phase at a given time.
    Phase { auction_id: u64, now: u64 },
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    Asset(Option<Asset>),
    AssetList(Vec<Asset>),
    Auction(Option<AuctionConfig>),
    AuctionList(Vec<AuctionConfig>),
    Bids(Vec<SealedBid>),
    Balance(u64),
    HighestBid(u64),
    HighestBidder(Option<Address>),
    Ended(bool),
    Outcome(Option<AuctionOutcome>),
    Phase(Option<AuctionPhase>),
}

/// Handle a query.
pub fn handle_query(state: &LedgerState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetAsset { asset_id } => {
            AuctionQueryResponse::Asset(state.get_asset(asset_id).cloned())
        }

        AuctionQuery::ListAssets => {
            let mut assets: Vec<Asset> = state.assets.values().cloned().collect();
            assets.sort_by_key(|a| a.asset_id);
            AuctionQueryResponse::AssetList(assets)
        }

        AuctionQuery::GetAuction { auction_id } => AuctionQueryResponse::Auction(
            state.get_auction(auction_id).map(|a| a.config.clone()),
        ),

        AuctionQuery::ListAuctions { offset, limit } => {
            let mut configs: Vec<AuctionConfig> = state
                .auctions
                .values()
                .map(|a| a.config.clone())
                .collect();
            configs.sort_by_key(|c| c.auction_id);
            let configs = configs
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            AuctionQueryResponse::AuctionList(configs)
        }

        AuctionQuery::GetBids { auction_id, bidder } => {
            let bids = state
                .get_auction(auction_id)
                .map(|a| a.bids_of(&bidder).to_vec())
                .unwrap_or_default();
            AuctionQueryResponse::Bids(bids)
        }

        AuctionQuery::PendingBalance {
            auction_id,
            account,
        } => AuctionQueryResponse::Balance(
            state
                .get_auction(auction_id)
                .map(|a| a.pending_balance(&account))
                .unwrap_or(0),
        ),

        AuctionQuery::HighestBid { auction_id } => AuctionQueryResponse::HighestBid(
            state
                .get_auction(auction_id)
                .map(|a| a.highest_bid)
                .unwrap_or(0),
        ),

        AuctionQuery::HighestBidder { auction_id } => AuctionQueryResponse::HighestBidder(
            state.get_auction(auction_id).and_then(|a| a.highest_bidder),
        ),

        AuctionQuery::Ended { auction_id } => AuctionQueryResponse::Ended(
            state
                .get_auction(auction_id)
                .map(|a| a.ended)
                .unwrap_or(false),
        ),

        AuctionQuery::GetOutcome { auction_id } => {
            AuctionQueryResponse::Outcome(state.outcomes.get(&auction_id).cloned())
        }

        AuctionQuery::Phase { auction_id, now } => AuctionQueryResponse::Phase(
            state.get_auction(auction_id).map(|a| a.phase(now)),
        ),
    }
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub asset_id: u64,
    pub seller: Address,
    pub phase: AuctionPhase,
    pub bidding_end: u64,
    pub reveal_end: u64,
    pub num_bidders: usize,
    pub num_commitments: usize,
    pub highest_bid: u64,
}

impl AuctionSummary {
    /// Create a summary from an auction ledger at a given time.
    pub fn from_auction(auction: &Auction, now: u64) -> Self {
        Self {
            auction_id: auction.config.auction_id,
            asset_id: auction.config.asset_id,
            seller: auction.config.seller,
            phase: auction.phase(now),
            bidding_end: auction.config.bidding_end,
            reveal_end: auction.config.reveal_end,
            num_bidders: auction.bidders().len(),
            num_commitments: auction.total_commitments(),
            highest_bid: auction.highest_bid,
        }
    }
}

/// Auctions currently accepting commitments.
pub fn get_open_auctions(state: &LedgerState, now: u64) -> Vec<AuctionSummary> {
    let mut open: Vec<AuctionSummary> = state
        .auctions
        .values()
        .filter(|a| a.phase(now) == AuctionPhase::Bidding)
        .map(|a| AuctionSummary::from_auction(a, now))
        .collect();
    open.sort_by_key(|s| s.auction_id);
    open
}

/// Auctions whose reveal window has closed but finalize has not run.
pub fn get_finalizable_auctions(state: &LedgerState, now: u64) -> Vec<u64> {
    let mut ids: Vec<u64> = state
        .auctions
        .values()
        .filter(|a| a.phase(now) == AuctionPhase::Closing)
        .map(|a| a.config.auction_id)
        .collect();
    ids.sort_unstable();
    ids
}
