//! RPC-compatible types for the mock chain.
//!
//! These types are JSON-serializable versions of the core auction types,
//! with byte arrays rendered as hex strings.

use serde::{Deserialize, Serialize};

use blindbid_engine::queries::AuctionSummary;
use blindbid_engine::Auction;
use blindbid_types::{
    Asset, AuctionOutcome, AuctionPhase, RevealReport, RevealStatus, SaleOutcome, SealedBid,
};

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for registering an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssetParams {
    pub sender: String,
    pub name: String,
    pub description: String,
    pub media_uri: String,
}

/// Parameters for creating an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionParams {
    pub sender: String,
    pub asset_id: u64,
    pub start_time: u64,
    pub bidding_duration: u64,
    pub reveal_duration: u64,
    /// Hex-encoded reserve price commitment (32 bytes)
    pub reserve_commitment: String,
}

/// Parameters for submitting a sealed commitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitParams {
    pub sender: String,
    pub auction_id: u64,
    /// Hex-encoded commitment (32 bytes)
    pub commitment: String,
    /// Deposit locked with the commitment
    pub deposit: u64,
}

/// One reveal opening for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealEntryRpc {
    pub value: u64,
    pub fake: bool,
    /// Hex-encoded secret nonce (32 bytes)
    pub secret: String,
}

/// Parameters for revealing commitments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealParams {
    pub sender: String,
    pub auction_id: u64,
    pub entries: Vec<RevealEntryRpc>,
}

/// Parameters for finalizing an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeParams {
    pub sender: String,
    pub auction_id: u64,
    pub reserve: u64,
    /// Hex-encoded reserve salt (32 bytes)
    pub salt: String,
}

/// Asset for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRpc {
    pub asset_id: u64,
    pub creator: String,
    pub name: String,
    pub description: String,
    pub media_uri: String,
}

impl From<&Asset> for AssetRpc {
    fn from(a: &Asset) -> Self {
        Self {
            asset_id: a.asset_id,
            creator: hex::encode(a.creator),
            name: a.name.clone(),
            description: a.description.clone(),
            media_uri: a.media_uri.clone(),
        }
    }
}

/// Auction configuration and live state for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRpc {
    pub auction_id: u64,
    pub asset_id: u64,
    pub seller: String,
    pub start_time: u64,
    pub bidding_end: u64,
    pub reveal_end: u64,
    pub reserve_commitment: String,
    pub phase: String,
    pub highest_bid: u64,
    pub highest_bidder: Option<String>,
    pub ended: bool,
    pub held: u64,
}

impl AuctionRpc {
    pub fn from_auction(auction: &Auction, now: u64) -> Self {
        Self {
            auction_id: auction.config.auction_id,
            asset_id: auction.config.asset_id,
            seller: hex::encode(auction.config.seller),
            start_time: auction.config.start_time,
            bidding_end: auction.config.bidding_end,
            reveal_end: auction.config.reveal_end,
            reserve_commitment: auction.config.reserve_commitment.to_string(),
            phase: phase_str(auction.phase(now)).to_string(),
            highest_bid: auction.highest_bid,
            highest_bidder: auction.highest_bidder.map(hex::encode),
            ended: auction.ended,
            held: auction.held,
        }
    }
}

/// Sealed bid for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedBidRpc {
    pub bidder: String,
    pub sequence: u32,
    pub commitment: String,
    pub deposit: u64,
    pub revealed: bool,
    pub valid: bool,
}

impl From<&SealedBid> for SealedBidRpc {
    fn from(b: &SealedBid) -> Self {
        Self {
            bidder: hex::encode(b.bidder),
            sequence: b.sequence,
            commitment: b.commitment.to_string(),
            deposit: b.deposit,
            revealed: b.revealed,
            valid: b.valid,
        }
    }
}

/// Reveal report for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealReportRpc {
    pub statuses: Vec<String>,
    pub refunded: u64,
}

impl From<RevealReport> for RevealReportRpc {
    fn from(r: RevealReport) -> Self {
        Self {
            statuses: r.statuses.iter().map(|s| status_str(*s).to_string()).collect(),
            refunded: r.refunded,
        }
    }
}

fn status_str(status: RevealStatus) -> &'static str {
    match status {
        RevealStatus::Leading => "leading",
        RevealStatus::Outbid => "outbid",
        RevealStatus::Decoy => "decoy",
        RevealStatus::Mismatch => "mismatch",
        RevealStatus::InsufficientCollateral => "insufficient_collateral",
    }
}

/// Finalization record for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionOutcomeRpc {
    pub auction_id: u64,
    /// "sale", "reserve_not_met", or "no_valid_bids"
    pub outcome: String,
    pub winner: Option<String>,
    pub amount: Option<u64>,
    pub reserve: Option<u64>,
    pub finalized_at: u64,
    pub finalized_by: String,
}

impl From<AuctionOutcome> for AuctionOutcomeRpc {
    fn from(record: AuctionOutcome) -> Self {
        let (outcome, winner, amount, reserve) = match record.outcome {
            SaleOutcome::Sale { winner, amount } => {
                ("sale", Some(hex::encode(winner)), Some(amount), None)
            }
            SaleOutcome::ReserveNotMet {
                best_bidder,
                best_bid,
                reserve,
            } => (
                "reserve_not_met",
                Some(hex::encode(best_bidder)),
                Some(best_bid),
                Some(reserve),
            ),
            SaleOutcome::NoValidBids => ("no_valid_bids", None, None, None),
        };
        Self {
            auction_id: record.auction_id,
            outcome: outcome.to_string(),
            winner,
            amount,
            reserve,
            finalized_at: record.finalized_at,
            finalized_by: hex::encode(record.finalized_by),
        }
    }
}

/// Auction summary for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSummaryRpc {
    pub auction_id: u64,
    pub asset_id: u64,
    pub seller: String,
    pub phase: String,
    pub bidding_end: u64,
    pub reveal_end: u64,
    pub num_bidders: usize,
    pub num_commitments: usize,
    pub highest_bid: u64,
}

impl From<AuctionSummary> for AuctionSummaryRpc {
    fn from(s: AuctionSummary) -> Self {
        Self {
            auction_id: s.auction_id,
            asset_id: s.asset_id,
            seller: hex::encode(s.seller),
            phase: phase_str(s.phase).to_string(),
            bidding_end: s.bidding_end,
            reveal_end: s.reveal_end,
            num_bidders: s.num_bidders,
            num_commitments: s.num_commitments,
            highest_bid: s.highest_bid,
        }
    }
}

pub fn phase_str(phase: AuctionPhase) -> &'static str {
    match phase {
        AuctionPhase::Created => "created",
        AuctionPhase::Bidding => "bidding",
        AuctionPhase::Reveal => "reveal",
        AuctionPhase::Closing => "closing",
        AuctionPhase::Ended => "ended",
    }
}
