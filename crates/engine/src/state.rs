//! Ledger state structures for the auction engine.

use std::collections::HashMap;

use blindbid_types::{Address, Asset, AuctionConfig, AuctionOutcome, AuctionPhase, SealedBid};

use crate::genesis::{DefaultAuctionParams, GenesisConfig, GenesisValidationError};

/// Creator recorded on assets registered at genesis.
pub const GENESIS_CREATOR: Address = [0u8; 32];

/// One auction instance: immutable configuration plus the mutable ledger
/// aggregate every operation funnels through.
///
/// The bid arena and the pending-returns map are crate-private; the only
/// mutation paths are the call handlers, which keeps the held-funds
/// accounting in one place.
#[derive(Debug, Clone)]
pub struct Auction {
    pub config: AuctionConfig,

    /// Highest valid revealed bid so far. Non-decreasing.
    pub highest_bid: u64,
    pub highest_bidder: Option<Address>,

    /// Set exactly once, by finalize.
    pub ended: bool,

    /// Funds currently held by this auction: locked deposits plus pending
    /// returns not yet withdrawn.
    pub held: u64,

    /// Commitment arena. A bidder's sequence index is the position in
    /// their list.
    pub(crate) bids: HashMap<Address, Vec<SealedBid>>,

    /// Bidders in first-commit order.
    pub(crate) bidders: Vec<Address>,

    /// Withdrawable balances.
    pub(crate) pending_returns: HashMap<Address, u64>,
}

impl Auction {
    /// Create a fresh auction ledger for a configuration.
    pub fn new(config: AuctionConfig) -> Self {
        Self {
            config,
            highest_bid: 0,
            highest_bidder: None,
            ended: false,
            held: 0,
            bids: HashMap::new(),
            bidders: Vec::new(),
            pending_returns: HashMap::new(),
        }
    }

    /// Derive the phase at `now`.
    pub fn phase(&self, now: u64) -> AuctionPhase {
        self.config.phase_at(now, self.ended)
    }

    /// All commitments submitted by a bidder, in submission order.
    pub fn bids_of(&self, bidder: &Address) -> &[SealedBid] {
        self.bids.get(bidder).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bidders in first-commit order.
    pub fn bidders(&self) -> &[Address] {
        &self.bidders
    }

    /// Total number of commitments across all bidders.
    pub fn total_commitments(&self) -> usize {
        self.bids.values().map(Vec::len).sum()
    }

    /// Whether the bidder's reveal call has already run. All of a bidder's
    /// bids flip together, so inspecting any one of them is enough.
    pub fn has_revealed(&self, bidder: &Address) -> bool {
        self.bids
            .get(bidder)
            .map_or(false, |bids| bids.iter().any(|b| b.revealed))
    }

    /// Withdrawable balance of an account.
    pub fn pending_balance(&self, account: &Address) -> u64 {
        self.pending_returns.get(account).copied().unwrap_or(0)
    }

    /// Sum of all withdrawable balances.
    pub fn total_pending(&self) -> u64 {
        self.pending_returns.values().sum()
    }

    /// Append a bid and lock its deposit. Record creation and the funds
    /// lock are one step: neither happens without the other.
    pub(crate) fn push_bid(&mut self, bid: SealedBid) {
        if !self.bids.contains_key(&bid.bidder) {
            self.bidders.push(bid.bidder);
        }
        self.held += bid.deposit;
        self.bids.entry(bid.bidder).or_default().push(bid);
    }

    /// Credit an account's pending returns.
    pub(crate) fn credit_pending(&mut self, account: Address, amount: u64) {
        if amount == 0 {
            return;
        }
        *self.pending_returns.entry(account).or_insert(0) += amount;
    }

    /// Zero an account's pending returns, returning the prior balance.
    pub(crate) fn take_pending(&mut self, account: &Address) -> u64 {
        self.pending_returns.remove(account).unwrap_or(0)
    }

    /// Put a taken balance back after a failed transfer.
    pub(crate) fn restore_pending(&mut self, account: Address, amount: u64) {
        self.credit_pending(account, amount);
    }
}

/// Auction engine state: the asset registry and every auction ledger.
#[derive(Debug, Default)]
pub struct LedgerState {
    /// Next asset ID to assign
    pub next_asset_id: u64,

    /// Next auction ID to assign
    pub next_auction_id: u64,

    /// Floors applied when auctions are created
    pub params: DefaultAuctionParams,

    /// All registered assets by ID
    pub assets: HashMap<u64, Asset>,

    /// All auctions by ID
    pub auctions: HashMap<u64, Auction>,

    /// Finalization records
    pub outcomes: HashMap<u64, AuctionOutcome>,
}

impl LedgerState {
    /// Create a new ledger state with default parameters.
    pub fn new() -> Self {
        Self {
            next_asset_id: 1,
            next_auction_id: 1,
            ..Default::default()
        }
    }

    /// Create a ledger state from a validated genesis configuration.
    pub fn from_genesis(config: &GenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;
        let mut state = Self::new();
        state.params = config.default_params.clone();
        for asset in &config.initial_assets {
            let asset_id = state.allocate_asset_id();
            state.assets.insert(
                asset_id,
                Asset {
                    asset_id,
                    creator: GENESIS_CREATOR,
                    name: asset.name.clone(),
                    description: asset.description.clone(),
                    media_uri: asset.media_uri.clone(),
                },
            );
        }
        Ok(state)
    }

    /// Get the next asset ID and increment.
    pub fn allocate_asset_id(&mut self) -> u64 {
        let id = self.next_asset_id;
        self.next_asset_id += 1;
        id
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&mut self) -> u64 {
        let id = self.next_auction_id;
        self.next_auction_id += 1;
        id
    }

    /// Get asset by ID.
    pub fn get_asset(&self, asset_id: u64) -> Option<&Asset> {
        self.assets.get(&asset_id)
    }

    /// Get auction by ID.
    pub fn get_auction(&self, auction_id: u64) -> Option<&Auction> {
        self.auctions.get(&auction_id)
    }

    /// Get mutable auction by ID.
    pub fn get_auction_mut(&mut self, auction_id: u64) -> Option<&mut Auction> {
        self.auctions.get_mut(&auction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindbid_types::Commitment;

    fn test_config() -> AuctionConfig {
        AuctionConfig {
            auction_id: 1,
            asset_id: 1,
            seller: [9u8; 32],
            start_time: 100,
            bidding_end: 200,
            reveal_end: 300,
            reserve_commitment: Commitment::default(),
        }
    }

    fn test_bid(bidder: Address, sequence: u32, deposit: u64) -> SealedBid {
        SealedBid {
            bidder,
            sequence,
            commitment: Commitment([sequence as u8; 32]),
            deposit,
            revealed: false,
            valid: false,
        }
    }

    #[test]
    fn test_allocate_ids() {
        let mut state = LedgerState::new();
        assert_eq!(state.allocate_asset_id(), 1);
        assert_eq!(state.allocate_asset_id(), 2);
        assert_eq!(state.allocate_auction_id(), 1);
        assert_eq!(state.allocate_auction_id(), 2);
    }

    #[test]
    fn test_push_bid_tracks_held_and_order() {
        let mut auction = Auction::new(test_config());
        let alice = [1u8; 32];
        let bob = [2u8; 32];

        auction.push_bid(test_bid(alice, 0, 100));
        auction.push_bid(test_bid(bob, 0, 50));
        auction.push_bid(test_bid(alice, 1, 70));

        assert_eq!(auction.held, 220);
        assert_eq!(auction.bidders(), &[alice, bob]);
        assert_eq!(auction.bids_of(&alice).len(), 2);
        assert_eq!(auction.bids_of(&alice)[1].sequence, 1);
        assert_eq!(auction.total_commitments(), 3);
    }

    #[test]
    fn test_pending_returns_accounting() {
        let mut auction = Auction::new(test_config());
        let alice = [1u8; 32];

        assert_eq!(auction.pending_balance(&alice), 0);

        auction.credit_pending(alice, 100);
        auction.credit_pending(alice, 50);
        assert_eq!(auction.pending_balance(&alice), 150);
        assert_eq!(auction.total_pending(), 150);

        assert_eq!(auction.take_pending(&alice), 150);
        assert_eq!(auction.pending_balance(&alice), 0);

        // A second take moves nothing.
        assert_eq!(auction.take_pending(&alice), 0);

        auction.restore_pending(alice, 150);
        assert_eq!(auction.pending_balance(&alice), 150);
    }

    #[test]
    fn test_credit_zero_is_noop() {
        let mut auction = Auction::new(test_config());
        auction.credit_pending([1u8; 32], 0);
        assert!(auction.pending_returns.is_empty());
    }

    #[test]
    fn test_from_genesis_registers_assets() {
        let mut config = GenesisConfig::default();
        config.initial_assets.push(crate::genesis::GenesisAsset {
            name: "plot-7".into(),
            description: "test asset".into(),
            media_uri: "ipfs://plot-7".into(),
        });

        let state = LedgerState::from_genesis(&config).unwrap();
        assert_eq!(state.assets.len(), 1);
        assert_eq!(state.get_asset(1).unwrap().creator, GENESIS_CREATOR);
        assert_eq!(state.next_asset_id, 2);
    }
}
