//! End-to-end lifecycle tests for the sealed-bid auction engine.
//!
//! These tests drive the public handler surface the way a host ledger
//! would: one strictly ordered operation stream against a single ledger,
//! with an in-memory bank standing in for the funds transport.

use std::collections::HashMap;

use blindbid_engine::handlers::{self, CallContext, PaymentSink};
use blindbid_engine::{AuctionError, HandlerResult, LedgerState, TransferError};
use blindbid_types::{
    compute_bid_commitment, compute_reserve_commitment, Address, AuctionOutcome, AuctionPhase,
    RevealEntry, RevealReport, SaleOutcome, Salt, Secret,
};

/// External balance book standing in for the funds transport.
#[derive(Debug, Default)]
pub struct Bank {
    pub balances: HashMap<Address, u64>,
    /// When set, every transfer is rejected.
    pub frozen: bool,
}

impl Bank {
    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl PaymentSink for Bank {
    fn transfer(&mut self, to: &Address, amount: u64) -> Result<(), TransferError> {
        if self.frozen {
            return Err(TransferError("account rejected the transfer".into()));
        }
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

/// Drives the engine with a simulated clock, one operation at a time.
pub struct Harness {
    pub state: LedgerState,
    pub bank: Bank,
    pub now: u64,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: LedgerState::new(),
            bank: Bank::default(),
            now: 0,
        }
    }

    fn ctx(&self, sender: Address, value: u64) -> CallContext {
        CallContext {
            sender,
            block_height: 0,
            timestamp: self.now,
            value,
        }
    }

    /// Register an asset and create an auction for it in one step, the
    /// way the registry layer drives the engine.
    pub fn listed_auction(
        &mut self,
        seller: Address,
        start_time: u64,
        bidding_duration: u64,
        reveal_duration: u64,
        reserve: u64,
        salt: &Salt,
    ) -> u64 {
        let ctx = self.ctx(seller, 0);
        let asset_id = handlers::handle_create_asset(
            &mut self.state,
            &ctx,
            "plot-7".into(),
            "auctioned asset".into(),
            "ipfs://plot-7".into(),
        )
        .unwrap();

        handlers::handle_create_auction(
            &mut self.state,
            &ctx,
            asset_id,
            start_time,
            bidding_duration,
            reveal_duration,
            compute_reserve_commitment(reserve, salt),
        )
        .unwrap()
    }

    pub fn commit(
        &mut self,
        auction_id: u64,
        bidder: Address,
        value: u64,
        fake: bool,
        secret: &Secret,
        deposit: u64,
    ) -> HandlerResult<u32> {
        let ctx = self.ctx(bidder, deposit);
        handlers::handle_commit(
            &mut self.state,
            &ctx,
            auction_id,
            compute_bid_commitment(value, fake, secret),
        )
    }

    pub fn reveal(
        &mut self,
        auction_id: u64,
        bidder: Address,
        entries: &[RevealEntry],
    ) -> HandlerResult<RevealReport> {
        let ctx = self.ctx(bidder, 0);
        handlers::handle_reveal(&mut self.state, &ctx, auction_id, entries)
    }

    pub fn finalize(
        &mut self,
        auction_id: u64,
        caller: Address,
        reserve: u64,
        salt: &Salt,
    ) -> HandlerResult<AuctionOutcome> {
        let ctx = self.ctx(caller, 0);
        handlers::handle_finalize(&mut self.state, &ctx, auction_id, reserve, salt)
    }

    pub fn withdraw(&mut self, auction_id: u64, account: Address) -> HandlerResult<u64> {
        let ctx = self.ctx(account, 0);
        handlers::handle_withdraw(&mut self.state, &ctx, auction_id, &mut self.bank)
    }

    pub fn pending(&self, auction_id: u64, account: &Address) -> u64 {
        self.state
            .get_auction(auction_id)
            .map(|a| a.pending_balance(account))
            .unwrap_or(0)
    }

    /// The funds conservation law: everything the auction holds is either
    /// an unrevealed deposit, the retained leading bid, or a pending
    /// return awaiting withdrawal.
    pub fn assert_funds_conserved(&self, auction_id: u64) {
        let auction = self.state.get_auction(auction_id).unwrap();

        let mut unrevealed = 0u64;
        for bidder in auction.bidders() {
            for bid in auction.bids_of(bidder) {
                if !bid.revealed {
                    unrevealed += bid.deposit;
                }
            }
        }
        let retained = if auction.ended { 0 } else { auction.highest_bid };

        assert_eq!(
            auction.held,
            unrevealed + retained + auction.total_pending(),
            "held funds diverged from the ledger for auction {auction_id}"
        );
    }
}

/// Build a reveal opening.
pub fn entry(value: u64, fake: bool, secret: &Secret) -> RevealEntry {
    RevealEntry {
        value,
        fake,
        secret: *secret,
    }
}
