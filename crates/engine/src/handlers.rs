//! Call handlers for the auction engine.
//!
//! These functions implement the business logic for each call type. Every
//! handler checks its guards before touching state, so a failed call
//! leaves the ledger exactly as it found it.

use crate::error::{AuctionError, TransferError};
use crate::state::LedgerState;
use blindbid_types::{
    compute_bid_commitment, compute_reserve_commitment, Address, Asset, AuctionConfig,
    AuctionOutcome, AuctionPhase, Commitment, RevealEntry, RevealReport, RevealStatus, SaleOutcome,
    Salt, SealedBid,
};

/// Context provided by the host for each call.
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp
    pub timestamp: u64,
    /// Value attached to the call (the deposit, for commits)
    pub value: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Destination for funds leaving the engine.
///
/// The withdraw handler zeroes the ledger balance before invoking the
/// sink, so a call back into the engine during the transfer finds nothing
/// left to take. A sink that fails must leave the receiving side
/// untouched; the handler then restores the balance and fails the call.
pub trait PaymentSink {
    fn transfer(&mut self, to: &Address, amount: u64) -> Result<(), TransferError>;
}

/// Handle CreateAsset.
pub fn handle_create_asset(
    state: &mut LedgerState,
    ctx: &CallContext,
    name: String,
    description: String,
    media_uri: String,
) -> HandlerResult<u64> {
    let asset_id = state.allocate_asset_id();
    state.assets.insert(
        asset_id,
        Asset {
            asset_id,
            creator: ctx.sender,
            name,
            description,
            media_uri,
        },
    );
    Ok(asset_id)
}

/// Handle CreateAuction. The caller becomes the seller.
pub fn handle_create_auction(
    state: &mut LedgerState,
    ctx: &CallContext,
    asset_id: u64,
    start_time: u64,
    bidding_duration: u64,
    reveal_duration: u64,
    reserve_commitment: Commitment,
) -> HandlerResult<u64> {
    if !state.assets.contains_key(&asset_id) {
        return Err(AuctionError::AssetNotFound(asset_id));
    }

    // Validate timing against the configured floors
    if bidding_duration < state.params.min_bidding_duration
        || reveal_duration < state.params.min_reveal_duration
    {
        return Err(AuctionError::InvalidTiming);
    }
    let bidding_end = start_time
        .checked_add(bidding_duration)
        .ok_or(AuctionError::InvalidTiming)?;
    let reveal_end = bidding_end
        .checked_add(reveal_duration)
        .ok_or(AuctionError::InvalidTiming)?;

    let auction_id = state.allocate_auction_id();
    let config = AuctionConfig {
        auction_id,
        asset_id,
        seller: ctx.sender,
        start_time,
        bidding_end,
        reveal_end,
        reserve_commitment,
    };

    state
        .auctions
        .insert(auction_id, crate::state::Auction::new(config));

    Ok(auction_id)
}

/// Handle Commit. The attached value is the deposit.
///
/// Returns the sequence index assigned to the new commitment. A bidder
/// may commit any number of times; decoys are indistinguishable from real
/// bids until reveal.
pub fn handle_commit(
    state: &mut LedgerState,
    ctx: &CallContext,
    auction_id: u64,
    commitment: Commitment,
) -> HandlerResult<u32> {
    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    let phase = auction.phase(ctx.timestamp);
    if phase != AuctionPhase::Bidding {
        return Err(AuctionError::PhaseViolation {
            required: AuctionPhase::Bidding,
            current: phase,
        });
    }
    if ctx.value == 0 {
        return Err(AuctionError::ZeroDeposit);
    }

    let sequence = auction.bids_of(&ctx.sender).len() as u32;
    auction.push_bid(SealedBid {
        bidder: ctx.sender,
        sequence,
        commitment,
        deposit: ctx.value,
        revealed: false,
        valid: false,
    });

    Ok(sequence)
}

/// Handle Reveal.
///
/// Opens every commitment the caller submitted, in submission order. An
/// opening that fails verification is refunded rather than rejected, so
/// once the guards ahead of the loop pass, the whole call applies.
pub fn handle_reveal(
    state: &mut LedgerState,
    ctx: &CallContext,
    auction_id: u64,
    entries: &[RevealEntry],
) -> HandlerResult<RevealReport> {
    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    let phase = auction.phase(ctx.timestamp);
    if phase != AuctionPhase::Reveal {
        return Err(AuctionError::PhaseViolation {
            required: AuctionPhase::Reveal,
            current: phase,
        });
    }

    let count = auction.bids_of(&ctx.sender).len();
    if count == 0 {
        return Err(AuctionError::UnknownBidder);
    }
    if auction.has_revealed(&ctx.sender) {
        return Err(AuctionError::AlreadyRevealed);
    }
    if entries.len() != count {
        return Err(AuctionError::RevealLengthMismatch {
            expected: count,
            got: entries.len(),
        });
    }

    let openings: Vec<(Commitment, u64)> = auction
        .bids_of(&ctx.sender)
        .iter()
        .map(|bid| (bid.commitment, bid.deposit))
        .collect();

    let mut statuses = Vec::with_capacity(entries.len());
    let mut valid_flags = Vec::with_capacity(entries.len());
    let mut refunded = 0u64;

    for (entry, (stored, deposit)) in entries.iter().zip(openings) {
        let recomputed = compute_bid_commitment(entry.value, entry.fake, &entry.secret);

        let (status, valid) = if recomputed != stored {
            auction.credit_pending(ctx.sender, deposit);
            refunded += deposit;
            (RevealStatus::Mismatch, false)
        } else if entry.fake {
            auction.credit_pending(ctx.sender, deposit);
            refunded += deposit;
            (RevealStatus::Decoy, false)
        } else if entry.value > deposit {
            // Under-collateralized: the hidden value was never backed.
            auction.credit_pending(ctx.sender, deposit);
            refunded += deposit;
            (RevealStatus::InsufficientCollateral, false)
        } else {
            // Surplus above the bid comes back immediately, win or lose.
            let surplus = deposit - entry.value;
            auction.credit_pending(ctx.sender, surplus);
            refunded += surplus;

            // Strict comparison: the first revealed value keeps the slot
            // on ties.
            if entry.value > auction.highest_bid {
                if let Some(prev) = auction.highest_bidder {
                    auction.credit_pending(prev, auction.highest_bid);
                    if prev == ctx.sender {
                        refunded += auction.highest_bid;
                    }
                }
                auction.highest_bid = entry.value;
                auction.highest_bidder = Some(ctx.sender);
                (RevealStatus::Leading, true)
            } else {
                auction.credit_pending(ctx.sender, entry.value);
                refunded += entry.value;
                (RevealStatus::Outbid, true)
            }
        };

        statuses.push(status);
        valid_flags.push(valid);
    }

    if let Some(bids) = auction.bids.get_mut(&ctx.sender) {
        for (bid, valid) in bids.iter_mut().zip(valid_flags) {
            bid.revealed = true;
            bid.valid = valid;
        }
    }

    Ok(RevealReport { statuses, refunded })
}

/// Handle Finalize.
///
/// Whoever can present the reserve plaintext may close the auction; the
/// commitment check is the authorization. Settlement is pull-payment
/// throughout, so a bad seller account cannot block closing.
pub fn handle_finalize(
    state: &mut LedgerState,
    ctx: &CallContext,
    auction_id: u64,
    reserve: u64,
    salt: &Salt,
) -> HandlerResult<AuctionOutcome> {
    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    if auction.ended {
        return Err(AuctionError::DoubleFinalize);
    }
    let phase = auction.phase(ctx.timestamp);
    if phase != AuctionPhase::Closing {
        return Err(AuctionError::PhaseViolation {
            required: AuctionPhase::Closing,
            current: phase,
        });
    }
    if compute_reserve_commitment(reserve, salt) != auction.config.reserve_commitment {
        return Err(AuctionError::ReserveVerificationFailed);
    }

    auction.ended = true;
    let outcome = match auction.highest_bidder {
        Some(winner) if auction.highest_bid >= reserve => {
            let seller = auction.config.seller;
            auction.credit_pending(seller, auction.highest_bid);
            SaleOutcome::Sale {
                winner,
                amount: auction.highest_bid,
            }
        }
        Some(best_bidder) => {
            // Reserve not met: the would-be winner is made whole.
            auction.credit_pending(best_bidder, auction.highest_bid);
            SaleOutcome::ReserveNotMet {
                best_bidder,
                best_bid: auction.highest_bid,
                reserve,
            }
        }
        None => SaleOutcome::NoValidBids,
    };

    let record = AuctionOutcome {
        auction_id,
        outcome,
        finalized_at: ctx.timestamp,
        finalized_by: ctx.sender,
    };
    state.outcomes.insert(auction_id, record.clone());

    Ok(record)
}

/// Handle Withdraw.
///
/// Legal in every phase. A zero balance is a no-op, not an error. The
/// balance is zeroed before the sink runs and restored if the sink
/// fails, so the call either moves exactly the pre-call balance or
/// changes nothing.
pub fn handle_withdraw(
    state: &mut LedgerState,
    ctx: &CallContext,
    auction_id: u64,
    sink: &mut dyn PaymentSink,
) -> HandlerResult<u64> {
    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    let amount = auction.take_pending(&ctx.sender);
    if amount == 0 {
        return Ok(0);
    }

    auction.held -= amount;
    if let Err(err) = sink.transfer(&ctx.sender, amount) {
        auction.held += amount;
        auction.restore_pending(ctx.sender, amount);
        return Err(AuctionError::TransferFailed(err.0));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindbid_types::Secret;

    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];
    const CAROL: Address = [3u8; 32];
    const SELLER: Address = [9u8; 32];

    const SALT: Salt = [5u8; 32];
    const RESERVE: u64 = 100;

    // Timeline used throughout: bidding [1_000, 2_000), reveal [2_000, 3_000).
    const T_BIDDING: u64 = 1_500;
    const T_REVEAL: u64 = 2_500;
    const T_CLOSED: u64 = 3_500;

    fn ctx(sender: Address, timestamp: u64, value: u64) -> CallContext {
        CallContext {
            sender,
            block_height: 1,
            timestamp,
            value,
        }
    }

    fn setup_auction(state: &mut LedgerState) -> u64 {
        let asset_id = handle_create_asset(
            state,
            &ctx(SELLER, 0, 0),
            "plot-7".into(),
            "test asset".into(),
            "ipfs://plot-7".into(),
        )
        .unwrap();

        handle_create_auction(
            state,
            &ctx(SELLER, 0, 0),
            asset_id,
            1_000,
            1_000,
            1_000,
            compute_reserve_commitment(RESERVE, &SALT),
        )
        .unwrap()
    }

    fn secret(tag: u8) -> Secret {
        [tag; 32]
    }

    fn commit(
        state: &mut LedgerState,
        auction_id: u64,
        bidder: Address,
        value: u64,
        fake: bool,
        tag: u8,
        deposit: u64,
    ) -> HandlerResult<u32> {
        let commitment = compute_bid_commitment(value, fake, &secret(tag));
        handle_commit(state, &ctx(bidder, T_BIDDING, deposit), auction_id, commitment)
    }

    fn reveal_one(
        state: &mut LedgerState,
        auction_id: u64,
        bidder: Address,
        value: u64,
        fake: bool,
        tag: u8,
    ) -> HandlerResult<RevealReport> {
        handle_reveal(
            state,
            &ctx(bidder, T_REVEAL, 0),
            auction_id,
            &[RevealEntry {
                value,
                fake,
                secret: secret(tag),
            }],
        )
    }

    struct RecordingSink(Vec<(Address, u64)>);

    impl PaymentSink for RecordingSink {
        fn transfer(&mut self, to: &Address, amount: u64) -> Result<(), TransferError> {
            self.0.push((*to, amount));
            Ok(())
        }
    }

    struct FailingSink;

    impl PaymentSink for FailingSink {
        fn transfer(&mut self, _to: &Address, _amount: u64) -> Result<(), TransferError> {
            Err(TransferError("account rejected the transfer".into()))
        }
    }

    #[test]
    fn test_create_auction_unknown_asset() {
        let mut state = LedgerState::new();
        let result = handle_create_auction(
            &mut state,
            &ctx(SELLER, 0, 0),
            42,
            1_000,
            1_000,
            1_000,
            Commitment::default(),
        );
        assert!(matches!(result, Err(AuctionError::AssetNotFound(42))));
    }

    #[test]
    fn test_create_auction_below_duration_floor() {
        let mut state = LedgerState::new();
        let asset_id = handle_create_asset(
            &mut state,
            &ctx(SELLER, 0, 0),
            "a".into(),
            "b".into(),
            "c".into(),
        )
        .unwrap();

        // Default floor is 60 seconds per window.
        let result = handle_create_auction(
            &mut state,
            &ctx(SELLER, 0, 0),
            asset_id,
            1_000,
            30,
            1_000,
            Commitment::default(),
        );
        assert!(matches!(result, Err(AuctionError::InvalidTiming)));
    }

    #[test]
    fn test_commit_locks_deposit_and_sequences() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);

        assert_eq!(commit(&mut state, id, ALICE, 100, false, 10, 120).unwrap(), 0);
        assert_eq!(commit(&mut state, id, ALICE, 50, true, 11, 60).unwrap(), 1);
        assert_eq!(commit(&mut state, id, BOB, 80, false, 12, 80).unwrap(), 0);

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.held, 260);
        assert_eq!(auction.bids_of(&ALICE).len(), 2);
        assert_eq!(auction.bids_of(&BOB).len(), 1);
    }

    #[test]
    fn test_commit_outside_bidding_window() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        let commitment = compute_bid_commitment(100, false, &secret(10));

        let before = handle_commit(&mut state, &ctx(ALICE, 500, 120), id, commitment);
        assert!(matches!(
            before,
            Err(AuctionError::PhaseViolation {
                required: AuctionPhase::Bidding,
                current: AuctionPhase::Created,
            })
        ));

        let after = handle_commit(&mut state, &ctx(ALICE, T_REVEAL, 120), id, commitment);
        assert!(matches!(
            after,
            Err(AuctionError::PhaseViolation {
                current: AuctionPhase::Reveal,
                ..
            })
        ));
        assert_eq!(state.get_auction(id).unwrap().held, 0);
    }

    #[test]
    fn test_commit_zero_deposit() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        let commitment = compute_bid_commitment(100, false, &secret(10));

        let result = handle_commit(&mut state, &ctx(ALICE, T_BIDDING, 0), id, commitment);
        assert!(matches!(result, Err(AuctionError::ZeroDeposit)));
        assert_eq!(state.get_auction(id).unwrap().total_commitments(), 0);
    }

    #[test]
    fn test_reveal_single_valid_bid_takes_lead() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 100, false, 10, 120).unwrap();

        let report = reveal_one(&mut state, id, ALICE, 100, false, 10).unwrap();
        assert_eq!(report.statuses, vec![RevealStatus::Leading]);
        assert_eq!(report.refunded, 20); // deposit surplus

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.highest_bid, 100);
        assert_eq!(auction.highest_bidder, Some(ALICE));
        assert_eq!(auction.pending_balance(&ALICE), 20);
        assert!(auction.bids_of(&ALICE)[0].revealed);
        assert!(auction.bids_of(&ALICE)[0].valid);
    }

    #[test]
    fn test_reveal_outbid_refunds_full_deposit() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 200, false, 10, 200).unwrap();
        commit(&mut state, id, BOB, 150, false, 12, 180).unwrap();

        reveal_one(&mut state, id, ALICE, 200, false, 10).unwrap();
        let report = reveal_one(&mut state, id, BOB, 150, false, 12).unwrap();

        assert_eq!(report.statuses, vec![RevealStatus::Outbid]);
        // 30 surplus plus the 150 bid itself
        assert_eq!(report.refunded, 180);

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.highest_bidder, Some(ALICE));
        assert_eq!(auction.pending_balance(&BOB), 180);
        assert!(auction.bids_of(&BOB)[0].valid);
    }

    #[test]
    fn test_reveal_displaces_previous_leader() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 150, false, 10, 150).unwrap();
        commit(&mut state, id, BOB, 200, false, 12, 220).unwrap();

        reveal_one(&mut state, id, ALICE, 150, false, 10).unwrap();
        reveal_one(&mut state, id, BOB, 200, false, 12).unwrap();

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.highest_bid, 200);
        assert_eq!(auction.highest_bidder, Some(BOB));
        // Alice gets her displaced bid back, Bob his surplus.
        assert_eq!(auction.pending_balance(&ALICE), 150);
        assert_eq!(auction.pending_balance(&BOB), 20);
    }

    #[test]
    fn test_reveal_tie_keeps_first_reveal() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 150, false, 10, 150).unwrap();
        commit(&mut state, id, BOB, 150, false, 12, 150).unwrap();

        reveal_one(&mut state, id, ALICE, 150, false, 10).unwrap();
        let report = reveal_one(&mut state, id, BOB, 150, false, 12).unwrap();

        assert_eq!(report.statuses, vec![RevealStatus::Outbid]);
        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.highest_bidder, Some(ALICE));
        assert_eq!(auction.pending_balance(&BOB), 150);
    }

    #[test]
    fn test_reveal_self_displacement_accounts_correctly() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 100, false, 10, 100).unwrap();
        commit(&mut state, id, ALICE, 180, false, 11, 200).unwrap();

        let report = handle_reveal(
            &mut state,
            &ctx(ALICE, T_REVEAL, 0),
            id,
            &[
                RevealEntry {
                    value: 100,
                    fake: false,
                    secret: secret(10),
                },
                RevealEntry {
                    value: 180,
                    fake: false,
                    secret: secret(11),
                },
            ],
        )
        .unwrap();

        assert_eq!(
            report.statuses,
            vec![RevealStatus::Leading, RevealStatus::Leading]
        );
        // 100 displaced first bid plus 20 surplus of the second
        assert_eq!(report.refunded, 120);

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.highest_bid, 180);
        assert_eq!(auction.pending_balance(&ALICE), 120);
    }

    #[test]
    fn test_reveal_mismatch_refunds_and_never_leads() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 100, false, 10, 120).unwrap();

        // Open with the wrong secret.
        let report = reveal_one(&mut state, id, ALICE, 100, false, 99).unwrap();
        assert_eq!(report.statuses, vec![RevealStatus::Mismatch]);
        assert_eq!(report.refunded, 120);

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.highest_bidder, None);
        assert_eq!(auction.pending_balance(&ALICE), 120);
        assert!(auction.bids_of(&ALICE)[0].revealed);
        assert!(!auction.bids_of(&ALICE)[0].valid);
    }

    #[test]
    fn test_reveal_decoy_refunds_in_full() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 500, true, 10, 90).unwrap();

        let report = reveal_one(&mut state, id, ALICE, 500, true, 10).unwrap();
        assert_eq!(report.statuses, vec![RevealStatus::Decoy]);
        assert_eq!(report.refunded, 90);
        assert_eq!(state.get_auction(id).unwrap().highest_bidder, None);
    }

    #[test]
    fn test_reveal_insufficient_collateral_refunds() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        // Claims 300 but only locked 100.
        commit(&mut state, id, ALICE, 300, false, 10, 100).unwrap();

        let report = reveal_one(&mut state, id, ALICE, 300, false, 10).unwrap();
        assert_eq!(report.statuses, vec![RevealStatus::InsufficientCollateral]);
        assert_eq!(report.refunded, 100);

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.highest_bidder, None);
        assert!(!auction.bids_of(&ALICE)[0].valid);
    }

    #[test]
    fn test_reveal_guards() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 100, false, 10, 120).unwrap();

        // Wrong phase.
        let early = handle_reveal(
            &mut state,
            &ctx(ALICE, T_BIDDING, 0),
            id,
            &[RevealEntry {
                value: 100,
                fake: false,
                secret: secret(10),
            }],
        );
        assert!(matches!(early, Err(AuctionError::PhaseViolation { .. })));

        // No commitments on file.
        let unknown = reveal_one(&mut state, id, CAROL, 1, false, 1);
        assert!(matches!(unknown, Err(AuctionError::UnknownBidder)));

        // Length mismatch.
        let mismatch = handle_reveal(&mut state, &ctx(ALICE, T_REVEAL, 0), id, &[]);
        assert!(matches!(
            mismatch,
            Err(AuctionError::RevealLengthMismatch {
                expected: 1,
                got: 0,
            })
        ));

        // Guard failures left the bid untouched.
        assert!(!state.get_auction(id).unwrap().bids_of(&ALICE)[0].revealed);

        // Second reveal is rejected wholesale.
        reveal_one(&mut state, id, ALICE, 100, false, 10).unwrap();
        let again = reveal_one(&mut state, id, ALICE, 100, false, 10);
        assert!(matches!(again, Err(AuctionError::AlreadyRevealed)));
    }

    #[test]
    fn test_finalize_sale() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 150, false, 10, 150).unwrap();
        reveal_one(&mut state, id, ALICE, 150, false, 10).unwrap();

        let record =
            handle_finalize(&mut state, &ctx(SELLER, T_CLOSED, 0), id, RESERVE, &SALT).unwrap();
        assert_eq!(
            record.outcome,
            SaleOutcome::Sale {
                winner: ALICE,
                amount: 150,
            }
        );

        let auction = state.get_auction(id).unwrap();
        assert!(auction.ended);
        assert_eq!(auction.pending_balance(&SELLER), 150);
        assert!(state.outcomes.contains_key(&id));
    }

    #[test]
    fn test_finalize_reserve_not_met() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        // Reserve is 100; the only bid is 80.
        commit(&mut state, id, ALICE, 80, false, 10, 80).unwrap();
        reveal_one(&mut state, id, ALICE, 80, false, 10).unwrap();

        let record =
            handle_finalize(&mut state, &ctx(SELLER, T_CLOSED, 0), id, RESERVE, &SALT).unwrap();
        assert_eq!(
            record.outcome,
            SaleOutcome::ReserveNotMet {
                best_bidder: ALICE,
                best_bid: 80,
                reserve: RESERVE,
            }
        );

        let auction = state.get_auction(id).unwrap();
        assert!(auction.ended);
        assert_eq!(auction.pending_balance(&SELLER), 0);
        assert_eq!(auction.pending_balance(&ALICE), 80);
    }

    #[test]
    fn test_finalize_no_valid_bids() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);

        let record =
            handle_finalize(&mut state, &ctx(SELLER, T_CLOSED, 0), id, RESERVE, &SALT).unwrap();
        assert_eq!(record.outcome, SaleOutcome::NoValidBids);
        assert!(state.get_auction(id).unwrap().ended);
    }

    #[test]
    fn test_finalize_wrong_reserve_then_retry() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);

        let wrong = handle_finalize(&mut state, &ctx(SELLER, T_CLOSED, 0), id, RESERVE + 1, &SALT);
        assert!(matches!(
            wrong,
            Err(AuctionError::ReserveVerificationFailed)
        ));
        assert!(!state.get_auction(id).unwrap().ended);

        // Corrected retry succeeds.
        handle_finalize(&mut state, &ctx(SELLER, T_CLOSED, 0), id, RESERVE, &SALT).unwrap();
        assert!(state.get_auction(id).unwrap().ended);
    }

    #[test]
    fn test_finalize_before_reveal_closes() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);

        let result = handle_finalize(&mut state, &ctx(SELLER, T_REVEAL, 0), id, RESERVE, &SALT);
        assert!(matches!(
            result,
            Err(AuctionError::PhaseViolation {
                required: AuctionPhase::Closing,
                current: AuctionPhase::Reveal,
            })
        ));
    }

    #[test]
    fn test_double_finalize_is_hard_error() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        handle_finalize(&mut state, &ctx(SELLER, T_CLOSED, 0), id, RESERVE, &SALT).unwrap();

        let again = handle_finalize(&mut state, &ctx(SELLER, T_CLOSED, 0), id, RESERVE, &SALT);
        assert!(matches!(again, Err(AuctionError::DoubleFinalize)));
    }

    #[test]
    fn test_withdraw_moves_balance_exactly_once() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 100, false, 10, 120).unwrap();
        reveal_one(&mut state, id, ALICE, 100, false, 10).unwrap();

        let mut sink = RecordingSink(Vec::new());
        let amount = handle_withdraw(&mut state, &ctx(ALICE, T_REVEAL, 0), id, &mut sink).unwrap();
        assert_eq!(amount, 20);
        assert_eq!(sink.0, vec![(ALICE, 20)]);

        // Immediate second call transfers zero and changes nothing.
        let again = handle_withdraw(&mut state, &ctx(ALICE, T_REVEAL, 0), id, &mut sink).unwrap();
        assert_eq!(again, 0);
        assert_eq!(sink.0.len(), 1);

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.pending_balance(&ALICE), 0);
        assert_eq!(auction.held, 100);
    }

    #[test]
    fn test_withdraw_sink_failure_restores_balance() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 100, false, 10, 120).unwrap();
        reveal_one(&mut state, id, ALICE, 100, false, 10).unwrap();

        let held_before = state.get_auction(id).unwrap().held;
        let result = handle_withdraw(&mut state, &ctx(ALICE, T_REVEAL, 0), id, &mut FailingSink);
        assert!(matches!(result, Err(AuctionError::TransferFailed(_))));

        let auction = state.get_auction(id).unwrap();
        assert_eq!(auction.pending_balance(&ALICE), 20);
        assert_eq!(auction.held, held_before);
    }

    #[test]
    fn test_withdraw_zero_balance_noop() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);

        let mut sink = RecordingSink(Vec::new());
        let amount = handle_withdraw(&mut state, &ctx(BOB, T_BIDDING, 0), id, &mut sink).unwrap();
        assert_eq!(amount, 0);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_highest_bid_monotone_across_reveals() {
        let mut state = LedgerState::new();
        let id = setup_auction(&mut state);
        commit(&mut state, id, ALICE, 120, false, 10, 120).unwrap();
        commit(&mut state, id, BOB, 90, false, 12, 90).unwrap();
        commit(&mut state, id, CAROL, 200, false, 13, 200).unwrap();

        let mut last = 0;
        for (bidder, value, tag) in [(ALICE, 120, 10), (BOB, 90, 12), (CAROL, 200, 13)] {
            reveal_one(&mut state, id, bidder, value, false, tag).unwrap();
            let high = state.get_auction(id).unwrap().highest_bid;
            assert!(high >= last);
            last = high;
        }
        assert_eq!(last, 200);
    }
}
