//! Core type definitions for sealed-bid (blind) auctions.
//!
//! This crate provides the shared data structures used across the auction
//! system: hash commitments, auction configuration, bid records, reveal
//! openings, and settlement outcomes.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// =========================
// COMMITMENTS
// =========================

/// Generic account address (32 bytes)
pub type Address = [u8; 32];

/// Secret nonce bound into a bid commitment (32 bytes)
pub type Secret = [u8; 32];

/// Salt bound into a reserve price commitment (32 bytes)
pub type Salt = [u8; 32];

/// SHA-256 commitment to a sealed bid or a reserve price (32 bytes)
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Commitment(pub [u8; 32]);

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Compute the commitment for a sealed bid.
///
/// Binds the hidden bid value, the decoy flag, and the bidder's secret
/// nonce. The flag is part of the preimage so a bidder cannot reinterpret
/// a decoy as a real bid (or the reverse) at reveal time.
pub fn compute_bid_commitment(value: u64, fake: bool, secret: &Secret) -> Commitment {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"SEALED_BID_V1:");
    hasher.update(value.to_le_bytes());
    hasher.update([fake as u8]);
    hasher.update(secret);
    Commitment(hasher.finalize().into())
}

/// Compute the commitment for an auction's reserve price.
pub fn compute_reserve_commitment(reserve: u64, salt: &Salt) -> Commitment {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"RESERVE_PRICE_V1:");
    hasher.update(reserve.to_le_bytes());
    hasher.update(salt);
    Commitment(hasher.finalize().into())
}

// =========================
// PHASES
// =========================

/// Auction lifecycle phase, derived from the clock.
///
/// `Ended` is only ever entered by a successful finalize call; time alone
/// moves an auction no further than `Closing`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionPhase {
    /// Before the configured start time
    Created,
    /// Accepting sealed commitments
    Bidding,
    /// Accepting reveals
    Reveal,
    /// Reveal window shut, awaiting finalize
    Closing,
    /// Finalized
    Ended,
}

// =========================
// ASSETS & AUCTIONS
// =========================

/// An asset registered for auctioning.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: u64,
    pub creator: Address,
    pub name: String,
    pub description: String,
    pub media_uri: String,
}

/// Immutable configuration of one auction instance.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionConfig {
    pub auction_id: u64,
    pub asset_id: u64,
    pub seller: Address,

    // Timing
    pub start_time: u64,
    pub bidding_end: u64,
    pub reveal_end: u64,

    /// Hash of the seller's reserve price and salt, opened at finalize.
    pub reserve_commitment: Commitment,
}

impl AuctionConfig {
    /// Derive the phase at `now`, given whether finalize has already run.
    pub fn phase_at(&self, now: u64, ended: bool) -> AuctionPhase {
        if ended {
            AuctionPhase::Ended
        } else if now < self.start_time {
            AuctionPhase::Created
        } else if now < self.bidding_end {
            AuctionPhase::Bidding
        } else if now < self.reveal_end {
            AuctionPhase::Reveal
        } else {
            AuctionPhase::Closing
        }
    }
}

/// One sealed commitment and its locked deposit.
///
/// `commitment` is immutable once stored; `revealed` and `valid` each flip
/// false to true at most once, during the reveal call.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SealedBid {
    pub bidder: Address,
    /// Order of submission within this bidder's commitments.
    pub sequence: u32,
    pub commitment: Commitment,
    pub deposit: u64,
    pub revealed: bool,
    pub valid: bool,
}

/// Plaintext opening of one commitment, supplied at reveal.
///
/// The secret is mandatory: without it the stored commitment cannot be
/// recomputed and matched.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealEntry {
    pub value: u64,
    pub fake: bool,
    pub secret: Secret,
}

// =========================
// RESULTS
// =========================

/// What happened to a single commitment as its entry was processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealStatus {
    /// Real bid, took the leader slot (a later reveal may still displace it).
    Leading,
    /// Real bid below the running maximum; refunded on the spot.
    Outbid,
    /// Decoy; deposit refunded in full.
    Decoy,
    /// Opening did not match the stored commitment; deposit refunded in full.
    Mismatch,
    /// Revealed value exceeded the locked deposit; deposit refunded in full.
    InsufficientCollateral,
}

/// Per-call result of a reveal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevealReport {
    /// Status of each entry, in submission order.
    pub statuses: Vec<RevealStatus>,
    /// Total credited to the caller's pending returns by this call.
    pub refunded: u64,
}

/// How an auction settled.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum SaleOutcome {
    /// Reserve met; the seller is owed `amount`.
    Sale { winner: Address, amount: u64 },
    /// A valid highest bid existed but fell short of the reserve.
    ReserveNotMet {
        best_bidder: Address,
        best_bid: u64,
        reserve: u64,
    },
    /// No commitment revealed into a valid bid.
    NoValidBids,
}

/// Finalization record, stored once per auction.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionOutcome {
    pub auction_id: u64,
    pub outcome: SaleOutcome,
    pub finalized_at: u64,
    pub finalized_by: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: Secret = [7u8; 32];

    #[test]
    fn test_bid_commitment_binds_every_input() {
        let base = compute_bid_commitment(100, false, &SECRET);

        assert_eq!(base, compute_bid_commitment(100, false, &SECRET));
        assert_ne!(base, compute_bid_commitment(101, false, &SECRET));
        assert_ne!(base, compute_bid_commitment(100, true, &SECRET));
        assert_ne!(base, compute_bid_commitment(100, false, &[8u8; 32]));
    }

    #[test]
    fn test_reserve_commitment_domain_separated() {
        // Same value and 32-byte suffix must not collide across domains.
        assert_ne!(
            compute_bid_commitment(100, false, &SECRET),
            compute_reserve_commitment(100, &SECRET)
        );
    }

    #[test]
    fn test_phase_boundaries() {
        let config = AuctionConfig {
            auction_id: 1,
            asset_id: 1,
            seller: [1u8; 32],
            start_time: 100,
            bidding_end: 200,
            reveal_end: 300,
            reserve_commitment: Commitment::default(),
        };

        assert_eq!(config.phase_at(99, false), AuctionPhase::Created);
        assert_eq!(config.phase_at(100, false), AuctionPhase::Bidding);
        assert_eq!(config.phase_at(199, false), AuctionPhase::Bidding);
        assert_eq!(config.phase_at(200, false), AuctionPhase::Reveal);
        assert_eq!(config.phase_at(299, false), AuctionPhase::Reveal);
        assert_eq!(config.phase_at(300, false), AuctionPhase::Closing);
        assert_eq!(config.phase_at(u64::MAX, false), AuctionPhase::Closing);
    }

    #[test]
    fn test_ended_overrides_clock() {
        let config = AuctionConfig {
            auction_id: 1,
            asset_id: 1,
            seller: [1u8; 32],
            start_time: 100,
            bidding_end: 200,
            reveal_end: 300,
            reserve_commitment: Commitment::default(),
        };

        // Once finalized the phase is Ended regardless of the clock.
        assert_eq!(config.phase_at(150, true), AuctionPhase::Ended);
        assert_eq!(config.phase_at(400, true), AuctionPhase::Ended);
    }

    #[test]
    fn test_commitment_serialization() {
        let commitment = compute_bid_commitment(42, false, &SECRET);
        let encoded = borsh::to_vec(&commitment).unwrap();
        let decoded: Commitment = borsh::from_slice(&encoded).unwrap();
        assert_eq!(commitment, decoded);
    }

    #[test]
    fn test_sealed_bid_json_round_trip() {
        let bid = SealedBid {
            bidder: [2u8; 32],
            sequence: 3,
            commitment: compute_bid_commitment(5, true, &SECRET),
            deposit: 500,
            revealed: false,
            valid: false,
        };
        let json = serde_json::to_string(&bid).unwrap();
        let back: SealedBid = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sequence, 3);
        assert_eq!(back.commitment, bid.commitment);
    }

    #[test]
    fn test_commitment_display_is_hex() {
        let commitment = Commitment([0xab; 32]);
        assert_eq!(commitment.to_string(), "ab".repeat(32));
    }
}
