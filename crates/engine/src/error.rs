//! Auction engine error types.

use thiserror::Error;

use blindbid_types::AuctionPhase;

/// Errors that can occur in the auction engine.
///
/// Every variant aborts its operation before any state is written, with
/// one exception: `TransferFailed` is raised after the withdraw handler
/// has already restored the balance it zeroed, so the net effect is still
/// no change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("Asset not found: {0}")]
    AssetNotFound(u64),

    #[error("Operation requires the {required:?} phase, auction is in {current:?}")]
    PhaseViolation {
        required: AuctionPhase,
        current: AuctionPhase,
    },

    #[error("Deposit must be strictly positive")]
    ZeroDeposit,

    #[error("No commitments recorded for this bidder")]
    UnknownBidder,

    #[error("Bidder has already revealed")]
    AlreadyRevealed,

    #[error("Reveal count mismatch: expected {expected}, got {got}")]
    RevealLengthMismatch { expected: usize, got: usize },

    #[error("Auction already finalized")]
    DoubleFinalize,

    #[error("Reserve price commitment verification failed")]
    ReserveVerificationFailed,

    #[error("Invalid timing configuration")]
    InvalidTiming,

    #[error("Outbound transfer failed: {0}")]
    TransferFailed(String),
}

/// Failure reported by a payment sink for an outbound transfer.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransferError(pub String);
