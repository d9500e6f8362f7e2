//! Sealed bid construction.

use rand::{CryptoRng, RngCore};
use thiserror::Error;

use blindbid_types::{compute_bid_commitment, compute_reserve_commitment, Commitment, Salt, Secret};

/// Errors that can occur while preparing a sealed bid.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Deposit {deposit} does not cover the bid value {value}")]
    DepositTooSmall { value: u64, deposit: u64 },
}

/// A sealed bid ready for submission.
///
/// Only the commitment goes on the wire; `value`, `fake`, and `secret`
/// must stay private until the reveal window.
#[derive(Debug, Clone)]
pub struct PreparedBid {
    /// Commitment to submit during bidding
    pub commitment: Commitment,
    /// Hidden bid value (the deposit is what the auction sees)
    pub value: u64,
    /// Whether this is a decoy
    pub fake: bool,
    /// Nonce required at reveal
    pub secret: Secret,
}

/// Seal a bid with a freshly generated secret nonce.
pub fn seal_bid<R: RngCore + CryptoRng>(value: u64, fake: bool, rng: &mut R) -> PreparedBid {
    let mut secret = [0u8; 32];
    rng.fill_bytes(&mut secret);
    let commitment = compute_bid_commitment(value, fake, &secret);
    PreparedBid {
        commitment,
        value,
        fake,
        secret,
    }
}

/// Compute the reserve commitment a seller supplies at auction creation,
/// using a freshly generated salt.
pub fn seal_reserve<R: RngCore + CryptoRng>(reserve: u64, rng: &mut R) -> (Commitment, Salt) {
    let mut salt = [0u8; 32];
    rng.fill_bytes(&mut salt);
    (compute_reserve_commitment(reserve, &salt), salt)
}

/// Builder for sealing bids with an explicit deposit check.
pub struct BidBuilder {
    value: u64,
    fake: bool,
    deposit: Option<u64>,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new(value: u64) -> Self {
        Self {
            value,
            fake: false,
            deposit: None,
        }
    }

    /// Mark the bid as a decoy.
    pub fn fake(mut self, fake: bool) -> Self {
        self.fake = fake;
        self
    }

    /// Set the deposit that will be attached at commit time.
    pub fn deposit(mut self, deposit: u64) -> Self {
        self.deposit = Some(deposit);
        self
    }

    /// Seal the bid.
    ///
    /// A real bid above its deposit would be refunded as
    /// under-collateralized at reveal, so it is rejected here. Decoys may
    /// claim any value; their deposit comes back regardless.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<PreparedBid, BidError> {
        if let Some(deposit) = self.deposit {
            if !self.fake && self.value > deposit {
                return Err(BidError::DepositTooSmall {
                    value: self.value,
                    deposit,
                });
            }
        }
        Ok(seal_bid(self.value, self.fake, rng))
    }
}
