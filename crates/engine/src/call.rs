//! Call message types for the auction engine.

use borsh::{BorshDeserialize, BorshSerialize};

use blindbid_types::{Commitment, RevealEntry, Salt};

/// Call messages for the auction engine.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    // === Registry ===
    /// Register an asset that auctions can be created for.
    CreateAsset {
        name: String,
        description: String,
        media_uri: String,
    },

    /// Create an auction for a registered asset. The caller becomes the
    /// seller.
    CreateAuction {
        asset_id: u64,
        start_time: u64,
        bidding_duration: u64,
        reveal_duration: u64,
        reserve_commitment: Commitment,
    },

    // === Auction Lifecycle ===
    /// Submit a sealed commitment. The deposit rides as the attached value.
    Commit {
        auction_id: u64,
        commitment: Commitment,
    },

    /// Open every commitment the caller submitted, in submission order.
    Reveal {
        auction_id: u64,
        entries: Vec<RevealEntry>,
    },

    /// Close the auction by revealing the reserve price.
    Finalize {
        auction_id: u64,
        reserve: u64,
        salt: Salt,
    },

    /// Withdraw the caller's pending returns.
    Withdraw { auction_id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindbid_types::compute_bid_commitment;

    #[test]
    fn test_call_wire_round_trip() {
        let call = AuctionCall::Reveal {
            auction_id: 7,
            entries: vec![RevealEntry {
                value: 100,
                fake: false,
                secret: [3u8; 32],
            }],
        };
        let encoded = borsh::to_vec(&call).unwrap();
        let decoded: AuctionCall = borsh::from_slice(&encoded).unwrap();
        match decoded {
            AuctionCall::Reveal {
                auction_id,
                entries,
            } => {
                assert_eq!(auction_id, 7);
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].value, 100);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn test_commit_call_carries_commitment() {
        let commitment = compute_bid_commitment(250, true, &[9u8; 32]);
        let call = AuctionCall::Commit {
            auction_id: 1,
            commitment,
        };
        let encoded = borsh::to_vec(&call).unwrap();
        let decoded: AuctionCall = borsh::from_slice(&encoded).unwrap();
        assert!(matches!(
            decoded,
            AuctionCall::Commit { auction_id: 1, commitment: c } if c == commitment
        ));
    }
}
