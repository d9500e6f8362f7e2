//! Client SDK for bidding in sealed-bid auctions.
//!
//! This crate provides a high-level API for:
//! - Sealing bids (and decoys) into hash commitments
//! - Keeping the openings needed for the reveal window
//! - Computing reserve price commitments for sellers

pub mod bid;

pub use bid::{seal_bid, seal_reserve, BidBuilder, PreparedBid};
