//! Sealed-bid auction engine.
//!
//! This crate implements the commit-reveal core of a blind auction:
//!
//! - Sealed commitment submission with locked deposits
//! - Reveal verification against stored commitments
//! - Highest-bid tracking with pull-payment refunds
//! - Reserve-price enforcement at finalization
//! - Escrow withdrawals through a host-provided payment sink
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Ledger state structures
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! The engine holds no clock and performs no I/O; the host supplies the
//! current time through [`CallContext`] and receives withdrawn funds
//! through [`handlers::PaymentSink`]. Operations are expected to arrive
//! one at a time, and each either fully applies or fails with the ledger
//! untouched.
//!
//! # Example
//!
//! ```ignore
//! use blindbid_engine::{handlers, state::LedgerState};
//!
//! let mut state = LedgerState::new();
//! let ctx = handlers::CallContext { ... };
//!
//! let asset_id = handlers::handle_create_asset(&mut state, &ctx, ...)?;
//! let auction_id = handlers::handle_create_auction(&mut state, &ctx, asset_id, ...)?;
//!
//! // Bidding window
//! handlers::handle_commit(&mut state, &ctx, auction_id, commitment)?;
//! ```

pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;

pub use call::AuctionCall;
pub use error::{AuctionError, TransferError};
pub use genesis::{DefaultAuctionParams, GenesisConfig};
pub use handlers::{CallContext, HandlerResult, PaymentSink};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use state::{Auction, LedgerState};
