//! Genesis configuration for the auction engine.
//!
//! Defines the initial state and the floors enforced on every auction
//! created afterwards.

use serde::{Deserialize, Serialize};

/// Genesis configuration for the auction engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Floors applied to newly created auctions
    pub default_params: DefaultAuctionParams,

    /// Assets registered at startup
    pub initial_assets: Vec<GenesisAsset>,
}

/// An asset registered at genesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisAsset {
    pub name: String,
    pub description: String,
    pub media_uri: String,
}

/// Floors for new auctions.
///
/// Windows shorter than these would let a seller end bidding before
/// anyone could commit, or end reveal before anyone could open.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultAuctionParams {
    /// Minimum length of the bidding window (seconds)
    pub min_bidding_duration: u64,
    /// Minimum length of the reveal window (seconds)
    pub min_reveal_duration: u64,
}

impl Default for DefaultAuctionParams {
    fn default() -> Self {
        Self {
            min_bidding_duration: 60,
            min_reveal_duration: 60,
        }
    }
}

impl GenesisConfig {
    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.default_params.min_bidding_duration == 0 {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Minimum bidding duration cannot be zero".into(),
            ));
        }
        if self.default_params.min_reveal_duration == 0 {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Minimum reveal duration cannot be zero".into(),
            ));
        }
        for asset in &self.initial_assets {
            if asset.name.is_empty() {
                return Err(GenesisValidationError::InvalidAsset(
                    "Asset name cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid default parameters: {0}")]
    InvalidDefaultParams(String),

    #[error("Invalid genesis asset: {0}")]
    InvalidAsset(String),
}
