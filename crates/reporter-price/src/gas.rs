//! Gas price sources.
//!
//! A gas source returns one snapshot of the safe, average and fast gas price
//! tiers plus the suggested base fee when the chain has one.

use async_trait::async_trait;
use reporter_delivery::ChainInterface;
use reporter_types::{GasSnapshot, ImplementationRegistry};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while fetching gas prices.
#[derive(Debug, Error)]
pub enum GasError {
	/// Error that occurs during network communication with the gas source.
	#[error("Network error: {0}")]
	Network(String),
	/// The gas source answered with something unusable.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for gas price sources.
#[async_trait]
pub trait GasPriceSource: Send + Sync {
	async fn fetch(&self) -> Result<GasSnapshot, GasError>;
}

/// Type alias for gas source factory functions.
///
/// Sources reading the chain directly get the shared chain client.
pub type GasSourceFactory =
	fn(&toml::Value, Arc<dyn ChainInterface>) -> Result<Box<dyn GasPriceSource>, GasError>;

/// Registry trait for gas source implementations.
pub trait GasSourceRegistry: ImplementationRegistry<Factory = GasSourceFactory> {}

/// Get all registered gas source implementations.
pub fn get_all_implementations() -> Vec<(&'static str, GasSourceFactory)> {
	use crate::implementations::gas::{etherscan, rpc};

	vec![
		(etherscan::Registry::NAME, etherscan::Registry::factory()),
		(rpc::Registry::NAME, rpc::Registry::factory()),
	]
}
