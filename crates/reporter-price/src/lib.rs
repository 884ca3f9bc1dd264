//! Price feed module for the oracle reporter.
//!
//! This module provides interfaces and implementations for fetching asset
//! prices and gas prices. Price sources answer `fetch_price(asset, currency)`
//! and gas sources answer `fetch()` with a snapshot of gas price tiers. Both
//! follow the same registry pattern: every implementation is configured under
//! its name in the TOML file and built by its factory.

use async_trait::async_trait;
use reporter_types::{DataSource, DataSourceError, Datapoint, ImplementationRegistry};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod gas;

/// Re-export implementations
pub mod implementations {
	pub mod coingecko;
	pub mod fixed;
	pub mod median;

	pub mod gas {
		pub mod etherscan;
		pub mod rpc;
	}
}

/// Errors that can occur during price feed operations.
#[derive(Debug, Error)]
pub enum PriceFeedError {
	/// Error that occurs during network communication with price data sources.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when a pair is not supported by the price source.
	#[error("Pair not supported: {asset}/{currency}")]
	PairNotSupported { asset: String, currency: String },
	/// Error that occurs when price data is temporarily unavailable.
	#[error("Price data unavailable: {0}")]
	PriceUnavailable(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A price and the time it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
	pub value: Decimal,
	/// Unix timestamp in seconds.
	pub timestamp: u64,
}

/// Trait defining the interface for price source implementations.
#[async_trait]
pub trait PriceSource: Send + Sync {
	/// Current price of `asset` denominated in `currency`.
	///
	/// Symbols are case-insensitive, e.g. `("eth", "usd")`.
	async fn fetch_price(&self, asset: &str, currency: &str)
		-> Result<PricePoint, PriceFeedError>;
}

/// Type alias for price source factory functions.
pub type PriceSourceFactory = fn(&toml::Value) -> Result<Box<dyn PriceSource>, PriceFeedError>;

/// Registry trait for price source implementations.
pub trait PriceSourceRegistry: ImplementationRegistry<Factory = PriceSourceFactory> {}

/// Get all registered price source implementations.
pub fn get_all_implementations() -> Vec<(&'static str, PriceSourceFactory)> {
	use implementations::{coingecko, fixed};

	vec![
		(coingecko::Registry::NAME, coingecko::Registry::factory()),
		(fixed::Registry::NAME, fixed::Registry::factory()),
	]
}

/// Service answering price requests from the selected sources.
///
/// A single selected source is queried directly. Several selected sources are
/// combined by their median.
pub struct PriceFeedService {
	active: Arc<dyn PriceSource>,
	selected: Vec<String>,
}

impl PriceFeedService {
	/// Creates the service from the built implementations and the names to query.
	pub fn new(
		mut implementations: HashMap<String, Arc<dyn PriceSource>>,
		selected: Vec<String>,
	) -> Result<Self, PriceFeedError> {
		let mut sources = Vec::with_capacity(selected.len());
		for name in &selected {
			let source = implementations.remove(name).ok_or_else(|| {
				PriceFeedError::Configuration(format!(
					"Price source '{}' not found in available implementations",
					name
				))
			})?;
			sources.push(source);
		}

		let active: Arc<dyn PriceSource> = match sources.len() {
			0 => {
				return Err(PriceFeedError::Configuration(
					"No price source selected".to_string(),
				))
			}
			1 => sources.remove(0),
			_ => Arc::new(implementations::median::MedianPriceSource::new(sources)),
		};

		Ok(Self { active, selected })
	}

	/// Names of the sources this service queries.
	pub fn selected(&self) -> &[String] {
		&self.selected
	}
}

#[async_trait]
impl PriceSource for PriceFeedService {
	async fn fetch_price(
		&self,
		asset: &str,
		currency: &str,
	) -> Result<PricePoint, PriceFeedError> {
		self.active.fetch_price(asset, currency).await
	}
}

/// Adapts a price source into the data source of a spot price datafeed.
pub struct PriceDataSource {
	source: Arc<dyn PriceSource>,
	asset: String,
	currency: String,
}

impl PriceDataSource {
	pub fn new(source: Arc<dyn PriceSource>, asset: &str, currency: &str) -> Self {
		Self {
			source,
			asset: asset.to_lowercase(),
			currency: currency.to_lowercase(),
		}
	}
}

#[async_trait]
impl DataSource for PriceDataSource {
	async fn fetch_new_datapoint(&self) -> Result<Datapoint, DataSourceError> {
		let price = self
			.source
			.fetch_price(&self.asset, &self.currency)
			.await
			.map_err(|e| DataSourceError::Unavailable(e.to_string()))?;
		Ok(Datapoint {
			value: price.value,
			timestamp: price.timestamp,
		})
	}
}
