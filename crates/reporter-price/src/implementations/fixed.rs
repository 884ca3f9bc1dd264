//! Fixed prices read from configuration.
//!
//! Useful on test networks where the reward token has no market, and for
//! pinning a price while debugging profitability.

use crate::{PriceFeedError, PricePoint, PriceSource, PriceSourceFactory, PriceSourceRegistry};
use async_trait::async_trait;
use reporter_types::{current_timestamp, ImplementationRegistry};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Configuration for the fixed price source.
#[derive(Debug, Clone, Deserialize)]
pub struct FixedPriceConfig {
	/// Prices keyed by `"asset/currency"`, e.g. `"trb/usd" = 1.0`.
	#[serde(default)]
	pub prices: HashMap<String, Decimal>,
}

/// Price source answering from a fixed table.
pub struct FixedPriceSource {
	prices: HashMap<String, Decimal>,
}

impl FixedPriceSource {
	pub fn new(prices: HashMap<String, Decimal>) -> Self {
		let prices = prices
			.into_iter()
			.map(|(pair, price)| (pair.to_lowercase(), price))
			.collect();
		Self { prices }
	}
}

#[async_trait]
impl PriceSource for FixedPriceSource {
	async fn fetch_price(
		&self,
		asset: &str,
		currency: &str,
	) -> Result<PricePoint, PriceFeedError> {
		let key = format!("{}/{}", asset, currency).to_lowercase();
		let value = self
			.prices
			.get(&key)
			.copied()
			.ok_or_else(|| PriceFeedError::PairNotSupported {
				asset: asset.to_string(),
				currency: currency.to_string(),
			})?;

		Ok(PricePoint {
			value,
			timestamp: current_timestamp(),
		})
	}
}

/// Registry for the fixed price source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "fixed";
	type Factory = PriceSourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn PriceSource>, PriceFeedError> {
			let fixed_config: FixedPriceConfig = config.clone().try_into().map_err(|e| {
				PriceFeedError::Configuration(format!("Invalid fixed price config: {}", e))
			})?;

			if fixed_config.prices.values().any(|p| p.is_sign_negative()) {
				return Err(PriceFeedError::Configuration(
					"Fixed prices cannot be negative".to_string(),
				));
			}

			Ok(Box::new(FixedPriceSource::new(fixed_config.prices)))
		}
	}
}

impl PriceSourceRegistry for Registry {}
