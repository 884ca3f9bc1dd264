//! CoinGecko simple price client.
//!
//! Queries `/simple/price` and maps asset symbols to CoinGecko coin ids.
//! Unknown symbols must be mapped in configuration.

use crate::{PriceFeedError, PricePoint, PriceSource, PriceSourceFactory, PriceSourceRegistry};
use async_trait::async_trait;
use reporter_types::{current_timestamp, ImplementationRegistry, SecretString};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Configuration for the CoinGecko source.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoConfig {
	#[serde(default = "default_api_url")]
	pub api_url: String,
	/// Optional demo or pro API key.
	pub api_key: Option<SecretString>,
	/// Extra symbol to coin id mappings, e.g. `matic = "matic-network"`.
	#[serde(default)]
	pub coin_ids: HashMap<String, String>,
	#[serde(default = "default_timeout")]
	pub timeout_seconds: u64,
}

fn default_api_url() -> String {
	DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
	10
}

fn default_coin_ids() -> HashMap<String, String> {
	[
		("eth", "ethereum"),
		("btc", "bitcoin"),
		("trb", "tellor"),
		("matic", "matic-network"),
		("dai", "dai"),
		("usdc", "usd-coin"),
	]
	.into_iter()
	.map(|(symbol, id)| (symbol.to_string(), id.to_string()))
	.collect()
}

/// CoinGecko HTTP price source.
pub struct CoinGeckoSource {
	client: reqwest::Client,
	api_url: String,
	api_key: Option<SecretString>,
	coin_ids: HashMap<String, String>,
}

impl CoinGeckoSource {
	pub fn new(config: CoinGeckoConfig) -> Result<Self, PriceFeedError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_seconds))
			.build()
			.map_err(|e| PriceFeedError::Configuration(format!("HTTP client: {}", e)))?;

		let mut coin_ids = default_coin_ids();
		for (symbol, id) in config.coin_ids {
			coin_ids.insert(symbol.to_lowercase(), id);
		}

		Ok(Self {
			client,
			api_url: config.api_url.trim_end_matches('/').to_string(),
			api_key: config.api_key.filter(|k| !k.is_empty()),
			coin_ids,
		})
	}

	fn coin_id(&self, asset: &str, currency: &str) -> Result<&str, PriceFeedError> {
		self.coin_ids
			.get(&asset.to_lowercase())
			.map(String::as_str)
			.ok_or_else(|| PriceFeedError::PairNotSupported {
				asset: asset.to_string(),
				currency: currency.to_string(),
			})
	}
}

/// Extracts `body[coin_id][currency]` from a simple price response.
fn parse_simple_price(
	body: &serde_json::Value,
	coin_id: &str,
	currency: &str,
) -> Result<Decimal, PriceFeedError> {
	let price = body
		.get(coin_id)
		.and_then(|prices| prices.get(currency))
		.and_then(serde_json::Value::as_f64)
		.ok_or_else(|| {
			PriceFeedError::PriceUnavailable(format!(
				"CoinGecko has no {} price for {}",
				currency, coin_id
			))
		})?;

	Decimal::from_f64(price)
		.filter(|p| p.is_sign_positive())
		.ok_or_else(|| PriceFeedError::PriceUnavailable(format!("Invalid price {}", price)))
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
	async fn fetch_price(
		&self,
		asset: &str,
		currency: &str,
	) -> Result<PricePoint, PriceFeedError> {
		let coin_id = self.coin_id(asset, currency)?;
		let currency = currency.to_lowercase();

		let mut request = self
			.client
			.get(format!("{}/simple/price", self.api_url))
			.query(&[("ids", coin_id), ("vs_currencies", currency.as_str())]);
		if let Some(key) = &self.api_key {
			request = key.with_exposed(|key| request.header(API_KEY_HEADER, key));
		}

		let response = request
			.send()
			.await
			.map_err(|e| PriceFeedError::Network(format!("CoinGecko request failed: {}", e)))?
			.error_for_status()
			.map_err(|e| PriceFeedError::Network(format!("CoinGecko returned {}", e)))?;

		let body: serde_json::Value = response
			.json()
			.await
			.map_err(|e| PriceFeedError::Network(format!("CoinGecko response: {}", e)))?;

		let value = parse_simple_price(&body, coin_id, &currency)?;
		tracing::debug!(asset, currency = %currency, price = %value, "CoinGecko price");

		Ok(PricePoint {
			value,
			timestamp: current_timestamp(),
		})
	}
}

/// Registry for the CoinGecko source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "coingecko";
	type Factory = PriceSourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn PriceSource>, PriceFeedError> {
			let coingecko_config: CoinGeckoConfig = config.clone().try_into().map_err(|e| {
				PriceFeedError::Configuration(format!("Invalid coingecko config: {}", e))
			})?;

			Ok(Box::new(CoinGeckoSource::new(coingecko_config)?))
		}
	}
}

impl PriceSourceRegistry for Registry {}
