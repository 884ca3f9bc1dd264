//! Etherscan gas tracker client.
//!
//! The gas oracle endpoint answers in gwei strings. Its safe, propose and fast
//! prices map onto the three snapshot tiers and `suggestBaseFee` onto the
//! suggested base fee.

use crate::gas::{GasError, GasPriceSource, GasSourceFactory, GasSourceRegistry};
use async_trait::async_trait;
use reporter_delivery::ChainInterface;
use reporter_types::{parse_gwei, GasSnapshot, ImplementationRegistry, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Configuration for the Etherscan gas source.
#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanConfig {
	#[serde(default = "default_api_url")]
	pub api_url: String,
	pub api_key: Option<SecretString>,
	/// Chain whose gas prices are requested.
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
	#[serde(default = "default_timeout")]
	pub timeout_seconds: u64,
}

fn default_api_url() -> String {
	DEFAULT_API_URL.to_string()
}

fn default_chain_id() -> u64 {
	1
}

fn default_timeout() -> u64 {
	10
}

#[derive(Debug, Deserialize)]
struct GasOracleResponse {
	status: String,
	message: String,
	result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GasOracleResult {
	safe_gas_price: String,
	propose_gas_price: String,
	fast_gas_price: String,
	#[serde(rename = "suggestBaseFee")]
	suggest_base_fee: Option<String>,
}

/// Etherscan HTTP gas source.
pub struct EtherscanGasSource {
	client: reqwest::Client,
	config: EtherscanConfig,
}

impl EtherscanGasSource {
	pub fn new(config: EtherscanConfig) -> Result<Self, GasError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_seconds))
			.build()
			.map_err(|e| GasError::Configuration(format!("HTTP client: {}", e)))?;
		Ok(Self { client, config })
	}
}

fn gwei_field(value: &str, field: &str) -> Result<u128, GasError> {
	parse_gwei(value)
		.ok_or_else(|| {
			GasError::InvalidResponse(format!("{} is not a gwei amount: {}", field, value))
		})
}

fn parse_gas_oracle(body: &str) -> Result<GasSnapshot, GasError> {
	let response: GasOracleResponse = serde_json::from_str(body)
		.map_err(|e| GasError::InvalidResponse(format!("Etherscan response: {}", e)))?;

	if response.status != "1" {
		// Errors put the reason in `result` as a string
		let reason = response
			.result
			.as_str()
			.map(str::to_string)
			.unwrap_or(response.message);
		return Err(GasError::InvalidResponse(format!("Etherscan error: {}", reason)));
	}

	let result: GasOracleResult = serde_json::from_value(response.result)
		.map_err(|e| GasError::InvalidResponse(format!("Etherscan result: {}", e)))?;

	Ok(GasSnapshot {
		suggest_base_fee: result
			.suggest_base_fee
			.as_deref()
			.map(|fee| gwei_field(fee, "suggestBaseFee"))
			.transpose()?,
		safe: gwei_field(&result.safe_gas_price, "SafeGasPrice")?,
		propose: gwei_field(&result.propose_gas_price, "ProposeGasPrice")?,
		fast: gwei_field(&result.fast_gas_price, "FastGasPrice")?,
	})
}

#[async_trait]
impl GasPriceSource for EtherscanGasSource {
	async fn fetch(&self) -> Result<GasSnapshot, GasError> {
		let chain_id = self.config.chain_id.to_string();
		let mut query = vec![
			("chainid", chain_id),
			("module", "gastracker".to_string()),
			("action", "gasoracle".to_string()),
		];
		if let Some(key) = self.config.api_key.as_ref().filter(|k| !k.is_empty()) {
			query.push(("apikey", key.with_exposed(str::to_string)));
		}

		let body = self
			.client
			.get(&self.config.api_url)
			.query(&query)
			.send()
			.await
			.map_err(|e| {
				// The URL carries the API key
				GasError::Network(format!("Etherscan request failed: {}", e.without_url()))
			})?
			.text()
			.await
			.map_err(|e| {
				GasError::Network(format!("Etherscan response unreadable: {}", e.without_url()))
			})?;

		let snapshot = parse_gas_oracle(&body)?;
		tracing::debug!(
			safe = snapshot.safe,
			propose = snapshot.propose,
			fast = snapshot.fast,
			base_fee = ?snapshot.suggest_base_fee,
			"Etherscan gas prices"
		);
		Ok(snapshot)
	}
}

/// Registry for the Etherscan gas source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "etherscan";
	type Factory = GasSourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value,
		 _chain: Arc<dyn ChainInterface>|
		 -> Result<Box<dyn GasPriceSource>, GasError> {
			let etherscan_config: EtherscanConfig = config.clone().try_into().map_err(|e| {
				GasError::Configuration(format!("Invalid etherscan config: {}", e))
			})?;
			Ok(Box::new(EtherscanGasSource::new(etherscan_config)?))
		}
	}
}

impl GasSourceRegistry for Registry {}
