//! Configuration module for the oracle reporter.
//!
//! This module provides structures and utilities for managing reporter configuration.
//! Configuration is read from a TOML file in which `${VAR}` and `${VAR:-default}`
//! placeholders are replaced with environment variables before parsing, so
//! private keys and API tokens never need to be written to disk.

use regex::Regex;
use reporter_types::{Address, GasSpeed, SecretString, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep only the message, not the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the reporter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Reporter identity and cadence.
	pub reporter: ReporterSection,
	/// Chain endpoint.
	pub network: NetworkConfig,
	/// Oracle and staking contract addresses.
	pub contracts: ContractsConfig,
	/// Reporting account.
	pub account: AccountConfig,
	/// Fee model and fee parameters.
	#[serde(default)]
	pub fees: FeeConfig,
	/// Gas price sources.
	pub gas_oracle: GasOracleConfig,
	/// Profitability settings.
	#[serde(default)]
	pub profit: ProfitConfig,
	/// Condition gate selection.
	#[serde(default)]
	pub conditions: ConditionsConfig,
	/// Private relay settings.
	#[serde(default)]
	pub relay: RelayConfig,
	/// Price sources.
	pub prices: PriceConfig,
	/// Datafeeds to report, one reporting loop each.
	pub feeds: Vec<FeedConfig>,
}

/// Reporter identity and cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReporterSection {
	/// Name used in logs.
	pub id: String,
	/// Chain the oracle is deployed on.
	pub chain_id: u64,
	/// Seconds to sleep between two reporting cycles.
	#[serde(default = "default_interval_seconds")]
	pub interval_seconds: u64,
	/// Stop after this many cycles. Runs until interrupted when unset.
	pub report_count: Option<u64>,
}

fn default_interval_seconds() -> u64 {
	7
}

/// Chain endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// HTTP(S) JSON-RPC endpoint.
	pub rpc_url: String,
	/// Block explorer base URL used to log links to submitted transactions.
	pub explorer: Option<String>,
}

/// Oracle contract addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractsConfig {
	/// Oracle receiving submissions.
	pub oracle: Address,
	/// Contract holding staker records. Defaults to the oracle.
	pub staking: Option<Address>,
}

impl ContractsConfig {
	pub fn staking_address(&self) -> Address {
		self.staking.unwrap_or(self.oracle)
	}
}

/// Reporting account configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Hex encoded private key of the reporting account.
	pub private_key: SecretString,
}

/// Fee model and fee parameters. Fee values are in gwei.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeeConfig {
	#[serde(default)]
	pub transaction_type: TransactionType,
	#[serde(default = "default_gas_limit")]
	pub gas_limit: u64,
	/// EIP-1559 max fee per gas. Derived from base fee plus priority fee when unset.
	pub max_fee: Option<f64>,
	/// EIP-1559 priority fee. Taken from the gas tracker's safe price when unset.
	pub priority_fee: Option<f64>,
	/// Legacy gas price. Taken from the gas tracker when unset.
	pub legacy_gas_price: Option<f64>,
	/// Gas tracker tier used for legacy gas prices.
	#[serde(default)]
	pub gas_price_speed: GasSpeed,
	/// Keep fees resolved in one cycle for the following cycles.
	#[serde(default = "default_true")]
	pub sticky: bool,
}

fn default_gas_limit() -> u64 {
	350_000
}

fn default_true() -> bool {
	true
}

impl Default for FeeConfig {
	fn default() -> Self {
		Self {
			transaction_type: TransactionType::default(),
			gas_limit: default_gas_limit(),
			max_fee: None,
			priority_fee: None,
			legacy_gas_price: None,
			gas_price_speed: GasSpeed::default(),
			sticky: true,
		}
	}
}

/// Gas price source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GasOracleConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of gas source implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Minimum profit required before submitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdRepr", into = "ThresholdRepr")]
pub enum ProfitThreshold {
	/// Report regardless of profitability.
	Always,
	/// Report when the expected percent profit reaches this value.
	Percent(f64),
}

/// Config spelling of the threshold that reports unconditionally.
pub const ALWAYS_REPORT: &str = "YOLO";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ThresholdRepr {
	Number(f64),
	Text(String),
}

impl TryFrom<ThresholdRepr> for ProfitThreshold {
	type Error = String;

	fn try_from(repr: ThresholdRepr) -> Result<Self, Self::Error> {
		match repr {
			ThresholdRepr::Number(n) if n.is_finite() => Ok(ProfitThreshold::Percent(n)),
			ThresholdRepr::Number(n) => Err(format!("invalid profit threshold {}", n)),
			ThresholdRepr::Text(t) if t.eq_ignore_ascii_case(ALWAYS_REPORT) => {
				Ok(ProfitThreshold::Always)
			}
			ThresholdRepr::Text(t) => t
				.parse::<f64>()
				.map(ProfitThreshold::Percent)
				.map_err(|_| {
					format!(
						"expected a percentage or \"{}\", got \"{}\"",
						ALWAYS_REPORT, t
					)
				}),
		}
	}
}

impl From<ProfitThreshold> for ThresholdRepr {
	fn from(threshold: ProfitThreshold) -> Self {
		match threshold {
			ProfitThreshold::Always => ThresholdRepr::Text(ALWAYS_REPORT.to_string()),
			ProfitThreshold::Percent(p) => ThresholdRepr::Number(p),
		}
	}
}

/// Profitability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitConfig {
	#[serde(default = "default_expected_profit")]
	pub expected_profit: ProfitThreshold,
	/// Asset gas is paid in.
	#[serde(default = "default_gas_asset")]
	pub gas_asset: String,
	/// Asset rewards are paid in.
	#[serde(default = "default_reward_asset")]
	pub reward_asset: String,
	/// Currency profit is measured in.
	#[serde(default = "default_currency")]
	pub currency: String,
}

fn default_expected_profit() -> ProfitThreshold {
	ProfitThreshold::Percent(100.0)
}

fn default_gas_asset() -> String {
	"eth".to_string()
}

fn default_reward_asset() -> String {
	"trb".to_string()
}

fn default_currency() -> String {
	"usd".to_string()
}

impl Default for ProfitConfig {
	fn default() -> Self {
		Self {
			expected_profit: default_expected_profit(),
			gas_asset: default_gas_asset(),
			reward_asset: default_reward_asset(),
			currency: default_currency(),
		}
	}
}

/// Which condition gate decides whether a report is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
	/// Report every cycle.
	#[default]
	Always,
	/// Report only when the oracle has no fresh value.
	Stale,
}

/// Condition gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionsConfig {
	#[serde(default)]
	pub gate: GateKind,
	/// Age in seconds after which the last report counts as stale.
	#[serde(default = "default_stale_timeout")]
	pub stale_timeout_seconds: u64,
}

fn default_stale_timeout() -> u64 {
	3600
}

impl Default for ConditionsConfig {
	fn default() -> Self {
		Self {
			gate: GateKind::default(),
			stale_timeout_seconds: default_stale_timeout(),
		}
	}
}

/// Which bundle submission the relay path waits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwaitPolicy {
	/// Wait until the furthest targeted block is mined, then look up the receipt.
	#[default]
	FurthestTarget,
	/// Check for a receipt after every block and return on the first inclusion.
	FirstInclusion,
}

/// Private relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
	/// Submit through the relay. Transactions are broadcast publicly when disabled.
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_relay_url")]
	pub url: String,
	/// Key signing relay requests. It identifies the searcher and holds no funds.
	pub signature_key: Option<SecretString>,
	/// Number of consecutive blocks each bundle targets.
	#[serde(default = "default_target_blocks")]
	pub target_blocks: u64,
	#[serde(default)]
	pub await_policy: AwaitPolicy,
	/// Upper bound on the time spent waiting for inclusion. Keep it above
	/// `target_blocks` times the block time, or mined transactions are
	/// reported as not executed.
	#[serde(default = "default_wait_timeout")]
	pub wait_timeout_seconds: u64,
	/// Interval between block number polls while waiting.
	#[serde(default = "default_poll_interval")]
	pub poll_interval_seconds: u64,
	/// Broadcast publicly when the relay rejects every bundle.
	#[serde(default = "default_true")]
	pub fallback_broadcast: bool,
}

fn default_relay_url() -> String {
	"https://relay.flashbots.net".to_string()
}

fn default_target_blocks() -> u64 {
	5
}

fn default_wait_timeout() -> u64 {
	120
}

fn default_poll_interval() -> u64 {
	3
}

impl Default for RelayConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			url: default_relay_url(),
			signature_key: None,
			target_blocks: default_target_blocks(),
			await_policy: AwaitPolicy::default(),
			wait_timeout_seconds: default_wait_timeout(),
			poll_interval_seconds: default_poll_interval(),
			fallback_broadcast: true,
		}
	}
}

/// Price source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceConfig {
	/// Implementations to query. Several sources are combined by their median.
	pub sources: Vec<String>,
	/// Map of price source implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// A spot price datafeed to report.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
	pub asset: String,
	pub currency: String,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Bounded input keeps regex matching cheap
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				}
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.reporter.id.is_empty() {
			return Err(ConfigError::Validation("Reporter ID cannot be empty".into()));
		}
		if self.reporter.interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"interval_seconds must be greater than zero".into(),
			));
		}
		if self.network.rpc_url.is_empty() {
			return Err(ConfigError::Validation("rpc_url cannot be empty".into()));
		}
		if self.account.private_key.is_empty() {
			return Err(ConfigError::Validation(
				"Account private key cannot be empty".into(),
			));
		}

		if self.fees.gas_limit == 0 {
			return Err(ConfigError::Validation(
				"gas_limit must be greater than zero".into(),
			));
		}
		for (name, value) in [
			("max_fee", self.fees.max_fee),
			("priority_fee", self.fees.priority_fee),
			("legacy_gas_price", self.fees.legacy_gas_price),
		] {
			if let Some(v) = value {
				if !v.is_finite() || v < 0.0 {
					return Err(ConfigError::Validation(format!(
						"{} must be a non-negative number of gwei",
						name
					)));
				}
			}
		}
		if let (Some(max_fee), Some(priority_fee)) = (self.fees.max_fee, self.fees.priority_fee) {
			if max_fee < priority_fee {
				return Err(ConfigError::Validation(
					"max_fee cannot be lower than priority_fee".into(),
				));
			}
		}

		if !self
			.gas_oracle
			.implementations
			.contains_key(&self.gas_oracle.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Gas oracle primary implementation '{}' is not configured",
				self.gas_oracle.primary
			)));
		}

		if self.prices.sources.is_empty() {
			return Err(ConfigError::Validation(
				"At least one price source must be selected".into(),
			));
		}
		for source in &self.prices.sources {
			if !self.prices.implementations.contains_key(source) {
				return Err(ConfigError::Validation(format!(
					"Price source '{}' is not configured",
					source
				)));
			}
		}

		if self.relay.wait_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Relay wait_timeout_seconds must be greater than zero".into(),
			));
		}
		if self.relay.poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"Relay poll_interval_seconds must be greater than zero".into(),
			));
		}

		if self.relay.enabled {
			if self.relay.signature_key.as_ref().is_none_or(|k| k.is_empty()) {
				return Err(ConfigError::Validation(
					"Relay signature_key is required when the relay is enabled".into(),
				));
			}
			if self.relay.target_blocks == 0 {
				return Err(ConfigError::Validation(
					"Relay target_blocks must be greater than zero".into(),
				));
			}
		}

		if self.feeds.is_empty() {
			return Err(ConfigError::Validation(
				"At least one feed must be configured".into(),
			));
		}
		for feed in &self.feeds {
			if feed.asset.is_empty() || feed.currency.is_empty() {
				return Err(ConfigError::Validation(
					"Feeds need both an asset and a currency".into(),
				));
			}
		}

		Ok(())
	}
}

/// Parses TOML, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const BASE_CONFIG: &str = r#"
[reporter]
id = "${TEST_REPORTER_ID:-eth-usd-reporter}"
chain_id = 1

[network]
rpc_url = "http://localhost:8545"
explorer = "https://etherscan.io"

[contracts]
oracle = "0x88dF592F8eb5D7Bd38bFeF7dEb0fBc02cf3778a0"

[account]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[gas_oracle]
primary = "rpc"
[gas_oracle.implementations.rpc]

[prices]
sources = ["fixed"]
[prices.implementations.fixed]
prices = { "eth/usd" = 2000.0, "trb/usd" = 1.0 }

[[feeds]]
asset = "eth"
currency = "usd"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_REPORTER_HOST", "localhost");
		std::env::set_var("TEST_REPORTER_PORT", "8545");

		let input = "url = \"http://${TEST_REPORTER_HOST}:${TEST_REPORTER_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("TEST_REPORTER_HOST");
		std::env::remove_var("TEST_REPORTER_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_REPORTER_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${MISSING_REPORTER_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("MISSING_REPORTER_VAR"));
	}

	#[test]
	fn test_defaults() {
		let config: Config = BASE_CONFIG.parse().unwrap();
		assert_eq!(config.reporter.id, "eth-usd-reporter");
		assert_eq!(config.reporter.interval_seconds, 7);
		assert_eq!(config.fees.transaction_type, TransactionType::Legacy);
		assert_eq!(config.fees.gas_limit, 350_000);
		assert_eq!(config.fees.gas_price_speed, GasSpeed::Fast);
		assert!(config.fees.sticky);
		assert_eq!(config.profit.expected_profit, ProfitThreshold::Percent(100.0));
		assert_eq!(config.conditions.gate, GateKind::Always);
		assert!(!config.relay.enabled);
		assert_eq!(config.relay.target_blocks, 5);
		assert_eq!(config.relay.await_policy, AwaitPolicy::FurthestTarget);
		assert_eq!(config.contracts.staking_address(), config.contracts.oracle);
	}

	#[test]
	fn test_always_report_threshold() {
		let toml = format!("{}\n[profit]\nexpected_profit = \"YOLO\"\n", BASE_CONFIG);
		let config: Config = toml.parse().unwrap();
		assert_eq!(config.profit.expected_profit, ProfitThreshold::Always);

		let toml = format!("{}\n[profit]\nexpected_profit = 25\n", BASE_CONFIG);
		let config: Config = toml.parse().unwrap();
		assert_eq!(config.profit.expected_profit, ProfitThreshold::Percent(25.0));

		let toml = format!("{}\n[profit]\nexpected_profit = \"lots\"\n", BASE_CONFIG);
		assert!(toml.parse::<Config>().is_err());
	}

	#[test]
	fn test_relay_requires_signature_key() {
		let toml = format!("{}\n[relay]\nenabled = true\n", BASE_CONFIG);
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("signature_key"));

		let toml = format!(
			"{}\n[relay]\nenabled = true\nsignature_key = \"0x01\"\nawait_policy = \"first_inclusion\"\n",
			BASE_CONFIG
		);
		let config: Config = toml.parse().unwrap();
		assert_eq!(config.relay.await_policy, AwaitPolicy::FirstInclusion);
	}

	#[test]
	fn test_rejects_zero_wait_timeout() {
		let toml = format!("{}\n[relay]\nwait_timeout_seconds = 0\n", BASE_CONFIG);
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("wait_timeout_seconds"));

		let toml = format!("{}\n[relay]\npoll_interval_seconds = 0\n", BASE_CONFIG);
		assert!(toml.parse::<Config>().is_err());
	}

	#[test]
	fn test_rejects_inverted_fees() {
		let toml = format!(
			"{}\n[fees]\ntransaction_type = \"eip1559\"\nmax_fee = 1.0\npriority_fee = 2.0\n",
			BASE_CONFIG
		);
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("max_fee"));
	}

	#[test]
	fn test_rejects_unknown_price_source() {
		let toml = BASE_CONFIG.replace("sources = [\"fixed\"]", "sources = [\"coingecko\"]");
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("coingecko"));
	}

	#[tokio::test]
	async fn test_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(BASE_CONFIG.as_bytes()).unwrap();

		let config = Config::from_file(file.path()).await.unwrap();
		assert_eq!(config.feeds.len(), 1);
		assert_eq!(config.feeds[0].asset, "eth");
	}
}
