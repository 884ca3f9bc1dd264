//! Builder pattern for constructing reporting loops.
//!
//! Composes one `ReportingLoop` per configured datafeed from the chain
//! client, the oracle contracts, the reporting account, the optional relay
//! and the price and gas sources built through their factories. All loops of
//! a process share these services.

use crate::bundle::{BundleSettings, BundleSubmitter};
use crate::conditions::gate_from_config;
use crate::engine::{LoopSettings, ReporterContext, ReportingLoop};
use crate::fees::{FeeEstimator, FeeSettings};
use reporter_account::{create_local_account, AccountService};
use reporter_config::Config;
use reporter_delivery::implementations::evm::alloy::AlloyChain;
use reporter_delivery::implementations::relay::flashbots::FlashbotsRelay;
use reporter_delivery::{ChainInterface, RelayInterface};
use reporter_oracle::{ContractOracle, OracleInterface};
use reporter_price::gas::{GasError, GasPriceSource};
use reporter_price::{PriceDataSource, PriceFeedError, PriceFeedService, PriceSource};
use reporter_types::{Datafeed, SpotPrice};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while assembling reporters.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for the pluggable price and gas sources.
///
/// Each factory takes the TOML table configured under its name.
pub struct ReporterFactories<PF, GF> {
	pub price_factories: HashMap<String, PF>,
	pub gas_factories: HashMap<String, GF>,
}

/// Builder for the reporting loops of one reporter process.
pub struct ReporterBuilder {
	config: Config,
}

impl ReporterBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Connects to the configured RPC endpoint and builds the loops.
	///
	/// Fails when the node serves another chain than the configured one.
	pub async fn build<PF, GF>(
		self,
		factories: ReporterFactories<PF, GF>,
	) -> Result<Vec<ReportingLoop>, BuilderError>
	where
		PF: Fn(&toml::Value) -> Result<Box<dyn PriceSource>, PriceFeedError>,
		GF: Fn(&toml::Value, Arc<dyn ChainInterface>) -> Result<Box<dyn GasPriceSource>, GasError>,
	{
		let chain = AlloyChain::new(&self.config.network.rpc_url)
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		let chain_id = chain
			.chain_id()
			.await
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		if chain_id != self.config.reporter.chain_id {
			return Err(BuilderError::Config(format!(
				"RPC endpoint serves chain {} but chain_id is {}",
				chain_id, self.config.reporter.chain_id
			)));
		}

		self.build_with_chain(Arc::new(chain), factories).await
	}

	/// Builds the loops on top of an existing chain client.
	pub async fn build_with_chain<PF, GF>(
		self,
		chain: Arc<dyn ChainInterface>,
		factories: ReporterFactories<PF, GF>,
	) -> Result<Vec<ReportingLoop>, BuilderError>
	where
		PF: Fn(&toml::Value) -> Result<Box<dyn PriceSource>, PriceFeedError>,
		GF: Fn(&toml::Value, Arc<dyn ChainInterface>) -> Result<Box<dyn GasPriceSource>, GasError>,
	{
		let config = &self.config;

		// Reporting account
		let account = create_local_account(&config.account.private_key)
			.map_err(|e| BuilderError::Config(format!("Failed to load account: {}", e)))?;
		let account = Arc::new(AccountService::new(account));
		let address = account
			.get_address()
			.await
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		tracing::info!(component = "account", address = %address, "Loaded");

		let oracle: Arc<dyn OracleInterface> = Arc::new(ContractOracle::new(
			chain.clone(),
			config.contracts.oracle,
			config.contracts.staking_address(),
		));

		// Price sources
		let mut price_impls: HashMap<String, Arc<dyn PriceSource>> = HashMap::new();
		for (name, source_config) in &config.prices.implementations {
			if let Some(factory) = factories.price_factories.get(name) {
				match factory(source_config) {
					Ok(implementation) => {
						let selected = config.prices.sources.contains(name);
						price_impls.insert(name.clone(), Arc::from(implementation));
						tracing::info!(
							component = "price",
							implementation = %name,
							enabled = %selected,
							"Loaded"
						);
					}
					Err(e) => {
						tracing::error!(
							component = "price",
							implementation = %name,
							error = %e,
							"Failed to create price source"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create price source '{}': {}",
							name, e
						)));
					}
				}
			}
		}
		if price_impls.is_empty() {
			return Err(BuilderError::MissingComponent(
				"No valid price sources available".into(),
			));
		}
		let price_service = PriceFeedService::new(price_impls, config.prices.sources.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		tracing::info!(
			component = "price",
			sources = ?price_service.selected(),
			median = price_service.selected().len() > 1,
			"Price feed ready"
		);
		let prices: Arc<dyn PriceSource> = Arc::new(price_service);

		// Gas source
		let primary_gas = &config.gas_oracle.primary;
		let gas_factory = factories.gas_factories.get(primary_gas).ok_or_else(|| {
			BuilderError::MissingComponent(format!("Unknown gas source '{}'", primary_gas))
		})?;
		let gas_config = config
			.gas_oracle
			.implementations
			.get(primary_gas)
			.ok_or_else(|| {
				BuilderError::Config(format!("Gas source '{}' is not configured", primary_gas))
			})?;
		let gas = gas_factory(gas_config, chain.clone()).map_err(|e| {
			BuilderError::Config(format!("Failed to create gas source '{}': {}", primary_gas, e))
		})?;
		tracing::info!(component = "gas", implementation = %primary_gas, "Loaded");
		let fees = Arc::new(FeeEstimator::new(Arc::from(gas)));

		// Private relay
		let relay: Option<Arc<dyn RelayInterface>> = if config.relay.enabled {
			let key = config.relay.signature_key.as_ref().ok_or_else(|| {
				BuilderError::Config("Relay signature_key is required".into())
			})?;
			let signer = create_local_account(key)
				.map_err(|e| BuilderError::Config(format!("Invalid relay signature key: {}", e)))?;
			tracing::info!(component = "relay", url = %config.relay.url, "Loaded");
			let relay: Arc<dyn RelayInterface> =
				Arc::new(FlashbotsRelay::new(config.relay.url.clone(), signer));
			Some(relay)
		} else {
			None
		};
		let bundles = Arc::new(BundleSubmitter::new(
			chain.clone(),
			relay,
			BundleSettings::from_config(&config.relay),
		));

		let context = ReporterContext {
			chain,
			oracle,
			account,
			address,
			prices: prices.clone(),
			fees,
			bundles,
		};
		let settings = LoopSettings {
			chain_id: config.reporter.chain_id,
			fees: FeeSettings::from_config(&config.fees),
			sticky_fees: config.fees.sticky,
			profit: config.profit.clone(),
			interval: Duration::from_secs(config.reporter.interval_seconds),
			report_count: config.reporter.report_count,
			explorer: config.network.explorer.clone(),
		};

		let loops = config
			.feeds
			.iter()
			.map(|feed| {
				let query = Arc::new(SpotPrice::new(&feed.asset, &feed.currency));
				let source = Arc::new(PriceDataSource::new(
					prices.clone(),
					&feed.asset,
					&feed.currency,
				));
				ReportingLoop::new(
					context.clone(),
					Datafeed::new(query, source),
					gate_from_config(&config.conditions),
					settings.clone(),
				)
			})
			.collect::<Vec<_>>();

		tracing::info!(
			reporter = %config.reporter.id,
			feeds = loops.len(),
			"Reporter built"
		);
		Ok(loops)
	}
}
