//! Gas prices straight from the node.
//!
//! `eth_gasPrice` is the safe tier. The average and fast tiers add a
//! configurable premium on top of it.

use crate::gas::{GasError, GasPriceSource, GasSourceFactory, GasSourceRegistry};
use async_trait::async_trait;
use reporter_delivery::ChainInterface;
use reporter_types::{GasSnapshot, ImplementationRegistry};
use serde::Deserialize;
use std::sync::Arc;

/// Configuration for the RPC gas source.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcGasConfig {
	/// Premium of the average tier over the node price, in percent.
	#[serde(default = "default_average_premium")]
	pub average_premium_percent: u32,
	/// Premium of the fast tier over the node price, in percent.
	#[serde(default = "default_fast_premium")]
	pub fast_premium_percent: u32,
}

fn default_average_premium() -> u32 {
	10
}

fn default_fast_premium() -> u32 {
	25
}

impl Default for RpcGasConfig {
	fn default() -> Self {
		Self {
			average_premium_percent: default_average_premium(),
			fast_premium_percent: default_fast_premium(),
		}
	}
}

/// Gas source reading the connected node.
pub struct RpcGasSource {
	chain: Arc<dyn ChainInterface>,
	config: RpcGasConfig,
}

impl RpcGasSource {
	pub fn new(chain: Arc<dyn ChainInterface>, config: RpcGasConfig) -> Self {
		Self { chain, config }
	}
}

fn with_premium(price: u128, percent: u32) -> u128 {
	price.saturating_mul(100 + percent as u128) / 100
}

#[async_trait]
impl GasPriceSource for RpcGasSource {
	async fn fetch(&self) -> Result<GasSnapshot, GasError> {
		let (gas_price, base_fee) =
			futures::try_join!(self.chain.gas_price(), self.chain.latest_base_fee())
				.map_err(|e| GasError::Network(e.to_string()))?;

		Ok(GasSnapshot {
			suggest_base_fee: base_fee,
			safe: gas_price,
			propose: with_premium(gas_price, self.config.average_premium_percent),
			fast: with_premium(gas_price, self.config.fast_premium_percent),
		})
	}
}

/// Registry for the RPC gas source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "rpc";
	type Factory = GasSourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value,
		 chain: Arc<dyn ChainInterface>|
		 -> Result<Box<dyn GasPriceSource>, GasError> {
			let rpc_config: RpcGasConfig = config
				.clone()
				.try_into()
				.map_err(|e| GasError::Configuration(format!("Invalid rpc gas config: {}", e)))?;
			Ok(Box::new(RpcGasSource::new(chain, rpc_config)))
		}
	}
}

impl GasSourceRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use reporter_delivery::DeliveryError;
	use reporter_types::{Address, Bytes, TransactionReceipt, B256, GWEI, U256};

	struct GasChain {
		gas_price: Option<u128>,
		base_fee: Option<u128>,
	}

	#[async_trait]
	impl ChainInterface for GasChain {
		async fn block_number(&self) -> Result<u64, DeliveryError> {
			Ok(1)
		}
		async fn transaction_count(&self, _address: Address) -> Result<u64, DeliveryError> {
			Ok(0)
		}
		async fn balance(&self, _address: Address) -> Result<U256, DeliveryError> {
			Ok(U256::ZERO)
		}
		async fn receipt(&self, _hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError> {
			Ok(None)
		}
		async fn send_raw_transaction(&self, _raw: &Bytes) -> Result<B256, DeliveryError> {
			Ok(B256::ZERO)
		}
		async fn call(&self, _to: Address, _input: Bytes) -> Result<Bytes, DeliveryError> {
			Ok(Bytes::new())
		}
		async fn gas_price(&self) -> Result<u128, DeliveryError> {
			self.gas_price
				.ok_or_else(|| DeliveryError::Network("connection refused".into()))
		}
		async fn latest_base_fee(&self) -> Result<Option<u128>, DeliveryError> {
			Ok(self.base_fee)
		}
	}

	#[tokio::test]
	async fn test_snapshot_tiers() {
		let chain = Arc::new(GasChain {
			gas_price: Some(20 * GWEI),
			base_fee: Some(18 * GWEI),
		});
		let source = RpcGasSource::new(chain, RpcGasConfig::default());

		let snapshot = source.fetch().await.unwrap();
		assert_eq!(snapshot.safe, 20 * GWEI);
		assert_eq!(snapshot.propose, 22 * GWEI);
		assert_eq!(snapshot.fast, 25 * GWEI);
		assert_eq!(snapshot.suggest_base_fee, Some(18 * GWEI));
	}

	#[tokio::test]
	async fn test_node_failure() {
		let chain = Arc::new(GasChain {
			gas_price: None,
			base_fee: None,
		});
		let source = RpcGasSource::new(chain, RpcGasConfig::default());
		assert!(matches!(source.fetch().await, Err(GasError::Network(_))));
	}
}
