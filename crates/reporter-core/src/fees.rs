//! Fee resolution under the legacy and EIP-1559 fee models.
//!
//! `FeeEstimator::resolve_fees` turns the reporter's fee settings and a gas
//! price snapshot into a `FeeQuote`. It never mutates the settings. Keeping
//! resolved values for later cycles is the caller's decision (`FeeSettings::pin`).

use reporter_config::FeeConfig;
use reporter_price::gas::{GasError, GasPriceSource};
use reporter_types::{
	gwei_to_wei, wei_to_gwei, FeeQuote, GasSnapshot, GasSpeed, TransactionType,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while resolving fees.
#[derive(Debug, Error)]
pub enum FeeError {
	#[error(transparent)]
	Source(#[from] GasError),
	#[error("Max fee {max_fee} wei is lower than priority fee {priority_fee} wei")]
	MaxFeeBelowPriorityFee { max_fee: u128, priority_fee: u128 },
	#[error("Gas source did not suggest a base fee")]
	MissingBaseFee,
}

/// Fee parameters of a reporter, in wei.
///
/// Unset values are resolved from the gas source every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSettings {
	pub transaction_type: TransactionType,
	pub gas_limit: u64,
	pub max_fee: Option<u128>,
	pub priority_fee: Option<u128>,
	pub legacy_gas_price: Option<u128>,
	pub gas_price_speed: GasSpeed,
}

impl FeeSettings {
	pub fn from_config(config: &FeeConfig) -> Self {
		Self {
			transaction_type: config.transaction_type,
			gas_limit: config.gas_limit,
			max_fee: config.max_fee.map(gwei_to_wei),
			priority_fee: config.priority_fee.map(gwei_to_wei),
			legacy_gas_price: config.legacy_gas_price.map(gwei_to_wei),
			gas_price_speed: config.gas_price_speed,
		}
	}

	/// Keeps the values of a resolved quote for the following cycles.
	pub fn pin(&mut self, quote: &FeeQuote) {
		match *quote {
			FeeQuote::Legacy { gas_price } => {
				self.legacy_gas_price = Some(gas_price);
			}
			FeeQuote::Eip1559 {
				priority_fee,
				max_fee,
				..
			} => {
				self.priority_fee = Some(priority_fee);
				self.max_fee = Some(max_fee);
			}
		}
	}
}

/// Resolves fee quotes from a gas price source.
pub struct FeeEstimator {
	source: Arc<dyn GasPriceSource>,
}

impl FeeEstimator {
	pub fn new(source: Arc<dyn GasPriceSource>) -> Self {
		Self { source }
	}

	/// Builds a fee quote for the configured fee model.
	///
	/// The gas source is only queried for values the settings leave unset.
	pub async fn resolve_fees(&self, settings: &FeeSettings) -> Result<FeeQuote, FeeError> {
		let quote = self.quote(settings).await?;
		tracing::debug!(
			model = ?quote.model(),
			max_price_gwei = wei_to_gwei(quote.max_price_per_gas()),
			"Resolved fees"
		);
		Ok(quote)
	}

	async fn quote(&self, settings: &FeeSettings) -> Result<FeeQuote, FeeError> {
		match settings.transaction_type {
			TransactionType::Legacy => {
				let gas_price = match settings.legacy_gas_price {
					Some(price) => price,
					None => self
						.source
						.fetch()
						.await?
						.price_for(settings.gas_price_speed),
				};
				Ok(FeeQuote::Legacy { gas_price })
			}
			TransactionType::Eip1559 => match (settings.priority_fee, settings.max_fee) {
				(Some(priority_fee), Some(max_fee)) => eip1559_quote(
					max_fee.saturating_sub(priority_fee),
					priority_fee,
					Some(max_fee),
				),
				(priority_fee, max_fee) => {
					let snapshot = self.source.fetch().await?;
					resolve_eip1559(&snapshot, priority_fee, max_fee)
				}
			},
		}
	}
}

fn resolve_eip1559(
	snapshot: &GasSnapshot,
	priority_fee: Option<u128>,
	max_fee: Option<u128>,
) -> Result<FeeQuote, FeeError> {
	let priority_fee = priority_fee.unwrap_or(snapshot.safe);
	match snapshot.suggest_base_fee {
		Some(base_fee) => eip1559_quote(base_fee, priority_fee, max_fee),
		// Without a base fee only an explicit max fee can cap the transaction
		None => match max_fee {
			Some(max_fee) => eip1559_quote(
				max_fee.saturating_sub(priority_fee),
				priority_fee,
				Some(max_fee),
			),
			None => Err(FeeError::MissingBaseFee),
		},
	}
}

fn eip1559_quote(
	base_fee: u128,
	priority_fee: u128,
	max_fee: Option<u128>,
) -> Result<FeeQuote, FeeError> {
	let max_fee = max_fee.unwrap_or_else(|| priority_fee.saturating_add(base_fee));
	if max_fee < priority_fee {
		return Err(FeeError::MaxFeeBelowPriorityFee {
			max_fee,
			priority_fee,
		});
	}
	Ok(FeeQuote::Eip1559 {
		base_fee,
		priority_fee,
		max_fee,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::FakeGas;
	use reporter_types::GWEI;

	fn settings(transaction_type: TransactionType) -> FeeSettings {
		FeeSettings {
			transaction_type,
			gas_limit: 350_000,
			max_fee: None,
			priority_fee: None,
			legacy_gas_price: None,
			gas_price_speed: GasSpeed::Fast,
		}
	}

	fn estimator(gas: FakeGas) -> (FeeEstimator, Arc<FakeGas>) {
		let gas = Arc::new(gas);
		(FeeEstimator::new(gas.clone()), gas)
	}

	#[tokio::test]
	async fn test_legacy_uses_speed_tier() {
		let (estimator, _) =
			estimator(FakeGas::snapshot(Some(30 * GWEI), 40 * GWEI, 45 * GWEI, 50 * GWEI));
		let mut settings = settings(TransactionType::Legacy);

		let quote = estimator.resolve_fees(&settings).await.unwrap();
		assert_eq!(quote, FeeQuote::Legacy { gas_price: 50 * GWEI });

		settings.gas_price_speed = GasSpeed::Average;
		let quote = estimator.resolve_fees(&settings).await.unwrap();
		assert_eq!(quote, FeeQuote::Legacy { gas_price: 45 * GWEI });
	}

	#[tokio::test]
	async fn test_legacy_configured_price_skips_source() {
		let (estimator, gas) = estimator(FakeGas::failing());
		let mut settings = settings(TransactionType::Legacy);
		settings.legacy_gas_price = Some(60 * GWEI);

		let quote = estimator.resolve_fees(&settings).await.unwrap();
		assert_eq!(quote, FeeQuote::Legacy { gas_price: 60 * GWEI });
		assert_eq!(gas.calls(), 0);
	}

	#[tokio::test]
	async fn test_eip1559_defaults() {
		let (estimator, _) =
			estimator(FakeGas::snapshot(Some(30 * GWEI), 2 * GWEI, 3 * GWEI, 4 * GWEI));
		let quote = estimator
			.resolve_fees(&settings(TransactionType::Eip1559))
			.await
			.unwrap();

		// Priority from the safe tier, max fee is base plus priority
		assert_eq!(
			quote,
			FeeQuote::Eip1559 {
				base_fee: 30 * GWEI,
				priority_fee: 2 * GWEI,
				max_fee: 32 * GWEI,
			}
		);
	}

	#[tokio::test]
	async fn test_eip1559_max_fee_below_priority_rejected() {
		let (estimator, _) =
			estimator(FakeGas::snapshot(Some(30 * GWEI), 5 * GWEI, 6 * GWEI, 7 * GWEI));
		let mut settings = settings(TransactionType::Eip1559);
		settings.max_fee = Some(GWEI);

		let err = estimator.resolve_fees(&settings).await.unwrap_err();
		assert!(matches!(err, FeeError::MaxFeeBelowPriorityFee { .. }));
	}

	#[tokio::test]
	async fn test_eip1559_missing_base_fee() {
		let (estimator, _) = estimator(FakeGas::snapshot(None, 2 * GWEI, 3 * GWEI, 4 * GWEI));
		let err = estimator
			.resolve_fees(&settings(TransactionType::Eip1559))
			.await
			.unwrap_err();
		assert!(matches!(err, FeeError::MissingBaseFee));
	}

	#[tokio::test]
	async fn test_source_failure_propagates() {
		let (estimator, _) = estimator(FakeGas::failing());
		let err = estimator
			.resolve_fees(&settings(TransactionType::Legacy))
			.await
			.unwrap_err();
		assert!(matches!(err, FeeError::Source(_)));
	}

	#[tokio::test]
	async fn test_pinned_fees_are_reused() {
		let (estimator, gas) =
			estimator(FakeGas::snapshot(Some(30 * GWEI), 2 * GWEI, 3 * GWEI, 4 * GWEI));
		let mut settings = settings(TransactionType::Eip1559);

		let first = estimator.resolve_fees(&settings).await.unwrap();
		settings.pin(&first);
		assert_eq!(settings.priority_fee, Some(2 * GWEI));
		assert_eq!(settings.max_fee, Some(32 * GWEI));

		let second = estimator.resolve_fees(&settings).await.unwrap();
		assert_eq!(second.max_price_per_gas(), first.max_price_per_gas());
		assert_eq!(gas.calls(), 1);
	}

	#[test]
	fn test_from_config_converts_gwei() {
		let config = FeeConfig {
			max_fee: Some(40.0),
			priority_fee: Some(1.5),
			..FeeConfig::default()
		};
		let settings = FeeSettings::from_config(&config);
		assert_eq!(settings.max_fee, Some(40 * GWEI));
		assert_eq!(settings.priority_fee, Some(1_500_000_000));
		assert_eq!(settings.legacy_gas_price, None);
		assert_eq!(settings.gas_limit, 350_000);
	}
}
