//! Fee models, gas snapshots and resolved fee quotes.
//!
//! All fee values are carried in wei. Configuration and gas trackers speak
//! gwei, so conversion helpers live here too.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Wei per gwei.
pub const GWEI: u128 = 1_000_000_000;

/// Transaction fee model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
	/// Type 0 transactions priced with a single gas price.
	#[default]
	#[serde(alias = "type0")]
	Legacy,
	/// Type 2 transactions priced with a max fee and a priority fee.
	#[serde(alias = "type2")]
	Eip1559,
}

/// Speed tier requested from a gas tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasSpeed {
	Safe,
	#[serde(alias = "propose", alias = "standard")]
	Average,
	#[default]
	Fast,
}

/// Gas prices reported by a gas tracker, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSnapshot {
	/// Base fee suggested for the next block, when the chain has one.
	pub suggest_base_fee: Option<u128>,
	pub safe: u128,
	pub propose: u128,
	pub fast: u128,
}

impl GasSnapshot {
	/// Gas price for a speed tier.
	pub fn price_for(&self, speed: GasSpeed) -> u128 {
		match speed {
			GasSpeed::Safe => self.safe,
			GasSpeed::Average => self.propose,
			GasSpeed::Fast => self.fast,
		}
	}
}

/// Fees resolved for one submission attempt.
///
/// The enum shape guarantees that exactly one set of fee fields exists and
/// that it matches the fee model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeQuote {
	Legacy {
		gas_price: u128,
	},
	Eip1559 {
		base_fee: u128,
		priority_fee: u128,
		max_fee: u128,
	},
}

impl FeeQuote {
	pub fn model(&self) -> TransactionType {
		match self {
			FeeQuote::Legacy { .. } => TransactionType::Legacy,
			FeeQuote::Eip1559 { .. } => TransactionType::Eip1559,
		}
	}

	/// Highest price per gas the transaction may pay.
	pub fn max_price_per_gas(&self) -> u128 {
		match self {
			FeeQuote::Legacy { gas_price } => *gas_price,
			FeeQuote::Eip1559 { max_fee, .. } => *max_fee,
		}
	}
}

/// Converts a gwei amount to wei, rounding down.
pub fn gwei_to_wei(gwei: f64) -> u128 {
	if !gwei.is_finite() || gwei <= 0.0 {
		return 0;
	}
	(gwei * GWEI as f64) as u128
}

/// Converts a wei amount to gwei.
pub fn wei_to_gwei(wei: u128) -> f64 {
	wei as f64 / GWEI as f64
}

/// Parses a decimal gwei string such as `"12.5"` into wei.
pub fn parse_gwei(text: &str) -> Option<u128> {
	let gwei = Decimal::from_str(text.trim()).ok()?;
	if gwei.is_sign_negative() {
		return None;
	}
	gwei.checked_mul(Decimal::from(GWEI as u64))?.trunc().to_u128()
}
