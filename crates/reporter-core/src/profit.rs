//! Profitability of a submission.
//!
//! Revenue is the tips plus the time-based reward currently available for the
//! query, valued at the reward asset price. Cost is the gas limit times the
//! highest price per gas the quote allows, valued at the gas asset price.
//! Both token amounts carry 18 decimals.

use crate::ReporterError;
use reporter_config::{ProfitConfig, ProfitThreshold};
use reporter_oracle::{OracleError, OracleInterface};
use reporter_price::PriceSource;
use reporter_types::{format_token_amount, FeeQuote, B256, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

const TOKEN_DECIMALS: u32 = 18;

/// Outcome of a profitability check.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitDecision {
	/// Whether the submission clears the threshold.
	pub ok: bool,
	pub percent_profit: f64,
	pub profit_usd: Decimal,
	pub revenue_usd: Decimal,
	pub costs_usd: Decimal,
}

/// Weighs expected rewards against gas costs.
pub struct ProfitabilityEvaluator {
	oracle: Arc<dyn OracleInterface>,
	prices: Arc<dyn PriceSource>,
	gas_limit: u64,
	threshold: ProfitThreshold,
	gas_asset: String,
	reward_asset: String,
	currency: String,
}

/// Converts an 18 decimal token amount into whole tokens.
fn token_amount(amount: U256) -> Option<Decimal> {
	let int = i128::try_from(u128::try_from(amount).ok()?).ok()?;
	Decimal::try_from_i128_with_scale(int, TOKEN_DECIMALS).ok()
}

impl ProfitabilityEvaluator {
	pub fn new(
		oracle: Arc<dyn OracleInterface>,
		prices: Arc<dyn PriceSource>,
		gas_limit: u64,
		config: &ProfitConfig,
	) -> Self {
		Self {
			oracle,
			prices,
			gas_limit,
			threshold: config.expected_profit,
			gas_asset: config.gas_asset.clone(),
			reward_asset: config.reward_asset.clone(),
			currency: config.currency.clone(),
		}
	}

	pub fn threshold(&self) -> ProfitThreshold {
		self.threshold
	}

	/// Estimates the profit of submitting a value for `query_id` at `fees`.
	pub async fn estimate(
		&self,
		query_id: B256,
		fees: &FeeQuote,
	) -> Result<ProfitDecision, ReporterError> {
		let reward = self
			.oracle
			.current_reward(query_id)
			.await
			.map_err(ReporterError::OracleRead)?;

		let (gas_price, reward_price) = tokio::try_join!(
			self.prices.fetch_price(&self.gas_asset, &self.currency),
			self.prices.fetch_price(&self.reward_asset, &self.currency),
		)
		.map_err(|e| ReporterError::PriceUnavailable(e.to_string()))?;

		let revenue = token_amount(reward.total())
			.ok_or(ReporterError::OracleRead(OracleError::OutOfRange("getCurrentReward")))?;
		let costs_wei =
			U256::from(self.gas_limit).saturating_mul(U256::from(fees.max_price_per_gas()));
		let costs = token_amount(costs_wei).ok_or_else(|| {
			ReporterError::Config(format!("Gas cost of {} wei is out of range", costs_wei))
		})?;

		let revenue_usd = revenue.checked_mul(reward_price.value).ok_or_else(|| {
			ReporterError::PriceUnavailable(format!("{} revenue overflows", self.currency))
		})?;
		let costs_usd = costs.checked_mul(gas_price.value).ok_or_else(|| {
			ReporterError::PriceUnavailable(format!("{} costs overflow", self.currency))
		})?;
		let profit_usd = revenue_usd - costs_usd;

		let decision = decide(self.threshold, profit_usd, revenue_usd, costs_usd);
		tracing::info!(
			query_id = %query_id,
			tips = %format_token_amount(reward.tips, 18),
			time_based_reward = %format_token_amount(reward.time_based_reward, 18),
			revenue_usd = %decision.revenue_usd.round_dp(4),
			costs_usd = %decision.costs_usd.round_dp(4),
			profit_usd = %decision.profit_usd.round_dp(4),
			percent_profit = decision.percent_profit,
			"Estimated profitability"
		);
		Ok(decision)
	}
}

fn decide(
	threshold: ProfitThreshold,
	profit_usd: Decimal,
	revenue_usd: Decimal,
	costs_usd: Decimal,
) -> ProfitDecision {
	let free = costs_usd.is_zero();
	let percent_profit = if free {
		if profit_usd > Decimal::ZERO {
			f64::INFINITY
		} else {
			0.0
		}
	} else {
		profit_usd.to_f64().unwrap_or_default() / costs_usd.to_f64().unwrap_or(f64::MAX) * 100.0
	};

	let ok = match threshold {
		ProfitThreshold::Always => true,
		// A free submission cannot lose money
		ProfitThreshold::Percent(_) if free => true,
		ProfitThreshold::Percent(min) => percent_profit >= min,
	};

	ProfitDecision {
		ok,
		percent_profit,
		profit_usd,
		revenue_usd,
		costs_usd,
	}
}
