//! Core reporting engine for the oracle reporter.
//!
//! This crate holds the decision logic of a reporter: whether a value should
//! be submitted this cycle (reporter lock, condition gate, profitability) and
//! how it is submitted (fee resolution, transaction construction, private
//! relay bundles with a public broadcast fallback). The `ReportingLoop` drives
//! these steps on a fixed interval and the builder assembles loops from
//! configuration.

use reporter_account::AccountError;
use reporter_delivery::DeliveryError;
use reporter_oracle::OracleError;
use reporter_types::{Address, QueryError, B256};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

pub mod builder;
pub mod bundle;
pub mod conditions;
pub mod engine;
pub mod fees;
pub mod profit;
pub mod submission;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{BuilderError, ReporterBuilder, ReporterFactories};
pub use bundle::{BundleSettings, BundleSubmitter};
pub use conditions::{AlwaysReport, ConditionGate, StaleDataGate};
pub use engine::{CycleOutcome, LoopState, ReportingLoop};
pub use fees::{FeeError, FeeEstimator, FeeSettings};
pub use profit::{ProfitDecision, ProfitabilityEvaluator};
pub use submission::SubmissionBuilder;

/// Errors that end a reporting cycle without a submission.
///
/// The reporting loop logs these and sleeps until the next cycle. Only
/// `NotStaked` and `Config` abort a reporter, and only at startup.
#[derive(Debug, Error)]
pub enum ReporterError {
	#[error("Unable to read oracle state: {0}")]
	OracleRead(#[source] OracleError),
	#[error("Unable to resolve fees: {0}")]
	GasQuote(#[from] FeeError),
	#[error("Price unavailable: {0}")]
	PriceUnavailable(String),
	#[error("Error encoding response value {value}: {cause}")]
	Encoding {
		value: Decimal,
		#[source]
		cause: QueryError,
	},
	#[error("Unable to retrieve timestamp count: {0}")]
	NonceRead(#[source] OracleError),
	#[error("Transaction {tx_hash} was not executed: {reason}")]
	BundleNotExecuted { tx_hash: B256, reason: String },
	#[error("Transaction {tx_hash} reverted in block {block_number}")]
	TransactionReverted { tx_hash: B256, block_number: u64 },
	#[error("Signing failed: {0}")]
	Signing(#[from] AccountError),
	#[error("Delivery failed: {0}")]
	Delivery(#[from] DeliveryError),
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Account {address} is not staked (status {status})")]
	NotStaked { address: Address, status: u64 },
}

/// Reasons a cycle ends without submitting that are not failures.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
	/// The reporter submitted too recently.
	LockActive { remaining_seconds: u64 },
	/// Expected profit is below the configured threshold.
	ProfitBelowThreshold { percent_profit: f64, threshold: f64 },
	/// The condition gate found no reason to report.
	ConditionsNotMet,
	/// The chain could not be reached.
	Offline,
	/// The account has no native balance to pay gas with.
	NoNativeBalance,
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SkipReason::LockActive { remaining_seconds } => {
				let hours = remaining_seconds / 3600;
				let minutes = (remaining_seconds % 3600) / 60;
				let seconds = remaining_seconds % 60;
				write!(
					f,
					"Currently in reporter lock. Time left: {}:{:02}:{:02}",
					hours, minutes, seconds
				)
			}
			SkipReason::ProfitBelowThreshold {
				percent_profit,
				threshold,
			} => write!(
				f,
				"Estimated profitability {:.2}% below threshold {:.2}%",
				percent_profit, threshold
			),
			SkipReason::ConditionsNotMet => write!(f, "Reporting conditions not met"),
			SkipReason::Offline => write!(f, "Unable to connect to the chain"),
			SkipReason::NoNativeBalance => write!(f, "Account has no native balance for gas"),
		}
	}
}
