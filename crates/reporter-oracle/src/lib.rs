//! Oracle contract access for the reporter.
//!
//! Typed reads of the oracle and staking contracts plus the calldata encoder
//! for value submissions. Every read goes to the chain. Nothing is cached
//! between reporting cycles.

use async_trait::async_trait;
use reporter_delivery::DeliveryError;
use reporter_types::{Address, Bytes, CurrentReward, DataBefore, StakerInfo, B256, U256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod contract;
}

pub use implementations::contract::ContractOracle;

/// Errors that can occur while reading the oracle.
#[derive(Debug, Error)]
pub enum OracleError {
	/// The call could not be executed.
	#[error("Call failed: {0}")]
	Call(#[from] DeliveryError),
	/// The call returned data that does not match the ABI.
	#[error("Failed to decode {function} result: {reason}")]
	Decode {
		function: &'static str,
		reason: String,
	},
	/// A returned number does not fit the expected width.
	#[error("Value out of range in {0}")]
	OutOfRange(&'static str),
}

/// Trait defining the oracle operations used by the reporting loop.
#[async_trait]
pub trait OracleInterface: Send + Sync {
	/// Address submissions are sent to.
	fn address(&self) -> Address;

	/// Tips and time-based reward currently available for a query.
	async fn current_reward(&self, query_id: B256) -> Result<CurrentReward, OracleError>;

	/// Most recent report for a query before `timestamp`.
	async fn data_before(&self, query_id: B256, timestamp: u64) -> Result<DataBefore, OracleError>;

	/// Number of values reported for a query. Used as the submission nonce.
	async fn timestamp_count(&self, query_id: B256) -> Result<U256, OracleError>;

	/// Timestamp of a reporter's last submission, zero if it never reported.
	async fn reporter_last_timestamp(&self, reporter: Address) -> Result<u64, OracleError>;

	/// Minimum number of seconds between two submissions of one reporter.
	async fn reporting_lock(&self) -> Result<u64, OracleError>;

	/// Staking record of a reporter.
	async fn staker_info(&self, staker: Address) -> Result<StakerInfo, OracleError>;

	/// Encodes a `submitValue` call.
	fn submit_value_calldata(
		&self,
		query_id: B256,
		value: Bytes,
		nonce: U256,
		query_data: Bytes,
	) -> Bytes;
}
