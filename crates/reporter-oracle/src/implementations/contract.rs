//! Oracle reads through `eth_call`.

use crate::{OracleError, OracleInterface};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use reporter_delivery::ChainInterface;
use reporter_types::{Address, Bytes, CurrentReward, DataBefore, StakerInfo, B256, U256};
use std::sync::Arc;

sol! {
	/// Oracle receiving value submissions.
	interface IOracle {
		function getCurrentReward(bytes32 _queryId) external view returns (uint256 tips, uint256 timeBasedReward);
		function getDataBefore(bytes32 _queryId, uint256 _timestamp) external view returns (bool ifRetrieve, bytes value, uint256 timestampRetrieved);
		function getTimestampCountById(bytes32 _queryId) external view returns (uint256);
		function getReporterLastTimestamp(address _reporter) external view returns (uint256);
		function reportingLock() external view returns (uint256);
		function submitValue(bytes32 _queryId, bytes calldata _value, uint256 _nonce, bytes calldata _queryData) external;
	}

	/// Contract holding staker records.
	interface IStaking {
		function getStakerInfo(address _staker) external view returns (uint256 status, uint256 startDate);
	}
}

/// Oracle implementation backed by read-only contract calls.
pub struct ContractOracle {
	chain: Arc<dyn ChainInterface>,
	oracle: Address,
	staking: Address,
}

impl ContractOracle {
	pub fn new(chain: Arc<dyn ChainInterface>, oracle: Address, staking: Address) -> Self {
		Self {
			chain,
			oracle,
			staking,
		}
	}

	async fn read<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, OracleError> {
		let output = self.chain.call(to, Bytes::from(call.abi_encode())).await?;
		C::abi_decode_returns(&output).map_err(|e| OracleError::Decode {
			function: C::SIGNATURE,
			reason: e.to_string(),
		})
	}
}

fn to_u64(value: U256, field: &'static str) -> Result<u64, OracleError> {
	u64::try_from(value).map_err(|_| OracleError::OutOfRange(field))
}

#[async_trait]
impl OracleInterface for ContractOracle {
	fn address(&self) -> Address {
		self.oracle
	}

	async fn current_reward(&self, query_id: B256) -> Result<CurrentReward, OracleError> {
		let reward = self
			.read(self.oracle, IOracle::getCurrentRewardCall { _queryId: query_id })
			.await?;
		Ok(CurrentReward {
			tips: reward.tips,
			time_based_reward: reward.timeBasedReward,
		})
	}

	async fn data_before(&self, query_id: B256, timestamp: u64) -> Result<DataBefore, OracleError> {
		let data = self
			.read(
				self.oracle,
				IOracle::getDataBeforeCall {
					_queryId: query_id,
					_timestamp: U256::from(timestamp),
				},
			)
			.await?;
		Ok(DataBefore {
			retrieved: data.ifRetrieve,
			value: data.value,
			timestamp_retrieved: to_u64(data.timestampRetrieved, "timestampRetrieved")?,
		})
	}

	async fn timestamp_count(&self, query_id: B256) -> Result<U256, OracleError> {
		self.read(
			self.oracle,
			IOracle::getTimestampCountByIdCall { _queryId: query_id },
		)
		.await
	}

	async fn reporter_last_timestamp(&self, reporter: Address) -> Result<u64, OracleError> {
		let timestamp = self
			.read(
				self.oracle,
				IOracle::getReporterLastTimestampCall {
					_reporter: reporter,
				},
			)
			.await?;
		to_u64(timestamp, "getReporterLastTimestamp")
	}

	async fn reporting_lock(&self) -> Result<u64, OracleError> {
		let lock = self
			.read(self.oracle, IOracle::reportingLockCall {})
			.await?;
		to_u64(lock, "reportingLock")
	}

	async fn staker_info(&self, staker: Address) -> Result<StakerInfo, OracleError> {
		let info = self
			.read(self.staking, IStaking::getStakerInfoCall { _staker: staker })
			.await?;
		Ok(StakerInfo {
			status: to_u64(info.status, "status")?,
			start_date: to_u64(info.startDate, "startDate")?,
		})
	}

	fn submit_value_calldata(
		&self,
		query_id: B256,
		value: Bytes,
		nonce: U256,
		query_data: Bytes,
	) -> Bytes {
		IOracle::submitValueCall {
			_queryId: query_id,
			_value: value,
			_nonce: nonce,
			_queryData: query_data,
		}
		.abi_encode()
		.into()
	}
}
