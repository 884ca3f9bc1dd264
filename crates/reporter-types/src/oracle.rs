//! Snapshots of on-chain oracle state.
//!
//! These are read fresh every reporting cycle and never cached across cycles.

use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

/// Staker status value the staking contract uses for an active staker.
pub const STAKER_STATUS_STAKED: u64 = 1;

/// Rewards currently available for reporting a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentReward {
	/// Tips attached to the query, in the reward token's smallest unit.
	pub tips: U256,
	/// Accrued time-based reward, in the reward token's smallest unit.
	pub time_based_reward: U256,
}

impl CurrentReward {
	/// Total revenue of a submission.
	pub fn total(&self) -> U256 {
		self.tips.saturating_add(self.time_based_reward)
	}
}

/// Most recent report for a query before a given timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBefore {
	/// Whether any value was found.
	pub retrieved: bool,
	/// Encoded reported value.
	pub value: Bytes,
	/// Timestamp of the reported value.
	pub timestamp_retrieved: u64,
}

/// Staking record of a reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerInfo {
	pub status: u64,
	pub start_date: u64,
}

impl StakerInfo {
	pub fn is_staked(&self) -> bool {
		self.status == STAKER_STATUS_STAKED
	}
}

/// Reporter lock state derived from the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReporterLock {
	/// Timestamp of the reporter's last submission.
	pub last_report: u64,
	/// Minimum seconds between two submissions.
	pub lock_seconds: u64,
}

impl ReporterLock {
	/// Seconds left before the reporter may submit again.
	pub fn remaining(&self, now: u64) -> u64 {
		self.last_report
			.saturating_add(self.lock_seconds)
			.saturating_sub(now)
	}

	pub fn is_active(&self, now: u64) -> bool {
		self.remaining(now) > 0
	}
}
