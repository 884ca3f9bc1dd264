//! Condition gates deciding whether a datafeed needs a report this cycle.
//!
//! A gate only answers "is a report wanted". Profitability is checked
//! separately, so a gate never overrides the profit threshold.

use reporter_config::{ConditionsConfig, GateKind};
use reporter_types::DataBefore;

/// Strategy deciding whether the reporter should submit a value.
pub trait ConditionGate: Send + Sync {
	/// `last` is the most recent report before `now`, `None` when it could not be read.
	fn should_report(&self, last: Option<&DataBefore>, now: u64) -> bool;

	/// Whether the gate looks at the last report at all.
	///
	/// Gates returning false spare the loop a `getDataBefore` call.
	fn needs_last_report(&self) -> bool {
		true
	}
}

/// Gate of reporters that submit every time the lock and profit allow.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReport;

impl ConditionGate for AlwaysReport {
	fn should_report(&self, _last: Option<&DataBefore>, _now: u64) -> bool {
		true
	}

	fn needs_last_report(&self) -> bool {
		false
	}
}

/// Gate of backup reporters: only report when the oracle value went stale.
#[derive(Debug, Clone, Copy)]
pub struct StaleDataGate {
	stale_timeout_seconds: u64,
}

impl StaleDataGate {
	pub fn new(stale_timeout_seconds: u64) -> Self {
		Self {
			stale_timeout_seconds,
		}
	}
}

impl ConditionGate for StaleDataGate {
	fn should_report(&self, last: Option<&DataBefore>, now: u64) -> bool {
		let Some(last) = last else {
			tracing::debug!("No prior report found");
			return true;
		};
		if !last.retrieved {
			tracing::debug!("Oracle holds no value for this query");
			return true;
		}
		let age = now.saturating_sub(last.timestamp_retrieved);
		if age > self.stale_timeout_seconds {
			tracing::debug!(
				age_seconds = age,
				timeout_seconds = self.stale_timeout_seconds,
				"Last report is stale"
			);
			return true;
		}
		false
	}
}

/// Builds the gate selected in configuration.
pub fn gate_from_config(config: &ConditionsConfig) -> Box<dyn ConditionGate> {
	match config.gate {
		GateKind::Always => Box::new(AlwaysReport),
		GateKind::Stale => Box::new(StaleDataGate::new(config.stale_timeout_seconds)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reporter_types::Bytes;

	const NOW: u64 = 1_700_000_000;

	fn report(retrieved: bool, timestamp_retrieved: u64) -> DataBefore {
		DataBefore {
			retrieved,
			value: Bytes::new(),
			timestamp_retrieved,
		}
	}

	#[test]
	fn test_stale_gate_truth_table() {
		let gate = StaleDataGate::new(3600);

		assert!(gate.should_report(None, NOW));
		// Not retrieved wins over a fresh timestamp
		assert!(gate.should_report(Some(&report(false, NOW)), NOW));
		assert!(gate.should_report(Some(&report(true, NOW - 3601)), NOW));
		assert!(!gate.should_report(Some(&report(true, NOW - 3600)), NOW));
		assert!(!gate.should_report(Some(&report(true, NOW - 10)), NOW));
	}

	#[test]
	fn test_future_timestamp_is_fresh() {
		let gate = StaleDataGate::new(60);
		assert!(!gate.should_report(Some(&report(true, NOW + 30)), NOW));
	}

	#[test]
	fn test_always_report() {
		let gate = AlwaysReport;
		assert!(gate.should_report(None, NOW));
		assert!(gate.should_report(Some(&report(true, NOW)), NOW));
		assert!(!gate.needs_last_report());
	}

	#[test]
	fn test_gate_from_config() {
		let config = ConditionsConfig {
			gate: GateKind::Stale,
			stale_timeout_seconds: 10,
		};
		let gate = gate_from_config(&config);
		assert!(gate.needs_last_report());
		assert!(!gate.should_report(Some(&report(true, NOW - 5)), NOW));
		assert!(gate.should_report(Some(&report(true, NOW - 11)), NOW));

		let gate = gate_from_config(&ConditionsConfig::default());
		assert!(!gate.needs_last_report());
	}
}
