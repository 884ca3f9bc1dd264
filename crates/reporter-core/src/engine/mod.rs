//! Reporting loop driving one datafeed.
//!
//! Each cycle walks the same checks in order: chain reachable, gas balance,
//! reporter lock, condition gate, fees and profitability, fresh value, then
//! the submission itself. A check that says "not now" ends the cycle with a
//! `SkipReason`. A failing step ends it with a `ReporterError`. Either way the
//! loop records a `StatusResult` and sleeps until the next cycle.

pub mod context;
pub mod lifecycle;

pub use context::{LoopSettings, ReporterContext};

use crate::conditions::ConditionGate;
use crate::fees::FeeSettings;
use crate::profit::ProfitabilityEvaluator;
use crate::submission::SubmissionBuilder;
use crate::{ReporterError, SkipReason};
use reporter_config::ProfitThreshold;
use reporter_types::{
	current_timestamp, Datafeed, ReporterLock, StatusResult, TransactionReceipt, B256,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing::instrument;

/// Where a loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
	Idle,
	LockCheck,
	ConditionCheck,
	ProfitCheck,
	Submitting,
	Success,
	Failed,
	Sleeping,
}

/// Result of a cycle that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
	Submitted(TransactionReceipt),
	Skipped(SkipReason),
}

/// Periodic reporter for one datafeed.
pub struct ReportingLoop {
	context: ReporterContext,
	datafeed: Datafeed,
	gate: Box<dyn ConditionGate>,
	profit: ProfitabilityEvaluator,
	submission: SubmissionBuilder,
	configured_fees: FeeSettings,
	fee_settings: FeeSettings,
	sticky_fees: bool,
	interval: Duration,
	report_count: Option<u64>,
	explorer: Option<String>,
	state: LoopState,
	last_status: StatusResult,
	last_submission_timestamp: u64,
	cycles: u64,
}

impl ReportingLoop {
	pub fn new(
		context: ReporterContext,
		datafeed: Datafeed,
		gate: Box<dyn ConditionGate>,
		settings: LoopSettings,
	) -> Self {
		let profit = ProfitabilityEvaluator::new(
			context.oracle.clone(),
			context.prices.clone(),
			settings.fees.gas_limit,
			&settings.profit,
		);
		let submission = SubmissionBuilder::new(
			context.oracle.clone(),
			context.chain.clone(),
			context.account.clone(),
			settings.chain_id,
			settings.fees.gas_limit,
		);

		Self {
			context,
			datafeed,
			gate,
			profit,
			submission,
			configured_fees: settings.fees.clone(),
			fee_settings: settings.fees,
			sticky_fees: settings.sticky_fees,
			interval: settings.interval,
			report_count: settings.report_count,
			explorer: settings.explorer,
			state: LoopState::Idle,
			last_status: StatusResult::success(),
			last_submission_timestamp: 0,
			cycles: 0,
		}
	}

	pub fn state(&self) -> LoopState {
		self.state
	}

	/// Status recorded by the latest cycle.
	pub fn last_status(&self) -> &StatusResult {
		&self.last_status
	}

	pub fn cycles(&self) -> u64 {
		self.cycles
	}

	/// Time of the last successful submission of this loop, zero if none.
	pub fn last_submission_timestamp(&self) -> u64 {
		self.last_submission_timestamp
	}

	/// Fee settings used by the next cycle, including pinned values.
	pub fn fee_settings(&self) -> &FeeSettings {
		&self.fee_settings
	}

	pub fn datafeed(&self) -> &Datafeed {
		&self.datafeed
	}

	/// Drops pinned fees so the next cycle resolves them again.
	pub fn reset_fees(&mut self) {
		self.fee_settings = self.configured_fees.clone();
	}

	/// Runs cycles until `stop` turns true or the report count is reached.
	pub async fn run(&mut self, mut stop: watch::Receiver<bool>) {
		tracing::info!(
			query = %self.datafeed.query.descriptor(),
			interval_seconds = self.interval.as_secs(),
			report_count = ?self.report_count,
			"Starting reporting loop"
		);

		loop {
			if *stop.borrow() {
				break;
			}

			self.cycle().await;

			if self.report_count.is_some_and(|count| self.cycles >= count) {
				tracing::info!(cycles = self.cycles, "Report count reached");
				break;
			}

			tokio::select! {
				_ = tokio::time::sleep(self.interval) => {}
				changed = stop.changed() => {
					if changed.is_err() || *stop.borrow() {
						break;
					}
				}
			}
		}

		self.state = LoopState::Idle;
		tracing::info!(
			query = %self.datafeed.query.descriptor(),
			cycles = self.cycles,
			"Reporting loop stopped"
		);
	}

	/// Runs one cycle and records its status. Never fails.
	#[instrument(
		skip_all,
		fields(query = %self.datafeed.query.descriptor(), cycle = self.cycles + 1)
	)]
	pub async fn cycle(&mut self) -> StatusResult {
		self.state = LoopState::Idle;

		let status = match self.report_once().await {
			Ok(CycleOutcome::Submitted(_)) => {
				self.state = LoopState::Success;
				StatusResult::success()
			}
			Ok(CycleOutcome::Skipped(reason)) => {
				tracing::info!(reason = %reason, "Skipping report");
				StatusResult::failure(reason.to_string())
			}
			Err(e) => {
				self.state = LoopState::Failed;
				tracing::error!(error = %e, "Reporting cycle failed");
				StatusResult::failure_with_cause("Reporting cycle failed", e)
			}
		};

		self.cycles += 1;
		self.last_status = status.clone();
		self.state = LoopState::Sleeping;
		status
	}

	/// Checks every precondition and submits a fresh value when they all pass.
	pub async fn report_once(&mut self) -> Result<CycleOutcome, ReporterError> {
		let query_id = self.datafeed.query.query_id();
		let address = self.context.address;

		if let Err(e) = self.context.chain.block_number().await {
			tracing::warn!(error = %e, "Chain unreachable");
			return Ok(CycleOutcome::Skipped(SkipReason::Offline));
		}

		let balance = self.context.chain.balance(address).await?;
		if balance.is_zero() {
			return Ok(CycleOutcome::Skipped(SkipReason::NoNativeBalance));
		}

		self.state = LoopState::LockCheck;
		let now = current_timestamp();
		let (last_report, lock_seconds) = tokio::try_join!(
			self.context.oracle.reporter_last_timestamp(address),
			self.context.oracle.reporting_lock(),
		)
		.map_err(ReporterError::OracleRead)?;
		// The node may lag behind our own latest submission
		let lock = ReporterLock {
			last_report: last_report.max(self.last_submission_timestamp),
			lock_seconds,
		};
		if lock.is_active(now) {
			return Ok(CycleOutcome::Skipped(SkipReason::LockActive {
				remaining_seconds: lock.remaining(now),
			}));
		}

		self.state = LoopState::ConditionCheck;
		let last = if self.gate.needs_last_report() {
			match self.context.oracle.data_before(query_id, now).await {
				Ok(data) => Some(data),
				Err(e) => {
					tracing::warn!(query_id = %query_id, error = %e, "Unable to read last report");
					None
				}
			}
		} else {
			None
		};
		if !self.gate.should_report(last.as_ref(), now) {
			return Ok(CycleOutcome::Skipped(SkipReason::ConditionsNotMet));
		}

		self.state = LoopState::ProfitCheck;
		let fees = self.context.fees.resolve_fees(&self.fee_settings).await?;
		if self.sticky_fees {
			self.fee_settings.pin(&fees);
		}
		let decision = self.profit.estimate(query_id, &fees).await?;
		if !decision.ok {
			let threshold = match self.profit.threshold() {
				ProfitThreshold::Percent(min) => min,
				ProfitThreshold::Always => f64::NEG_INFINITY,
			};
			return Ok(CycleOutcome::Skipped(SkipReason::ProfitBelowThreshold {
				percent_profit: decision.percent_profit,
				threshold,
			}));
		}

		let datapoint = self
			.datafeed
			.source
			.fetch_new_datapoint()
			.await
			.map_err(|e| ReporterError::PriceUnavailable(e.to_string()))?;
		tracing::info!(
			query_id = %query_id,
			value = %datapoint.value,
			"Fetched new value"
		);

		self.state = LoopState::Submitting;
		let mut last_account_submission = self.context.account.lock_submission().await;
		// Another loop on this account may have submitted while we waited
		let last_report = self
			.context
			.oracle
			.reporter_last_timestamp(address)
			.await
			.map_err(ReporterError::OracleRead)?;
		let now = current_timestamp();
		let lock = ReporterLock {
			last_report: last_report
				.max(*last_account_submission)
				.max(self.last_submission_timestamp),
			lock_seconds,
		};
		if lock.is_active(now) {
			return Ok(CycleOutcome::Skipped(SkipReason::LockActive {
				remaining_seconds: lock.remaining(now),
			}));
		}

		let signed = self
			.submission
			.build_and_sign(
				datapoint.value,
				self.datafeed.query.as_ref(),
				&fees,
				address,
			)
			.await?;
		let current_block = self.context.chain.block_number().await?;
		match self.context.bundles.submit(&signed, current_block).await {
			Ok(receipt) => {
				let submitted_at = current_timestamp();
				*last_account_submission = submitted_at;
				self.last_submission_timestamp = submitted_at;
				tracing::info!(
					query_id = %query_id,
					tx_hash = %receipt.hash,
					block_number = receipt.block_number,
					profit_usd = %decision.profit_usd.round_dp(4),
					percent_profit = decision.percent_profit,
					link = self.explorer_link(receipt.hash).as_deref().unwrap_or("-"),
					"Value submitted"
				);
				Ok(CycleOutcome::Submitted(receipt))
			}
			Err(e) => {
				if matches!(e, ReporterError::BundleNotExecuted { .. }) {
					self.fee_settings = self.configured_fees.clone();
				}
				Err(e)
			}
		}
	}

	fn explorer_link(&self, tx_hash: B256) -> Option<String> {
		self.explorer
			.as_deref()
			.map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
	}
}
