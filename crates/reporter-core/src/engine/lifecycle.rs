//! Startup checks for a reporting loop.

use super::ReportingLoop;
use crate::ReporterError;

impl ReportingLoop {
	/// Verifies the reporting account is staked before any cycle runs.
	pub async fn initialize(&self) -> Result<(), ReporterError> {
		let address = self.context.address;
		let info = self
			.context
			.oracle
			.staker_info(address)
			.await
			.map_err(ReporterError::OracleRead)?;

		if !info.is_staked() {
			return Err(ReporterError::NotStaked {
				address,
				status: info.status,
			});
		}

		tracing::info!(
			query = %self.datafeed.query.descriptor(),
			address = %address,
			staked_since = info.start_date,
			relay = self.context.bundles.uses_relay(),
			"Reporter initialized"
		);
		Ok(())
	}
}
