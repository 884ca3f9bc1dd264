//! Services and settings handed to each reporting loop.

use crate::bundle::BundleSubmitter;
use crate::fees::{FeeEstimator, FeeSettings};
use reporter_account::AccountService;
use reporter_config::ProfitConfig;
use reporter_delivery::ChainInterface;
use reporter_oracle::OracleInterface;
use reporter_price::PriceSource;
use reporter_types::Address;
use std::sync::Arc;
use std::time::Duration;

/// Services shared by every loop of a reporter process.
#[derive(Clone)]
pub struct ReporterContext {
	pub chain: Arc<dyn ChainInterface>,
	pub oracle: Arc<dyn OracleInterface>,
	pub account: Arc<AccountService>,
	/// Address of `account`, resolved once at startup.
	pub address: Address,
	pub prices: Arc<dyn PriceSource>,
	pub fees: Arc<FeeEstimator>,
	pub bundles: Arc<BundleSubmitter>,
}

/// Per-loop settings.
#[derive(Debug, Clone)]
pub struct LoopSettings {
	pub chain_id: u64,
	pub fees: FeeSettings,
	/// Keep the first resolved fees for the following cycles.
	pub sticky_fees: bool,
	pub profit: ProfitConfig,
	pub interval: Duration,
	/// Stop after this many cycles.
	pub report_count: Option<u64>,
	/// Block explorer base URL for transaction links.
	pub explorer: Option<String>,
}
