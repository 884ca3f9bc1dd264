//! In-memory fakes of the collaborator traits.

use crate::bundle::{BundleSettings, BundleSubmitter};
use crate::conditions::{AlwaysReport, ConditionGate};
use crate::engine::{LoopSettings, ReporterContext, ReportingLoop};
use crate::fees::{FeeEstimator, FeeSettings};
use alloy_primitives::keccak256;
use async_trait::async_trait;
use reporter_account::{create_local_account, AccountService};
use reporter_config::{ProfitConfig, ProfitThreshold};
use reporter_delivery::{ChainInterface, DeliveryError, RelayInterface};
use reporter_oracle::{OracleError, OracleInterface};
use reporter_price::gas::{GasError, GasPriceSource};
use reporter_price::implementations::fixed::FixedPriceSource;
use reporter_types::{
	Address, BundleReceipt, Bytes, CurrentReward, DataBefore, DataSource, DataSourceError,
	Datafeed, Datapoint, GasSnapshot, GasSpeed, SecretString, SignedTransaction, SpotPrice,
	StakerInfo, TransactionReceipt, TransactionType, B256, GWEI, U256,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) const ANVIL_KEY: &str =
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub(crate) const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

pub(crate) fn account() -> Arc<AccountService> {
	let account = create_local_account(&SecretString::from(ANVIL_KEY)).unwrap();
	Arc::new(AccountService::new(account))
}

pub(crate) fn signed_tx(raw: &[u8]) -> SignedTransaction {
	SignedTransaction {
		raw: Bytes::copy_from_slice(raw),
		hash: keccak256(raw),
		nonce: 0,
	}
}

fn unreachable_node() -> DeliveryError {
	DeliveryError::Network("connection refused".into())
}

/// Chain producing a block every `block_time` of tokio time.
///
/// Receipts become visible once their block is mined.
pub(crate) struct FakeChain {
	start: Instant,
	start_block: u64,
	block_time: Duration,
	pub offline: bool,
	pub balance: U256,
	pub tx_count: u64,
	pub fail_broadcast: bool,
	/// Mine broadcast transactions in the next block.
	pub mine_broadcasts: bool,
	receipts: Mutex<HashMap<B256, (u64, bool)>>,
	broadcasts: Mutex<Vec<Bytes>>,
}

impl FakeChain {
	pub(crate) fn new(start_block: u64) -> Self {
		Self {
			start: Instant::now(),
			start_block,
			block_time: Duration::from_secs(12),
			offline: false,
			balance: U256::from(ONE_TOKEN),
			tx_count: 7,
			fail_broadcast: false,
			mine_broadcasts: true,
			receipts: Mutex::new(HashMap::new()),
			broadcasts: Mutex::new(Vec::new()),
		}
	}

	pub(crate) fn current_block(&self) -> u64 {
		let elapsed = self.start.elapsed().as_secs() / self.block_time.as_secs();
		self.start_block + elapsed
	}

	pub(crate) fn include(&self, hash: B256, block_number: u64, success: bool) {
		self.receipts
			.lock()
			.unwrap()
			.insert(hash, (block_number, success));
	}

	pub(crate) fn broadcasts(&self) -> Vec<Bytes> {
		self.broadcasts.lock().unwrap().clone()
	}
}

#[async_trait]
impl ChainInterface for FakeChain {
	async fn block_number(&self) -> Result<u64, DeliveryError> {
		if self.offline {
			return Err(unreachable_node());
		}
		Ok(self.current_block())
	}

	async fn transaction_count(&self, _address: Address) -> Result<u64, DeliveryError> {
		Ok(self.tx_count)
	}

	async fn balance(&self, _address: Address) -> Result<U256, DeliveryError> {
		Ok(self.balance)
	}

	async fn receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError> {
		let current = self.current_block();
		Ok(self
			.receipts
			.lock()
			.unwrap()
			.get(&hash)
			.filter(|(block_number, _)| *block_number <= current)
			.map(|(block_number, success)| TransactionReceipt {
				hash,
				block_number: *block_number,
				success: *success,
			}))
	}

	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, DeliveryError> {
		if self.fail_broadcast {
			return Err(DeliveryError::Network("nonce too low".into()));
		}
		let hash = keccak256(raw);
		self.broadcasts.lock().unwrap().push(raw.clone());
		if self.mine_broadcasts {
			self.include(hash, self.current_block() + 1, true);
		}
		Ok(hash)
	}

	async fn call(&self, _to: Address, _input: Bytes) -> Result<Bytes, DeliveryError> {
		Err(DeliveryError::InvalidResponse("no contracts on the fake chain".into()))
	}

	async fn gas_price(&self) -> Result<u128, DeliveryError> {
		Err(unreachable_node())
	}

	async fn latest_base_fee(&self) -> Result<Option<u128>, DeliveryError> {
		Ok(None)
	}
}

fn failed_read() -> OracleError {
	OracleError::Call(unreachable_node())
}

/// Oracle whose reads fail for every field set to `None`.
pub(crate) struct FakeOracle {
	pub address: Address,
	pub reward: Option<CurrentReward>,
	pub data_before: Option<DataBefore>,
	pub timestamp_count: Option<U256>,
	pub last_timestamp: Option<u64>,
	pub reporting_lock: u64,
	pub staker_status: Option<u64>,
	/// `(query_id, value, nonce)` of every encoded submission.
	pub submissions: Mutex<Vec<(B256, Bytes, U256)>>,
	data_before_calls: AtomicUsize,
}

impl FakeOracle {
	pub(crate) fn new() -> Self {
		Self {
			address: Address::repeat_byte(0x88),
			reward: Some(CurrentReward {
				tips: U256::ZERO,
				time_based_reward: U256::from(ONE_TOKEN),
			}),
			data_before: None,
			timestamp_count: Some(U256::from(41u64)),
			last_timestamp: Some(0),
			reporting_lock: 43_200,
			staker_status: Some(1),
			submissions: Mutex::new(Vec::new()),
			data_before_calls: AtomicUsize::new(0),
		}
	}

	pub(crate) fn data_before_calls(&self) -> usize {
		self.data_before_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl OracleInterface for FakeOracle {
	fn address(&self) -> Address {
		self.address
	}

	async fn current_reward(&self, _query_id: B256) -> Result<CurrentReward, OracleError> {
		self.reward.ok_or_else(failed_read)
	}

	async fn data_before(
		&self,
		_query_id: B256,
		_timestamp: u64,
	) -> Result<DataBefore, OracleError> {
		self.data_before_calls.fetch_add(1, Ordering::SeqCst);
		self.data_before.clone().ok_or_else(failed_read)
	}

	async fn timestamp_count(&self, _query_id: B256) -> Result<U256, OracleError> {
		self.timestamp_count.ok_or_else(failed_read)
	}

	async fn reporter_last_timestamp(&self, _reporter: Address) -> Result<u64, OracleError> {
		self.last_timestamp.ok_or_else(failed_read)
	}

	async fn reporting_lock(&self) -> Result<u64, OracleError> {
		Ok(self.reporting_lock)
	}

	async fn staker_info(&self, _staker: Address) -> Result<StakerInfo, OracleError> {
		let status = self.staker_status.ok_or_else(failed_read)?;
		Ok(StakerInfo {
			status,
			start_date: 1_600_000_000,
		})
	}

	fn submit_value_calldata(
		&self,
		query_id: B256,
		value: Bytes,
		nonce: U256,
		_query_data: Bytes,
	) -> Bytes {
		self.submissions
			.lock()
			.unwrap()
			.push((query_id, value, nonce));
		Bytes::from_static(b"submitValue")
	}
}

/// Gas source returning a fixed snapshot, or failing when there is none.
pub(crate) struct FakeGas {
	snapshot: Option<GasSnapshot>,
	calls: AtomicUsize,
}

impl FakeGas {
	pub(crate) fn snapshot(base_fee: Option<u128>, safe: u128, propose: u128, fast: u128) -> Self {
		Self {
			snapshot: Some(GasSnapshot {
				suggest_base_fee: base_fee,
				safe,
				propose,
				fast,
			}),
			calls: AtomicUsize::new(0),
		}
	}

	pub(crate) fn failing() -> Self {
		Self {
			snapshot: None,
			calls: AtomicUsize::new(0),
		}
	}

	pub(crate) fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl GasPriceSource for FakeGas {
	async fn fetch(&self) -> Result<GasSnapshot, GasError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.snapshot
			.ok_or_else(|| GasError::Network("gas tracker unreachable".into()))
	}
}

/// Relay accepting or rejecting every bundle.
#[derive(Default)]
pub(crate) struct FakeRelay {
	pub reject: bool,
	targets: Mutex<Vec<u64>>,
}

impl FakeRelay {
	pub(crate) fn rejecting() -> Self {
		Self {
			reject: true,
			..Self::default()
		}
	}

	/// Blocks targeted by the accepted bundles.
	pub(crate) fn targets(&self) -> Vec<u64> {
		self.targets.lock().unwrap().clone()
	}
}

#[async_trait]
impl RelayInterface for FakeRelay {
	async fn send_bundle(
		&self,
		raw_txs: &[Bytes],
		target_block: u64,
	) -> Result<BundleReceipt, DeliveryError> {
		if self.reject {
			return Err(DeliveryError::Relay("bundle rejected".into()));
		}
		self.targets.lock().unwrap().push(target_block);
		let bundle_hash = raw_txs
			.first()
			.map(keccak256)
			.unwrap_or_default();
		Ok(BundleReceipt {
			bundle_hash,
			target_block,
		})
	}
}

/// Data source answering a fixed value, or failing when there is none.
pub(crate) struct FakeDataSource {
	pub value: Option<Decimal>,
}

#[async_trait]
impl DataSource for FakeDataSource {
	async fn fetch_new_datapoint(&self) -> Result<Datapoint, DataSourceError> {
		let value = self
			.value
			.ok_or_else(|| DataSourceError::Unavailable("all sources failed".into()))?;
		Ok(Datapoint {
			value,
			timestamp: 1_700_000_000,
		})
	}
}

/// Shared fakes behind a loop built by `LoopHarness`.
pub(crate) struct LoopParts {
	pub chain: Arc<FakeChain>,
	pub oracle: Arc<FakeOracle>,
	pub gas: Arc<FakeGas>,
	pub relay: Option<Arc<FakeRelay>>,
}

/// A reporting loop over fakes, reporting an eth/usd spot price with legacy fees.
///
/// Defaults submit successfully: 50 gwei gas, 1 TRB of reward at 100 USD,
/// unlocked reporter and a public broadcast mined in the next block.
pub(crate) struct LoopHarness {
	pub chain: FakeChain,
	pub oracle: FakeOracle,
	pub gas: FakeGas,
	pub prices: Vec<(&'static str, &'static str)>,
	pub value: Option<Decimal>,
	pub relay: Option<FakeRelay>,
	pub fallback_broadcast: bool,
	pub gate: Box<dyn ConditionGate>,
	pub threshold: ProfitThreshold,
	pub report_count: Option<u64>,
	pub interval: Duration,
	pub explorer: Option<String>,
}

impl LoopHarness {
	pub(crate) fn new() -> Self {
		Self {
			chain: FakeChain::new(100),
			oracle: FakeOracle::new(),
			gas: FakeGas::snapshot(Some(30 * GWEI), 40 * GWEI, 45 * GWEI, 50 * GWEI),
			prices: vec![("eth/usd", "2000"), ("trb/usd", "100")],
			value: Some(Decimal::from(2000)),
			relay: None,
			fallback_broadcast: true,
			gate: Box::new(AlwaysReport),
			threshold: ProfitThreshold::Percent(100.0),
			report_count: None,
			interval: Duration::from_secs(7),
			explorer: None,
		}
	}

	pub(crate) async fn build(self) -> (ReportingLoop, LoopParts) {
		let (mut loops, parts) = self.build_many(1).await;
		(loops.remove(0), parts)
	}

	/// Builds `count` loops sharing one context. Only the first gets `gate`.
	pub(crate) async fn build_many(self, count: usize) -> (Vec<ReportingLoop>, LoopParts) {
		let chain = Arc::new(self.chain);
		let oracle = Arc::new(self.oracle);
		let gas = Arc::new(self.gas);
		let relay = self.relay.map(Arc::new);

		let prices: HashMap<String, Decimal> = self
			.prices
			.iter()
			.map(|(pair, price)| (pair.to_string(), Decimal::from_str(price).unwrap()))
			.collect();
		let prices = Arc::new(FixedPriceSource::new(prices));

		let account = account();
		let address = account.get_address().await.unwrap();
		let bundles = BundleSubmitter::new(
			chain.clone(),
			relay.clone().map(|r| r as Arc<dyn RelayInterface>),
			BundleSettings {
				fallback_broadcast: self.fallback_broadcast,
				..BundleSettings::default()
			},
		);

		let context = ReporterContext {
			chain: chain.clone(),
			oracle: oracle.clone(),
			account,
			address,
			prices,
			fees: Arc::new(FeeEstimator::new(gas.clone())),
			bundles: Arc::new(bundles),
		};
		let settings = LoopSettings {
			chain_id: 1,
			fees: FeeSettings {
				transaction_type: TransactionType::Legacy,
				gas_limit: 350_000,
				max_fee: None,
				priority_fee: None,
				legacy_gas_price: None,
				gas_price_speed: GasSpeed::Fast,
			},
			sticky_fees: true,
			profit: ProfitConfig {
				expected_profit: self.threshold,
				..ProfitConfig::default()
			},
			interval: self.interval,
			report_count: self.report_count,
			explorer: self.explorer,
		};
		let source = Arc::new(FakeDataSource { value: self.value });
		let mut gate = Some(self.gate);
		let loops = (0..count)
			.map(|_| {
				let datafeed =
					Datafeed::new(Arc::new(SpotPrice::new("eth", "usd")), source.clone());
				let gate = gate
					.take()
					.unwrap_or_else(|| Box::new(AlwaysReport) as Box<dyn ConditionGate>);
				ReportingLoop::new(context.clone(), datafeed, gate, settings.clone())
			})
			.collect();
		(
			loops,
			LoopParts {
				chain,
				oracle,
				gas,
				relay,
			},
		)
	}
}
