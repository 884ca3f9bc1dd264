//! Delivery of signed submissions.
//!
//! With a relay configured, the transaction goes out as a one-transaction
//! bundle for each of the next `target_blocks` blocks and never touches the
//! public mempool unless every bundle is rejected. Without a relay it is
//! broadcast directly. Every wait is bounded by `wait_timeout`.

use crate::ReporterError;
use reporter_config::{AwaitPolicy, RelayConfig};
use reporter_delivery::{ChainInterface, RelayInterface};
use reporter_types::{truncate_id, SignedTransaction, TransactionReceipt, B256};
use std::sync::Arc;
use std::time::Duration;

/// Relay submission settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSettings {
	pub target_blocks: u64,
	pub await_policy: AwaitPolicy,
	pub wait_timeout: Duration,
	pub poll_interval: Duration,
	pub fallback_broadcast: bool,
}

impl BundleSettings {
	pub fn from_config(config: &RelayConfig) -> Self {
		Self {
			target_blocks: config.target_blocks.max(1),
			await_policy: config.await_policy,
			wait_timeout: Duration::from_secs(config.wait_timeout_seconds),
			poll_interval: Duration::from_secs(config.poll_interval_seconds.max(1)),
			fallback_broadcast: config.fallback_broadcast,
		}
	}
}

impl Default for BundleSettings {
	fn default() -> Self {
		Self::from_config(&RelayConfig::default())
	}
}

/// Submits signed transactions and waits for their receipt.
pub struct BundleSubmitter {
	chain: Arc<dyn ChainInterface>,
	relay: Option<Arc<dyn RelayInterface>>,
	settings: BundleSettings,
}

impl BundleSubmitter {
	pub fn new(
		chain: Arc<dyn ChainInterface>,
		relay: Option<Arc<dyn RelayInterface>>,
		settings: BundleSettings,
	) -> Self {
		Self {
			chain,
			relay,
			settings,
		}
	}

	pub fn uses_relay(&self) -> bool {
		self.relay.is_some()
	}

	/// Delivers `tx` and returns its receipt once mined.
	///
	/// `current_block` is the latest block seen by the caller. Bundles target
	/// the blocks right after it.
	pub async fn submit(
		&self,
		tx: &SignedTransaction,
		current_block: u64,
	) -> Result<TransactionReceipt, ReporterError> {
		let Some(relay) = &self.relay else {
			return self.broadcast(tx).await;
		};

		let mut last_accepted = None;
		for target in current_block + 1..=current_block + self.settings.target_blocks {
			match relay.send_bundle(std::slice::from_ref(&tx.raw), target).await {
				Ok(bundle) => {
					tracing::debug!(
						target_block = target,
						bundle_hash = %truncate_id(&bundle.bundle_hash.to_string()),
						"Bundle accepted"
					);
					last_accepted = Some(target);
				}
				Err(e) => {
					tracing::warn!(target_block = target, error = %e, "Bundle rejected");
				}
			}
		}

		match last_accepted {
			Some(last_target) => {
				tracing::info!(
					tx_hash = %truncate_id(&tx.hash.to_string()),
					first_target = current_block + 1,
					last_target,
					"Bundles submitted, waiting for inclusion"
				);
				self.bounded(tx.hash, self.await_bundle(tx.hash, last_target))
					.await
			}
			None if self.settings.fallback_broadcast => {
				tracing::warn!("Relay rejected every bundle, broadcasting publicly");
				self.broadcast(tx).await
			}
			None => Err(ReporterError::BundleNotExecuted {
				tx_hash: tx.hash,
				reason: "relay rejected every bundle".into(),
			}),
		}
	}

	async fn broadcast(&self, tx: &SignedTransaction) -> Result<TransactionReceipt, ReporterError> {
		let hash = self.chain.send_raw_transaction(&tx.raw).await?;
		tracing::info!(tx_hash = %truncate_id(&hash.to_string()), "Transaction broadcast");
		self.bounded(hash, self.await_receipt(hash)).await
	}

	async fn bounded<F>(&self, tx_hash: B256, wait: F) -> Result<TransactionReceipt, ReporterError>
	where
		F: std::future::Future<Output = Result<TransactionReceipt, ReporterError>>,
	{
		tokio::time::timeout(self.settings.wait_timeout, wait)
			.await
			.unwrap_or_else(|_| {
				Err(ReporterError::BundleNotExecuted {
					tx_hash,
					reason: format!(
						"no receipt within {} seconds",
						self.settings.wait_timeout.as_secs()
					),
				})
			})
	}

	async fn await_bundle(
		&self,
		tx_hash: B256,
		last_target: u64,
	) -> Result<TransactionReceipt, ReporterError> {
		let mut last_checked = None;
		loop {
			let block = self.chain.block_number().await?;
			let check_now = match self.settings.await_policy {
				AwaitPolicy::FurthestTarget => block >= last_target,
				AwaitPolicy::FirstInclusion => last_checked != Some(block),
			};

			if check_now {
				last_checked = Some(block);
				if let Some(receipt) = self.chain.receipt(tx_hash).await? {
					return executed(receipt);
				}
				if block >= last_target {
					return Err(ReporterError::BundleNotExecuted {
						tx_hash,
						reason: format!("not included in any block up to {}", last_target),
					});
				}
			}

			tokio::time::sleep(self.settings.poll_interval).await;
		}
	}

	async fn await_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, ReporterError> {
		loop {
			if let Some(receipt) = self.chain.receipt(tx_hash).await? {
				return executed(receipt);
			}
			tokio::time::sleep(self.settings.poll_interval).await;
		}
	}
}

fn executed(receipt: TransactionReceipt) -> Result<TransactionReceipt, ReporterError> {
	if receipt.success {
		Ok(receipt)
	} else {
		Err(ReporterError::TransactionReverted {
			tx_hash: receipt.hash,
			block_number: receipt.block_number,
		})
	}
}
