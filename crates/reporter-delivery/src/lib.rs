//! Transaction delivery module for the oracle reporter.
//!
//! This module handles everything that talks to the chain or to a private
//! relay: state reads used by the reporting loop, raw transaction broadcast,
//! receipt lookups and bundle submission.

use async_trait::async_trait;
use reporter_types::{Address, BundleReceipt, Bytes, TransactionReceipt, B256, U256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod relay {
		pub mod flashbots;
	}
}

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error returned by a private relay.
	#[error("Relay error: {0}")]
	Relay(String),
	/// Error that occurs when a response cannot be interpreted.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
}

/// Chain access needed by the reporter.
///
/// Reads never cache. Every call reflects the node's latest view.
#[async_trait]
pub trait ChainInterface: Send + Sync {
	/// Gets the latest block number.
	async fn block_number(&self) -> Result<u64, DeliveryError>;

	/// Gets the transaction count (next nonce) of an account.
	async fn transaction_count(&self, address: Address) -> Result<u64, DeliveryError>;

	/// Gets the native token balance of an account, in wei.
	async fn balance(&self, address: Address) -> Result<U256, DeliveryError>;

	/// Looks up a receipt. `None` when the transaction is not mined.
	async fn receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError>;

	/// Broadcasts an EIP-2718 encoded signed transaction to the public pool.
	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, DeliveryError>;

	/// Executes a read-only call against the latest block.
	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, DeliveryError>;

	/// Gets the node's suggested legacy gas price, in wei.
	async fn gas_price(&self) -> Result<u128, DeliveryError>;

	/// Gets the base fee of the latest block, in wei. `None` on chains without one.
	async fn latest_base_fee(&self) -> Result<Option<u128>, DeliveryError>;
}

/// Private relay accepting transaction bundles for a specific block.
#[async_trait]
pub trait RelayInterface: Send + Sync {
	/// Sends a bundle of signed transactions targeting one block.
	async fn send_bundle(
		&self,
		raw_txs: &[Bytes],
		target_block: u64,
	) -> Result<BundleReceipt, DeliveryError>;
}
