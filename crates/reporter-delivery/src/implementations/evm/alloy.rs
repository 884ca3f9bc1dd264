//! Alloy-based chain access.
//!
//! Wraps an HTTP provider and maps alloy responses into reporter types.
//! Signing happens in the account service, so the provider carries no wallet.

use crate::{ChainInterface, DeliveryError};
use alloy_eips::BlockNumberOrTag;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use reporter_types::{truncate_id, Address, Bytes, TransactionReceipt, B256, U256};

/// Alloy-based EVM chain client.
pub struct AlloyChain {
	provider: DynProvider,
}

impl AlloyChain {
	/// Creates a client for an HTTP(S) JSON-RPC endpoint.
	pub fn new(rpc_url: &str) -> Result<Self, DeliveryError> {
		let url = rpc_url
			.parse()
			.map_err(|e| DeliveryError::Network(format!("Invalid RPC URL: {}", e)))?;

		let provider = ProviderBuilder::new().connect_http(url).erased();
		Ok(Self { provider })
	}

	/// Gets the chain id reported by the node.
	pub async fn chain_id(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get chain id: {}", e)))
	}
}

#[async_trait]
impl ChainInterface for AlloyChain {
	async fn block_number(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get block number: {}", e)))
	}

	async fn transaction_count(&self, address: Address) -> Result<u64, DeliveryError> {
		self.provider
			.get_transaction_count(address)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get nonce: {}", e)))
	}

	async fn balance(&self, address: Address) -> Result<U256, DeliveryError> {
		self.provider
			.get_balance(address)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get balance: {}", e)))
	}

	async fn receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError> {
		let receipt = self
			.provider
			.get_transaction_receipt(hash)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get receipt: {}", e)))?;

		Ok(receipt.map(|receipt| TransactionReceipt {
			hash: receipt.transaction_hash,
			block_number: receipt.block_number.unwrap_or(0),
			success: receipt.status(),
		}))
	}

	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, DeliveryError> {
		let pending = self
			.provider
			.send_raw_transaction(raw)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to send transaction: {}", e)))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(tx_hash = %truncate_id(&tx_hash.to_string()), "Broadcast transaction");
		Ok(tx_hash)
	}

	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, DeliveryError> {
		let request = TransactionRequest::default().to(to).input(input.into());
		self.provider
			.call(request)
			.await
			.map_err(|e| DeliveryError::Network(format!("Call to {} failed: {}", to, e)))
	}

	async fn gas_price(&self) -> Result<u128, DeliveryError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get gas price: {}", e)))
	}

	async fn latest_base_fee(&self) -> Result<Option<u128>, DeliveryError> {
		let block = self
			.provider
			.get_block_by_number(BlockNumberOrTag::Latest)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get latest block: {}", e)))?
			.ok_or_else(|| DeliveryError::InvalidResponse("Latest block not found".into()))?;

		Ok(block.header.base_fee_per_gas.map(u128::from))
	}
}
