//! Transaction delivery types for the reporter.
//!
//! This module defines types related to blockchain transaction submission
//! and monitoring: signed transactions, receipts and bundle handles.

use crate::fees::FeeQuote;
use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// Fully specified transaction waiting for a signature.
///
/// The fee fields are carried by the quote, so the transaction envelope type
/// always matches the fee model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
	pub chain_id: u64,
	/// Account transaction count.
	pub nonce: u64,
	pub to: Address,
	pub input: Bytes,
	pub gas_limit: u64,
	pub fees: FeeQuote,
}

/// A signed transaction ready for broadcast or bundling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	/// EIP-2718 encoded transaction.
	pub raw: Bytes,
	/// Hash of the signed transaction.
	pub hash: B256,
	/// Account nonce the transaction was signed with.
	pub nonce: u64,
}

/// Transaction receipt containing execution details.
///
/// Provides information about a transaction after it has been included in a block,
/// including its success status and block number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: B256,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}

/// Acknowledgement of a bundle accepted by a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReceipt {
	/// Identifier the relay assigned to the bundle.
	pub bundle_hash: B256,
	/// Block the bundle targets.
	pub target_block: u64,
}
