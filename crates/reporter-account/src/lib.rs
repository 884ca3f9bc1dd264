//! Account management module for the oracle reporter.
//!
//! This module provides abstractions for the reporting account: address
//! retrieval, transaction signing and message signing. It also owns the lock
//! that serializes the "transaction count, sign, broadcast" sequence so that
//! several reporting loops can share one account without nonce collisions or
//! a second submission inside the oracle's reporter lock.

use alloy_primitives::Signature;
use async_trait::async_trait;
use reporter_types::{Address, SecretString, SignedTransaction, UnsignedTransaction};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Trait defining the interface for account implementations.
///
/// Implementations hold the key material. Callers only ever see addresses,
/// signatures and signed transactions.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Retrieves the address associated with this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a transaction and returns its EIP-2718 encoding and hash.
	async fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
	) -> Result<SignedTransaction, AccountError>;

	/// Signs an arbitrary message with the EIP-191 personal message prefix.
	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError>;
}

/// Builds the local signer from a private key.
pub fn create_local_account(
	private_key: &SecretString,
) -> Result<Box<dyn AccountInterface>, AccountError> {
	Ok(Box::new(implementations::local::LocalAccount::new(
		private_key,
	)?))
}

/// Service that manages account operations.
///
/// Wraps an account implementation together with the submission lock shared
/// by every reporting loop using this account. The lock guards the time of
/// the account's latest successful submission, zero if none.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
	submission_lock: Mutex<u64>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self {
			implementation,
			submission_lock: Mutex::new(0),
		}
	}

	/// Retrieves the address associated with the managed account.
	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs a transaction using the managed account.
	pub async fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, AccountError> {
		self.implementation.sign_transaction(tx).await
	}

	/// Signs a message using the managed account.
	pub async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError> {
		self.implementation.sign_message(message).await
	}

	/// Acquires exclusive use of the account for one submission.
	///
	/// Hold the guard from the transaction count read until the transaction
	/// has been handed to the network. Write the submission time through the
	/// guard once it succeeds.
	pub async fn lock_submission(&self) -> MutexGuard<'_, u64> {
		self.submission_lock.lock().await
	}
}
