//! Local private key account.
//!
//! Signs legacy and EIP-1559 transactions in process with an alloy
//! `PrivateKeySigner`. The key is parsed once and never leaves the signer.

use crate::{AccountError, AccountInterface};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Signature, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use reporter_types::{
	Address, Bytes, FeeQuote, SecretString, SignedTransaction, UnsignedTransaction, B256,
};

/// Account backed by a private key held in memory.
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Parses a hex private key, with or without the 0x prefix.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer = private_key.with_exposed(|key| {
			key.trim()
				.parse::<PrivateKeySigner>()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))
		})?;
		Ok(Self { signer })
	}
}

fn envelope(tx: &UnsignedTransaction) -> EnvelopeDraft {
	let to = TxKind::Call(tx.to);
	match tx.fees {
		FeeQuote::Legacy { gas_price } => EnvelopeDraft::Legacy(TxLegacy {
			chain_id: Some(tx.chain_id),
			nonce: tx.nonce,
			gas_price,
			gas_limit: tx.gas_limit,
			to,
			value: U256::ZERO,
			input: tx.input.clone(),
		}),
		FeeQuote::Eip1559 {
			priority_fee,
			max_fee,
			..
		} => EnvelopeDraft::Eip1559(TxEip1559 {
			chain_id: tx.chain_id,
			nonce: tx.nonce,
			gas_limit: tx.gas_limit,
			max_fee_per_gas: max_fee,
			max_priority_fee_per_gas: priority_fee,
			to,
			value: U256::ZERO,
			input: tx.input.clone(),
			..Default::default()
		}),
	}
}

enum EnvelopeDraft {
	Legacy(TxLegacy),
	Eip1559(TxEip1559),
}

impl LocalAccount {
	fn sign_envelope(&self, draft: EnvelopeDraft) -> Result<TxEnvelope, AccountError> {
		let signed = match draft {
			EnvelopeDraft::Legacy(tx) => {
				let signature = self.sign_hash(&tx.signature_hash())?;
				TxEnvelope::Legacy(tx.into_signed(signature))
			}
			EnvelopeDraft::Eip1559(tx) => {
				let signature = self.sign_hash(&tx.signature_hash())?;
				TxEnvelope::Eip1559(tx.into_signed(signature))
			}
		};
		Ok(signed)
	}

	fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError> {
		self.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
	) -> Result<SignedTransaction, AccountError> {
		let signed = self.sign_envelope(envelope(tx))?;
		Ok(SignedTransaction {
			raw: Bytes::from(signed.encoded_2718()),
			hash: *signed.tx_hash(),
			nonce: tx.nonce,
		})
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError> {
		self.signer
			.sign_message_sync(message)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_eips::eip2718::Decodable2718;
	use reporter_types::GWEI;

	const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn account() -> LocalAccount {
		LocalAccount::new(&SecretString::from(ANVIL_KEY)).unwrap()
	}

	fn unsigned(fees: FeeQuote) -> UnsignedTransaction {
		UnsignedTransaction {
			chain_id: 1,
			nonce: 7,
			to: Address::repeat_byte(0x11),
			input: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
			gas_limit: 350_000,
			fees,
		}
	}

	#[test]
	fn test_invalid_key_rejected() {
		let result = LocalAccount::new(&SecretString::from("not-a-key"));
		assert!(matches!(result, Err(AccountError::InvalidKey(_))));
	}

	#[tokio::test]
	async fn test_signs_legacy_transaction() {
		let account = account();
		let tx = unsigned(FeeQuote::Legacy {
			gas_price: 50 * GWEI,
		});
		let signed = account.sign_transaction(&tx).await.unwrap();
		assert_eq!(signed.nonce, 7);

		let decoded = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
		assert_eq!(*decoded.tx_hash(), signed.hash);
		match decoded {
			TxEnvelope::Legacy(inner) => {
				assert_eq!(inner.tx().gas_price, 50 * GWEI);
				assert_eq!(inner.tx().gas_limit, 350_000);
				assert_eq!(inner.tx().chain_id, Some(1));
				let sender = inner
					.signature()
					.recover_address_from_prehash(&inner.tx().signature_hash())
					.unwrap();
				assert_eq!(sender, account.address().await.unwrap());
			}
			other => panic!("expected legacy envelope, got {:?}", other.tx_type()),
		}
	}

	#[tokio::test]
	async fn test_signs_eip1559_transaction() {
		let account = account();
		let tx = unsigned(FeeQuote::Eip1559 {
			base_fee: 30 * GWEI,
			priority_fee: 2 * GWEI,
			max_fee: 32 * GWEI,
		});
		let signed = account.sign_transaction(&tx).await.unwrap();

		let decoded = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
		match decoded {
			TxEnvelope::Eip1559(inner) => {
				assert_eq!(inner.tx().max_fee_per_gas, 32 * GWEI);
				assert_eq!(inner.tx().max_priority_fee_per_gas, 2 * GWEI);
				assert_eq!(inner.tx().nonce, 7);
				assert_eq!(inner.tx().input, tx.input);
			}
			other => panic!("expected eip1559 envelope, got {:?}", other.tx_type()),
		}
	}

	#[tokio::test]
	async fn test_sign_message_recovers_address() {
		let account = account();
		let signature = account.sign_message(b"hello relay").await.unwrap();
		let recovered = signature
			.recover_address_from_msg(b"hello relay".as_slice())
			.unwrap();
		assert_eq!(recovered, account.address().await.unwrap());
	}
}
