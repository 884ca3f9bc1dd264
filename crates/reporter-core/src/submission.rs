//! Construction and signing of `submitValue` transactions.

use crate::ReporterError;
use reporter_account::AccountService;
use reporter_delivery::ChainInterface;
use reporter_oracle::OracleInterface;
use reporter_types::{truncate_id, Address, FeeQuote, Query, SignedTransaction, UnsignedTransaction};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Builds signed value submissions. Nothing is broadcast here.
pub struct SubmissionBuilder {
	oracle: Arc<dyn OracleInterface>,
	chain: Arc<dyn ChainInterface>,
	account: Arc<AccountService>,
	chain_id: u64,
	gas_limit: u64,
}

impl SubmissionBuilder {
	pub fn new(
		oracle: Arc<dyn OracleInterface>,
		chain: Arc<dyn ChainInterface>,
		account: Arc<AccountService>,
		chain_id: u64,
		gas_limit: u64,
	) -> Self {
		Self {
			oracle,
			chain,
			account,
			chain_id,
			gas_limit,
		}
	}

	/// Encodes `value` for `query` and signs the submission from `from`.
	///
	/// Callers hold the account's submission lock: the account transaction
	/// count is read here and must not change before the broadcast.
	pub async fn build_and_sign(
		&self,
		value: Decimal,
		query: &dyn Query,
		fees: &FeeQuote,
		from: Address,
	) -> Result<SignedTransaction, ReporterError> {
		let encoded = query
			.value_type()
			.encode(value)
			.map_err(|cause| ReporterError::Encoding { value, cause })?;

		let query_id = query.query_id();
		let report_nonce = self
			.oracle
			.timestamp_count(query_id)
			.await
			.map_err(ReporterError::NonceRead)?;

		let input =
			self.oracle
				.submit_value_calldata(query_id, encoded, report_nonce, query.query_data());
		let nonce = self.chain.transaction_count(from).await?;

		let tx = UnsignedTransaction {
			chain_id: self.chain_id,
			nonce,
			to: self.oracle.address(),
			input,
			gas_limit: self.gas_limit,
			fees: *fees,
		};
		let signed = self.account.sign(&tx).await?;

		tracing::debug!(
			query = %query.descriptor(),
			value = %value,
			report_nonce = %report_nonce,
			nonce,
			tx_hash = %truncate_id(&signed.hash.to_string()),
			"Signed submission"
		);
		Ok(signed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{account, FakeChain, FakeOracle};
	use reporter_types::{SpotPrice, GWEI, U256};
	use std::str::FromStr;

	fn builder(oracle: Arc<FakeOracle>, chain: Arc<FakeChain>) -> SubmissionBuilder {
		SubmissionBuilder::new(oracle, chain, account(), 1, 350_000)
	}

	fn fees() -> FeeQuote {
		FeeQuote::Legacy {
			gas_price: 50 * GWEI,
		}
	}

	#[tokio::test]
	async fn test_build_and_sign() {
		let oracle = Arc::new(FakeOracle::new());
		let chain = Arc::new(FakeChain::new(100));
		let query = SpotPrice::new("eth", "usd");

		let signed = builder(oracle.clone(), chain)
			.build_and_sign(
				Decimal::from_str("2000.5").unwrap(),
				&query,
				&fees(),
				Address::ZERO,
			)
			.await
			.unwrap();

		// Account nonce comes from the chain, report nonce from the oracle
		assert_eq!(signed.nonce, 7);
		let submissions = oracle.submissions.lock().unwrap();
		assert_eq!(submissions.len(), 1);
		let (query_id, value, report_nonce) = &submissions[0];
		assert_eq!(*query_id, query.query_id());
		assert_eq!(*report_nonce, U256::from(41u64));
		assert_eq!(
			U256::from_be_slice(value),
			U256::from(2_000_500_000_000_000_000_000u128)
		);
	}

	#[tokio::test]
	async fn test_unencodable_value() {
		let oracle = Arc::new(FakeOracle::new());
		let err = builder(oracle.clone(), Arc::new(FakeChain::new(100)))
			.build_and_sign(
				Decimal::from(-1),
				&SpotPrice::new("eth", "usd"),
				&fees(),
				Address::ZERO,
			)
			.await
			.unwrap_err();

		assert!(matches!(err, ReporterError::Encoding { .. }));
		assert!(oracle.submissions.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_nonce_read_failure() {
		let mut oracle = FakeOracle::new();
		oracle.timestamp_count = None;
		let err = builder(Arc::new(oracle), Arc::new(FakeChain::new(100)))
			.build_and_sign(
				Decimal::from(1),
				&SpotPrice::new("eth", "usd"),
				&fees(),
				Address::ZERO,
			)
			.await
			.unwrap_err();
		assert!(matches!(err, ReporterError::NonceRead(_)));
	}
}
