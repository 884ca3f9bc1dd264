//! Flashbots-style bundle relay.
//!
//! Bundles go out as `eth_sendBundle` JSON-RPC requests. Every request carries
//! an `X-Flashbots-Signature` header: the relay identifies the searcher by the
//! address that signed the keccak hash of the request body. That key builds
//! reputation only and never needs funds.

use crate::{DeliveryError, RelayInterface};
use alloy_primitives::keccak256;
use async_trait::async_trait;
use reporter_account::AccountInterface;
use reporter_types::{truncate_id, with_0x_prefix, BundleReceipt, Bytes, B256};
use serde::Deserialize;

/// Header carrying the searcher signature.
pub const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

/// Relay client signing its requests with a reputation key.
pub struct FlashbotsRelay {
	url: String,
	client: reqwest::Client,
	signer: Box<dyn AccountInterface>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
	result: Option<SendBundleResult>,
	error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendBundleResult {
	bundle_hash: B256,
}

impl FlashbotsRelay {
	pub fn new(url: impl Into<String>, signer: Box<dyn AccountInterface>) -> Self {
		Self {
			url: url.into(),
			client: reqwest::Client::new(),
			signer,
		}
	}

	/// Value of the signature header for a request body.
	async fn signature_header(&self, body: &[u8]) -> Result<String, DeliveryError> {
		let address = self
			.signer
			.address()
			.await
			.map_err(|e| DeliveryError::Relay(e.to_string()))?;
		let message = body_digest_message(body);
		let signature = self
			.signer
			.sign_message(message.as_bytes())
			.await
			.map_err(|e| DeliveryError::Relay(e.to_string()))?;

		Ok(format!(
			"{}:{}",
			address,
			with_0x_prefix(&hex::encode(signature.as_bytes()))
		))
	}
}

/// Message the relay expects to be signed: the hex encoded keccak of the body.
fn body_digest_message(body: &[u8]) -> String {
	format!("{}", keccak256(body))
}

fn bundle_request(raw_txs: &[Bytes], target_block: u64) -> serde_json::Value {
	let txs: Vec<String> = raw_txs.iter().map(|tx| tx.to_string()).collect();
	serde_json::json!({
		"jsonrpc": "2.0",
		"id": 1,
		"method": "eth_sendBundle",
		"params": [{
			"txs": txs,
			"blockNumber": format!("0x{:x}", target_block),
		}],
	})
}

fn parse_bundle_response(body: &str, target_block: u64) -> Result<BundleReceipt, DeliveryError> {
	let response: RpcResponse = serde_json::from_str(body)
		.map_err(|e| DeliveryError::InvalidResponse(format!("Relay response: {}", e)))?;

	if let Some(error) = response.error {
		return Err(DeliveryError::Relay(error.to_string()));
	}

	let result = response
		.result
		.ok_or_else(|| DeliveryError::InvalidResponse("Relay response has no result".into()))?;

	Ok(BundleReceipt {
		bundle_hash: result.bundle_hash,
		target_block,
	})
}

#[async_trait]
impl RelayInterface for FlashbotsRelay {
	async fn send_bundle(
		&self,
		raw_txs: &[Bytes],
		target_block: u64,
	) -> Result<BundleReceipt, DeliveryError> {
		let body = serde_json::to_vec(&bundle_request(raw_txs, target_block))
			.map_err(|e| DeliveryError::Relay(format!("Failed to encode bundle: {}", e)))?;
		let signature = self.signature_header(&body).await?;

		let response = self
			.client
			.post(&self.url)
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.header(SIGNATURE_HEADER, signature)
			.body(body)
			.send()
			.await
			.map_err(|e| DeliveryError::Network(format!("Relay request failed: {}", e)))?;

		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| DeliveryError::Network(format!("Relay response unreadable: {}", e)))?;
		if !status.is_success() {
			return Err(DeliveryError::Relay(format!("HTTP {}: {}", status, text)));
		}

		let receipt = parse_bundle_response(&text, target_block)?;
		tracing::debug!(
			bundle_hash = %truncate_id(&receipt.bundle_hash.to_string()),
			target_block,
			"Bundle accepted by relay"
		);
		Ok(receipt)
	}
}
