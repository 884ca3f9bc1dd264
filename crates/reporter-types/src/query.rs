//! Query descriptors and value encoders.
//!
//! A query identifies what is being reported. Its `query_data` is the ABI
//! encoding of the query type name and parameters, and the `query_id` is the
//! keccak256 hash of that data. Reported values are encoded according to the
//! query's value type before they are submitted on-chain.

use alloy_primitives::{keccak256, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Errors that can occur while encoding or decoding reported values.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
	/// The value cannot be represented by the value type.
	#[error("Value {value} cannot be encoded: {reason}")]
	Unencodable { value: Decimal, reason: String },
	/// The on-chain bytes do not decode to the value type.
	#[error("Invalid encoded value: {0}")]
	InvalidEncoding(String),
}

/// How a reported value is represented on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
	/// Unsigned fixed point number stored as `uint256` with `decimals` places.
	UFixed { decimals: u32 },
	/// Unsigned integer stored as `uint256`.
	UInt,
}

impl Default for ValueType {
	fn default() -> Self {
		ValueType::UFixed { decimals: 18 }
	}
}

impl ValueType {
	/// Encodes a value as ABI `uint256` bytes.
	///
	/// Fixed point values are rounded to the type's decimal places. Negative
	/// values, and fractional values for `UInt`, are rejected.
	pub fn encode(&self, value: Decimal) -> Result<Bytes, QueryError> {
		if value.is_sign_negative() && !value.is_zero() {
			return Err(QueryError::Unencodable {
				value,
				reason: "negative values are not supported".into(),
			});
		}

		let raw = match self {
			ValueType::UFixed { decimals } => {
				let rounded = value.round_dp(*decimals);
				let mantissa = U256::from(rounded.mantissa().unsigned_abs());
				let shift = U256::from(decimals - rounded.scale());
				U256::from(10u8)
					.checked_pow(shift)
					.and_then(|factor| mantissa.checked_mul(factor))
					.ok_or_else(|| QueryError::Unencodable {
						value,
						reason: "value overflows uint256".into(),
					})?
			}
			ValueType::UInt => {
				if !value.fract().is_zero() {
					return Err(QueryError::Unencodable {
						value,
						reason: "integer value type cannot hold a fraction".into(),
					});
				}
				let int = value.to_u128().ok_or_else(|| QueryError::Unencodable {
					value,
					reason: "value out of range".into(),
				})?;
				U256::from(int)
			}
		};

		Ok(Bytes::from(raw.abi_encode()))
	}

	/// Decodes ABI `uint256` bytes back into a value.
	pub fn decode(&self, bytes: &[u8]) -> Result<Decimal, QueryError> {
		let raw = U256::abi_decode(bytes).map_err(|e| QueryError::InvalidEncoding(e.to_string()))?;
		let int = u128::try_from(raw)
			.ok()
			.and_then(|v| i128::try_from(v).ok())
			.ok_or_else(|| QueryError::InvalidEncoding(format!("{} exceeds decimal range", raw)))?;

		let scale = match self {
			ValueType::UFixed { decimals } => *decimals,
			ValueType::UInt => 0,
		};
		if scale > MAX_DECIMAL_SCALE {
			return Err(QueryError::InvalidEncoding(format!(
				"{} decimals exceed the supported scale of {}",
				scale, MAX_DECIMAL_SCALE
			)));
		}

		Decimal::try_from_i128_with_scale(int, scale)
			.map(|d| d.normalize())
			.map_err(|e| QueryError::InvalidEncoding(e.to_string()))
	}
}

/// A query that can be reported to the oracle.
pub trait Query: Send + Sync + fmt::Debug {
	/// Short human readable description used in logs.
	fn descriptor(&self) -> String;

	/// ABI encoded query type and parameters.
	fn query_data(&self) -> Bytes;

	/// How values for this query are encoded.
	fn value_type(&self) -> ValueType;

	/// Identifier of the query on the oracle.
	fn query_id(&self) -> B256 {
		keccak256(self.query_data())
	}
}

/// Spot price of an asset denominated in a currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotPrice {
	pub asset: String,
	pub currency: String,
}

impl SpotPrice {
	pub fn new(asset: impl Into<String>, currency: impl Into<String>) -> Self {
		Self {
			asset: asset.into(),
			currency: currency.into(),
		}
	}
}

impl Query for SpotPrice {
	fn descriptor(&self) -> String {
		format!(
			"SpotPrice({}/{})",
			self.asset.to_lowercase(),
			self.currency.to_lowercase()
		)
	}

	fn query_data(&self) -> Bytes {
		let params = (self.asset.to_lowercase(), self.currency.to_lowercase()).abi_encode_params();
		let data = ("SpotPrice".to_string(), Bytes::from(params)).abi_encode_params();
		Bytes::from(data)
	}

	fn value_type(&self) -> ValueType {
		ValueType::UFixed { decimals: 18 }
	}
}
