//! String formatting utilities for logs.

use alloy_primitives::U256;

/// Truncates a hex identifier for display, keeping the first 10 characters.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Formats a raw token amount with decimal places for display.
///
/// `1500000000000000000` with 18 decimals becomes `"1.5"`.
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
	let digits = amount.to_string();
	if decimals == 0 {
		return digits;
	}

	let places = decimals as usize;
	let (integer_part, fraction_part) = if digits.len() <= places {
		("0".to_string(), format!("{:0>width$}", digits, width = places))
	} else {
		let split = digits.len() - places;
		(digits[..split].to_string(), digits[split..].to_string())
	};

	let fraction_trimmed = fraction_part.trim_end_matches('0');
	if fraction_trimmed.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, fraction_trimmed)
	}
}
