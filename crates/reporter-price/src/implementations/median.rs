//! Median over several price sources.

use crate::{PriceFeedError, PricePoint, PriceSource};
use async_trait::async_trait;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Queries every source concurrently and reports the median of the answers.
///
/// Failing sources are skipped. The result fails only when no source answers.
pub struct MedianPriceSource {
	sources: Vec<Arc<dyn PriceSource>>,
}

impl MedianPriceSource {
	pub fn new(sources: Vec<Arc<dyn PriceSource>>) -> Self {
		Self { sources }
	}
}

/// Median of the values. Even counts average the two middle values.
fn median(mut values: Vec<Decimal>) -> Option<Decimal> {
	if values.is_empty() {
		return None;
	}
	values.sort();
	let mid = values.len() / 2;
	if values.len() % 2 == 1 {
		Some(values[mid])
	} else {
		Some((values[mid - 1] + values[mid]) / Decimal::TWO)
	}
}

#[async_trait]
impl PriceSource for MedianPriceSource {
	async fn fetch_price(
		&self,
		asset: &str,
		currency: &str,
	) -> Result<PricePoint, PriceFeedError> {
		let results = join_all(
			self.sources
				.iter()
				.map(|source| source.fetch_price(asset, currency)),
		)
		.await;

		let mut values = Vec::with_capacity(results.len());
		let mut timestamp = 0;
		for result in results {
			match result {
				Ok(point) => {
					timestamp = timestamp.max(point.timestamp);
					values.push(point.value);
				}
				Err(e) => {
					tracing::warn!(asset, currency, error = %e, "Price source failed");
				}
			}
		}

		let value = median(values).ok_or_else(|| {
			PriceFeedError::PriceUnavailable(format!(
				"No source returned a price for {}/{}",
				asset, currency
			))
		})?;

		Ok(PricePoint { value, timestamp })
	}
}
