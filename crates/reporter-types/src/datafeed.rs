//! Datafeeds pairing a query with the source that produces its values.

use crate::query::Query;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by data sources.
#[derive(Debug, Clone, Error)]
pub enum DataSourceError {
	/// No fresh value could be produced.
	#[error("Data unavailable: {0}")]
	Unavailable(String),
}

/// A freshly fetched value and the time it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datapoint {
	pub value: Decimal,
	/// Unix timestamp in seconds.
	pub timestamp: u64,
}

/// Anything able to produce a fresh value for a query.
#[async_trait]
pub trait DataSource: Send + Sync {
	async fn fetch_new_datapoint(&self) -> Result<Datapoint, DataSourceError>;
}

/// A query together with the source of its values.
#[derive(Clone)]
pub struct Datafeed {
	pub query: Arc<dyn Query>,
	pub source: Arc<dyn DataSource>,
}

impl Datafeed {
	pub fn new(query: Arc<dyn Query>, source: Arc<dyn DataSource>) -> Self {
		Self { query, source }
	}
}

impl std::fmt::Debug for Datafeed {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Datafeed")
			.field("query", &self.query.descriptor())
			.finish_non_exhaustive()
	}
}
