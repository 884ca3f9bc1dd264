//! Factory registry for the pluggable reporter sources.
//!
//! Collects the factories of every price and gas source implementation so the
//! builder can instantiate whichever ones the configuration names.

use reporter_core::ReporterFactories;
use reporter_price::gas::GasSourceFactory;
use reporter_price::PriceSourceFactory;
use std::collections::HashMap;

/// Factories of every built-in implementation.
pub type BuiltinFactories = ReporterFactories<PriceSourceFactory, GasSourceFactory>;

pub fn builtin_factories() -> BuiltinFactories {
	let price_factories: HashMap<String, PriceSourceFactory> =
		reporter_price::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect();
	let gas_factories: HashMap<String, GasSourceFactory> =
		reporter_price::gas::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect();

	tracing::debug!(
		price_sources = ?price_factories.keys().collect::<Vec<_>>(),
		gas_sources = ?gas_factories.keys().collect::<Vec<_>>(),
		"Registered implementations"
	);

	ReporterFactories {
		price_factories,
		gas_factories,
	}
}
