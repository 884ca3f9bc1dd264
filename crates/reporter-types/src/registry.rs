//! Registry trait for pluggable implementations.

/// Base trait for implementation registries.
///
/// Each pluggable implementation (price sources, gas sources) provides a
/// `Registry` struct declaring the name it is configured under and the
/// factory building it from its TOML table.
pub trait ImplementationRegistry {
	/// Key of the implementation's table in the configuration file, for example
	/// `"coingecko"` for `prices.implementations.coingecko`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
