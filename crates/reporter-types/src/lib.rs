//! Common types module for the oracle reporter.
//!
//! This module defines the data types shared by every reporter crate: oracle
//! snapshots, fee quotes, queries and their value encoders, datafeeds,
//! transaction receipts and the uniform status record logged per cycle.

/// Datafeeds pairing a query with the source that produces its values.
pub mod datafeed;
/// Transaction delivery types for blockchain interactions.
pub mod delivery;
/// Fee models, gas snapshots and resolved fee quotes.
pub mod fees;
/// Snapshots of on-chain oracle state.
pub mod oracle;
/// Query descriptors and value encoders.
pub mod query;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Secure string type for private keys and API tokens.
pub mod secret_string;
/// Uniform success/failure record.
pub mod status;
/// Utility functions for formatting and timestamps.
pub mod utils;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use datafeed::*;
pub use delivery::*;
pub use fees::*;
pub use oracle::*;
pub use query::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use status::StatusResult;
pub use utils::{current_timestamp, format_token_amount, truncate_id, with_0x_prefix};
