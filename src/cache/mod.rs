//! Content-addressed cache for expensive, input-deterministic work.

/// Cache handle, clocks and TTLs.
pub mod content;
/// Key derivation.
pub mod key;
/// Backing stores.
pub mod store;
