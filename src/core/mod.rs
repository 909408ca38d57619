//! In-memory authoritative catalog and relationship rules.

/// Link/unlink operations and the cascade-delete contract.
pub mod links;
/// Authoritative movie/performer store with dirty tracking.
pub mod store;
