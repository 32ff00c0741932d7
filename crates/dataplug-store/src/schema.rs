//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Wallet records, keyed by `user_id`.
    pub const WALLETS: &str = "wallets";

    /// Deposit transactions, keyed by deposit reference.
    pub const DEPOSITS: &str = "deposits";

    /// Index: deposits by user, keyed by
    /// `user_id || created_at_millis || reference`. Value is empty
    /// (index only).
    pub const DEPOSITS_BY_USER: &str = "deposits_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::WALLETS, cf::DEPOSITS, cf::DEPOSITS_BY_USER]
}
