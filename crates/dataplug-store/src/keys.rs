//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use dataplug_core::{DepositReference, UserId};

/// Byte width of the `user_id || created_at_millis` index prefix.
const USER_TIME_PREFIX_LEN: usize = 24;

/// Create a wallet key from a user ID.
#[must_use]
pub fn wallet_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a deposit key from a deposit reference.
#[must_use]
pub fn deposit_key(reference: &DepositReference) -> Vec<u8> {
    reference.as_bytes().to_vec()
}

/// Create a user-deposit index key.
///
/// Format: `user_id (16 bytes) || created_at_millis (8 bytes, big-endian)
/// || reference`.
///
/// Creation timestamps are post-epoch so the big-endian encoding sorts
/// numerically; deposits for a user therefore iterate in creation order.
#[must_use]
pub fn user_deposit_key(
    user_id: &UserId,
    created_at_millis: i64,
    reference: &DepositReference,
) -> Vec<u8> {
    let reference = reference.as_bytes();
    let mut key = Vec::with_capacity(USER_TIME_PREFIX_LEN + reference.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&created_at_millis.to_be_bytes());
    key.extend_from_slice(reference);
    key
}

/// Create a prefix for iterating all deposits for a user.
#[must_use]
pub fn user_deposits_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the deposit reference bytes from a user-deposit index key.
///
/// # Panics
///
/// Panics if the key is shorter than the fixed prefix.
#[must_use]
pub fn extract_reference_from_user_key(key: &[u8]) -> &[u8] {
    &key[USER_TIME_PREFIX_LEN..]
}
