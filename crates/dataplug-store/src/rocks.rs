//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Claim and settlement operations are serialized through striped
//! in-process mutexes: `RocksDB` gives atomic batch writes but no
//! conditional update, so the read-check-write inside
//! [`Store::claim_deposit`] and [`Store::commit_credit`] runs under the
//! stripe lock for the touched reference (and wallet). Lock order is
//! always deposit stripe first, wallet stripe second.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use dataplug_core::{
    DepositReference, DepositStatus, DepositTransaction, LedgerEntryType, UserId, Wallet,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{ClaimOutcome, SettlementDetails, Store};

/// Number of lock stripes for deposit and wallet serialization.
const LOCK_STRIPES: usize = 64;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    deposit_locks: Vec<Mutex<()>>,
    wallet_locks: Vec<Mutex<()>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            deposit_locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            wallet_locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn stripe_index(bytes: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        (hasher.finish() % LOCK_STRIPES as u64) as usize
    }

    fn deposit_lock(&self, reference: &DepositReference) -> &Mutex<()> {
        &self.deposit_locks[Self::stripe_index(reference.as_bytes())]
    }

    fn wallet_lock(&self, user_id: &UserId) -> &Mutex<()> {
        &self.wallet_locks[Self::stripe_index(user_id.as_bytes())]
    }

    /// Persist a deposit record (primary column family only; the user
    /// index is written at creation and never changes afterwards).
    fn write_deposit(&self, deposit: &DepositTransaction) -> Result<()> {
        let cf = self.cf(cf::DEPOSITS)?;
        let value = Self::serialize(deposit)?;

        self.db
            .put_cf(&cf, keys::deposit_key(&deposit.reference), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Wallet Operations
    // =========================================================================

    fn put_wallet(&self, wallet: &Wallet) -> Result<()> {
        let _guard = self.wallet_lock(&wallet.user_id).lock();

        let cf = self.cf(cf::WALLETS)?;
        let key = keys::wallet_key(&wallet.user_id);
        let value = Self::serialize(wallet)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>> {
        let cf = self.cf(cf::WALLETS)?;
        let key = keys::wallet_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Deposit Operations
    // =========================================================================

    fn create_deposit(&self, deposit: &DepositTransaction) -> Result<()> {
        let _guard = self.deposit_lock(&deposit.reference).lock();

        if self.get_deposit(&deposit.reference)?.is_some() {
            return Err(StoreError::DuplicateReference {
                reference: deposit.reference.to_string(),
            });
        }

        let cf_deposits = self.cf(cf::DEPOSITS)?;
        let cf_by_user = self.cf(cf::DEPOSITS_BY_USER)?;

        let deposit_key = keys::deposit_key(&deposit.reference);
        let index_key = keys::user_deposit_key(
            &deposit.user_id,
            deposit.created_at.timestamp_millis(),
            &deposit.reference,
        );
        let value = Self::serialize(deposit)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_deposits, &deposit_key, &value);
        batch.put_cf(&cf_by_user, &index_key, []); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_deposit(&self, reference: &DepositReference) -> Result<Option<DepositTransaction>> {
        let cf = self.cf(cf::DEPOSITS)?;
        let key = keys::deposit_key(reference);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_deposits_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DepositTransaction>> {
        let cf_by_user = self.cf(cf::DEPOSITS_BY_USER)?;
        let prefix = keys::user_deposits_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect all matching keys first; the timestamp segment keeps
        // them in creation order, so reversing gives newest first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        all_keys.reverse();

        let mut deposits = Vec::new();
        let mut skipped = 0;

        for key in all_keys {
            if skipped < offset {
                skipped += 1;
                continue;
            }

            if deposits.len() >= limit {
                break;
            }

            let reference_bytes = keys::extract_reference_from_user_key(&key);
            let reference = std::str::from_utf8(reference_bytes)
                .ok()
                .and_then(|s| DepositReference::parse(s).ok())
                .ok_or_else(|| {
                    StoreError::Serialization("corrupt user-deposit index key".to_string())
                })?;

            if let Some(deposit) = self.get_deposit(&reference)? {
                deposits.push(deposit);
            }
        }

        Ok(deposits)
    }

    // =========================================================================
    // Claim Operations
    // =========================================================================

    fn claim_deposit(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        stale_after: Duration,
    ) -> Result<ClaimOutcome> {
        let _guard = self.deposit_lock(reference).lock();

        let mut deposit = self.get_deposit(reference)?.ok_or(StoreError::NotFound)?;

        if deposit.status.is_terminal() {
            return Ok(ClaimOutcome::Terminal(deposit));
        }

        let now = Utc::now();
        if !deposit.is_claimable(stale_after, now) {
            return Ok(ClaimOutcome::Busy);
        }

        if deposit.processing {
            tracing::warn!(
                reference = %deposit.reference,
                previous_holder = deposit.idempotency_key.as_deref().unwrap_or("<none>"),
                claimant = idempotency_key,
                "taking over stale reconciliation claim"
            );
        }

        deposit.processing = true;
        deposit.processing_started_at = Some(now);
        deposit.idempotency_key = Some(idempotency_key.to_string());
        deposit.updated_at = now;

        self.write_deposit(&deposit)?;

        Ok(ClaimOutcome::Claimed(deposit))
    }

    fn release_claim(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        error: Option<&str>,
    ) -> Result<()> {
        let _guard = self.deposit_lock(reference).lock();

        let mut deposit = self.get_deposit(reference)?.ok_or(StoreError::NotFound)?;

        if !deposit.processing {
            return Ok(());
        }

        if deposit.idempotency_key.as_deref() != Some(idempotency_key) {
            return Err(StoreError::ClaimMismatch {
                reference: reference.to_string(),
            });
        }

        deposit.processing = false;
        if let Some(error) = error {
            deposit.last_error = Some(error.to_string());
        }
        deposit.updated_at = Utc::now();

        self.write_deposit(&deposit)?;

        Ok(())
    }

    // =========================================================================
    // Settlement Operations
    // =========================================================================

    fn commit_credit(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        settlement: &SettlementDetails,
    ) -> Result<DepositTransaction> {
        let _ref_guard = self.deposit_lock(reference).lock();

        let mut deposit = self.get_deposit(reference)?.ok_or(StoreError::NotFound)?;

        // Replay of a finished reconciliation: answer from the record.
        if deposit.status == DepositStatus::Completed {
            return Ok(deposit);
        }

        if !deposit.processing {
            return Err(StoreError::NotClaimed {
                reference: reference.to_string(),
            });
        }

        if deposit.idempotency_key.as_deref() != Some(idempotency_key) {
            return Err(StoreError::ClaimMismatch {
                reference: reference.to_string(),
            });
        }

        let _wallet_guard = self.wallet_lock(&deposit.user_id).lock();

        let mut wallet = self
            .get_wallet(&deposit.user_id)?
            .unwrap_or_else(|| Wallet::new(deposit.user_id));

        let new_balance = wallet
            .credit(
                LedgerEntryType::Deposit,
                deposit.amount_pesewas,
                deposit.reference.as_str().to_string(),
                format!("Deposit {}", deposit.reference),
                serde_json::json!({
                    "gateway_reference": settlement.gateway_reference,
                    "channel": settlement.channel,
                }),
            )?
            .balance_after_pesewas;

        let now = Utc::now();
        deposit.status = DepositStatus::Completed;
        deposit.processing = false;
        deposit.new_balance_pesewas = Some(new_balance);
        deposit.gateway_reference = settlement.gateway_reference.clone();
        deposit.channel = settlement.channel.clone();
        deposit.paid_at = settlement.paid_at;
        deposit.last_error = None;
        deposit.completed_at = Some(now);
        deposit.updated_at = now;

        let cf_wallets = self.cf(cf::WALLETS)?;
        let cf_deposits = self.cf(cf::DEPOSITS)?;

        let wallet_value = Self::serialize(&wallet)?;
        let deposit_value = Self::serialize(&deposit)?;

        // Write atomically: wallet credit and deposit finalization either
        // both land or neither does.
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_wallets, keys::wallet_key(&deposit.user_id), &wallet_value);
        batch.put_cf(&cf_deposits, keys::deposit_key(&deposit.reference), &deposit_value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(deposit)
    }

    fn mark_failed(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        reason: &str,
    ) -> Result<DepositTransaction> {
        let _guard = self.deposit_lock(reference).lock();

        let mut deposit = self.get_deposit(reference)?.ok_or(StoreError::NotFound)?;

        if deposit.status == DepositStatus::Failed {
            return Ok(deposit);
        }

        if !deposit.processing {
            return Err(StoreError::NotClaimed {
                reference: reference.to_string(),
            });
        }

        if deposit.idempotency_key.as_deref() != Some(idempotency_key) {
            return Err(StoreError::ClaimMismatch {
                reference: reference.to_string(),
            });
        }

        deposit.status = DepositStatus::Failed;
        deposit.processing = false;
        deposit.last_error = Some(reason.to_string());
        deposit.updated_at = Utc::now();

        self.write_deposit(&deposit)?;

        Ok(deposit)
    }

    // =========================================================================
    // Maintenance Sweeps
    // =========================================================================

    fn release_stale_claims(&self, stale_after: Duration) -> Result<usize> {
        let cf_deposits = self.cf(cf::DEPOSITS)?;
        let now = Utc::now();

        // Collect candidates first, then re-check each under its stripe
        // lock so a claim refreshed mid-sweep is left alone.
        let mut candidates = Vec::new();
        for item in self.db.iterator_cf(&cf_deposits, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let deposit: DepositTransaction = Self::deserialize(&value)?;

            if deposit.processing && deposit.is_claimable(stale_after, now) {
                candidates.push(deposit.reference);
            }
        }

        let mut released = 0;
        for reference in candidates {
            let _guard = self.deposit_lock(&reference).lock();

            let mut deposit = match self.get_deposit(&reference)? {
                Some(d) => d,
                None => continue,
            };

            if !(deposit.processing && deposit.is_claimable(stale_after, Utc::now())) {
                continue;
            }

            tracing::warn!(
                reference = %deposit.reference,
                holder = deposit.idempotency_key.as_deref().unwrap_or("<none>"),
                "releasing stale reconciliation claim"
            );

            deposit.processing = false;
            deposit.last_error = Some(format!(
                "stale claim released after {}s",
                stale_after.num_seconds()
            ));
            deposit.updated_at = Utc::now();

            self.write_deposit(&deposit)?;
            released += 1;
        }

        Ok(released)
    }

    fn cancel_stale_pending(&self, older_than: Duration) -> Result<usize> {
        let cf_deposits = self.cf(cf::DEPOSITS)?;
        let cutoff = Utc::now() - older_than;

        let mut candidates = Vec::new();
        for item in self.db.iterator_cf(&cf_deposits, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let deposit: DepositTransaction = Self::deserialize(&value)?;

            if deposit.status == DepositStatus::Pending
                && !deposit.processing
                && deposit.created_at < cutoff
            {
                candidates.push(deposit.reference);
            }
        }

        let mut cancelled = 0;
        for reference in candidates {
            let _guard = self.deposit_lock(&reference).lock();

            let mut deposit = match self.get_deposit(&reference)? {
                Some(d) => d,
                None => continue,
            };

            // A claim taken mid-sweep means reconciliation is live again.
            if deposit.status != DepositStatus::Pending
                || deposit.processing
                || deposit.created_at >= cutoff
            {
                continue;
            }

            tracing::info!(
                reference = %deposit.reference,
                age_hours = (Utc::now() - deposit.created_at).num_hours(),
                "cancelling expired unpaid deposit"
            );

            deposit.status = DepositStatus::Cancelled;
            deposit.last_error = Some("expired unpaid".to_string());
            deposit.updated_at = Utc::now();

            self.write_deposit(&deposit)?;
            cancelled += 1;
        }

        Ok(cancelled)
    }
}
