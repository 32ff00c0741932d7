//! In-process verification result cache.
//!
//! Two kinds of entries live here. Completed verdicts are kept for a few
//! minutes so webhook replays and client polls can be answered from the
//! stored balance snapshot without touching the claim path. Pending
//! observations are kept for a few seconds only, to damp rapid client
//! polling between gateway round-trips; the admin path ignores them.
//!
//! The cache is advisory. It is never consulted in place of the
//! claim/commit protocol, and a cold cache only costs an extra store read.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use dataplug_core::{DepositReference, DepositTransaction};

/// How long a completed verdict is served from cache.
const COMPLETED_TTL: Duration = Duration::from_secs(300);

/// How long a pending observation damps repeat client polls.
const PENDING_TTL: Duration = Duration::from_secs(10);

/// A cached verification verdict.
#[derive(Debug, Clone)]
pub enum CachedVerdict {
    /// The deposit settled; the record carries the balance snapshot.
    Completed(Box<DepositTransaction>),
    /// The gateway recently reported the charge as not settled yet.
    Pending,
}

struct Entry {
    verdict: CachedVerdict,
    inserted_at: Instant,
}

/// TTL map of recent verification verdicts keyed by deposit reference.
pub struct VerificationCache {
    entries: RwLock<HashMap<String, Entry>>,
    completed_ttl: Duration,
    pending_ttl: Duration,
}

impl VerificationCache {
    /// Create a cache with the default TTLs.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttls(COMPLETED_TTL, PENDING_TTL)
    }

    /// Create a cache with explicit TTLs.
    #[must_use]
    pub fn with_ttls(completed_ttl: Duration, pending_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            completed_ttl,
            pending_ttl,
        }
    }

    /// Look up a fresh verdict for a reference.
    pub async fn get(&self, reference: &DepositReference) -> Option<CachedVerdict> {
        let entries = self.entries.read().await;
        let entry = entries.get(reference.as_str())?;

        if self.is_fresh(entry) {
            Some(entry.verdict.clone())
        } else {
            None
        }
    }

    /// Record a completed deposit. Replaces any pending observation.
    pub async fn put_completed(&self, reference: &DepositReference, deposit: DepositTransaction) {
        let mut entries = self.entries.write().await;
        self.prune_expired(&mut entries);
        entries.insert(
            reference.as_str().to_string(),
            Entry {
                verdict: CachedVerdict::Completed(Box::new(deposit)),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Record a pending observation for poll damping.
    pub async fn put_pending(&self, reference: &DepositReference) {
        let mut entries = self.entries.write().await;
        self.prune_expired(&mut entries);

        // Never downgrade a completed verdict to pending
        if let Some(entry) = entries.get(reference.as_str()) {
            if matches!(entry.verdict, CachedVerdict::Completed(_)) && self.is_fresh(entry) {
                return;
            }
        }

        entries.insert(
            reference.as_str().to_string(),
            Entry {
                verdict: CachedVerdict::Pending,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop any cached verdict for a reference.
    pub async fn evict(&self, reference: &DepositReference) {
        let mut entries = self.entries.write().await;
        entries.remove(reference.as_str());
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        let ttl = match entry.verdict {
            CachedVerdict::Completed(_) => self.completed_ttl,
            CachedVerdict::Pending => self.pending_ttl,
        };
        entry.inserted_at.elapsed() < ttl
    }

    /// Drop expired entries while the write lock is held.
    fn prune_expired(&self, entries: &mut HashMap<String, Entry>) {
        entries.retain(|_, entry| self.is_fresh(entry));
    }
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new()
    }
}
