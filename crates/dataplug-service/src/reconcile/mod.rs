//! Deposit reconciliation.
//!
//! The engine decides what happened to a charge, the cache damps repeat
//! lookups, and the reaper cleans up after crashed attempts.

pub mod cache;
pub mod engine;
pub mod reaper;

pub use cache::VerificationCache;
pub use engine::{
    ReconcileError, ReconcileOutcome, Reconciler, Trigger, AMOUNT_TOLERANCE_PESEWAS,
};
pub use reaper::ReaperConfig;
