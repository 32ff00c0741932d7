//! Deposit reference type.
//!
//! A reference identifies one deposit attempt end-to-end: it is generated
//! at initiation, handed to the payment gateway, echoed back by webhooks
//! and redirect callbacks, and used as the primary key of the deposit
//! record. Format: `DEP-{8 lowercase hex}-{epoch millis}`, for example
//! `DEP-a1b2c3d4-1700000000000`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix for deposit references.
pub const DEPOSIT_PREFIX: &str = "DEP";

/// Minimum length of the random hex segment.
const MIN_HEX_LEN: usize = 6;

/// Maximum length of the random hex segment.
const MAX_HEX_LEN: usize = 32;

/// A validated deposit reference.
///
/// References are caller-generated, globally unique, and immutable once a
/// deposit record exists. The type guarantees the `DEP-hex-millis` shape,
/// so anything that made it past parsing is safe to hand to the gateway
/// or use as a storage key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepositReference(String);

impl DepositReference {
    /// Generate a fresh reference with the current timestamp.
    ///
    /// Entropy comes from a v4 UUID (first 8 hex chars), which together
    /// with millisecond timestamps makes collisions practically
    /// impossible; the store's unique-reference constraint backstops the
    /// theoretical case.
    #[must_use]
    pub fn generate() -> Self {
        let entropy = uuid::Uuid::new_v4().simple().to_string();
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!("{DEPOSIT_PREFIX}-{}-{millis}", &entropy[..8]))
    }

    /// Parse and validate a reference string.
    ///
    /// # Errors
    ///
    /// Returns a `ReferenceError` describing which segment is malformed.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        let mut parts = s.splitn(3, '-');
        let prefix = parts.next().unwrap_or_default();
        if prefix != DEPOSIT_PREFIX {
            return Err(ReferenceError::BadPrefix);
        }

        let hex = parts.next().ok_or(ReferenceError::Truncated)?;
        if hex.len() < MIN_HEX_LEN
            || hex.len() > MAX_HEX_LEN
            || !hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return Err(ReferenceError::BadEntropy);
        }

        let millis = parts.next().ok_or(ReferenceError::Truncated)?;
        if millis.is_empty() || millis.parse::<i64>().is_err() {
            return Err(ReferenceError::BadTimestamp);
        }

        Ok(Self(s.to_string()))
    }

    /// Return the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the reference bytes (used as the storage key).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The epoch-millisecond timestamp embedded at generation time.
    ///
    /// # Panics
    ///
    /// Never panics for a value constructed through `parse` or
    /// `generate`; the timestamp segment is validated on the way in.
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0
            .rsplit('-')
            .next()
            .and_then(|t| t.parse().ok())
            .expect("validated reference always has a numeric tail")
    }
}

impl FromStr for DepositReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for DepositReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DepositReference({})", self.0)
    }
}

impl fmt::Display for DepositReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DepositReference {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DepositReference> for String {
    fn from(r: DepositReference) -> Self {
        r.0
    }
}

impl AsRef<str> for DepositReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing a deposit reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// The reference does not start with the `DEP` prefix.
    #[error("reference must start with `{DEPOSIT_PREFIX}-`")]
    BadPrefix,

    /// The random segment is missing, too short, or not lowercase hex.
    #[error("reference entropy segment is malformed")]
    BadEntropy,

    /// The trailing segment is not an epoch-millisecond timestamp.
    #[error("reference timestamp segment is malformed")]
    BadTimestamp,

    /// The reference has fewer than three segments.
    #[error("reference is truncated")]
    Truncated,
}
