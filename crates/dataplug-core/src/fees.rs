//! Gateway fee schedule.
//!
//! The gateway collects its processing fee on top of the wallet credit:
//! the customer is charged `amount + fee` and the wallet receives
//! `amount`. The expected charge is fixed at initiation and stored on the
//! deposit, so reconciliation can check the gateway's reported figure
//! against what we asked for.

use serde::{Deserialize, Serialize};

/// Fee schedule applied when initiating a deposit.
///
/// All arithmetic is integer pesewas. The percentage component uses
/// ceiling division so the platform never undercharges by a fraction of
/// a pesewa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Percentage surcharge in basis points (195 = 1.95%).
    pub surcharge_basis_points: i64,

    /// Flat component added to every charge, in pesewas.
    pub flat_pesewas: i64,

    /// Cap on the percentage component, in pesewas.
    pub cap_pesewas: Option<i64>,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        // Gateway's standard local rate for mobile money and cards.
        Self {
            surcharge_basis_points: 195,
            flat_pesewas: 0,
            cap_pesewas: None,
        }
    }
}

impl FeeSchedule {
    /// Fee in pesewas for a given credit amount.
    #[must_use]
    pub fn fee_pesewas(&self, amount_pesewas: i64) -> i64 {
        let mut percentage = (amount_pesewas * self.surcharge_basis_points + 9_999) / 10_000;
        if let Some(cap) = self.cap_pesewas {
            percentage = percentage.min(cap);
        }
        percentage + self.flat_pesewas
    }

    /// Total the customer is charged for a given credit amount.
    #[must_use]
    pub fn charged_pesewas(&self, amount_pesewas: i64) -> i64 {
        amount_pesewas + self.fee_pesewas(amount_pesewas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_rounds_fee_up() {
        let fees = FeeSchedule::default();

        // 1.95% of 5000 = 97.5, rounded up.
        assert_eq!(fees.fee_pesewas(5000), 98);
        assert_eq!(fees.charged_pesewas(5000), 5098);

        // Exact division stays exact.
        assert_eq!(fees.fee_pesewas(10_000), 195);
    }

    #[test]
    fn zero_amount_has_zero_fee() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.fee_pesewas(0), 0);
    }

    #[test]
    fn cap_limits_percentage_component() {
        let fees = FeeSchedule {
            surcharge_basis_points: 195,
            flat_pesewas: 0,
            cap_pesewas: Some(1000),
        };

        // 1.95% of GHS 1000.00 would be 1950 pesewas; capped at 1000.
        assert_eq!(fees.fee_pesewas(100_000), 1000);
        assert_eq!(fees.charged_pesewas(100_000), 101_000);
    }

    #[test]
    fn flat_component_applies_after_cap() {
        let fees = FeeSchedule {
            surcharge_basis_points: 100,
            flat_pesewas: 30,
            cap_pesewas: Some(500),
        };

        // 1% of 2000 = 20, plus flat 30.
        assert_eq!(fees.fee_pesewas(2000), 50);
        // Capped percentage still gets the flat on top.
        assert_eq!(fees.fee_pesewas(1_000_000), 530);
    }
}
