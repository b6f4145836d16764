//! Deposit bounds checking
//!
//! Pure functions only; nothing here touches the store or the network.

use cryptoadvisor_model::{MAX_BALANCE, OwnerId};

use super::errors::DepositRejection;
use crate::infra::constants::wallet::QUICK_AMOUNTS;

/// Check a proposed deposit of `amount` onto `current` against `cap`.
///
/// Rules are checked in order: amount validity, the per-transaction cap,
/// then the account cap. The account-cap rejection carries the exact
/// remaining headroom.
pub fn validate(
    current: f64,
    amount: f64,
    cap: f64,
) -> Result<(), DepositRejection> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(DepositRejection::InvalidAmount);
    }
    if amount > cap {
        return Err(DepositRejection::ExceedsPerTransactionCap { cap });
    }
    if current + amount > cap {
        return Err(DepositRejection::ExceedsAccountCap {
            headroom: headroom(current, cap),
            cap,
        });
    }
    Ok(())
}

/// Remaining room under `cap`, never negative.
pub fn headroom(current: f64, cap: f64) -> f64 {
    (cap - current).max(0.0)
}

/// Validator bound to one cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositValidator {
    cap: f64,
}

impl Default for DepositValidator {
    fn default() -> Self {
        Self { cap: MAX_BALANCE }
    }
}

impl DepositValidator {
    pub fn new(cap: f64) -> Self {
        Self { cap }
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn validate(
        &self,
        current: f64,
        amount: f64,
    ) -> Result<(), DepositRejection> {
        validate(current, amount, self.cap)
    }

    pub fn headroom(&self, current: f64) -> f64 {
        headroom(current, self.cap)
    }

    /// Preset shortcuts that would be accepted on top of `current`.
    pub fn quick_amounts(&self, current: f64) -> Vec<f64> {
        QUICK_AMOUNTS
            .iter()
            .copied()
            .filter(|amount| self.validate(current, *amount).is_ok())
            .collect()
    }
}

/// A deposit the user asked for, before it reaches the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositRequest {
    pub amount: f64,
    pub target_owner: OwnerId,
}

impl DepositRequest {
    pub fn new(target_owner: OwnerId, amount: f64) -> Self {
        Self {
            amount,
            target_owner,
        }
    }

    pub fn check(
        &self,
        current: f64,
        validator: &DepositValidator,
    ) -> Result<(), DepositRejection> {
        validator.validate(current, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const CAP: f64 = 10_000.0;

    #[test]
    fn rejects_non_positive_and_non_finite() {
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                validate(0.0, amount, CAP),
                Err(DepositRejection::InvalidAmount),
                "amount {amount}"
            );
        }
    }

    #[test]
    fn per_transaction_cap_wins_over_account_cap() {
        assert_eq!(
            validate(5_000.0, 10_001.0, CAP),
            Err(DepositRejection::ExceedsPerTransactionCap { cap: CAP })
        );
    }

    #[test]
    fn near_cap_scenario() {
        assert_eq!(validate(9_500.0, 400.0, CAP), Ok(()));
        assert_eq!(
            validate(9_900.0, 600.0, CAP),
            Err(DepositRejection::ExceedsAccountCap {
                headroom: 100.0,
                cap: CAP
            })
        );
    }

    #[test]
    fn exactly_reaching_the_cap_is_allowed() {
        assert_eq!(validate(0.0, CAP, CAP), Ok(()));
        assert_eq!(validate(9_999.0, 1.0, CAP), Ok(()));
    }

    #[test]
    fn accepts_iff_sum_within_cap() {
        let mut rng = rand::rng();
        for _ in 0..2_000 {
            let current = rng.random_range(0.0..=CAP);
            let amount = rng.random_range(0.01..=CAP);
            let result = validate(current, amount, CAP);
            assert_eq!(
                result.is_ok(),
                current + amount <= CAP,
                "current={current} amount={amount} result={result:?}"
            );
        }
    }

    #[test]
    fn quick_amounts_shrink_with_headroom() {
        let validator = DepositValidator::default();
        assert_eq!(
            validator.quick_amounts(0.0),
            vec![100.0, 500.0, 1_000.0, 2_500.0, 5_000.0]
        );
        assert_eq!(
            validator.quick_amounts(8_000.0),
            vec![100.0, 500.0, 1_000.0]
        );
        assert!(validator.quick_amounts(CAP).is_empty());
        assert_eq!(validator.headroom(CAP + 5.0), 0.0);
    }

    #[test]
    fn request_checks_against_validator() {
        let owner = OwnerId::new("42").unwrap();
        let request = DepositRequest::new(owner, 250.0);
        assert!(request.check(9_750.0, &DepositValidator::default()).is_ok());
        assert!(
            request
                .check(9_751.0, &DepositValidator::default())
                .is_err()
        );
    }
}
