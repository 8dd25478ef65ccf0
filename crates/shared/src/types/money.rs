//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are plain `rust_decimal::Decimal` values in the company's
//! functional currency; these helpers centralise the ledger's tolerance rules.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Maximum absolute difference still treated as "equal" (one cent).
///
/// Debits and credits of an entry balance when `|Σdebit − Σcredit| < 0.01`.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to cents using Banker's Rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if `a` and `b` differ by strictly less than one cent.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < BALANCE_TOLERANCE
}

/// Returns true if the amount rounds to 0.00.
///
/// Used for reconciliation differences, which must be exactly zero at cent
/// precision before a statement can be closed.
#[must_use]
pub fn is_settled(amount: Decimal) -> bool {
    round_money(amount).is_zero()
}
