//! Property-based tests for journal line and entry validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::ChartOfAccountId;

use super::entry::JournalLine;
use super::error::LedgerError;
use super::validation::{is_balanced, validate_line, validate_lines};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a negative amount.
fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Strategy to generate a list of lines with matching debit and credit totals.
fn balanced_lines() -> impl Strategy<Value = Vec<JournalLine>> {
    prop::collection::vec(positive_amount(), 1..6).prop_map(|amounts| {
        let total: Decimal = amounts.iter().copied().sum();
        let mut lines: Vec<JournalLine> = amounts
            .into_iter()
            .map(|a| JournalLine::debit(ChartOfAccountId::new(), a, None))
            .collect();
        lines.push(JournalLine::credit(ChartOfAccountId::new(), total, None));
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A single-sided positive line is always valid.
    #[test]
    fn prop_single_sided_line_is_valid(amount in positive_amount(), debit_side in any::<bool>()) {
        let (debit, credit) = if debit_side { (amount, Decimal::ZERO) } else { (Decimal::ZERO, amount) };
        prop_assert!(validate_line(debit, credit).is_ok());
    }

    /// Negative amounts are rejected on either side.
    #[test]
    fn prop_negative_amount_rejected(amount in negative_amount(), debit_side in any::<bool>()) {
        let (debit, credit) = if debit_side { (amount, Decimal::ZERO) } else { (Decimal::ZERO, amount) };
        prop_assert!(matches!(validate_line(debit, credit), Err(LedgerError::NegativeAmount)));
    }

    /// Lines with both sides set are rejected.
    #[test]
    fn prop_both_sides_rejected(debit in positive_amount(), credit in positive_amount()) {
        prop_assert!(matches!(validate_line(debit, credit), Err(LedgerError::BothSides)));
    }

    /// Generated balanced sets validate.
    #[test]
    fn prop_balanced_lines_validate(lines in balanced_lines()) {
        prop_assert!(is_balanced(&lines));
        prop_assert!(validate_lines(&lines).is_ok());
    }

    /// Shifting one line by a cent or more breaks the balance.
    #[test]
    fn prop_cent_shift_unbalances(lines in balanced_lines(), extra in positive_amount()) {
        let mut lines = lines;
        if let Some(first) = lines.first_mut() {
            first.debit += extra;
        }
        prop_assert!(!is_balanced(&lines));
        let is_unbalanced = matches!(validate_lines(&lines), Err(LedgerError::Unbalanced { .. }));
        prop_assert!(is_unbalanced);
    }

    /// Swapping every line keeps a balanced set balanced.
    #[test]
    fn prop_swapped_lines_stay_balanced(lines in balanced_lines()) {
        let swapped: Vec<JournalLine> = lines.iter().map(JournalLine::swapped).collect();
        prop_assert!(validate_lines(&swapped).is_ok());
    }
}
