//! Business rule validation for journal lines and entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::within_tolerance;

use super::entry::JournalLine;
use super::error::LedgerError;

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
    /// Whether `|debit - credit| < 0.01`.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            is_balanced: within_tolerance(debit, credit),
        }
    }

    /// Sums a slice of lines.
    #[must_use]
    pub fn from_lines(lines: &[JournalLine]) -> Self {
        let debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = lines.iter().map(|l| l.credit).sum();
        Self::new(debit, credit)
    }

    /// Returns debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Returns true if the lines balance within one cent.
///
/// An empty slice is vacuously balanced.
#[must_use]
pub fn is_balanced(lines: &[JournalLine]) -> bool {
    EntryTotals::from_lines(lines).is_balanced
}

/// Validates one line's amounts.
///
/// # Errors
///
/// Returns an error if an amount is negative, or if not exactly one of
/// debit/credit is nonzero.
pub fn validate_line(debit: Decimal, credit: Decimal) -> Result<(), LedgerError> {
    if debit < Decimal::ZERO || credit < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount);
    }
    match (debit.is_zero(), credit.is_zero()) {
        (true, true) => Err(LedgerError::ZeroLine),
        (false, false) => Err(LedgerError::BothSides),
        _ => Ok(()),
    }
}

/// Validates every line and the balance of the set.
///
/// # Errors
///
/// Returns the first line error, or `Unbalanced` if the totals differ by a
/// cent or more.
pub fn validate_lines(lines: &[JournalLine]) -> Result<(), LedgerError> {
    for line in lines {
        line.validate()?;
    }

    let totals = EntryTotals::from_lines(lines);
    if !totals.is_balanced {
        return Err(LedgerError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(())
}
