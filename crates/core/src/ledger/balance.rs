//! Account balance calculations.
//!
//! `period_balance` is the building block for every report: it sums an
//! account's posted lines inside a date window using the account's normal
//! balance side.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::ChartOfAccountId;

use crate::coa::AccountType;

/// Inclusive date window; `None` bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// First date included.
    pub start: Option<NaiveDate>,
    /// Last date included.
    pub end: Option<NaiveDate>,
}

impl PeriodWindow {
    /// Creates a window.
    #[must_use]
    pub const fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// A window with no bounds.
    #[must_use]
    pub const fn all_time() -> Self {
        Self::new(None, None)
    }

    /// Returns true if the date falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// The parts of a journal line needed for balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceLine {
    /// Date of the owning entry.
    pub entry_date: NaiveDate,
    /// Whether the owning entry is posted.
    pub posted: bool,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Account balance over a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: ChartOfAccountId,
    /// The account type (decides the sign convention).
    pub account_type: AccountType,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance on the account's normal side.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub fn new(account_id: ChartOfAccountId, account_type: AccountType) -> Self {
        Self {
            account_id,
            account_type,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Adds one line.
    pub fn add_line(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
        self.balance = self
            .account_type
            .normal_balance()
            .balance_change(self.debit_total, self.credit_total);
    }
}

/// Sums an account's posted lines within the window.
///
/// Unposted lines and lines outside the window are ignored.
#[must_use]
pub fn period_balance(
    account_id: ChartOfAccountId,
    account_type: AccountType,
    lines: &[BalanceLine],
    window: PeriodWindow,
) -> AccountBalance {
    let mut balance = AccountBalance::new(account_id, account_type);
    for line in lines
        .iter()
        .filter(|l| l.posted && window.contains(l.entry_date))
    {
        balance.add_line(line.debit, line.credit);
    }
    balance
}
