//! Reconciliation domain types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BankAccountId, CompanyId, ReconciliationId, TransactionId, is_settled};

use crate::audit::AuditEvent;
use crate::ledger::BankTransaction;

/// Reconciliation lifecycle. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Transactions are being ticked off.
    InProgress,
    /// Difference reached zero; cleared transactions are reconciled.
    Completed,
}

impl ReconciliationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One statement-matching session for one bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Unique identifier.
    pub id: ReconciliationId,
    /// Company (tenant).
    pub company_id: CompanyId,
    /// Bank account being reconciled.
    pub bank_account_id: BankAccountId,
    /// Statement closing date.
    pub statement_date: NaiveDate,
    /// Statement closing balance.
    pub statement_balance: Decimal,
    /// Sum of transactions cleared against this session.
    pub book_balance: Decimal,
    /// `statement_balance - book_balance`.
    pub difference: Decimal,
    /// Lifecycle status.
    pub status: ReconciliationStatus,
    /// When the session was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Reconciliation {
    /// Opens a session with nothing cleared.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        bank_account_id: BankAccountId,
        statement_date: NaiveDate,
        statement_balance: Decimal,
    ) -> Self {
        Self {
            id: ReconciliationId::new(),
            company_id,
            bank_account_id,
            statement_date,
            statement_balance,
            book_balance: Decimal::ZERO,
            difference: statement_balance,
            status: ReconciliationStatus::InProgress,
            completed_at: None,
        }
    }

    /// Returns true if the session is completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ReconciliationStatus::Completed
    }

    /// Sets the book balance and recomputes the difference.
    pub fn apply_book_balance(&mut self, book_balance: Decimal) {
        self.book_balance = book_balance;
        self.difference = self.statement_balance - book_balance;
    }

    /// Returns true if the difference rounds to 0.00 and the session is open.
    #[must_use]
    pub fn can_finish(&self) -> bool {
        !self.is_completed() && is_settled(self.difference)
    }
}

/// Result of a clear/unclear toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    /// The toggled transaction.
    pub transaction_id: TransactionId,
    /// Whether it is now cleared.
    pub cleared: bool,
}

/// Result of trying to finish a session.
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// The session is completed.
    Completed {
        /// Transactions promoted to reconciled.
        reconciled: Vec<TransactionId>,
        /// Audit fact for the completion.
        audit: AuditEvent,
    },
    /// The difference is not zero yet. Nothing changed.
    Outstanding {
        /// Remaining `statement_balance - book_balance`.
        difference: Decimal,
    },
}

impl FinishOutcome {
    /// Returns true if the session was completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Review view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationSummary {
    /// The session with freshly computed balances.
    pub reconciliation: Reconciliation,
    /// Transactions cleared against the session.
    pub cleared: Vec<BankTransaction>,
    /// Uncleared candidates dated on or before the statement date.
    pub uncleared: Vec<BankTransaction>,
    /// Sum of cleared amounts.
    pub book_balance: Decimal,
    /// `statement_balance - book_balance`.
    pub difference: Decimal,
    /// Whether finishing would complete the session.
    pub can_finish: bool,
}
