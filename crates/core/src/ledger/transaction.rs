//! Bank transaction aggregate.
//!
//! A bank transaction is a movement of money on a bank account. Its
//! `ledger_status` tracks whether it has been turned into a journal entry; its
//! `reconciliation_status` tracks whether it has been matched to a statement.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    BankAccountId, ChartOfAccountId, CompanyId, ReconciliationId, TransactionId,
};

use super::error::LedgerError;

/// Whether a transaction has been turned into an accounting entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    /// Imported, not yet booked.
    Pending,
    /// Booked; has exactly one synchronized journal entry.
    Posted,
    /// Deliberately left out of the books (e.g., duplicate, transfer leg).
    Excluded,
}

impl LedgerStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Posted => "posted",
            Self::Excluded => "excluded",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction's standing against bank-statement matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearingStatus {
    /// Not yet matched to a statement.
    Uncleared,
    /// Ticked off in an in-progress reconciliation.
    Cleared,
    /// Locked by a completed reconciliation. Terminal.
    Reconciled,
}

impl ClearingStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncleared => "uncleared",
            Self::Cleared => "cleared",
            Self::Reconciled => "reconciled",
        }
    }
}

impl fmt::Display for ClearingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fields whose changes drive ledger synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFields {
    /// Ledger status.
    pub status: LedgerStatus,
    /// Category (chart of account) assigned by a user or rule.
    pub category_id: Option<ChartOfAccountId>,
    /// Signed amount; negative is money out.
    pub amount: Decimal,
}

/// A bank transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Company (tenant).
    pub company_id: CompanyId,
    /// Bank account the money moved on.
    pub bank_account_id: BankAccountId,
    /// Transaction date.
    pub date: NaiveDate,
    /// Signed amount; negative is money out.
    pub amount: Decimal,
    /// Bank description.
    pub description: String,
    /// Merchant name, if the feed supplied one.
    pub merchant: Option<String>,
    /// Category (chart of account).
    pub category_id: Option<ChartOfAccountId>,
    /// Ledger status.
    pub ledger_status: LedgerStatus,
    /// Reconciliation status.
    pub reconciliation_status: ClearingStatus,
    /// Reconciliation this transaction is flagged against.
    pub reconciliation_id: Option<ReconciliationId>,
}

impl BankTransaction {
    /// Returns the fields that drive ledger synchronization.
    #[must_use]
    pub fn ledger_fields(&self) -> LedgerFields {
        LedgerFields {
            status: self.ledger_status,
            category_id: self.category_id,
            amount: self.amount,
        }
    }

    /// Returns true if the transaction is permanently reconciled.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.reconciliation_status == ClearingStatus::Reconciled
    }

    /// Returns true if the transaction is cleared against the given reconciliation.
    #[must_use]
    pub fn is_cleared_in(&self, reconciliation_id: ReconciliationId) -> bool {
        self.reconciliation_status == ClearingStatus::Cleared
            && self.reconciliation_id == Some(reconciliation_id)
    }

    /// Text used for entry and line memos.
    #[must_use]
    pub fn memo(&self) -> String {
        match self.merchant.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(merchant) => merchant.to_string(),
            None => self.description.clone(),
        }
    }

    /// Checks that the transaction's amount or existence may change.
    ///
    /// # Errors
    ///
    /// Returns `TransactionReconciled` once a completed reconciliation owns it.
    pub fn ensure_mutable(&self) -> Result<(), LedgerError> {
        if self.is_reconciled() {
            return Err(LedgerError::TransactionReconciled(self.id));
        }
        Ok(())
    }

    /// Moves the transaction to a new ledger status.
    ///
    /// Posting requires a category. Any other move is allowed, including
    /// re-applying the current status.
    ///
    /// # Errors
    ///
    /// Returns `MissingCategory` when posting an uncategorized transaction.
    pub fn transition_to(&mut self, status: LedgerStatus) -> Result<(), LedgerError> {
        if status == LedgerStatus::Posted && self.category_id.is_none() {
            return Err(LedgerError::MissingCategory(self.id));
        }
        self.ledger_status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn txn() -> BankTransaction {
        BankTransaction {
            id: TransactionId::new(),
            company_id: CompanyId::new(),
            bank_account_id: BankAccountId::new(),
            date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            amount: dec!(-45.00),
            description: "POS 4411 STAPLES".to_string(),
            merchant: Some("Staples".to_string()),
            category_id: None,
            ledger_status: LedgerStatus::Pending,
            reconciliation_status: ClearingStatus::Uncleared,
            reconciliation_id: None,
        }
    }

    #[test]
    fn test_cannot_post_without_category() {
        let mut t = txn();
        assert!(matches!(
            t.transition_to(LedgerStatus::Posted),
            Err(LedgerError::MissingCategory(_))
        ));
        assert_eq!(t.ledger_status, LedgerStatus::Pending);
    }

    #[test]
    fn test_post_with_category() {
        let mut t = txn();
        t.category_id = Some(ChartOfAccountId::new());
        t.transition_to(LedgerStatus::Posted).unwrap();
        assert_eq!(t.ledger_status, LedgerStatus::Posted);
    }

    #[test]
    fn test_exclude_without_category() {
        let mut t = txn();
        t.transition_to(LedgerStatus::Excluded).unwrap();
        assert_eq!(t.ledger_status, LedgerStatus::Excluded);
    }

    #[test]
    fn test_reconciled_is_immutable() {
        let mut t = txn();
        assert!(t.ensure_mutable().is_ok());
        t.reconciliation_status = ClearingStatus::Reconciled;
        assert!(matches!(
            t.ensure_mutable(),
            Err(LedgerError::TransactionReconciled(_))
        ));
    }

    #[test]
    fn test_memo_prefers_merchant() {
        let mut t = txn();
        assert_eq!(t.memo(), "Staples");
        t.merchant = Some("  ".to_string());
        assert_eq!(t.memo(), "POS 4411 STAPLES");
        t.merchant = None;
        assert_eq!(t.memo(), "POS 4411 STAPLES");
    }
}
