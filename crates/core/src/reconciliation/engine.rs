//! Reconciliation state machine.
//!
//! `in_progress → completed`, nothing after. Toggling flips a transaction
//! between uncleared and cleared against one session; finishing promotes the
//! cleared set to reconciled once the difference rounds to zero.
//!
//! The engine works on in-memory values. The repository loads the rows under
//! lock, calls in here, and writes back the result in the same transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tally_shared::types::{BankAccountId, CompanyId, TransactionId};

use super::error::ReconciliationError;
use super::types::{
    FinishOutcome, Reconciliation, ReconciliationStatus, ReconciliationSummary, ToggleOutcome,
};
use crate::audit::{AuditAction, AuditEntity, AuditEvent};
use crate::ledger::{BankTransaction, ClearingStatus};

/// Stateless reconciliation logic.
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Opens a session for a bank account.
    ///
    /// # Errors
    ///
    /// Returns `InProgressExists` if the account already has an open session.
    pub fn start(
        company_id: CompanyId,
        bank_account_id: BankAccountId,
        statement_date: NaiveDate,
        statement_balance: Decimal,
        has_open_session: bool,
    ) -> Result<Reconciliation, ReconciliationError> {
        if has_open_session {
            return Err(ReconciliationError::InProgressExists(bank_account_id));
        }
        Ok(Reconciliation::new(
            company_id,
            bank_account_id,
            statement_date,
            statement_balance,
        ))
    }

    /// Returns the account's uncleared transactions dated on or before the
    /// statement date, oldest first.
    #[must_use]
    pub fn review_candidates(
        reconciliation: &Reconciliation,
        transactions: &[BankTransaction],
    ) -> Vec<BankTransaction> {
        let mut candidates: Vec<BankTransaction> = transactions
            .iter()
            .filter(|t| {
                t.bank_account_id == reconciliation.bank_account_id
                    && t.date <= reconciliation.statement_date
                    && t.reconciliation_status == ClearingStatus::Uncleared
            })
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        candidates
    }

    /// Sums the transactions cleared against this session.
    #[must_use]
    pub fn book_balance(reconciliation: &Reconciliation, transactions: &[BankTransaction]) -> Decimal {
        transactions
            .iter()
            .filter(|t| t.is_cleared_in(reconciliation.id))
            .map(|t| t.amount)
            .sum()
    }

    /// Recomputes book balance and difference from the transaction set.
    pub fn recalculate(reconciliation: &mut Reconciliation, transactions: &[BankTransaction]) {
        let book = Self::book_balance(reconciliation, transactions);
        reconciliation.apply_book_balance(book);
    }

    /// Checks that a transaction can be toggled in this session.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a completed session or a transaction on
    /// another account, and a consistency error for a reconciled transaction
    /// or one cleared in a different session.
    pub fn ensure_toggleable(
        reconciliation: &Reconciliation,
        txn: &BankTransaction,
    ) -> Result<(), ReconciliationError> {
        if reconciliation.is_completed() {
            return Err(ReconciliationError::AlreadyCompleted(reconciliation.id));
        }
        if txn.is_reconciled() {
            return Err(ReconciliationError::AlreadyReconciled(txn.id));
        }
        if txn.bank_account_id != reconciliation.bank_account_id {
            return Err(ReconciliationError::TransactionNotInAccount {
                transaction_id: txn.id,
                bank_account_id: reconciliation.bank_account_id,
            });
        }
        if let Some(other) = txn.reconciliation_id
            && other != reconciliation.id
            && txn.reconciliation_status == ClearingStatus::Cleared
        {
            return Err(ReconciliationError::ClearedElsewhere {
                transaction_id: txn.id,
                reconciliation_id: other,
            });
        }
        Ok(())
    }

    /// Flips a transaction between uncleared and cleared.
    ///
    /// Nothing is modified when a precondition fails. The caller recomputes
    /// the session balances afterwards (see [`Self::recalculate`]).
    ///
    /// # Errors
    ///
    /// See [`Self::ensure_toggleable`].
    pub fn toggle_cleared(
        reconciliation: &Reconciliation,
        txn: &mut BankTransaction,
    ) -> Result<ToggleOutcome, ReconciliationError> {
        Self::ensure_toggleable(reconciliation, txn)?;

        let cleared = if txn.is_cleared_in(reconciliation.id) {
            txn.reconciliation_status = ClearingStatus::Uncleared;
            txn.reconciliation_id = None;
            false
        } else {
            txn.reconciliation_status = ClearingStatus::Cleared;
            txn.reconciliation_id = Some(reconciliation.id);
            true
        };

        Ok(ToggleOutcome {
            transaction_id: txn.id,
            cleared,
        })
    }

    /// Completes the session if the difference rounds to zero.
    ///
    /// On success every transaction cleared in this session becomes
    /// reconciled. Otherwise nothing changes and the difference is returned.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCompleted` for a completed session.
    pub fn finish(
        reconciliation: &mut Reconciliation,
        transactions: &mut [BankTransaction],
    ) -> Result<FinishOutcome, ReconciliationError> {
        if reconciliation.is_completed() {
            return Err(ReconciliationError::AlreadyCompleted(reconciliation.id));
        }

        Self::recalculate(reconciliation, transactions);
        if !reconciliation.can_finish() {
            return Ok(FinishOutcome::Outstanding {
                difference: reconciliation.difference,
            });
        }

        let before = json!({
            "status": reconciliation.status,
            "book_balance": reconciliation.book_balance,
            "difference": reconciliation.difference,
        });

        let mut reconciled: Vec<TransactionId> = Vec::new();
        for txn in transactions
            .iter_mut()
            .filter(|t| t.is_cleared_in(reconciliation.id))
        {
            txn.reconciliation_status = ClearingStatus::Reconciled;
            reconciled.push(txn.id);
        }

        reconciliation.status = ReconciliationStatus::Completed;
        reconciliation.completed_at = Some(Utc::now());

        let after = json!({
            "status": reconciliation.status,
            "book_balance": reconciliation.book_balance,
            "difference": reconciliation.difference,
            "reconciled_transactions": reconciled,
        });
        let audit = AuditEvent::new(
            AuditEntity::Reconciliation,
            reconciliation.id,
            AuditAction::Completed,
            &before,
            &after,
        )
        .emit();

        Ok(FinishOutcome::Completed { reconciled, audit })
    }

    /// Checks that a session may be deleted.
    ///
    /// # Errors
    ///
    /// Returns `CannotDeleteCompleted` for completed sessions.
    pub fn ensure_deletable(reconciliation: &Reconciliation) -> Result<(), ReconciliationError> {
        if reconciliation.is_completed() {
            return Err(ReconciliationError::CannotDeleteCompleted(reconciliation.id));
        }
        Ok(())
    }

    /// Reverts every transaction cleared in this session to uncleared.
    ///
    /// Returns the released transaction ids. Transactions are never deleted.
    pub fn release(
        reconciliation: &Reconciliation,
        transactions: &mut [BankTransaction],
    ) -> Vec<TransactionId> {
        transactions
            .iter_mut()
            .filter(|t| t.is_cleared_in(reconciliation.id))
            .map(|t| {
                t.reconciliation_status = ClearingStatus::Uncleared;
                t.reconciliation_id = None;
                t.id
            })
            .collect()
    }

    /// Builds the review view of a session.
    ///
    /// Completed sessions keep their stored balances.
    #[must_use]
    pub fn summary(
        reconciliation: &Reconciliation,
        transactions: &[BankTransaction],
    ) -> ReconciliationSummary {
        let mut current = reconciliation.clone();
        if !current.is_completed() {
            Self::recalculate(&mut current, transactions);
        }

        let cleared: Vec<BankTransaction> = transactions
            .iter()
            .filter(|t| t.reconciliation_id == Some(reconciliation.id))
            .cloned()
            .collect();
        let uncleared = Self::review_candidates(reconciliation, transactions);

        ReconciliationSummary {
            book_balance: current.book_balance,
            difference: current.difference,
            can_finish: current.can_finish(),
            reconciliation: current,
            cleared,
            uncleared,
        }
    }
}
