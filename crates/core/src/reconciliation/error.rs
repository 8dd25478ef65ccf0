//! Reconciliation error types.

use tally_shared::AppError;
use tally_shared::types::{BankAccountId, ReconciliationId, TransactionId};
use thiserror::Error;

use crate::ledger::ErrorKind;

/// Errors that can occur during reconciliation.
///
/// A nonzero difference at finish time is not an error; see
/// [`super::FinishOutcome::Outstanding`].
#[derive(Debug, Error)]
pub enum ReconciliationError {
    // ========== Validation Errors ==========
    /// Completed reconciliations are terminal.
    #[error("Reconciliation {0} is already completed")]
    AlreadyCompleted(ReconciliationId),

    /// Transaction belongs to another bank account.
    #[error("Transaction {transaction_id} does not belong to bank account {bank_account_id}")]
    TransactionNotInAccount {
        /// Transaction.
        transaction_id: TransactionId,
        /// Bank account of the reconciliation.
        bank_account_id: BankAccountId,
    },

    // ========== Not Found Errors ==========
    /// Reconciliation not found.
    #[error("Reconciliation not found: {0}")]
    NotFound(ReconciliationId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Bank account not found.
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(BankAccountId),

    // ========== Consistency Errors ==========
    /// Transaction was reconciled by an earlier completed session.
    #[error("Transaction {0} is already reconciled")]
    AlreadyReconciled(TransactionId),

    /// Transaction is cleared against a different reconciliation.
    #[error("Transaction {transaction_id} is cleared in reconciliation {reconciliation_id}")]
    ClearedElsewhere {
        /// Transaction.
        transaction_id: TransactionId,
        /// The reconciliation that holds it.
        reconciliation_id: ReconciliationId,
    },

    /// The bank account already has an open session.
    #[error("Bank account {0} already has a reconciliation in progress")]
    InProgressExists(BankAccountId),

    /// Completed reconciliations cannot be deleted.
    #[error("Completed reconciliation {0} cannot be deleted")]
    CannotDeleteCompleted(ReconciliationId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ReconciliationError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyCompleted(_) | Self::TransactionNotInAccount { .. } => {
                ErrorKind::Validation
            }
            Self::NotFound(_) | Self::TransactionNotFound(_) | Self::BankAccountNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyReconciled(_)
            | Self::ClearedElsewhere { .. }
            | Self::InProgressExists(_)
            | Self::CannotDeleteCompleted(_) => ErrorKind::Consistency,
            Self::Database(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyCompleted(_) => "RECONCILIATION_COMPLETED",
            Self::TransactionNotInAccount { .. } => "TRANSACTION_NOT_IN_ACCOUNT",
            Self::NotFound(_) => "RECONCILIATION_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::BankAccountNotFound(_) => "BANK_ACCOUNT_NOT_FOUND",
            Self::AlreadyReconciled(_) => "ALREADY_RECONCILED",
            Self::ClearedElsewhere { .. } => "CLEARED_ELSEWHERE",
            Self::InProgressExists(_) => "RECONCILIATION_IN_PROGRESS",
            Self::CannotDeleteCompleted(_) => "CANNOT_DELETE_COMPLETED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<ReconciliationError> for AppError {
    fn from(err: ReconciliationError) -> Self {
        err.kind().into_app_error(err.to_string())
    }
}
