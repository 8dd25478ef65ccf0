//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur while building, posting,
//! reversing, or synchronizing journal entries, plus the [`ErrorKind`]
//! classification shared by every core error enum.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{BankAccountId, ChartOfAccountId, JournalEntryId, TransactionId};
use thiserror::Error;

/// Coarse classification of a core error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or invalid state transition. Never auto-corrected.
    Validation,
    /// A referenced record does not exist.
    NotFound,
    /// The operation conflicts with permanent state (e.g., reconciled).
    Consistency,
    /// The store failed. Propagated as-is.
    Persistence,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Consistency => 409,
            Self::Persistence => 500,
        }
    }

    /// Wraps a message into the matching application error.
    #[must_use]
    pub fn into_app_error(self, message: String) -> AppError {
        match self {
            Self::Validation => AppError::Validation(message),
            Self::NotFound => AppError::NotFound(message),
            Self::Consistency => AppError::Conflict(message),
            Self::Persistence => AppError::Database(message),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines before it can be posted.
    #[error("Journal entry must have at least 2 lines to be posted")]
    InsufficientLines,

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line amount cannot be negative.
    #[error("Journal line amounts cannot be negative")]
    NegativeAmount,

    /// Line has neither a debit nor a credit.
    #[error("Journal line must have a nonzero debit or credit")]
    ZeroLine,

    /// Line has both a debit and a credit.
    #[error("Journal line must specify either debit or credit, not both")]
    BothSides,

    /// Transaction with a zero amount cannot produce an entry.
    #[error("Transaction {0} has a zero amount and cannot be posted")]
    ZeroAmount(TransactionId),

    /// A transaction cannot be posted without a category.
    #[error("Transaction {0} cannot be posted without a category")]
    MissingCategory(TransactionId),

    /// Attempted an invalid ledger status transition.
    #[error("Invalid ledger status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Posted entries that are not owned by a transaction are immutable.
    #[error("Cannot modify posted journal entry {0}; reverse it or add an adjusting entry")]
    CannotModifyPosted(JournalEntryId),

    /// Only posted entries can be reversed.
    #[error("Cannot reverse unposted journal entry {0}")]
    CannotReverseUnposted(JournalEntryId),

    /// Entries owned by a bank transaction follow the transaction.
    #[error("Journal entry {0} is synchronized with a bank transaction; change the transaction instead")]
    CannotReverseSynchronized(JournalEntryId),

    /// Entry has already been reversed.
    #[error("Journal entry {0} has already been reversed")]
    AlreadyReversed(JournalEntryId),

    /// Reversal must be dated on or after the original.
    #[error("Reversal date {requested} is before the original entry date {original}")]
    ReversalBeforeOriginal {
        /// Original entry date.
        original: NaiveDate,
        /// Requested reversal date.
        requested: NaiveDate,
    },

    // ========== Not Found Errors ==========
    /// Chart of account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(ChartOfAccountId),

    /// Bank account not found.
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(BankAccountId),

    /// Bank transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    // ========== Consistency Errors ==========
    /// Transaction is permanently reconciled.
    #[error("Transaction {0} is reconciled and cannot be changed or deleted")]
    TransactionReconciled(TransactionId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines
            | Self::Unbalanced { .. }
            | Self::NegativeAmount
            | Self::ZeroLine
            | Self::BothSides
            | Self::ZeroAmount(_)
            | Self::MissingCategory(_)
            | Self::InvalidStatusTransition { .. }
            | Self::CannotModifyPosted(_)
            | Self::CannotReverseUnposted(_)
            | Self::CannotReverseSynchronized(_)
            | Self::AlreadyReversed(_)
            | Self::ReversalBeforeOriginal { .. } => ErrorKind::Validation,

            Self::AccountNotFound(_)
            | Self::BankAccountNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::EntryNotFound(_) => ErrorKind::NotFound,

            Self::TransactionReconciled(_) => ErrorKind::Consistency,

            Self::Database(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::ZeroLine => "ZERO_LINE",
            Self::BothSides => "BOTH_SIDES",
            Self::ZeroAmount(_) => "ZERO_AMOUNT",
            Self::MissingCategory(_) => "MISSING_CATEGORY",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::CannotModifyPosted(_) => "CANNOT_MODIFY_POSTED",
            Self::CannotReverseUnposted(_) => "CANNOT_REVERSE_UNPOSTED",
            Self::CannotReverseSynchronized(_) => "CANNOT_REVERSE_SYNCHRONIZED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::ReversalBeforeOriginal { .. } => "REVERSAL_BEFORE_ORIGINAL",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::BankAccountNotFound(_) => "BANK_ACCOUNT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::TransactionReconciled(_) => "TRANSACTION_RECONCILED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Returns true if this error is retryable.
    ///
    /// Only store failures are; validation and consistency errors need a
    /// different request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        err.kind().into_app_error(err.to_string())
    }
}
