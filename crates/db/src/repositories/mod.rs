//! Repository abstractions for data access.
//!
//! Repositories load domain values from `SeaORM` models, run the pure logic
//! from `tally-core` on them, and write the result back inside one database
//! transaction per operation.

pub mod bank_transaction;
pub mod chart_of_account;
pub mod company;
pub mod journal;
mod mapping;
pub mod reconciliation;
pub mod recurring;

pub use bank_transaction::{BankTransactionRepository, CreateBankTransactionInput, SyncOutcome};
pub use chart_of_account::{ChartOfAccountRepository, CreateAccountInput};
pub use company::{CompanyRepository, CreateBankAccountInput, bank_account_info};
pub use journal::{CreateJournalEntryInput, JournalRepository, ReversedEntry};
pub use reconciliation::{
    FinishedReconciliation, ReconciliationRepository, StartedReconciliation,
    ToggledReconciliation,
};
pub use recurring::RecurringRepository;

use sea_orm::DbErr;
use tally_core::ledger::LedgerError;
use tally_core::reconciliation::ReconciliationError;
use tally_core::recurring::RecurringError;

pub(crate) fn ledger_db(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

pub(crate) fn reconciliation_db(err: DbErr) -> ReconciliationError {
    ReconciliationError::Database(err.to_string())
}

pub(crate) fn recurring_db(err: DbErr) -> RecurringError {
    RecurringError::Database(err.to_string())
}
