//! Double-entry bookkeeping logic.
//!
//! This module implements the journal side of the ledger:
//! - Journal entries and lines with the debits = credits invariant
//! - Line and entry validation
//! - Bank transactions and their ledger/clearing status
//! - Synchronization of categorized transactions into journal entries
//! - Reversal of posted entries
//! - Per-account period balances

pub mod balance;
pub mod entry;
pub mod error;
pub mod reversal;
pub mod sync;
pub mod transaction;
pub mod validation;

#[cfg(test)]
mod sync_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, BalanceLine, PeriodWindow, period_balance};
pub use entry::{EntrySource, JournalEntry, JournalEntryType, JournalLine};
pub use error::{ErrorKind, LedgerError};
pub use reversal::{ReversalOutcome, ReversalService};
pub use sync::{LedgerSynchronizer, SyncPlan, TransactionChange};
pub use transaction::{BankTransaction, ClearingStatus, LedgerFields, LedgerStatus};
pub use validation::{EntryTotals, is_balanced, validate_line, validate_lines};
