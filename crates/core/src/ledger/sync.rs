//! Bank transaction → journal entry synchronization.
//!
//! Every posted, categorized bank transaction owns exactly one balanced
//! two-line journal entry. The synchronizer decides what has to happen to that
//! entry when a transaction changes and builds its lines; the caller applies
//! the plan inside one database transaction.
//!
//! | condition | plan |
//! |---|---|
//! | posted, categorized, and status/category/amount changed | [`SyncPlan::Upsert`] |
//! | status moved away from posted | [`SyncPlan::Remove`] |
//! | category removed while posted | [`SyncPlan::ForcePendingAndRemove`] |
//! | anything else | [`SyncPlan::Unchanged`] |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::ChartOfAccountId;

use super::entry::{EntrySource, JournalEntry, JournalEntryType, JournalLine};
use super::error::LedgerError;
use super::transaction::{BankTransaction, LedgerFields, LedgerStatus};

/// Before/after view of a transaction's ledger-relevant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionChange {
    /// Fields before the mutation.
    pub before: LedgerFields,
    /// Fields after the mutation.
    pub after: LedgerFields,
}

impl TransactionChange {
    /// Creates a change.
    #[must_use]
    pub const fn new(before: LedgerFields, after: LedgerFields) -> Self {
        Self { before, after }
    }

    /// Returns true if status, category, or amount changed.
    #[must_use]
    pub fn is_relevant(&self) -> bool {
        self.before != self.after
    }
}

/// What must happen to a transaction's synchronized entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPlan {
    /// Create the entry, or replace its lines in place.
    Upsert,
    /// Delete the entry if one exists.
    Remove,
    /// Set the transaction back to pending and delete the entry.
    ForcePendingAndRemove,
    /// Leave the entry alone.
    Unchanged,
}

/// Stateless synchronizer between bank transactions and journal entries.
pub struct LedgerSynchronizer;

impl LedgerSynchronizer {
    /// Plans the sync for a mutation.
    ///
    /// Mutations that do not touch status, category, or amount never change
    /// the entry.
    #[must_use]
    pub fn plan(change: &TransactionChange) -> SyncPlan {
        let TransactionChange { before, after } = change;

        if after.status == LedgerStatus::Posted {
            if after.category_id.is_none() {
                return SyncPlan::ForcePendingAndRemove;
            }
            if change.is_relevant() {
                return SyncPlan::Upsert;
            }
            return SyncPlan::Unchanged;
        }

        if before.status == LedgerStatus::Posted {
            return SyncPlan::Remove;
        }

        SyncPlan::Unchanged
    }

    /// Plans an explicit re-sync from the transaction's current state.
    ///
    /// Unlike [`Self::plan`] this never answers `Unchanged`: a posted,
    /// categorized transaction is always upserted, anything else has its entry
    /// removed. Both are idempotent.
    #[must_use]
    pub fn plan_for_state(fields: &LedgerFields) -> SyncPlan {
        match (fields.status, fields.category_id) {
            (LedgerStatus::Posted, Some(_)) => SyncPlan::Upsert,
            (LedgerStatus::Posted, None) => SyncPlan::ForcePendingAndRemove,
            _ => SyncPlan::Remove,
        }
    }

    /// Builds the two lines for a transaction.
    ///
    /// Money out (negative amount): debit the category, credit the bank.
    /// Money in (positive amount): debit the bank, credit the category.
    ///
    /// # Errors
    ///
    /// Returns `MissingCategory` if the transaction has no category and
    /// `ZeroAmount` if there is nothing to book.
    pub fn build_lines(
        txn: &BankTransaction,
        bank_account_id: ChartOfAccountId,
    ) -> Result<Vec<JournalLine>, LedgerError> {
        let category_id = txn
            .category_id
            .ok_or(LedgerError::MissingCategory(txn.id))?;
        if txn.amount.is_zero() {
            return Err(LedgerError::ZeroAmount(txn.id));
        }

        let amount = txn.amount.abs();
        let memo = Some(txn.memo());

        let lines = if txn.amount < Decimal::ZERO {
            vec![
                JournalLine::debit(category_id, amount, memo.clone()),
                JournalLine::credit(bank_account_id, amount, memo),
            ]
        } else {
            vec![
                JournalLine::debit(bank_account_id, amount, memo.clone()),
                JournalLine::credit(category_id, amount, memo),
            ]
        };

        Ok(lines)
    }

    /// Builds the synchronized entry for a transaction.
    ///
    /// When `existing` is given its identity is kept and its lines are
    /// replaced, so syncing twice converges on the same single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines cannot be built or, defensively, if the
    /// result does not balance.
    pub fn build_entry(
        txn: &BankTransaction,
        bank_account_id: ChartOfAccountId,
        existing: Option<&JournalEntry>,
    ) -> Result<JournalEntry, LedgerError> {
        let lines = Self::build_lines(txn, bank_account_id)?;

        let mut entry = match existing {
            Some(current) => current.clone(),
            None => JournalEntry::draft(
                txn.company_id,
                txn.date,
                EntrySource::Auto,
                JournalEntryType::Standard,
            ),
        };

        entry.entry_date = txn.date;
        entry.memo = Some(txn.memo());
        entry.transaction_id = Some(txn.id);
        entry.lines = lines;
        entry.posted = false;
        entry.post()?;

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::types::{BankAccountId, CompanyId, TransactionId};

    use crate::ledger::transaction::ClearingStatus;

    fn fields(status: LedgerStatus, category: Option<ChartOfAccountId>, amount: Decimal) -> LedgerFields {
        LedgerFields {
            status,
            category_id: category,
            amount,
        }
    }

    fn txn(amount: Decimal, category: Option<ChartOfAccountId>) -> BankTransaction {
        BankTransaction {
            id: TransactionId::new(),
            company_id: CompanyId::new(),
            bank_account_id: BankAccountId::new(),
            date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            amount,
            description: "OFFICE DEPOT #221".to_string(),
            merchant: None,
            category_id: category,
            ledger_status: LedgerStatus::Posted,
            reconciliation_status: ClearingStatus::Uncleared,
            reconciliation_id: None,
        }
    }

    #[test]
    fn test_plan_posting_categorized_upserts() {
        let cat = Some(ChartOfAccountId::new());
        let change = TransactionChange::new(
            fields(LedgerStatus::Pending, cat, dec!(-45)),
            fields(LedgerStatus::Posted, cat, dec!(-45)),
        );
        assert_eq!(LedgerSynchronizer::plan(&change), SyncPlan::Upsert);
    }

    #[test]
    fn test_plan_category_change_while_posted_upserts() {
        let change = TransactionChange::new(
            fields(LedgerStatus::Posted, Some(ChartOfAccountId::new()), dec!(-45)),
            fields(LedgerStatus::Posted, Some(ChartOfAccountId::new()), dec!(-45)),
        );
        assert_eq!(LedgerSynchronizer::plan(&change), SyncPlan::Upsert);
    }

    #[test]
    fn test_plan_amount_change_while_posted_upserts() {
        let cat = Some(ChartOfAccountId::new());
        let change = TransactionChange::new(
            fields(LedgerStatus::Posted, cat, dec!(-45)),
            fields(LedgerStatus::Posted, cat, dec!(-50)),
        );
        assert_eq!(LedgerSynchronizer::plan(&change), SyncPlan::Upsert);
    }

    #[test]
    fn test_plan_unrelated_change_is_unchanged() {
        let cat = Some(ChartOfAccountId::new());
        let same = fields(LedgerStatus::Posted, cat, dec!(-45));
        assert_eq!(
            LedgerSynchronizer::plan(&TransactionChange::new(same, same)),
            SyncPlan::Unchanged
        );
    }

    #[test]
    fn test_plan_unposting_removes() {
        let cat = Some(ChartOfAccountId::new());
        for target in [LedgerStatus::Pending, LedgerStatus::Excluded] {
            let change = TransactionChange::new(
                fields(LedgerStatus::Posted, cat, dec!(-45)),
                fields(target, cat, dec!(-45)),
            );
            assert_eq!(LedgerSynchronizer::plan(&change), SyncPlan::Remove);
        }
    }

    #[test]
    fn test_plan_category_removed_while_posted_forces_pending() {
        let change = TransactionChange::new(
            fields(LedgerStatus::Posted, Some(ChartOfAccountId::new()), dec!(-45)),
            fields(LedgerStatus::Posted, None, dec!(-45)),
        );
        assert_eq!(
            LedgerSynchronizer::plan(&change),
            SyncPlan::ForcePendingAndRemove
        );
    }

    #[test]
    fn test_plan_pending_categorization_is_unchanged() {
        let change = TransactionChange::new(
            fields(LedgerStatus::Pending, None, dec!(-45)),
            fields(LedgerStatus::Pending, Some(ChartOfAccountId::new()), dec!(-45)),
        );
        assert_eq!(LedgerSynchronizer::plan(&change), SyncPlan::Unchanged);
    }

    #[test]
    fn test_plan_for_state() {
        let cat = Some(ChartOfAccountId::new());
        assert_eq!(
            LedgerSynchronizer::plan_for_state(&fields(LedgerStatus::Posted, cat, dec!(1))),
            SyncPlan::Upsert
        );
        assert_eq!(
            LedgerSynchronizer::plan_for_state(&fields(LedgerStatus::Posted, None, dec!(1))),
            SyncPlan::ForcePendingAndRemove
        );
        assert_eq!(
            LedgerSynchronizer::plan_for_state(&fields(LedgerStatus::Pending, cat, dec!(1))),
            SyncPlan::Remove
        );
        assert_eq!(
            LedgerSynchronizer::plan_for_state(&fields(LedgerStatus::Excluded, None, dec!(1))),
            SyncPlan::Remove
        );
    }

    #[test]
    fn test_money_out_debits_category_credits_bank() {
        let office_supplies = ChartOfAccountId::new();
        let checking = ChartOfAccountId::new();
        let t = txn(dec!(-45.00), Some(office_supplies));

        let entry = LedgerSynchronizer::build_entry(&t, checking, None).unwrap();

        assert_eq!(entry.lines.len(), 2);
        assert_eq!(entry.lines[0].account_id, office_supplies);
        assert_eq!(entry.lines[0].debit, dec!(45.00));
        assert_eq!(entry.lines[0].credit, Decimal::ZERO);
        assert_eq!(entry.lines[1].account_id, checking);
        assert_eq!(entry.lines[1].debit, Decimal::ZERO);
        assert_eq!(entry.lines[1].credit, dec!(45.00));
        assert!(entry.posted);
        assert_eq!(entry.source, EntrySource::Auto);
        assert_eq!(entry.transaction_id, Some(t.id));
        assert_eq!(entry.entry_date, t.date);
    }

    #[test]
    fn test_money_in_debits_bank_credits_category() {
        let sales = ChartOfAccountId::new();
        let checking = ChartOfAccountId::new();
        let t = txn(dec!(1200.00), Some(sales));

        let entry = LedgerSynchronizer::build_entry(&t, checking, None).unwrap();

        assert_eq!(entry.lines[0].account_id, checking);
        assert_eq!(entry.lines[0].debit, dec!(1200.00));
        assert_eq!(entry.lines[1].account_id, sales);
        assert_eq!(entry.lines[1].credit, dec!(1200.00));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_resync_replaces_in_place() {
        let checking = ChartOfAccountId::new();
        let mut t = txn(dec!(-45.00), Some(ChartOfAccountId::new()));
        let first = LedgerSynchronizer::build_entry(&t, checking, None).unwrap();

        let again = LedgerSynchronizer::build_entry(&t, checking, Some(&first)).unwrap();
        assert_eq!(again, first);

        t.amount = dec!(-60.00);
        let updated = LedgerSynchronizer::build_entry(&t, checking, Some(&first)).unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.lines.len(), 2);
        assert_eq!(updated.totals().debit, dec!(60.00));
    }

    #[test]
    fn test_build_without_category_fails() {
        let t = txn(dec!(-45.00), None);
        assert!(matches!(
            LedgerSynchronizer::build_entry(&t, ChartOfAccountId::new(), None),
            Err(LedgerError::MissingCategory(_))
        ));
    }

    #[test]
    fn test_build_zero_amount_fails() {
        let t = txn(Decimal::ZERO, Some(ChartOfAccountId::new()));
        assert!(matches!(
            LedgerSynchronizer::build_entry(&t, ChartOfAccountId::new(), None),
            Err(LedgerError::ZeroAmount(_))
        ));
    }
}
