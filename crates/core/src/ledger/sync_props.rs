//! Property-based tests for ledger synchronization and reversal.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{BankAccountId, ChartOfAccountId, CompanyId, TransactionId};

use super::balance::{BalanceLine, PeriodWindow, period_balance};
use super::entry::{EntrySource, JournalEntry, JournalEntryType, JournalLine};
use super::reversal::ReversalService;
use super::sync::LedgerSynchronizer;
use super::transaction::{BankTransaction, ClearingStatus, LedgerStatus};
use crate::coa::AccountType;

/// Strategy to generate a nonzero signed amount (±0.01 to ±100,000.00).
fn nonzero_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64, any::<bool>()).prop_map(|(cents, negative)| {
        if negative {
            Decimal::new(-cents, 2)
        } else {
            Decimal::new(cents, 2)
        }
    })
}

fn posted_txn(amount: Decimal) -> BankTransaction {
    BankTransaction {
        id: TransactionId::new(),
        company_id: CompanyId::new(),
        bank_account_id: BankAccountId::new(),
        date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap_or_default(),
        amount,
        description: "CARD PURCHASE".to_string(),
        merchant: None,
        category_id: Some(ChartOfAccountId::new()),
        ledger_status: LedgerStatus::Posted,
        reconciliation_status: ClearingStatus::Uncleared,
        reconciliation_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every synchronized entry is posted, has two lines, and balances.
    #[test]
    fn prop_sync_entry_is_balanced(amount in nonzero_amount()) {
        let txn = posted_txn(amount);
        let entry = LedgerSynchronizer::build_entry(&txn, ChartOfAccountId::new(), None).unwrap();

        prop_assert!(entry.posted);
        prop_assert_eq!(entry.lines.len(), 2);
        prop_assert!(entry.validate_for_posting().is_ok());
        prop_assert_eq!(entry.totals().debit, amount.abs());
    }

    /// Syncing again with unchanged inputs yields the identical entry.
    #[test]
    fn prop_resync_is_idempotent(amount in nonzero_amount()) {
        let txn = posted_txn(amount);
        let bank = ChartOfAccountId::new();
        let first = LedgerSynchronizer::build_entry(&txn, bank, None).unwrap();
        let second = LedgerSynchronizer::build_entry(&txn, bank, Some(&first)).unwrap();
        prop_assert_eq!(first, second);
    }

    /// The bank account moves by exactly the signed transaction amount.
    #[test]
    fn prop_bank_side_tracks_signed_amount(amount in nonzero_amount()) {
        let txn = posted_txn(amount);
        let bank = ChartOfAccountId::new();
        let entry = LedgerSynchronizer::build_entry(&txn, bank, None).unwrap();

        let lines: Vec<BalanceLine> = entry
            .lines
            .iter()
            .filter(|l| l.account_id == bank)
            .map(|l| BalanceLine { entry_date: entry.entry_date, posted: true, debit: l.debit, credit: l.credit })
            .collect();
        let balance = period_balance(bank, AccountType::Asset, &lines, PeriodWindow::all_time());
        prop_assert_eq!(balance.balance, amount);
    }

    /// An entry plus its reversal nets every account to zero.
    #[test]
    fn prop_reversal_cancels_original(amounts in prop::collection::vec(1i64..1_000_000i64, 1..5)) {
        let amounts: Vec<Decimal> = amounts.into_iter().map(|c| Decimal::new(c, 2)).collect();
        let total: Decimal = amounts.iter().copied().sum();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap_or_default();

        let mut original = JournalEntry::draft(CompanyId::new(), date, EntrySource::Manual, JournalEntryType::Standard);
        original.lines = amounts
            .iter()
            .map(|a| JournalLine::debit(ChartOfAccountId::new(), *a, None))
            .collect();
        original.lines.push(JournalLine::credit(ChartOfAccountId::new(), total, None));
        original.post().unwrap();

        let reversal = ReversalService::reverse(&mut original, date, None).unwrap().reversal;

        for (a, b) in original.lines.iter().zip(&reversal.lines) {
            prop_assert_eq!(a.account_id, b.account_id);
            prop_assert_eq!(a.debit - a.credit + b.debit - b.credit, Decimal::ZERO);
        }
    }
}
