//! Property-based tests for the reconciliation engine and match suggester.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{BankAccountId, CompanyId, TransactionId};

use super::engine::ReconciliationEngine;
use super::matching::{MatchConfidence, MatchSuggester};
use super::types::{FinishOutcome, Reconciliation, ReconciliationStatus};
use crate::ledger::{BankTransaction, ClearingStatus, LedgerStatus};

/// Strategy to generate a nonzero signed amount.
fn signed_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64, any::<bool>())
        .prop_map(|(cents, negative)| Decimal::new(if negative { -cents } else { cents }, 2))
}

fn txn(rec: &Reconciliation, amount: Decimal) -> BankTransaction {
    BankTransaction {
        id: TransactionId::new(),
        company_id: rec.company_id,
        bank_account_id: rec.bank_account_id,
        date: rec.statement_date,
        amount,
        description: "STATEMENT LINE".to_string(),
        merchant: None,
        category_id: None,
        ledger_status: LedgerStatus::Pending,
        reconciliation_status: ClearingStatus::Uncleared,
        reconciliation_id: None,
    }
}

fn session(statement_balance: Decimal) -> Reconciliation {
    Reconciliation::new(
        CompanyId::new(),
        BankAccountId::new(),
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap_or_default(),
        statement_balance,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// After any toggle sequence, difference = statement - sum(cleared).
    #[test]
    fn prop_difference_formula(
        amounts in prop::collection::vec(signed_amount(), 1..12),
        toggles in prop::collection::vec(any::<prop::sample::Index>(), 0..30),
        statement in signed_amount(),
    ) {
        let mut rec = session(statement);
        let mut txns: Vec<BankTransaction> = amounts.iter().map(|a| txn(&rec, *a)).collect();

        for index in toggles {
            let i = index.index(txns.len());
            ReconciliationEngine::toggle_cleared(&rec, &mut txns[i]).unwrap();
            ReconciliationEngine::recalculate(&mut rec, &txns);

            let cleared: Decimal = txns
                .iter()
                .filter(|t| t.reconciliation_status == ClearingStatus::Cleared && t.reconciliation_id == Some(rec.id))
                .map(|t| t.amount)
                .sum();
            prop_assert_eq!(rec.book_balance, cleared);
            prop_assert_eq!(rec.difference, statement - cleared);
        }
    }

    /// Finishing either completes with a settled difference or changes nothing.
    #[test]
    fn prop_finish_all_or_nothing(
        amounts in prop::collection::vec(signed_amount(), 1..8),
        clear_mask in prop::collection::vec(any::<bool>(), 8),
        statement in signed_amount(),
    ) {
        let mut rec = session(statement);
        let mut txns: Vec<BankTransaction> = amounts.iter().map(|a| txn(&rec, *a)).collect();
        for (t, clear) in txns.iter_mut().zip(&clear_mask) {
            if *clear {
                ReconciliationEngine::toggle_cleared(&rec, t).unwrap();
            }
        }
        let before = txns.clone();

        match ReconciliationEngine::finish(&mut rec, &mut txns).unwrap() {
            FinishOutcome::Completed { reconciled, .. } => {
                prop_assert_eq!(rec.status, ReconciliationStatus::Completed);
                prop_assert_eq!(tally_shared::types::round_money(rec.difference), Decimal::ZERO);
                prop_assert!(txns.iter().all(|t| t.reconciliation_status != ClearingStatus::Cleared));
                prop_assert_eq!(reconciled.len(), before.iter().filter(|t| t.reconciliation_status == ClearingStatus::Cleared).count());
            }
            FinishOutcome::Outstanding { difference } => {
                prop_assert_eq!(rec.status, ReconciliationStatus::InProgress);
                prop_assert_ne!(tally_shared::types::round_money(difference), Decimal::ZERO);
                prop_assert_eq!(txns, before);
            }
        }
    }

    /// When the whole uncleared set sums to the target, all of it is suggested.
    #[test]
    fn prop_full_set_is_suggested(amounts in prop::collection::vec(signed_amount(), 1..10)) {
        let rec = session(Decimal::ZERO);
        let txns: Vec<BankTransaction> = amounts.iter().map(|a| txn(&rec, *a)).collect();
        let total: Decimal = amounts.iter().copied().sum();

        let suggestion = MatchSuggester::suggest(total, Decimal::ZERO, &txns);

        prop_assert_eq!(suggestion.confidence, MatchConfidence::High);
        prop_assert_eq!(suggestion.transaction_ids.len(), txns.len());
        prop_assert_eq!(suggestion.difference, Decimal::ZERO);
    }

    /// The greedy pass never ends further from the target than it started.
    #[test]
    fn prop_greedy_never_worsens(
        amounts in prop::collection::vec(signed_amount(), 0..10),
        statement in signed_amount(),
    ) {
        let rec = session(statement);
        let txns: Vec<BankTransaction> = amounts.iter().map(|a| txn(&rec, *a)).collect();

        let suggestion = MatchSuggester::suggest(statement, Decimal::ZERO, &txns);

        prop_assert!(suggestion.difference.abs() <= statement.abs());
        prop_assert_eq!(suggestion.projected_balance + suggestion.difference, statement);
    }
}
