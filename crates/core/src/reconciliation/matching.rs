//! Match suggestions for a reconciliation.
//!
//! Given the amount still needed to reach the statement balance, propose which
//! uncleared transactions to clear:
//!
//! 1. If the whole uncleared set hits the target within one cent, suggest all
//!    of it.
//! 2. Otherwise walk the set by descending absolute amount and take each
//!    transaction only if it strictly shrinks `|running - target|`, stopping
//!    as soon as the target is reached.
//!
//! Step 2 is a greedy best effort. It is not a subset-sum solver: it can miss
//! a matching subset that exists, and the one it finds need not be minimal or
//! unique. A person confirms the result before anything is cleared.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{TransactionId, within_tolerance};

use crate::ledger::BankTransaction;

/// How much to trust a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    /// The full uncleared set matches.
    High,
    /// The greedy pass reached the target.
    Medium,
    /// The greedy pass left a difference.
    Low,
}

/// A proposed set of transactions to clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSuggestion {
    /// Transactions to clear, in suggestion order.
    pub transaction_ids: Vec<TransactionId>,
    /// Book balance if the suggestion is applied.
    pub projected_balance: Decimal,
    /// `statement_balance - projected_balance`.
    pub difference: Decimal,
    /// Confidence in the suggestion.
    pub confidence: MatchConfidence,
}

/// Deterministic match suggester.
pub struct MatchSuggester;

impl MatchSuggester {
    /// Suggests which uncleared transactions to clear.
    ///
    /// `cleared_balance` is the sum already cleared in the session, so the
    /// remaining target is `statement_balance - cleared_balance`.
    #[must_use]
    pub fn suggest(
        statement_balance: Decimal,
        cleared_balance: Decimal,
        uncleared: &[BankTransaction],
    ) -> MatchSuggestion {
        let target = statement_balance - cleared_balance;

        // An empty set that already meets the target is a complete match.
        let total: Decimal = uncleared.iter().map(|t| t.amount).sum();
        if within_tolerance(total, target) {
            return Self::suggestion(
                uncleared.iter().map(|t| t.id).collect(),
                statement_balance,
                cleared_balance + total,
                MatchConfidence::High,
            );
        }

        let mut ordered: Vec<&BankTransaction> = uncleared.iter().collect();
        ordered.sort_by(|a, b| {
            b.amount
                .abs()
                .cmp(&a.amount.abs())
                .then(a.date.cmp(&b.date))
                .then(a.id.cmp(&b.id))
        });

        let mut running = Decimal::ZERO;
        let mut selected = Vec::new();
        for txn in ordered {
            if within_tolerance(running, target) {
                break;
            }
            let candidate = running + txn.amount;
            if (candidate - target).abs() < (running - target).abs() {
                running = candidate;
                selected.push(txn.id);
            }
        }

        let confidence = if within_tolerance(running, target) {
            MatchConfidence::Medium
        } else {
            MatchConfidence::Low
        };

        Self::suggestion(
            selected,
            statement_balance,
            cleared_balance + running,
            confidence,
        )
    }

    fn suggestion(
        transaction_ids: Vec<TransactionId>,
        statement_balance: Decimal,
        projected_balance: Decimal,
        confidence: MatchConfidence,
    ) -> MatchSuggestion {
        MatchSuggestion {
            transaction_ids,
            projected_balance,
            difference: statement_balance - projected_balance,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::types::{BankAccountId, CompanyId};

    use crate::ledger::{ClearingStatus, LedgerStatus};

    fn txn(amount: Decimal) -> BankTransaction {
        BankTransaction {
            id: TransactionId::new(),
            company_id: CompanyId::new(),
            bank_account_id: BankAccountId::new(),
            date: NaiveDate::from_ymd_opt(2026, 6, 10).unwrap(),
            amount,
            description: "DEPOSIT".to_string(),
            merchant: None,
            category_id: None,
            ledger_status: LedgerStatus::Pending,
            reconciliation_status: ClearingStatus::Uncleared,
            reconciliation_id: None,
        }
    }

    #[test]
    fn test_full_set_match_is_high_confidence() {
        let txns = vec![txn(dec!(500.00)), txn(dec!(300.00)), txn(dec!(200.00))];
        let s = MatchSuggester::suggest(dec!(1000.00), Decimal::ZERO, &txns);

        assert_eq!(s.confidence, MatchConfidence::High);
        assert_eq!(s.transaction_ids.len(), 3);
        assert_eq!(s.projected_balance, dec!(1000.00));
        assert_eq!(s.difference, Decimal::ZERO);
    }

    #[test]
    fn test_greedy_reaches_target() {
        let big = txn(dec!(700.00));
        let mid = txn(dec!(300.00));
        let noise = txn(dec!(-45.00));
        let s = MatchSuggester::suggest(
            dec!(1000.00),
            Decimal::ZERO,
            &[noise, mid.clone(), big.clone()],
        );

        assert_eq!(s.confidence, MatchConfidence::Medium);
        assert_eq!(s.transaction_ids, vec![big.id, mid.id]);
        assert_eq!(s.difference, Decimal::ZERO);
    }

    #[test]
    fn test_greedy_skips_overshoot() {
        let too_big = txn(dec!(1500.00));
        let fits = txn(dec!(400.00));
        let s = MatchSuggester::suggest(dec!(500.00), Decimal::ZERO, &[too_big, fits.clone()]);

        assert_eq!(s.confidence, MatchConfidence::Low);
        assert_eq!(s.transaction_ids, vec![fits.id]);
        assert_eq!(s.projected_balance, dec!(400.00));
        assert_eq!(s.difference, dec!(100.00));
    }

    #[test]
    fn test_target_accounts_for_cleared_balance() {
        let remaining = txn(dec!(250.00));
        let s = MatchSuggester::suggest(dec!(1000.00), dec!(750.00), &[remaining.clone()]);

        assert_eq!(s.confidence, MatchConfidence::High);
        assert_eq!(s.transaction_ids, vec![remaining.id]);
        assert_eq!(s.projected_balance, dec!(1000.00));
    }

    #[test]
    fn test_greedy_can_miss_existing_subset() {
        // 6 + 4 = 10 exists, but greedy takes 7 first and ends at 7 + 4.
        let seven = txn(dec!(7));
        let four = txn(dec!(4));
        let txns = vec![seven.clone(), txn(dec!(6)), four.clone()];
        let s = MatchSuggester::suggest(dec!(10), Decimal::ZERO, &txns);
        assert_eq!(s.confidence, MatchConfidence::Low);
        assert_eq!(s.transaction_ids, vec![seven.id, four.id]);
        assert_eq!(s.difference, dec!(-1));
    }

    #[test]
    fn test_empty_set() {
        let s = MatchSuggester::suggest(dec!(50), Decimal::ZERO, &[]);
        assert!(s.transaction_ids.is_empty());
        assert_eq!(s.difference, dec!(50));
        assert_eq!(s.confidence, MatchConfidence::Low);
    }

    #[test]
    fn test_nothing_left_to_clear_is_high() {
        let s = MatchSuggester::suggest(dec!(750.00), dec!(750.00), &[]);
        assert!(s.transaction_ids.is_empty());
        assert_eq!(s.difference, Decimal::ZERO);
        assert_eq!(s.projected_balance, dec!(750.00));
        assert_eq!(s.confidence, MatchConfidence::High);
    }
}
