//! Chart of account classification.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Things the company owns (bank balances, receivables).
    Asset,
    /// Things the company owes (credit cards, loans).
    Liability,
    /// Owner's stake.
    Equity,
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "income" | "revenue" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns the side on which this account type normally carries its balance.
    ///
    /// - Asset/Expense: debit-normal
    /// - Liability/Equity/Income: credit-normal
    #[must_use]
    pub fn normal_balance(&self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalBalance::Credit,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normal balance side of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// balance += debit - credit
    Debit,
    /// balance += credit - debit
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change for one line.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AccountType::Asset, NormalBalance::Debit)]
    #[case(AccountType::Expense, NormalBalance::Debit)]
    #[case(AccountType::Liability, NormalBalance::Credit)]
    #[case(AccountType::Equity, NormalBalance::Credit)]
    #[case(AccountType::Income, NormalBalance::Credit)]
    fn test_normal_balance(#[case] account_type: AccountType, #[case] expected: NormalBalance) {
        assert_eq!(account_type.normal_balance(), expected);
    }

    #[test]
    fn test_balance_change() {
        assert_eq!(
            NormalBalance::Debit.balance_change(dec!(100), dec!(30)),
            dec!(70)
        );
        assert_eq!(
            NormalBalance::Credit.balance_change(dec!(100), dec!(30)),
            dec!(-70)
        );
    }

    #[test]
    fn test_parse_round_trips_and_aliases() {
        for account_type in [
            AccountType::Asset,
            AccountType::Liability,
            AccountType::Equity,
            AccountType::Income,
            AccountType::Expense,
        ] {
            assert_eq!(AccountType::parse(account_type.as_str()), Some(account_type));
        }
        assert_eq!(AccountType::parse("Revenue"), Some(AccountType::Income));
        assert_eq!(AccountType::parse("bogus"), None);
    }
}
