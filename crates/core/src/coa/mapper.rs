//! Bank account → chart of account mapping.
//!
//! Every bank account is represented in the ledger by one chart of account
//! row. The row is named deterministically from the bank account so that a
//! find-or-create by name is idempotent, and it is classified as a liability
//! for credit and loan products and as an asset for everything else.

use std::fmt;

use serde::{Deserialize, Serialize};
use tally_shared::config::LedgerConfig;
use tally_shared::types::BankAccountId;

use super::types::AccountType;

/// Kind of bank account, as reported by the bank feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAccountKind {
    /// Generic deposit account.
    Depository,
    /// Checking account.
    Checking,
    /// Savings account.
    Savings,
    /// Generic credit line.
    Credit,
    /// Credit card.
    CreditCard,
    /// Loan.
    Loan,
    /// Mortgage.
    Mortgage,
    /// Brokerage or investment account.
    Investment,
    /// Anything the feed did not classify.
    Other,
}

impl BankAccountKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Depository => "depository",
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::CreditCard => "credit_card",
            Self::Loan => "loan",
            Self::Mortgage => "mortgage",
            Self::Investment => "investment",
            Self::Other => "other",
        }
    }

    /// Parses a kind from a feed string. Unknown values map to `Other`.
    ///
    /// Accepts both `credit_card` and `credit card` spellings.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "depository" => Self::Depository,
            "checking" => Self::Checking,
            "savings" => Self::Savings,
            "credit" => Self::Credit,
            "credit_card" => Self::CreditCard,
            "loan" => Self::Loan,
            "mortgage" => Self::Mortgage,
            "investment" | "brokerage" => Self::Investment,
            _ => Self::Other,
        }
    }

    /// Returns true for products where the company owes the bank.
    #[must_use]
    pub fn is_liability(&self) -> bool {
        matches!(
            self,
            Self::Credit | Self::CreditCard | Self::Loan | Self::Mortgage
        )
    }
}

impl fmt::Display for BankAccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The bank account facts the mapper needs.
#[derive(Debug, Clone)]
pub struct BankAccountInfo {
    /// Bank account ID.
    pub id: BankAccountId,
    /// Display name (e.g., "Chase Checking").
    pub name: String,
    /// Last digits of the account number, if known.
    pub mask: Option<String>,
    /// Kind reported by the feed.
    pub kind: BankAccountKind,
}

/// The ledger account a bank account maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankLedgerAccount {
    /// Deterministic name; the find-or-create key.
    pub name: String,
    /// Auto-generated code, used only when the account is created.
    pub code: String,
    /// Asset or liability.
    pub account_type: AccountType,
}

/// Derives the chart of account that represents a bank account.
#[derive(Debug, Clone)]
pub struct BankAccountMapper {
    asset_code_prefix: String,
    liability_code_prefix: String,
}

impl Default for BankAccountMapper {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

impl BankAccountMapper {
    /// Creates a mapper with explicit code prefixes.
    #[must_use]
    pub fn new(asset_code_prefix: impl Into<String>, liability_code_prefix: impl Into<String>) -> Self {
        Self {
            asset_code_prefix: asset_code_prefix.into(),
            liability_code_prefix: liability_code_prefix.into(),
        }
    }

    /// Creates a mapper from the ledger configuration section.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            config.asset_code_prefix.clone(),
            config.liability_code_prefix.clone(),
        )
    }

    /// Classifies a bank account kind.
    #[must_use]
    pub fn account_type(kind: BankAccountKind) -> AccountType {
        if kind.is_liability() {
            AccountType::Liability
        } else {
            AccountType::Asset
        }
    }

    /// Builds the deterministic ledger name for a bank account.
    ///
    /// `"{name} - {mask}"` when a mask is known, `"{name} ({kind})"` otherwise.
    #[must_use]
    pub fn ledger_name(bank: &BankAccountInfo) -> String {
        let name = bank.name.trim();
        let name = if name.is_empty() { "Bank Account" } else { name };

        match bank.mask.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(mask) => format!("{name} - {mask}"),
            None => format!("{name} ({})", bank.kind),
        }
    }

    /// Builds the auto-generated code for a bank account.
    ///
    /// The suffix is the trailing 8 hex digits of the bank account ID, which
    /// are random in both v4 and v7 UUIDs.
    #[must_use]
    pub fn ledger_code(&self, bank: &BankAccountInfo) -> String {
        let prefix = if bank.kind.is_liability() {
            &self.liability_code_prefix
        } else {
            &self.asset_code_prefix
        };
        let simple = bank.id.into_inner().simple().to_string();
        let suffix = &simple[simple.len() - 8..];
        format!("{prefix}-{}", suffix.to_uppercase())
    }

    /// Maps a bank account to its ledger account.
    #[must_use]
    pub fn map(&self, bank: &BankAccountInfo) -> BankLedgerAccount {
        BankLedgerAccount {
            name: Self::ledger_name(bank),
            code: self.ledger_code(bank),
            account_type: Self::account_type(bank.kind),
        }
    }
}
