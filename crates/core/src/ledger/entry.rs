//! Journal entry aggregate.
//!
//! A journal entry owns its lines. Posting requires at least two valid lines
//! whose debits and credits agree within one cent.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{ChartOfAccountId, CompanyId, JournalEntryId, TransactionId};

use super::error::LedgerError;
use super::validation::{EntryTotals, validate_line, validate_lines};

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Entered by a user.
    Manual,
    /// Generated from a categorized bank transaction.
    Auto,
    /// Generated from a bank-feed import.
    Plaid,
    /// Generated by a recurring template.
    Recurring,
    /// Suggested by the AI assistant and accepted by a user.
    Ai,
}

impl EntrySource {
    /// Returns the string representation of the source.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
            Self::Plaid => "plaid",
            Self::Recurring => "recurring",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accounting purpose of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEntryType {
    /// Ordinary entry.
    Standard,
    /// Period-end or correcting adjustment.
    Adjusting,
    /// Reversal of another entry.
    Reversing,
    /// Opening balance.
    Opening,
    /// Closing entry.
    Closing,
}

impl JournalEntryType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Adjusting => "adjusting",
            Self::Reversing => "reversing",
            Self::Opening => "opening",
            Self::Closing => "closing",
        }
    }
}

/// One side of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// The account this line posts to.
    pub account_id: ChartOfAccountId,
    /// Debit amount (0 if credit).
    pub debit: Decimal,
    /// Credit amount (0 if debit).
    pub credit: Decimal,
    /// Optional memo.
    pub memo: Option<String>,
}

impl JournalLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: ChartOfAccountId, amount: Decimal, memo: Option<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: ChartOfAccountId, amount: Decimal, memo: Option<String>) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo,
        }
    }

    /// Returns true if this line is on the debit side.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.debit > Decimal::ZERO
    }

    /// Returns the nonzero amount of this line.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.debit.max(self.credit)
    }

    /// Returns the same line with debit and credit swapped.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
            memo: self.memo.clone(),
        }
    }

    /// Validates the line.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount is negative or if not exactly one side is nonzero.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_line(self.debit, self.credit)
    }
}

/// A journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Company (tenant) this entry belongs to.
    pub company_id: CompanyId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Free-text memo.
    pub memo: Option<String>,
    /// Where the entry came from.
    pub source: EntrySource,
    /// Accounting purpose.
    pub entry_type: JournalEntryType,
    /// Bank transaction that owns this entry, if any.
    pub transaction_id: Option<TransactionId>,
    /// Whether the entry is posted to the ledger.
    pub posted: bool,
    /// The entry this one reverses.
    pub reversal_of_id: Option<JournalEntryId>,
    /// The entry that reversed this one.
    pub reversed_by_id: Option<JournalEntryId>,
    /// Lines (owned; removed with the entry).
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Creates an unposted entry with no lines.
    #[must_use]
    pub fn draft(
        company_id: CompanyId,
        entry_date: NaiveDate,
        source: EntrySource,
        entry_type: JournalEntryType,
    ) -> Self {
        Self {
            id: JournalEntryId::new(),
            company_id,
            entry_date,
            memo: None,
            source,
            entry_type,
            transaction_id: None,
            posted: false,
            reversal_of_id: None,
            reversed_by_id: None,
            lines: Vec::new(),
        }
    }

    /// Returns the debit and credit totals.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::from_lines(&self.lines)
    }

    /// Returns true if debits equal credits within one cent.
    ///
    /// An entry with no lines is vacuously balanced.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.totals().is_balanced
    }

    /// Returns true if a bank transaction owns this entry.
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.transaction_id.is_some()
    }

    /// Returns true if the entry has been reversed.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed_by_id.is_some()
    }

    /// Validates that the entry can be in the posted state.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 2 lines, a line is invalid,
    /// or the entry is unbalanced.
    pub fn validate_for_posting(&self) -> Result<(), LedgerError> {
        if self.lines.len() < 2 {
            return Err(LedgerError::InsufficientLines);
        }
        validate_lines(&self.lines)
    }

    /// Posts the entry.
    ///
    /// Posting an already posted entry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry fails [`Self::validate_for_posting`].
    pub fn post(&mut self) -> Result<(), LedgerError> {
        if self.posted {
            return Ok(());
        }
        self.validate_for_posting()?;
        self.posted = true;
        Ok(())
    }

    /// Checks that the entry may be edited in place.
    ///
    /// Posted entries are immutable unless a bank transaction owns them; the
    /// synchronizer replaces those in place.
    ///
    /// # Errors
    ///
    /// Returns `CannotModifyPosted` for posted, unowned entries.
    pub fn ensure_editable(&self) -> Result<(), LedgerError> {
        if self.posted && !self.is_synchronized() {
            return Err(LedgerError::CannotModifyPosted(self.id));
        }
        Ok(())
    }

    /// Replaces all lines of an editable entry.
    ///
    /// Each line must be valid. Balance is only enforced when the entry is
    /// posted, so drafts may be saved half-finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not editable, a line is invalid, or the
    /// entry is posted and the new lines do not balance.
    pub fn replace_lines(&mut self, lines: Vec<JournalLine>) -> Result<(), LedgerError> {
        self.ensure_editable()?;
        for line in &lines {
            line.validate()?;
        }
        if self.posted {
            if lines.len() < 2 {
                return Err(LedgerError::InsufficientLines);
            }
            validate_lines(&lines)?;
        }
        self.lines = lines;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn balanced_entry() -> JournalEntry {
        let mut entry = JournalEntry::draft(
            CompanyId::new(),
            date(),
            EntrySource::Manual,
            JournalEntryType::Standard,
        );
        entry.lines = vec![
            JournalLine::debit(ChartOfAccountId::new(), dec!(120.00), None),
            JournalLine::credit(ChartOfAccountId::new(), dec!(120.00), None),
        ];
        entry
    }

    #[test]
    fn test_empty_entry_is_vacuously_balanced_but_not_postable() {
        let mut entry = JournalEntry::draft(
            CompanyId::new(),
            date(),
            EntrySource::Manual,
            JournalEntryType::Standard,
        );
        assert!(entry.is_balanced());
        assert!(matches!(entry.post(), Err(LedgerError::InsufficientLines)));
        assert!(!entry.posted);
    }

    #[test]
    fn test_post_balanced_entry() {
        let mut entry = balanced_entry();
        entry.post().unwrap();
        assert!(entry.posted);
        // Idempotent
        entry.post().unwrap();
        assert!(entry.posted);
    }

    #[test]
    fn test_post_rejects_unbalanced() {
        let mut entry = balanced_entry();
        entry.lines[1].credit = dec!(100.00);
        assert!(matches!(entry.post(), Err(LedgerError::Unbalanced { .. })));
        assert!(!entry.posted);
    }

    #[test]
    fn test_post_accepts_sub_cent_difference() {
        let mut entry = balanced_entry();
        entry.lines[1].credit = dec!(120.005);
        assert!(entry.is_balanced());
        assert!(entry.post().is_ok());
    }

    #[test]
    fn test_posted_manual_entry_is_immutable() {
        let mut entry = balanced_entry();
        entry.post().unwrap();

        let lines = entry.lines.clone();
        assert!(matches!(
            entry.replace_lines(lines),
            Err(LedgerError::CannotModifyPosted(_))
        ));
    }

    #[test]
    fn test_posted_synchronized_entry_can_be_replaced() {
        let mut entry = balanced_entry();
        entry.transaction_id = Some(TransactionId::new());
        entry.post().unwrap();

        let account = ChartOfAccountId::new();
        let bank = ChartOfAccountId::new();
        entry
            .replace_lines(vec![
                JournalLine::debit(account, dec!(80), None),
                JournalLine::credit(bank, dec!(80), None),
            ])
            .unwrap();
        assert_eq!(entry.totals().debit, dec!(80));
    }

    #[test]
    fn test_replace_lines_on_posted_synchronized_entry_still_balances() {
        let mut entry = balanced_entry();
        entry.transaction_id = Some(TransactionId::new());
        entry.post().unwrap();

        let result = entry.replace_lines(vec![
            JournalLine::debit(ChartOfAccountId::new(), dec!(80), None),
            JournalLine::credit(ChartOfAccountId::new(), dec!(70), None),
        ]);
        assert!(matches!(result, Err(LedgerError::Unbalanced { .. })));
    }

    #[test]
    fn test_draft_may_hold_unbalanced_lines() {
        let mut entry = balanced_entry();
        entry
            .replace_lines(vec![JournalLine::debit(ChartOfAccountId::new(), dec!(10), None)])
            .unwrap();
        assert!(!entry.is_balanced());
    }

    #[test]
    fn test_line_swapped() {
        let line = JournalLine::debit(ChartOfAccountId::new(), dec!(45.00), Some("memo".into()));
        let swapped = line.swapped();
        assert_eq!(swapped.debit, Decimal::ZERO);
        assert_eq!(swapped.credit, dec!(45.00));
        assert_eq!(swapped.account_id, line.account_id);
        assert!(!swapped.is_debit());
        assert_eq!(swapped.amount(), dec!(45.00));
    }
}
