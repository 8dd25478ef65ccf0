//! Reversal of posted journal entries.
//!
//! A reversal is a new posted entry with every line's debit and credit
//! swapped. The original is kept and linked both ways, so the net effect on
//! every account is zero without deleting history.

use chrono::NaiveDate;

use super::entry::{JournalEntry, JournalEntryType};
use super::error::LedgerError;
use crate::audit::{AuditAction, AuditEntity, AuditEvent};

/// A reversing entry and the audit fact describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversalOutcome {
    /// The new, posted reversing entry.
    pub reversal: JournalEntry,
    /// Before/after of the original entry.
    pub audit: AuditEvent,
}

/// Stateless reversal logic.
pub struct ReversalService;

impl ReversalService {
    /// Checks that an entry may be reversed on the given date.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is unposted, already reversed, owned by a
    /// bank transaction, or if `date` is before the original entry date.
    pub fn validate(original: &JournalEntry, date: NaiveDate) -> Result<(), LedgerError> {
        if !original.posted {
            return Err(LedgerError::CannotReverseUnposted(original.id));
        }
        if original.is_reversed() {
            return Err(LedgerError::AlreadyReversed(original.id));
        }
        if original.is_synchronized() {
            return Err(LedgerError::CannotReverseSynchronized(original.id));
        }
        if date < original.entry_date {
            return Err(LedgerError::ReversalBeforeOriginal {
                original: original.entry_date,
                requested: date,
            });
        }
        Ok(())
    }

    /// Builds the reversing entry and links it to `original`.
    ///
    /// `original` is updated in place (`reversed_by_id`); the caller persists
    /// both entries together.
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub fn reverse(
        original: &mut JournalEntry,
        date: NaiveDate,
        memo: Option<String>,
    ) -> Result<ReversalOutcome, LedgerError> {
        Self::validate(original, date)?;
        let before = original.clone();

        let mut reversal = JournalEntry::draft(
            original.company_id,
            date,
            original.source,
            JournalEntryType::Reversing,
        );
        reversal.memo = Some(memo.unwrap_or_else(|| match original.memo.as_deref() {
            Some(m) => format!("Reversal of: {m}"),
            None => format!("Reversal of entry {}", original.id),
        }));
        reversal.reversal_of_id = Some(original.id);
        reversal.lines = original.lines.iter().map(|line| line.swapped()).collect();
        reversal.post()?;

        original.reversed_by_id = Some(reversal.id);

        let audit = AuditEvent::new(
            AuditEntity::JournalEntry,
            original.id,
            AuditAction::Reversed,
            &before,
            &*original,
        )
        .emit();

        Ok(ReversalOutcome { reversal, audit })
    }
}
