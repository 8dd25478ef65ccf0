//! Recurring template types and calendar arithmetic.

use std::fmt;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tally_shared::types::{ChartOfAccountId, CompanyId, JournalEntryId, RecurringEntryId};

use crate::ledger::JournalLine;

/// How often a template fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
    /// Every calendar month.
    Monthly,
    /// Every 3 calendar months.
    Quarterly,
    /// Every 12 calendar months.
    Annually,
}

impl Frequency {
    /// Returns the string representation of the frequency.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }

    /// Parses a frequency from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "biweekly" => Some(Self::Biweekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "annually" | "yearly" => Some(Self::Annually),
            _ => None,
        }
    }

    /// Returns the `n`-th occurrence counted from `anchor` (occurrence 0).
    ///
    /// Month-based frequencies clamp to the last day of short months without
    /// drifting: a Jan 31 anchor gives Feb 28 (or 29), then Mar 31.
    #[must_use]
    pub fn occurrence(self, anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Self::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(n))),
            Self::Biweekly => anchor.checked_add_days(Days::new(14 * u64::from(n))),
            Self::Monthly => anchor.checked_add_months(Months::new(n)),
            Self::Quarterly => anchor.checked_add_months(Months::new(n.checked_mul(3)?)),
            Self::Annually => anchor.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A journal template replayed on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringEntry {
    /// Unique identifier.
    pub id: RecurringEntryId,
    /// Company (tenant).
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Memo copied onto generated entries.
    pub memo: Option<String>,
    /// Cadence.
    pub frequency: Frequency,
    /// Schedule anchor; occurrence 0.
    pub start_date: NaiveDate,
    /// Date of the next firing.
    pub next_run_date: NaiveDate,
    /// Last date a firing may fall on.
    pub end_date: Option<NaiveDate>,
    /// Whether generated entries are posted immediately.
    pub auto_post: bool,
    /// Number of times the template has fired.
    pub run_count: u32,
    /// Inactive templates never fire.
    pub is_active: bool,
    /// Line template.
    pub lines: Vec<JournalLine>,
}

/// Input for creating a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecurringEntry {
    /// Display name.
    pub name: String,
    /// Memo.
    pub memo: Option<String>,
    /// Cadence.
    pub frequency: Frequency,
    /// First firing date.
    pub start_date: NaiveDate,
    /// Optional last firing date.
    pub end_date: Option<NaiveDate>,
    /// Post generated entries immediately.
    pub auto_post: bool,
    /// Line template.
    pub lines: Vec<JournalLine>,
}

/// A template line that was dropped when firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// Template that fired.
    pub recurring_entry_id: RecurringEntryId,
    /// Account that no longer resolves.
    pub account_id: ChartOfAccountId,
}

/// A template that failed to fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiringFailure {
    /// Template.
    pub recurring_entry_id: RecurringEntryId,
    /// Error message.
    pub error: String,
}

/// Outcome of one `process_due` run for a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDueReport {
    /// Entries created, one per firing.
    pub created: Vec<JournalEntryId>,
    /// Lines dropped because their account no longer resolves.
    pub skipped_lines: Vec<SkippedLine>,
    /// Templates that failed; the rest were not affected.
    pub failures: Vec<FiringFailure>,
}

impl ProcessDueReport {
    /// Number of entries created.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}
