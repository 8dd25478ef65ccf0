//! Recurring entry scheduling and firing.

use chrono::NaiveDate;
use tally_shared::types::{ChartOfAccountId, CompanyId, RecurringEntryId};

use super::error::RecurringError;
use super::types::{CreateRecurringEntry, RecurringEntry, SkippedLine};
use crate::ledger::{EntrySource, JournalEntry, JournalEntryType, JournalLine, validate_lines};

/// An entry produced by firing a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredEntry {
    /// The generated entry.
    pub entry: JournalEntry,
    /// Lines dropped because their account no longer resolves.
    pub skipped: Vec<SkippedLine>,
}

/// Stateless recurring scheduler.
pub struct RecurringScheduler;

impl RecurringScheduler {
    /// Validates input and builds a new active template.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank name, fewer than two lines, an invalid or
    /// unbalanced line set, or an end date before the start date.
    pub fn create(
        company_id: CompanyId,
        input: CreateRecurringEntry,
    ) -> Result<RecurringEntry, RecurringError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(RecurringError::EmptyName);
        }
        Self::validate_lines(&input.lines)?;
        if let Some(end) = input.end_date
            && end < input.start_date
        {
            return Err(RecurringError::EndBeforeStart {
                start: input.start_date,
                end,
            });
        }

        Ok(RecurringEntry {
            id: RecurringEntryId::new(),
            company_id,
            name: name.to_string(),
            memo: input.memo,
            frequency: input.frequency,
            start_date: input.start_date,
            next_run_date: input.start_date,
            end_date: input.end_date,
            auto_post: input.auto_post,
            run_count: 0,
            is_active: true,
            lines: input.lines,
        })
    }

    /// Checks that template lines are postable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLines` wrapping the ledger error.
    pub fn validate_lines(lines: &[JournalLine]) -> Result<(), RecurringError> {
        if lines.len() < 2 {
            return Err(RecurringError::InvalidLines(
                crate::ledger::LedgerError::InsufficientLines,
            ));
        }
        validate_lines(lines).map_err(RecurringError::InvalidLines)
    }

    /// Returns true if the template should fire on `today`.
    #[must_use]
    pub fn is_due(template: &RecurringEntry, today: NaiveDate) -> bool {
        template.is_active
            && template.next_run_date <= today
            && template
                .end_date
                .is_none_or(|end| template.next_run_date <= end)
    }

    /// Fires the template once.
    ///
    /// Lines whose account fails `resolves` are skipped and reported. The
    /// entry is dated at the current `next_run_date` and posted if the
    /// template says so and the remaining lines balance; otherwise it is left
    /// as a draft. The template's run counter and next run date advance, and
    /// it deactivates once the next run falls after the end date.
    ///
    /// # Errors
    ///
    /// Returns `NotDue` if the template is not due on `today`,
    /// `TooFewResolvedLines` if fewer than two lines survive, and
    /// `ScheduleOverflow` if the next date cannot be computed. The template is
    /// unchanged on error.
    pub fn fire<F>(
        template: &mut RecurringEntry,
        today: NaiveDate,
        resolves: F,
    ) -> Result<FiredEntry, RecurringError>
    where
        F: Fn(ChartOfAccountId) -> bool,
    {
        if !Self::is_due(template, today) {
            return Err(RecurringError::NotDue {
                id: template.id,
                today,
            });
        }

        let (lines, skipped): (Vec<&JournalLine>, Vec<&JournalLine>) = template
            .lines
            .iter()
            .partition(|line| resolves(line.account_id));
        let skipped: Vec<SkippedLine> = skipped
            .into_iter()
            .map(|line| {
                tracing::warn!(
                    recurring_entry_id = %template.id,
                    account_id = %line.account_id,
                    "Skipping recurring line with unresolvable account"
                );
                SkippedLine {
                    recurring_entry_id: template.id,
                    account_id: line.account_id,
                }
            })
            .collect();

        if lines.len() < 2 {
            return Err(RecurringError::TooFewResolvedLines {
                id: template.id,
                remaining: lines.len(),
            });
        }

        let next_count = template
            .run_count
            .checked_add(1)
            .ok_or(RecurringError::ScheduleOverflow(template.id))?;
        let next_run = template
            .frequency
            .occurrence(template.start_date, next_count)
            .ok_or(RecurringError::ScheduleOverflow(template.id))?;

        let mut entry = JournalEntry::draft(
            template.company_id,
            template.next_run_date,
            EntrySource::Recurring,
            JournalEntryType::Standard,
        );
        entry.memo = Some(template.memo.clone().unwrap_or_else(|| template.name.clone()));
        entry.lines = lines.into_iter().cloned().collect();

        if template.auto_post
            && let Err(err) = entry.post()
        {
            tracing::warn!(
                recurring_entry_id = %template.id,
                error = %err,
                "Recurring entry left unposted after skipping lines"
            );
        }

        template.run_count = next_count;
        template.next_run_date = next_run;
        if template.end_date.is_some_and(|end| next_run > end) {
            template.is_active = false;
        }

        tracing::info!(
            recurring_entry_id = %template.id,
            journal_entry_id = %entry.id,
            run_count = template.run_count,
            next_run_date = %template.next_run_date,
            "Recurring entry fired"
        );

        Ok(FiredEntry { entry, skipped })
    }
}
