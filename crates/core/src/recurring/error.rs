//! Recurring entry error types.

use chrono::NaiveDate;
use tally_shared::AppError;
use tally_shared::types::RecurringEntryId;
use thiserror::Error;

use crate::ledger::{ErrorKind, LedgerError};

/// Errors that can occur while creating or firing recurring templates.
#[derive(Debug, Error)]
pub enum RecurringError {
    // ========== Validation Errors ==========
    /// Template name is blank.
    #[error("Recurring entry name cannot be empty")]
    EmptyName,

    /// Template lines are invalid or do not balance.
    #[error("Invalid template lines: {0}")]
    InvalidLines(#[source] LedgerError),

    /// End date precedes start date.
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Template is not due (inactive, in the future, or past its end).
    #[error("Recurring entry {id} is not due on {today}")]
    NotDue {
        /// Template.
        id: RecurringEntryId,
        /// Date checked.
        today: NaiveDate,
    },

    /// Too few lines remained after dropping unresolvable accounts.
    #[error("Recurring entry {id} has {remaining} usable line(s); at least 2 are required")]
    TooFewResolvedLines {
        /// Template.
        id: RecurringEntryId,
        /// Lines left after skipping.
        remaining: usize,
    },

    /// The schedule ran past the representable calendar.
    #[error("Recurring entry {0} schedule overflowed the calendar")]
    ScheduleOverflow(RecurringEntryId),

    // ========== Not Found Errors ==========
    /// Template not found.
    #[error("Recurring entry not found: {0}")]
    NotFound(RecurringEntryId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl RecurringError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyName
            | Self::InvalidLines(_)
            | Self::EndBeforeStart { .. }
            | Self::NotDue { .. }
            | Self::TooFewResolvedLines { .. }
            | Self::ScheduleOverflow(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Database(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyName => "EMPTY_NAME",
            Self::InvalidLines(_) => "INVALID_TEMPLATE_LINES",
            Self::EndBeforeStart { .. } => "END_BEFORE_START",
            Self::NotDue { .. } => "NOT_DUE",
            Self::TooFewResolvedLines { .. } => "TOO_FEW_RESOLVED_LINES",
            Self::ScheduleOverflow(_) => "SCHEDULE_OVERFLOW",
            Self::NotFound(_) => "RECURRING_ENTRY_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<RecurringError> for AppError {
    fn from(err: RecurringError) -> Self {
        err.kind().into_app_error(err.to_string())
    }
}
