//! Recurring journal templates.
//!
//! A template stores balanced lines and a cadence. Each firing produces one
//! journal entry dated at the template's next run date, then advances the
//! schedule by calendar arithmetic anchored on the start date.

pub mod error;
pub mod scheduler;
pub mod types;

pub use error::RecurringError;
pub use scheduler::{FiredEntry, RecurringScheduler};
pub use types::{
    CreateRecurringEntry, FiringFailure, Frequency, ProcessDueReport, RecurringEntry, SkippedLine,
};
