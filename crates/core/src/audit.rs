//! Audit facts.
//!
//! The core does not store audit records. It describes what changed as an
//! [`AuditEvent`], logs it on the `tally::audit` target, and hands it back to
//! the caller, which decides where it goes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Target used for audit log events.
pub const AUDIT_TARGET: &str = "tally::audit";

/// The kinds of entity an audit fact can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    /// A journal entry.
    JournalEntry,
    /// A reconciliation session.
    Reconciliation,
    /// A bank transaction.
    BankTransaction,
    /// A recurring entry template.
    RecurringEntry,
}

impl AuditEntity {
    /// Returns the string representation of the entity kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JournalEntry => "journal_entry",
            Self::Reconciliation => "reconciliation",
            Self::BankTransaction => "bank_transaction",
            Self::RecurringEntry => "recurring_entry",
        }
    }
}

impl fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A posted entry was reversed.
    Reversed,
    /// A reconciliation was completed.
    Completed,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reversed => "reversed",
            Self::Completed => "completed",
        }
    }
}

/// A structured "what changed" fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Entity kind.
    pub entity: AuditEntity,
    /// Entity id.
    pub entity_id: Uuid,
    /// Action performed.
    pub action: AuditAction,
    /// Snapshot before the change.
    pub before: serde_json::Value,
    /// Snapshot after the change.
    pub after: serde_json::Value,
    /// When the fact was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Builds an event from before/after snapshots.
    ///
    /// Snapshots that fail to serialize are recorded as `null`.
    pub fn new<B: Serialize, A: Serialize>(
        entity: AuditEntity,
        entity_id: impl Into<Uuid>,
        action: AuditAction,
        before: &B,
        after: &A,
    ) -> Self {
        Self {
            entity,
            entity_id: entity_id.into(),
            action,
            before: serde_json::to_value(before).unwrap_or_default(),
            after: serde_json::to_value(after).unwrap_or_default(),
            occurred_at: Utc::now(),
        }
    }

    /// Logs the event on [`AUDIT_TARGET`] and returns it.
    #[must_use]
    pub fn emit(self) -> Self {
        tracing::info!(
            target: AUDIT_TARGET,
            entity = %self.entity,
            entity_id = %self.entity_id,
            action = self.action.as_str(),
            before = %self.before,
            after = %self.after,
            "audit"
        );
        self
    }
}
