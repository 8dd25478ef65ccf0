//! Recurring entry repository.
//!
//! Templates are fired one per database transaction. A template row is locked
//! while it fires, and its schedule is advanced with a guarded update so that
//! two schedulers running at once never produce the same occurrence twice.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use tally_core::recurring::{
    CreateRecurringEntry, FiringFailure, ProcessDueReport, RecurringEntry, RecurringError,
    RecurringScheduler, SkippedLine,
};
use tally_shared::types::{ChartOfAccountId, CompanyId, JournalEntryId, RecurringEntryId};
use uuid::Uuid;

use super::chart_of_account::ChartOfAccountRepository;
use super::journal::JournalRepository;
use super::{mapping, recurring_db};
use crate::entities::recurring_entries;

/// What happened when one template was fired.
#[derive(Debug)]
enum Firing {
    Created {
        entry_id: JournalEntryId,
        skipped: Vec<SkippedLine>,
    },
    /// Another run got there first, or the template is no longer due.
    Skipped,
}

/// Recurring entry repository.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    db: DatabaseConnection,
}

impl RecurringRepository {
    /// Creates a new recurring entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a template.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, or `InvalidLines` if a line
    /// references an account that is missing or inactive.
    pub async fn create(
        &self,
        company_id: CompanyId,
        input: CreateRecurringEntry,
    ) -> Result<RecurringEntry, RecurringError> {
        let template = RecurringScheduler::create(company_id, input)?;

        let account_ids: Vec<ChartOfAccountId> =
            template.lines.iter().map(|line| line.account_id).collect();
        ChartOfAccountRepository::ensure_active(&self.db, company_id, account_ids)
            .await
            .map_err(RecurringError::InvalidLines)?;

        let lines = serde_json::to_value(&template.lines)
            .map_err(|e| RecurringError::Database(e.to_string()))?;
        let run_count = i32::try_from(template.run_count)
            .map_err(|_| RecurringError::ScheduleOverflow(template.id))?;
        let now = chrono::Utc::now().into();

        recurring_entries::ActiveModel {
            id: Set(template.id.into()),
            company_id: Set(company_id.into()),
            name: Set(template.name.clone()),
            memo: Set(template.memo.clone()),
            frequency: Set(template.frequency.into()),
            start_date: Set(template.start_date),
            next_run_date: Set(template.next_run_date),
            end_date: Set(template.end_date),
            auto_post: Set(template.auto_post),
            run_count: Set(run_count),
            is_active: Set(template.is_active),
            lines: Set(lines),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(recurring_db)?;

        tracing::info!(
            company_id = %company_id,
            recurring_entry_id = %template.id,
            frequency = template.frequency.as_str(),
            "Created recurring entry"
        );
        Ok(template)
    }

    /// Gets a template.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it is not in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        recurring_entry_id: RecurringEntryId,
    ) -> Result<RecurringEntry, RecurringError> {
        let model = recurring_entries::Entity::find_by_id(recurring_entry_id.into_inner())
            .filter(recurring_entries::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(recurring_db)?
            .ok_or(RecurringError::NotFound(recurring_entry_id))?;
        mapping::recurring_entry(model).map_err(recurring_db)
    }

    /// Fires every template of the company that is due on `today`.
    ///
    /// Each template fires at most once per call. A template that fails is
    /// reported and left unchanged; the others still fire.
    ///
    /// # Errors
    ///
    /// Returns an error only if the due templates cannot be listed.
    pub async fn process_due(
        &self,
        company_id: CompanyId,
        today: NaiveDate,
    ) -> Result<ProcessDueReport, RecurringError> {
        let due: Vec<Uuid> = recurring_entries::Entity::find()
            .select_only()
            .column(recurring_entries::Column::Id)
            .filter(recurring_entries::Column::CompanyId.eq(company_id.into_inner()))
            .filter(recurring_entries::Column::IsActive.eq(true))
            .filter(recurring_entries::Column::NextRunDate.lte(today))
            .order_by_asc(recurring_entries::Column::NextRunDate)
            .order_by_asc(recurring_entries::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(recurring_db)?;

        let mut report = ProcessDueReport::default();
        for id in due.into_iter().map(RecurringEntryId::from_uuid) {
            match self.fire_one(company_id, id, today).await {
                Ok(Firing::Created { entry_id, skipped }) => {
                    report.created.push(entry_id);
                    report.skipped_lines.extend(skipped);
                }
                Ok(Firing::Skipped) => {}
                Err(err) => {
                    tracing::warn!(
                        company_id = %company_id,
                        recurring_entry_id = %id,
                        error = %err,
                        "Recurring entry failed to fire"
                    );
                    report.failures.push(FiringFailure {
                        recurring_entry_id: id,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            company_id = %company_id,
            %today,
            created = report.created_count(),
            failures = report.failures.len(),
            "Processed recurring entries"
        );
        Ok(report)
    }

    async fn fire_one(
        &self,
        company_id: CompanyId,
        id: RecurringEntryId,
        today: NaiveDate,
    ) -> Result<Firing, RecurringError> {
        let txn = self.db.begin().await.map_err(recurring_db)?;

        let Some(model) = recurring_entries::Entity::find_by_id(id.into_inner())
            .filter(recurring_entries::Column::CompanyId.eq(company_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(recurring_db)?
        else {
            return Ok(Firing::Skipped);
        };
        let mut template = mapping::recurring_entry(model.clone()).map_err(recurring_db)?;
        if !RecurringScheduler::is_due(&template, today) {
            return Ok(Firing::Skipped);
        }

        let account_ids: Vec<ChartOfAccountId> =
            template.lines.iter().map(|line| line.account_id).collect();
        let active = ChartOfAccountRepository::active_ids(&txn, company_id, &account_ids)
            .await
            .map_err(recurring_db)?;

        let fired = RecurringScheduler::fire(&mut template, today, |account_id| {
            active.contains(&account_id.into_inner())
        })?;

        JournalRepository::insert(&txn, &fired.entry)
            .await
            .map_err(|e| RecurringError::Database(e.to_string()))?;

        let run_count = i32::try_from(template.run_count)
            .map_err(|_| RecurringError::ScheduleOverflow(template.id))?;
        let advanced = recurring_entries::Entity::update_many()
            .col_expr(recurring_entries::Column::RunCount, Expr::value(run_count))
            .col_expr(
                recurring_entries::Column::NextRunDate,
                Expr::value(template.next_run_date),
            )
            .col_expr(
                recurring_entries::Column::IsActive,
                Expr::value(template.is_active),
            )
            .col_expr(
                recurring_entries::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(recurring_entries::Column::Id.eq(model.id))
            .filter(recurring_entries::Column::NextRunDate.eq(model.next_run_date))
            .filter(recurring_entries::Column::RunCount.eq(model.run_count))
            .exec(&txn)
            .await
            .map_err(recurring_db)?;

        if advanced.rows_affected == 0 {
            txn.rollback().await.map_err(recurring_db)?;
            return Ok(Firing::Skipped);
        }
        txn.commit().await.map_err(recurring_db)?;

        tracing::debug!(
            recurring_entry_id = %id,
            journal_entry_id = %fired.entry.id,
            posted = fired.entry.posted,
            next_run_date = %template.next_run_date,
            active = template.is_active,
            "Fired recurring entry"
        );

        Ok(Firing::Created {
            entry_id: fired.entry.id,
            skipped: fired.skipped,
        })
    }
}
