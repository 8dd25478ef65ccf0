//! Reconciliation repository.
//!
//! Loads the session and the affected transactions under row locks, runs the
//! reconciliation engine on them, and writes the result back in the same
//! database transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use tally_core::ledger::BankTransaction;
use tally_core::reconciliation::{
    FinishOutcome, MatchSuggester, MatchSuggestion, Reconciliation, ReconciliationEngine,
    ReconciliationError, ReconciliationSummary, ToggleOutcome,
};
use tally_shared::types::{BankAccountId, CompanyId, ReconciliationId, TransactionId};

use super::{mapping, reconciliation_db};
use crate::entities::sea_orm_active_enums::{
    ClearingStatus as DbClearingStatus, ReconciliationStatus as DbReconciliationStatus,
};
use crate::entities::{bank_accounts, bank_transactions, reconciliations};

/// A newly started session with the transactions to review.
#[derive(Debug, Clone)]
pub struct StartedReconciliation {
    /// The session.
    pub reconciliation: Reconciliation,
    /// Uncleared transactions dated on or before the statement date.
    pub candidates: Vec<BankTransaction>,
}

/// Result of toggling a transaction.
#[derive(Debug, Clone)]
pub struct ToggledReconciliation {
    /// The session with recomputed balances.
    pub reconciliation: Reconciliation,
    /// What happened to the transaction.
    pub outcome: ToggleOutcome,
}

/// Result of a finish attempt.
#[derive(Debug, Clone)]
pub struct FinishedReconciliation {
    /// The session after the attempt.
    pub reconciliation: Reconciliation,
    /// Completed, or the outstanding difference.
    pub outcome: FinishOutcome,
}

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Starts a session for a bank account.
    ///
    /// # Errors
    ///
    /// Returns `BankAccountNotFound` for an unknown account and
    /// `InProgressExists` if the account already has an open session.
    pub async fn start(
        &self,
        company_id: CompanyId,
        bank_account_id: BankAccountId,
        statement_date: NaiveDate,
        statement_balance: Decimal,
    ) -> Result<StartedReconciliation, ReconciliationError> {
        let txn = self.db.begin().await.map_err(reconciliation_db)?;

        bank_accounts::Entity::find_by_id(bank_account_id.into_inner())
            .filter(bank_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(reconciliation_db)?
            .ok_or(ReconciliationError::BankAccountNotFound(bank_account_id))?;

        let open = reconciliations::Entity::find()
            .filter(reconciliations::Column::BankAccountId.eq(bank_account_id.into_inner()))
            .filter(reconciliations::Column::Status.eq(DbReconciliationStatus::InProgress))
            .count(&txn)
            .await
            .map_err(reconciliation_db)?;

        let reconciliation = ReconciliationEngine::start(
            company_id,
            bank_account_id,
            statement_date,
            statement_balance,
            open > 0,
        )?;

        let now = chrono::Utc::now().into();
        reconciliations::ActiveModel {
            id: Set(reconciliation.id.into()),
            company_id: Set(company_id.into()),
            bank_account_id: Set(bank_account_id.into()),
            statement_date: Set(statement_date),
            statement_balance: Set(statement_balance),
            book_balance: Set(reconciliation.book_balance),
            difference: Set(reconciliation.difference),
            status: Set(reconciliation.status.into()),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(reconciliation_db)?;

        let transactions = Self::account_transactions(&txn, &reconciliation).await?;
        let candidates = ReconciliationEngine::review_candidates(&reconciliation, &transactions);
        txn.commit().await.map_err(reconciliation_db)?;

        tracing::info!(
            company_id = %company_id,
            reconciliation_id = %reconciliation.id,
            bank_account_id = %bank_account_id,
            candidates = candidates.len(),
            "Started reconciliation"
        );

        Ok(StartedReconciliation {
            reconciliation,
            candidates,
        })
    }

    /// Gets a session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it is not in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        reconciliation_id: ReconciliationId,
    ) -> Result<Reconciliation, ReconciliationError> {
        Self::load(&self.db, company_id, reconciliation_id, false)
            .await
            .map(mapping::reconciliation)
    }

    /// Flips a transaction between uncleared and cleared and recomputes the
    /// session balances.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyReconciled` for a transaction locked by an earlier
    /// session, `ClearedElsewhere` for one held by another open session, and
    /// `AlreadyCompleted` for a completed session. Nothing changes on error.
    pub async fn toggle_cleared(
        &self,
        company_id: CompanyId,
        reconciliation_id: ReconciliationId,
        transaction_id: TransactionId,
    ) -> Result<ToggledReconciliation, ReconciliationError> {
        let txn = self.db.begin().await.map_err(reconciliation_db)?;
        let rec_model = Self::load(&txn, company_id, reconciliation_id, true).await?;
        let mut reconciliation = mapping::reconciliation(rec_model.clone());

        let txn_model = bank_transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(bank_transactions::Column::CompanyId.eq(company_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(reconciliation_db)?
            .ok_or(ReconciliationError::TransactionNotFound(transaction_id))?;
        let mut transaction = mapping::bank_transaction(txn_model.clone());

        let outcome = ReconciliationEngine::toggle_cleared(&reconciliation, &mut transaction)?;
        mapping::bank_transaction_changes(txn_model, &transaction)
            .update(&txn)
            .await
            .map_err(reconciliation_db)?;

        let cleared = Self::cleared_transactions(&txn, reconciliation_id)
            .await
            .map_err(reconciliation_db)?;
        ReconciliationEngine::recalculate(&mut reconciliation, &cleared);
        Self::save_balances(&txn, rec_model, &reconciliation).await?;
        txn.commit().await.map_err(reconciliation_db)?;

        tracing::debug!(
            reconciliation_id = %reconciliation_id,
            transaction_id = %transaction_id,
            cleared = outcome.cleared,
            difference = %reconciliation.difference,
            "Toggled transaction"
        );

        Ok(ToggledReconciliation {
            reconciliation,
            outcome,
        })
    }

    /// Completes the session if its difference rounds to zero.
    ///
    /// A nonzero difference is reported in the outcome and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCompleted` for a completed session.
    pub async fn finish(
        &self,
        company_id: CompanyId,
        reconciliation_id: ReconciliationId,
    ) -> Result<FinishedReconciliation, ReconciliationError> {
        let txn = self.db.begin().await.map_err(reconciliation_db)?;
        let rec_model = Self::load(&txn, company_id, reconciliation_id, true).await?;
        let mut reconciliation = mapping::reconciliation(rec_model.clone());

        let mut cleared = Self::cleared_transactions(&txn, reconciliation_id)
            .await
            .map_err(reconciliation_db)?;
        let outcome = ReconciliationEngine::finish(&mut reconciliation, &mut cleared)?;

        match &outcome {
            FinishOutcome::Completed { reconciled, .. } => {
                bank_transactions::Entity::update_many()
                    .col_expr(
                        bank_transactions::Column::ReconciliationStatus,
                        DbClearingStatus::Reconciled.as_enum(),
                    )
                    .filter(
                        bank_transactions::Column::Id
                            .is_in(reconciled.iter().map(|id| id.into_inner())),
                    )
                    .exec(&txn)
                    .await
                    .map_err(reconciliation_db)?;

                let mut active: reconciliations::ActiveModel = rec_model.into();
                active.book_balance = Set(reconciliation.book_balance);
                active.difference = Set(reconciliation.difference);
                active.status = Set(reconciliation.status.into());
                active.completed_at = Set(reconciliation.completed_at.map(Into::into));
                active.updated_at = Set(chrono::Utc::now().into());
                active.update(&txn).await.map_err(reconciliation_db)?;

                tracing::info!(
                    company_id = %company_id,
                    reconciliation_id = %reconciliation_id,
                    reconciled = reconciled.len(),
                    "Completed reconciliation"
                );
            }
            FinishOutcome::Outstanding { difference } => {
                Self::save_balances(&txn, rec_model, &reconciliation).await?;
                tracing::info!(
                    reconciliation_id = %reconciliation_id,
                    difference = %difference,
                    "Reconciliation not balanced yet"
                );
            }
        }

        txn.commit().await.map_err(reconciliation_db)?;

        Ok(FinishedReconciliation {
            reconciliation,
            outcome,
        })
    }

    /// Builds the review view of a session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session is not in the company.
    pub async fn summary(
        &self,
        company_id: CompanyId,
        reconciliation_id: ReconciliationId,
    ) -> Result<ReconciliationSummary, ReconciliationError> {
        let model = Self::load(&self.db, company_id, reconciliation_id, false).await?;
        let reconciliation = mapping::reconciliation(model);
        let transactions = Self::account_transactions(&self.db, &reconciliation).await?;
        Ok(ReconciliationEngine::summary(&reconciliation, &transactions))
    }

    /// Suggests which uncleared transactions to clear next.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session is not in the company.
    pub async fn suggest_matches(
        &self,
        company_id: CompanyId,
        reconciliation_id: ReconciliationId,
    ) -> Result<MatchSuggestion, ReconciliationError> {
        let summary = self.summary(company_id, reconciliation_id).await?;
        Ok(MatchSuggester::suggest(
            summary.reconciliation.statement_balance,
            summary.book_balance,
            &summary.uncleared,
        ))
    }

    /// Deletes an open session, returning its cleared transactions to
    /// uncleared. Transactions themselves are kept.
    ///
    /// # Errors
    ///
    /// Returns `CannotDeleteCompleted` for a completed session.
    pub async fn delete(
        &self,
        company_id: CompanyId,
        reconciliation_id: ReconciliationId,
    ) -> Result<Vec<TransactionId>, ReconciliationError> {
        let txn = self.db.begin().await.map_err(reconciliation_db)?;
        let model = Self::load(&txn, company_id, reconciliation_id, true).await?;
        let reconciliation = mapping::reconciliation(model);
        ReconciliationEngine::ensure_deletable(&reconciliation)?;

        let mut cleared = Self::cleared_transactions(&txn, reconciliation_id)
            .await
            .map_err(reconciliation_db)?;
        let released = ReconciliationEngine::release(&reconciliation, &mut cleared);

        bank_transactions::Entity::update_many()
            .col_expr(
                bank_transactions::Column::ReconciliationStatus,
                DbClearingStatus::Uncleared.as_enum(),
            )
            .col_expr(
                bank_transactions::Column::ReconciliationId,
                Expr::value(Option::<uuid::Uuid>::None),
            )
            .filter(bank_transactions::Column::Id.is_in(released.iter().map(|id| id.into_inner())))
            .exec(&txn)
            .await
            .map_err(reconciliation_db)?;

        reconciliations::Entity::delete_by_id(reconciliation_id.into_inner())
            .exec(&txn)
            .await
            .map_err(reconciliation_db)?;
        txn.commit().await.map_err(reconciliation_db)?;

        tracing::info!(
            company_id = %company_id,
            reconciliation_id = %reconciliation_id,
            released = released.len(),
            "Deleted reconciliation"
        );
        Ok(released)
    }

    /// Takes the row lock on a session so callers that go on to lock its
    /// transactions follow the same order as `toggle_cleared` and `finish`.
    pub(crate) async fn lock_in<C: ConnectionTrait>(
        conn: &C,
        reconciliation_id: ReconciliationId,
    ) -> Result<(), DbErr> {
        reconciliations::Entity::find_by_id(reconciliation_id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await?;
        Ok(())
    }

    /// Recomputes the balances of an open session after one of its cleared
    /// transactions changed. Completed sessions are left alone.
    pub(crate) async fn refresh_in<C: ConnectionTrait>(
        conn: &C,
        reconciliation_id: ReconciliationId,
    ) -> Result<(), DbErr> {
        let Some(model) = reconciliations::Entity::find_by_id(reconciliation_id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await?
        else {
            return Ok(());
        };
        let mut reconciliation = mapping::reconciliation(model.clone());
        if reconciliation.is_completed() {
            return Ok(());
        }

        let cleared = Self::cleared_transactions(conn, reconciliation_id).await?;
        ReconciliationEngine::recalculate(&mut reconciliation, &cleared);

        let mut active: reconciliations::ActiveModel = model.into();
        active.book_balance = Set(reconciliation.book_balance);
        active.difference = Set(reconciliation.difference);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(conn).await?;
        Ok(())
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        reconciliation_id: ReconciliationId,
        lock: bool,
    ) -> Result<reconciliations::Model, ReconciliationError> {
        let mut query = reconciliations::Entity::find_by_id(reconciliation_id.into_inner())
            .filter(reconciliations::Column::CompanyId.eq(company_id.into_inner()));
        if lock {
            query = query.lock_exclusive();
        }
        query
            .one(conn)
            .await
            .map_err(reconciliation_db)?
            .ok_or(ReconciliationError::NotFound(reconciliation_id))
    }

    async fn cleared_transactions<C: ConnectionTrait>(
        conn: &C,
        reconciliation_id: ReconciliationId,
    ) -> Result<Vec<BankTransaction>, DbErr> {
        let rows = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::ReconciliationId.eq(reconciliation_id.into_inner()))
            .filter(bank_transactions::Column::ReconciliationStatus.eq(DbClearingStatus::Cleared))
            .order_by_asc(bank_transactions::Column::Date)
            .order_by_asc(bank_transactions::Column::Id)
            .lock_exclusive()
            .all(conn)
            .await?;
        Ok(rows.into_iter().map(mapping::bank_transaction).collect())
    }

    async fn account_transactions<C: ConnectionTrait>(
        conn: &C,
        reconciliation: &Reconciliation,
    ) -> Result<Vec<BankTransaction>, ReconciliationError> {
        let rows = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::CompanyId.eq(reconciliation.company_id.into_inner()))
            .filter(
                bank_transactions::Column::BankAccountId
                    .eq(reconciliation.bank_account_id.into_inner()),
            )
            .order_by_asc(bank_transactions::Column::Date)
            .order_by_asc(bank_transactions::Column::Id)
            .all(conn)
            .await
            .map_err(reconciliation_db)?;
        Ok(rows.into_iter().map(mapping::bank_transaction).collect())
    }

    async fn save_balances<C: ConnectionTrait>(
        conn: &C,
        model: reconciliations::Model,
        reconciliation: &Reconciliation,
    ) -> Result<(), ReconciliationError> {
        let mut active: reconciliations::ActiveModel = model.into();
        active.book_balance = Set(reconciliation.book_balance);
        active.difference = Set(reconciliation.difference);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(conn).await.map_err(reconciliation_db)?;
        Ok(())
    }
}
