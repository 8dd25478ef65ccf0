//! Bank transaction repository.
//!
//! Every mutation that can affect the ledger (categorize, post, exclude,
//! mark pending, amount change, delete, resync) runs in one database
//! transaction that locks the transaction row, applies the change, and
//! applies the synchronizer's plan to the linked journal entry before
//! committing. Readers never see a posted transaction without its entry.
//!
//! Lock order is reconciliation first, then transaction rows. A transaction
//! tied to a session has that session locked before its own row.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::coa::BankAccountMapper;
use tally_core::ledger::{
    BankTransaction, ClearingStatus, JournalEntry, LedgerError, LedgerStatus, LedgerSynchronizer,
    SyncPlan, TransactionChange,
};
use tally_shared::types::{BankAccountId, ChartOfAccountId, CompanyId, TransactionId};

use super::chart_of_account::ChartOfAccountRepository;
use super::journal::JournalRepository;
use super::reconciliation::ReconciliationRepository;
use super::{ledger_db, mapping};
use crate::entities::{bank_accounts, bank_transactions};

/// Attempts at taking the session and row locks before giving up.
const LOCK_ATTEMPTS: usize = 3;

/// Input for importing a bank transaction.
#[derive(Debug, Clone)]
pub struct CreateBankTransactionInput {
    /// Bank account the money moved on.
    pub bank_account_id: BankAccountId,
    /// Transaction date.
    pub date: NaiveDate,
    /// Signed amount; negative is money out.
    pub amount: Decimal,
    /// Bank description.
    pub description: String,
    /// Merchant name.
    pub merchant: Option<String>,
}

/// Result of a ledger-affecting mutation.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The transaction after the mutation.
    pub transaction: BankTransaction,
    /// What was done to the linked entry.
    pub plan: SyncPlan,
    /// The linked entry after the mutation, if any.
    pub entry: Option<JournalEntry>,
}

/// Bank transaction repository.
#[derive(Debug, Clone)]
pub struct BankTransactionRepository {
    db: DatabaseConnection,
    accounts: ChartOfAccountRepository,
}

impl BankTransactionRepository {
    /// Creates a new repository with the default ledger code prefixes.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_mapper(db, BankAccountMapper::default())
    }

    /// Creates a new repository with a configured mapper.
    #[must_use]
    pub fn with_mapper(db: DatabaseConnection, mapper: BankAccountMapper) -> Self {
        Self {
            accounts: ChartOfAccountRepository::with_mapper(db.clone(), mapper),
            db,
        }
    }

    /// Imports a pending, uncleared transaction.
    ///
    /// # Errors
    ///
    /// Returns `BankAccountNotFound` if the bank account is not in the company.
    pub async fn create(
        &self,
        company_id: CompanyId,
        input: CreateBankTransactionInput,
    ) -> Result<BankTransaction, LedgerError> {
        bank_accounts::Entity::find_by_id(input.bank_account_id.into_inner())
            .filter(bank_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::BankAccountNotFound(input.bank_account_id))?;

        let now = chrono::Utc::now().into();
        let model = bank_transactions::ActiveModel {
            id: Set(TransactionId::new().into()),
            company_id: Set(company_id.into()),
            bank_account_id: Set(input.bank_account_id.into()),
            date: Set(input.date),
            amount: Set(input.amount),
            description: Set(input.description),
            merchant: Set(input.merchant),
            category_id: Set(None),
            ledger_status: Set(LedgerStatus::Pending.into()),
            reconciliation_status: Set(ClearingStatus::Uncleared.into()),
            reconciliation_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(ledger_db)?;

        Ok(mapping::bank_transaction(model))
    }

    /// Gets a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if it is not in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<BankTransaction, LedgerError> {
        bank_transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(bank_transactions::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(ledger_db)?
            .map(mapping::bank_transaction)
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }

    /// Lists a bank account's transactions by date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_account(
        &self,
        company_id: CompanyId,
        bank_account_id: BankAccountId,
    ) -> Result<Vec<BankTransaction>, LedgerError> {
        let rows = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::CompanyId.eq(company_id.into_inner()))
            .filter(bank_transactions::Column::BankAccountId.eq(bank_account_id.into_inner()))
            .order_by_asc(bank_transactions::Column::Date)
            .order_by_asc(bank_transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(ledger_db)?;
        Ok(rows.into_iter().map(mapping::bank_transaction).collect())
    }

    /// Returns the entry synchronized with a transaction, if any.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if the transaction is not in the company.
    pub async fn linked_entry(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<Option<JournalEntry>, LedgerError> {
        self.get(company_id, transaction_id).await?;
        let txn = self.db.begin().await.map_err(ledger_db)?;
        let entry = JournalRepository::find_by_transaction(&txn, transaction_id).await?;
        txn.commit().await.map_err(ledger_db)?;
        Ok(entry)
    }

    /// Sets or clears the category.
    ///
    /// Removing the category of a posted transaction sends it back to pending
    /// and removes its entry.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the category is not an active account of
    /// the company.
    pub async fn categorize(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
        category_id: Option<ChartOfAccountId>,
    ) -> Result<SyncOutcome, LedgerError> {
        self.mutate(company_id, transaction_id, |txn| {
            txn.category_id = category_id;
            Ok(())
        })
        .await
    }

    /// Posts the transaction, creating its journal entry.
    ///
    /// # Errors
    ///
    /// Returns `MissingCategory` without a category and `ZeroAmount` for a
    /// zero amount.
    pub async fn post(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<SyncOutcome, LedgerError> {
        self.mutate(company_id, transaction_id, |txn| {
            txn.transition_to(LedgerStatus::Posted)
        })
        .await
    }

    /// Excludes the transaction from the books, removing any entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction does not exist.
    pub async fn exclude(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<SyncOutcome, LedgerError> {
        self.mutate(company_id, transaction_id, |txn| {
            txn.transition_to(LedgerStatus::Excluded)
        })
        .await
    }

    /// Moves the transaction back to pending, removing any entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction does not exist.
    pub async fn mark_pending(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<SyncOutcome, LedgerError> {
        self.mutate(company_id, transaction_id, |txn| {
            txn.transition_to(LedgerStatus::Pending)
        })
        .await
    }

    /// Changes the amount. A posted transaction's entry is rebuilt in place.
    ///
    /// # Errors
    ///
    /// Returns `TransactionReconciled` once the transaction is reconciled.
    pub async fn update_amount(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
        amount: Decimal,
    ) -> Result<SyncOutcome, LedgerError> {
        self.mutate(company_id, transaction_id, |txn| {
            txn.ensure_mutable()?;
            txn.amount = amount;
            Ok(())
        })
        .await
    }

    /// Rebuilds the linked entry from the transaction's current state.
    ///
    /// Idempotent: a posted, categorized transaction ends with exactly one
    /// entry; anything else ends with none.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction does not exist or cannot be booked.
    pub async fn resync(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<SyncOutcome, LedgerError> {
        let txn = self.db.begin().await.map_err(ledger_db)?;
        let model = Self::find(&txn, company_id, transaction_id, true).await?;
        let mut current = mapping::bank_transaction(model.clone());

        let plan = LedgerSynchronizer::plan_for_state(&current.ledger_fields());
        let entry = self.apply_plan(&txn, &mut current, plan).await?;
        if plan == SyncPlan::ForcePendingAndRemove {
            mapping::bank_transaction_changes(model, &current)
                .update(&txn)
                .await
                .map_err(ledger_db)?;
        }
        txn.commit().await.map_err(ledger_db)?;

        Ok(SyncOutcome {
            transaction: current,
            plan,
            entry,
        })
    }

    /// Deletes a transaction and its linked entry.
    ///
    /// # Errors
    ///
    /// Returns `TransactionReconciled` once the transaction is reconciled.
    pub async fn delete(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<(), LedgerError> {
        let (txn, model) = self.begin_locked(company_id, transaction_id).await?;
        let current = mapping::bank_transaction(model);
        current.ensure_mutable()?;

        JournalRepository::delete_by_transaction(&txn, transaction_id).await?;
        bank_transactions::Entity::delete_by_id(transaction_id.into_inner())
            .exec(&txn)
            .await
            .map_err(ledger_db)?;
        if let (ClearingStatus::Cleared, Some(reconciliation_id)) =
            (current.reconciliation_status, current.reconciliation_id)
        {
            ReconciliationRepository::refresh_in(&txn, reconciliation_id)
                .await
                .map_err(ledger_db)?;
        }
        txn.commit().await.map_err(ledger_db)?;

        tracing::info!(
            company_id = %company_id,
            transaction_id = %transaction_id,
            "Deleted bank transaction"
        );
        Ok(())
    }

    async fn mutate<F>(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
        change: F,
    ) -> Result<SyncOutcome, LedgerError>
    where
        F: FnOnce(&mut BankTransaction) -> Result<(), LedgerError>,
    {
        let (txn, model) = self.begin_locked(company_id, transaction_id).await?;
        let mut current = mapping::bank_transaction(model.clone());
        let before = current.ledger_fields();

        change(&mut current)?;

        let after = current.ledger_fields();
        if let Some(category_id) = after.category_id
            && before.category_id != after.category_id
        {
            ChartOfAccountRepository::ensure_active(&txn, company_id, [category_id]).await?;
        }

        let plan = LedgerSynchronizer::plan(&TransactionChange::new(before, after));
        let entry = self.apply_plan(&txn, &mut current, plan).await?;

        mapping::bank_transaction_changes(model, &current)
            .update(&txn)
            .await
            .map_err(ledger_db)?;

        if before.amount != after.amount
            && let (ClearingStatus::Cleared, Some(reconciliation_id)) =
                (current.reconciliation_status, current.reconciliation_id)
        {
            ReconciliationRepository::refresh_in(&txn, reconciliation_id)
                .await
                .map_err(ledger_db)?;
        }

        txn.commit().await.map_err(ledger_db)?;

        tracing::debug!(
            company_id = %company_id,
            transaction_id = %transaction_id,
            ledger_status = %current.ledger_status,
            plan = ?plan,
            "Bank transaction updated"
        );

        Ok(SyncOutcome {
            transaction: current,
            plan,
            entry,
        })
    }

    async fn apply_plan<C: ConnectionTrait>(
        &self,
        conn: &C,
        current: &mut BankTransaction,
        plan: SyncPlan,
    ) -> Result<Option<JournalEntry>, LedgerError> {
        match plan {
            SyncPlan::Upsert => {
                let bank = self
                    .accounts
                    .resolve_in(conn, current.company_id, current.bank_account_id)
                    .await?;
                let existing = JournalRepository::find_by_transaction(conn, current.id).await?;
                let entry =
                    LedgerSynchronizer::build_entry(current, bank.id.into(), existing.as_ref())?;
                if existing.is_some() {
                    JournalRepository::save(conn, &entry).await?;
                } else {
                    JournalRepository::insert(conn, &entry).await?;
                }
                Ok(Some(entry))
            }
            SyncPlan::Remove => {
                JournalRepository::delete_by_transaction(conn, current.id).await?;
                Ok(None)
            }
            SyncPlan::ForcePendingAndRemove => {
                tracing::warn!(
                    transaction_id = %current.id,
                    "Posted transaction lost its category; moving back to pending"
                );
                current.ledger_status = LedgerStatus::Pending;
                JournalRepository::delete_by_transaction(conn, current.id).await?;
                Ok(None)
            }
            SyncPlan::Unchanged => JournalRepository::find_by_transaction(conn, current.id).await,
        }
    }

    /// Opens a database transaction holding the row lock on `transaction_id`,
    /// with its reconciliation (if any) locked first.
    ///
    /// The session id is read unlocked, so it is checked again once the row
    /// is locked. If the row moved to another session in between, the attempt
    /// is rolled back and retried.
    async fn begin_locked(
        &self,
        company_id: CompanyId,
        transaction_id: TransactionId,
    ) -> Result<(DatabaseTransaction, bank_transactions::Model), LedgerError> {
        for _ in 0..LOCK_ATTEMPTS {
            let txn = self.db.begin().await.map_err(ledger_db)?;
            let seen = Self::find(&txn, company_id, transaction_id, false)
                .await?
                .reconciliation_id;
            if let Some(reconciliation_id) = seen {
                ReconciliationRepository::lock_in(&txn, reconciliation_id.into())
                    .await
                    .map_err(ledger_db)?;
            }

            let model = Self::find(&txn, company_id, transaction_id, true).await?;
            match model.reconciliation_id {
                Some(current) if seen != Some(current) => {
                    txn.rollback().await.map_err(ledger_db)?;
                    tracing::debug!(
                        transaction_id = %transaction_id,
                        "Transaction changed reconciliation while locking; retrying"
                    );
                }
                _ => return Ok((txn, model)),
            }
        }
        Err(LedgerError::Database(format!(
            "could not lock transaction {transaction_id}: its reconciliation kept changing"
        )))
    }

    async fn find<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        transaction_id: TransactionId,
        lock: bool,
    ) -> Result<bank_transactions::Model, LedgerError> {
        let mut query = bank_transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(bank_transactions::Column::CompanyId.eq(company_id.into_inner()));
        if lock {
            query = query.lock_exclusive();
        }
        query
            .one(conn)
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }
}
