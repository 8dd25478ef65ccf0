//! Chart of account repository.
//!
//! Besides plain account creation this resolves the ledger account that
//! stands for a bank account, creating it on first use.

use std::collections::HashSet;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set,
};
use tally_core::coa::{AccountType, BankAccountMapper};
use tally_core::ledger::LedgerError;
use tally_shared::types::{BankAccountId, ChartOfAccountId, CompanyId};
use uuid::Uuid;

use super::company::bank_account_info;
use super::ledger_db;
use crate::entities::{bank_accounts, chart_of_accounts};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account code, unique per company.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
}

/// Chart of account repository.
#[derive(Debug, Clone)]
pub struct ChartOfAccountRepository {
    db: DatabaseConnection,
    mapper: BankAccountMapper,
}

impl ChartOfAccountRepository {
    /// Creates a new repository with the default code prefixes.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_mapper(db, BankAccountMapper::default())
    }

    /// Creates a new repository with a configured mapper.
    #[must_use]
    pub const fn with_mapper(db: DatabaseConnection, mapper: BankAccountMapper) -> Self {
        Self { db, mapper }
    }

    /// Creates a user-defined account.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g., duplicate code).
    pub async fn create(
        &self,
        company_id: CompanyId,
        input: CreateAccountInput,
    ) -> Result<chart_of_accounts::Model, DbErr> {
        let now = chrono::Utc::now().into();
        chart_of_accounts::ActiveModel {
            id: Set(ChartOfAccountId::new().into()),
            company_id: Set(company_id.into()),
            code: Set(input.code),
            name: Set(input.name),
            account_type: Set(input.account_type.into()),
            is_active: Set(true),
            system_generated: Set(false),
            bank_account_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Marks an account inactive.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is not in the company.
    pub async fn deactivate(
        &self,
        company_id: CompanyId,
        account_id: ChartOfAccountId,
    ) -> Result<(), LedgerError> {
        let account = Self::find_in(&self.db, company_id, account_id).await?;
        let mut active: chart_of_accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await.map_err(ledger_db)?;
        Ok(())
    }

    /// Returns the ledger account for a bank account, creating it if needed.
    ///
    /// Repeated calls return the same row.
    ///
    /// # Errors
    ///
    /// Returns `BankAccountNotFound` if the bank account is not in the company.
    pub async fn resolve_or_create_bank_account(
        &self,
        company_id: CompanyId,
        bank_account_id: BankAccountId,
    ) -> Result<chart_of_accounts::Model, LedgerError> {
        self.resolve_in(&self.db, company_id, bank_account_id).await
    }

    /// Same as [`Self::resolve_or_create_bank_account`] on a caller's connection.
    ///
    /// Concurrent first calls converge: the insert skips on conflict and the
    /// row is selected again.
    pub(crate) async fn resolve_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: CompanyId,
        bank_account_id: BankAccountId,
    ) -> Result<chart_of_accounts::Model, LedgerError> {
        if let Some(existing) = Self::find_for_bank_account(conn, company_id, bank_account_id).await? {
            return Ok(existing);
        }

        let bank = bank_accounts::Entity::find_by_id(bank_account_id.into_inner())
            .filter(bank_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .one(conn)
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::BankAccountNotFound(bank_account_id))?;
        let mapped = self.mapper.map(&bank_account_info(&bank));

        // An unlinked system account with the same name is adopted.
        if let Some(by_name) = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(chart_of_accounts::Column::Name.eq(mapped.name.clone()))
            .filter(chart_of_accounts::Column::SystemGenerated.eq(true))
            .filter(chart_of_accounts::Column::BankAccountId.is_null())
            .one(conn)
            .await
            .map_err(ledger_db)?
        {
            let mut active: chart_of_accounts::ActiveModel = by_name.into();
            active.bank_account_id = Set(Some(bank_account_id.into_inner()));
            active.updated_at = Set(chrono::Utc::now().into());
            return active.update(conn).await.map_err(ledger_db);
        }

        let now = chrono::Utc::now().into();
        let inserted = chart_of_accounts::Entity::insert(chart_of_accounts::ActiveModel {
            id: Set(ChartOfAccountId::new().into()),
            company_id: Set(company_id.into()),
            code: Set(mapped.code.clone()),
            name: Set(mapped.name.clone()),
            account_type: Set(mapped.account_type.into()),
            is_active: Set(true),
            system_generated: Set(true),
            bank_account_id: Set(Some(bank_account_id.into_inner())),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(OnConflict::new().do_nothing().to_owned())
        .exec_without_returning(conn)
        .await
        .map_err(ledger_db)?;

        if inserted > 0 {
            tracing::info!(
                company_id = %company_id,
                bank_account_id = %bank_account_id,
                code = %mapped.code,
                name = %mapped.name,
                "Created ledger account for bank account"
            );
        }

        Self::find_for_bank_account(conn, company_id, bank_account_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Database(format!(
                    "ledger account code {} is already taken in company {company_id}",
                    mapped.code
                ))
            })
    }

    async fn find_for_bank_account<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        bank_account_id: BankAccountId,
    ) -> Result<Option<chart_of_accounts::Model>, LedgerError> {
        chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(chart_of_accounts::Column::BankAccountId.eq(bank_account_id.into_inner()))
            .one(conn)
            .await
            .map_err(ledger_db)
    }

    /// Loads an account within a company.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist in the company.
    pub(crate) async fn find_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        account_id: ChartOfAccountId,
    ) -> Result<chart_of_accounts::Model, LedgerError> {
        chart_of_accounts::Entity::find_by_id(account_id.into_inner())
            .filter(chart_of_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .one(conn)
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Checks that every account exists and is active in the company.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for the first account that does not.
    pub(crate) async fn ensure_active<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        account_ids: impl IntoIterator<Item = ChartOfAccountId>,
    ) -> Result<(), LedgerError> {
        let wanted: Vec<ChartOfAccountId> = account_ids.into_iter().collect();
        let found = Self::active_ids(conn, company_id, &wanted)
            .await
            .map_err(ledger_db)?;
        match wanted.into_iter().find(|id| !found.contains(&id.into_inner())) {
            Some(missing) => Err(LedgerError::AccountNotFound(missing)),
            None => Ok(()),
        }
    }

    /// Returns the subset of `account_ids` that are active in the company.
    pub(crate) async fn active_ids<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        account_ids: &[ChartOfAccountId],
    ) -> Result<HashSet<Uuid>, DbErr> {
        if account_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<Uuid> = chart_of_accounts::Entity::find()
            .select_only()
            .column(chart_of_accounts::Column::Id)
            .filter(chart_of_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(chart_of_accounts::Column::IsActive.eq(true))
            .filter(
                chart_of_accounts::Column::Id
                    .is_in(account_ids.iter().map(|id| id.into_inner())),
            )
            .into_tuple()
            .all(conn)
            .await?;
        Ok(ids.into_iter().collect())
    }
}
