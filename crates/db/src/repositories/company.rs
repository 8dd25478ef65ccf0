//! Company and bank account repository.
//!
//! Tenants and bank accounts are owned by the surrounding application; this
//! repository only covers what the ledger needs: creating them and listing
//! tenants for batch jobs.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tally_core::coa::{BankAccountInfo, BankAccountKind};
use tally_shared::types::{BankAccountId, CompanyId};
use uuid::Uuid;

use crate::entities::{bank_accounts, companies};

/// Input for registering a bank account.
#[derive(Debug, Clone)]
pub struct CreateBankAccountInput {
    /// Display name.
    pub name: String,
    /// Last digits of the account number.
    pub mask: Option<String>,
    /// Kind of account as reported by the bank feed.
    pub kind: BankAccountKind,
}

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str) -> Result<companies::Model, DbErr> {
        companies::ActiveModel {
            id: Set(CompanyId::new().into()),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Lists all company IDs, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_ids(&self) -> Result<Vec<CompanyId>, DbErr> {
        let ids: Vec<Uuid> = companies::Entity::find()
            .select_only()
            .column(companies::Column::Id)
            .order_by_asc(companies::Column::CreatedAt)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(ids.into_iter().map(CompanyId::from_uuid).collect())
    }

    /// Registers a bank account for a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_bank_account(
        &self,
        company_id: CompanyId,
        input: CreateBankAccountInput,
    ) -> Result<bank_accounts::Model, DbErr> {
        bank_accounts::ActiveModel {
            id: Set(BankAccountId::new().into()),
            company_id: Set(company_id.into()),
            name: Set(input.name),
            mask: Set(input.mask),
            account_kind: Set(input.kind.as_str().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Finds a bank account within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_bank_account(
        &self,
        company_id: CompanyId,
        bank_account_id: BankAccountId,
    ) -> Result<Option<bank_accounts::Model>, DbErr> {
        bank_accounts::Entity::find_by_id(bank_account_id.into_inner())
            .filter(bank_accounts::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
    }
}

/// Builds the mapper input for a bank account row.
#[must_use]
pub fn bank_account_info(model: &bank_accounts::Model) -> BankAccountInfo {
    BankAccountInfo {
        id: model.id.into(),
        name: model.name.clone(),
        mask: model.mask.clone(),
        kind: BankAccountKind::parse(&model.account_kind),
    }
}
