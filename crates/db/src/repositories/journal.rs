//! Journal entry repository.
//!
//! Manual entries (create, edit, post, delete drafts), reversals, and account
//! balances. The header/line persistence helpers are shared with the bank
//! transaction and recurring repositories so every writer goes through the
//! same code.

use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    TransactionTrait,
};
use tally_core::audit::AuditEvent;
use tally_core::ledger::{
    AccountBalance, BalanceLine, EntrySource, JournalEntry, JournalEntryType, JournalLine,
    LedgerError, PeriodWindow, ReversalOutcome, ReversalService, period_balance,
};
use tally_shared::types::{ChartOfAccountId, CompanyId, JournalEntryId, TransactionId};

use super::chart_of_account::ChartOfAccountRepository;
use super::ledger_db;
use super::mapping;
use crate::entities::{journal_entries, journal_lines};

/// Input for creating a manual journal entry.
#[derive(Debug, Clone)]
pub struct CreateJournalEntryInput {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Memo.
    pub memo: Option<String>,
    /// Accounting purpose.
    pub entry_type: JournalEntryType,
    /// Lines.
    pub lines: Vec<JournalLine>,
    /// Post immediately instead of saving a draft.
    pub post: bool,
}

/// Result of reversing an entry.
#[derive(Debug, Clone)]
pub struct ReversedEntry {
    /// The original entry, now linked to its reversal.
    pub original: JournalEntry,
    /// The new reversing entry.
    pub reversal: JournalEntry,
    /// Audit fact for the reversal.
    pub audit: AuditEvent,
}

/// Journal entry repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a manual entry, posted or as a draft.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown or inactive accounts, a line
    /// validation error, or a posting error if `post` is set and the lines
    /// do not balance.
    pub async fn create_manual(
        &self,
        company_id: CompanyId,
        input: CreateJournalEntryInput,
    ) -> Result<JournalEntry, LedgerError> {
        let mut entry = JournalEntry::draft(
            company_id,
            input.entry_date,
            EntrySource::Manual,
            input.entry_type,
        );
        entry.memo = input.memo;
        entry.replace_lines(input.lines)?;
        if input.post {
            entry.post()?;
        }

        let txn = self.db.begin().await.map_err(ledger_db)?;
        ChartOfAccountRepository::ensure_active(
            &txn,
            company_id,
            entry.lines.iter().map(|l| l.account_id),
        )
        .await?;
        Self::insert(&txn, &entry).await?;
        txn.commit().await.map_err(ledger_db)?;

        tracing::info!(
            company_id = %company_id,
            journal_entry_id = %entry.id,
            posted = entry.posted,
            "Created manual journal entry"
        );
        Ok(entry)
    }

    /// Gets an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry is not in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        Self::load(&self.db, company_id, entry_id, false).await
    }

    /// Replaces the lines of a draft entry.
    ///
    /// # Errors
    ///
    /// Returns `CannotModifyPosted` for posted or synchronized entries.
    pub async fn update_lines(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
        lines: Vec<JournalLine>,
    ) -> Result<JournalEntry, LedgerError> {
        let txn = self.db.begin().await.map_err(ledger_db)?;
        let mut entry = Self::load(&txn, company_id, entry_id, true).await?;
        // Synchronized entries follow their transaction only.
        if entry.is_synchronized() {
            return Err(LedgerError::CannotModifyPosted(entry_id));
        }
        entry.replace_lines(lines)?;
        ChartOfAccountRepository::ensure_active(
            &txn,
            company_id,
            entry.lines.iter().map(|l| l.account_id),
        )
        .await?;
        Self::save(&txn, &entry).await?;
        txn.commit().await.map_err(ledger_db)?;
        Ok(entry)
    }

    /// Posts a draft entry. Posting a posted entry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientLines` or `Unbalanced` if the entry cannot post.
    pub async fn post(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        let txn = self.db.begin().await.map_err(ledger_db)?;
        let mut entry = Self::load(&txn, company_id, entry_id, true).await?;
        if entry.posted {
            return Ok(entry);
        }
        entry.post()?;
        Self::save_header(&txn, &entry).await?;
        txn.commit().await.map_err(ledger_db)?;

        tracing::info!(company_id = %company_id, journal_entry_id = %entry_id, "Posted journal entry");
        Ok(entry)
    }

    /// Deletes an unposted entry and its lines.
    ///
    /// # Errors
    ///
    /// Returns `CannotModifyPosted` for posted entries.
    pub async fn delete_unposted(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
    ) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_err(ledger_db)?;
        let entry = Self::load(&txn, company_id, entry_id, true).await?;
        if entry.posted || entry.is_synchronized() {
            return Err(LedgerError::CannotModifyPosted(entry_id));
        }
        journal_entries::Entity::delete_by_id(entry_id.into_inner())
            .exec(&txn)
            .await
            .map_err(ledger_db)?;
        txn.commit().await.map_err(ledger_db)?;
        Ok(())
    }

    /// Reverses a posted entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is unposted, synchronized, already
    /// reversed, or `date` is before the original date.
    pub async fn reverse(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
        date: NaiveDate,
        memo: Option<String>,
    ) -> Result<ReversedEntry, LedgerError> {
        let txn = self.db.begin().await.map_err(ledger_db)?;
        let mut original = Self::load(&txn, company_id, entry_id, true).await?;
        let ReversalOutcome { reversal, audit } =
            ReversalService::reverse(&mut original, date, memo)?;

        Self::insert(&txn, &reversal).await?;
        Self::save_header(&txn, &original).await?;
        txn.commit().await.map_err(ledger_db)?;

        Ok(ReversedEntry {
            original,
            reversal,
            audit,
        })
    }

    /// Balance of an account over an optional date window, posted entries only.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is not in the company.
    pub async fn period_balance(
        &self,
        company_id: CompanyId,
        account_id: ChartOfAccountId,
        window: PeriodWindow,
    ) -> Result<AccountBalance, LedgerError> {
        #[derive(Debug, FromQueryResult)]
        struct LineRow {
            entry_date: NaiveDate,
            posted: bool,
            debit: rust_decimal::Decimal,
            credit: rust_decimal::Decimal,
        }

        let account = ChartOfAccountRepository::find_in(&self.db, company_id, account_id).await?;

        let mut query = journal_lines::Entity::find()
            .select_only()
            .column(journal_lines::Column::Debit)
            .column(journal_lines::Column::Credit)
            .column(journal_entries::Column::EntryDate)
            .column(journal_entries::Column::Posted)
            .join(JoinType::InnerJoin, journal_lines::Relation::JournalEntries.def())
            .filter(journal_lines::Column::AccountId.eq(account_id.into_inner()))
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .filter(journal_entries::Column::Posted.eq(true));
        if let Some(start) = window.start {
            query = query.filter(journal_entries::Column::EntryDate.gte(start));
        }
        if let Some(end) = window.end {
            query = query.filter(journal_entries::Column::EntryDate.lte(end));
        }

        let rows = query
            .into_model::<LineRow>()
            .all(&self.db)
            .await
            .map_err(ledger_db)?;
        let lines: Vec<BalanceLine> = rows
            .into_iter()
            .map(|r| BalanceLine {
                entry_date: r.entry_date,
                posted: r.posted,
                debit: r.debit,
                credit: r.credit,
            })
            .collect();

        Ok(period_balance(
            account_id,
            account.account_type.into(),
            &lines,
            window,
        ))
    }

    // ========== Shared persistence helpers ==========

    /// Loads an entry with its lines, optionally locking the header row.
    pub(crate) async fn load<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        entry_id: JournalEntryId,
        lock: bool,
    ) -> Result<JournalEntry, LedgerError> {
        let mut query = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()));
        if lock {
            query = query.lock_exclusive();
        }
        let header = query
            .one(conn)
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        Self::with_lines(conn, header).await
    }

    /// Loads and locks the entry synchronized with a transaction, if any.
    pub(crate) async fn find_by_transaction<C: ConnectionTrait>(
        conn: &C,
        transaction_id: TransactionId,
    ) -> Result<Option<JournalEntry>, LedgerError> {
        let header = journal_entries::Entity::find()
            .filter(journal_entries::Column::TransactionId.eq(transaction_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(ledger_db)?;
        match header {
            Some(header) => Ok(Some(Self::with_lines(conn, header).await?)),
            None => Ok(None),
        }
    }

    async fn with_lines<C: ConnectionTrait>(
        conn: &C,
        header: journal_entries::Model,
    ) -> Result<JournalEntry, LedgerError> {
        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(header.id))
            .order_by_asc(journal_lines::Column::LineOrder)
            .all(conn)
            .await
            .map_err(ledger_db)?;
        Ok(mapping::journal_entry(header, lines))
    }

    /// Inserts a new entry and its lines.
    pub(crate) async fn insert<C: ConnectionTrait>(
        conn: &C,
        entry: &JournalEntry,
    ) -> Result<(), LedgerError> {
        mapping::journal_entry_active(entry)
            .insert(conn)
            .await
            .map_err(ledger_db)?;
        Self::insert_lines(conn, entry).await
    }

    /// Updates the header and replaces all lines of an existing entry.
    pub(crate) async fn save<C: ConnectionTrait>(
        conn: &C,
        entry: &JournalEntry,
    ) -> Result<(), LedgerError> {
        Self::save_header(conn, entry).await?;
        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::JournalEntryId.eq(entry.id.into_inner()))
            .exec(conn)
            .await
            .map_err(ledger_db)?;
        Self::insert_lines(conn, entry).await
    }

    async fn save_header<C: ConnectionTrait>(
        conn: &C,
        entry: &JournalEntry,
    ) -> Result<(), LedgerError> {
        journal_entries::Entity::update_many()
            .col_expr(journal_entries::Column::EntryDate, Expr::value(entry.entry_date))
            .col_expr(journal_entries::Column::Memo, Expr::value(entry.memo.clone()))
            .col_expr(journal_entries::Column::Posted, Expr::value(entry.posted))
            .col_expr(
                journal_entries::Column::ReversedById,
                Expr::value(entry.reversed_by_id.map(|id| id.into_inner())),
            )
            .col_expr(
                journal_entries::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(journal_entries::Column::Id.eq(entry.id.into_inner()))
            .exec(conn)
            .await
            .map_err(ledger_db)?;
        Ok(())
    }

    async fn insert_lines<C: ConnectionTrait>(
        conn: &C,
        entry: &JournalEntry,
    ) -> Result<(), LedgerError> {
        let lines = mapping::journal_line_actives(entry);
        if lines.is_empty() {
            return Ok(());
        }
        journal_lines::Entity::insert_many(lines)
            .exec(conn)
            .await
            .map_err(ledger_db)?;
        Ok(())
    }

    /// Deletes the entry synchronized with a transaction. Returns true if one existed.
    pub(crate) async fn delete_by_transaction<C: ConnectionTrait>(
        conn: &C,
        transaction_id: TransactionId,
    ) -> Result<bool, LedgerError> {
        let result = journal_entries::Entity::delete_many()
            .filter(journal_entries::Column::TransactionId.eq(transaction_id.into_inner()))
            .exec(conn)
            .await
            .map_err(ledger_db)?;
        Ok(result.rows_affected > 0)
    }
}
