//! Initial database migration.
//!
//! Creates the enums and tables for companies, bank accounts, the chart of
//! accounts, bank transactions, journal entries and lines, reconciliations,
//! and recurring entry templates.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANTS & BANK ACCOUNTS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(CHART_OF_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 4: RECONCILIATION & BANK TRANSACTIONS
        // ============================================================
        db.execute_unprepared(RECONCILIATIONS_SQL).await?;
        db.execute_unprepared(BANK_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 6: RECURRING ENTRIES
        // ============================================================
        db.execute_unprepared(RECURRING_ENTRIES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('asset', 'liability', 'equity', 'income', 'expense');

-- Bank transaction: has it been booked?
CREATE TYPE ledger_status AS ENUM ('pending', 'posted', 'excluded');

-- Bank transaction: has it been matched to a statement?
CREATE TYPE clearing_status AS ENUM ('uncleared', 'cleared', 'reconciled');

CREATE TYPE entry_source AS ENUM ('manual', 'auto', 'plaid', 'recurring', 'ai');

CREATE TYPE journal_entry_type AS ENUM ('standard', 'adjusting', 'reversing', 'opening', 'closing');

CREATE TYPE reconciliation_status AS ENUM ('in_progress', 'completed');

CREATE TYPE recurring_frequency AS ENUM ('weekly', 'biweekly', 'monthly', 'quarterly', 'annually');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    mask VARCHAR(10),
    account_kind VARCHAR(50) NOT NULL DEFAULT 'depository',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_bank_accounts_company ON bank_accounts(company_id);
";

const CHART_OF_ACCOUNTS_SQL: &str = r"
CREATE TABLE chart_of_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    system_generated BOOLEAN NOT NULL DEFAULT false,
    bank_account_id UUID REFERENCES bank_accounts(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (company_id, code),
    -- At most one ledger account per bank account
    UNIQUE (company_id, bank_account_id)
);

CREATE INDEX idx_coa_company ON chart_of_accounts(company_id) WHERE is_active = true;
CREATE INDEX idx_coa_type ON chart_of_accounts(company_id, account_type);
";

const RECONCILIATIONS_SQL: &str = r"
CREATE TABLE reconciliations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id) ON DELETE CASCADE,
    statement_date DATE NOT NULL,
    statement_balance NUMERIC(19, 4) NOT NULL,
    book_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    difference NUMERIC(19, 4) NOT NULL,
    status reconciliation_status NOT NULL DEFAULT 'in_progress',
    completed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_completed_at CHECK ((status = 'completed') = (completed_at IS NOT NULL))
);

-- One open session per bank account
CREATE UNIQUE INDEX idx_reconciliations_open
    ON reconciliations(bank_account_id) WHERE status = 'in_progress';
CREATE INDEX idx_reconciliations_company ON reconciliations(company_id, bank_account_id);
";

const BANK_TRANSACTIONS_SQL: &str = r"
CREATE TABLE bank_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id) ON DELETE CASCADE,
    date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    description VARCHAR(500) NOT NULL,
    merchant VARCHAR(255),
    category_id UUID REFERENCES chart_of_accounts(id),
    ledger_status ledger_status NOT NULL DEFAULT 'pending',
    reconciliation_status clearing_status NOT NULL DEFAULT 'uncleared',
    reconciliation_id UUID REFERENCES reconciliations(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_posted_has_category CHECK (ledger_status <> 'posted' OR category_id IS NOT NULL)
);

CREATE INDEX idx_bank_txn_account_date ON bank_transactions(bank_account_id, date);
CREATE INDEX idx_bank_txn_reconciliation ON bank_transactions(reconciliation_id)
    WHERE reconciliation_id IS NOT NULL;
CREATE INDEX idx_bank_txn_company_status ON bank_transactions(company_id, ledger_status);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    entry_date DATE NOT NULL,
    memo VARCHAR(500),
    source entry_source NOT NULL DEFAULT 'manual',
    entry_type journal_entry_type NOT NULL DEFAULT 'standard',
    -- At most one synchronized entry per bank transaction
    transaction_id UUID UNIQUE REFERENCES bank_transactions(id) ON DELETE CASCADE,
    posted BOOLEAN NOT NULL DEFAULT false,
    reversal_of_id UUID REFERENCES journal_entries(id),
    reversed_by_id UUID REFERENCES journal_entries(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_je_company_date ON journal_entries(company_id, entry_date);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES chart_of_accounts(id),
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    memo VARCHAR(500),
    line_order INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT chk_debit_or_credit CHECK (
        debit >= 0 AND credit >= 0 AND ((debit = 0) <> (credit = 0))
    )
);

CREATE INDEX idx_jl_entry ON journal_lines(journal_entry_id);
CREATE INDEX idx_jl_account ON journal_lines(account_id);
";

const RECURRING_ENTRIES_SQL: &str = r"
CREATE TABLE recurring_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    memo VARCHAR(500),
    frequency recurring_frequency NOT NULL,
    start_date DATE NOT NULL,
    next_run_date DATE NOT NULL,
    end_date DATE,
    auto_post BOOLEAN NOT NULL DEFAULT false,
    run_count INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    lines JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_recurring_end CHECK (end_date IS NULL OR end_date >= start_date),
    CONSTRAINT chk_recurring_run_count CHECK (run_count >= 0)
);

CREATE INDEX idx_recurring_due ON recurring_entries(company_id, next_run_date) WHERE is_active = true;
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS recurring_entries CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS bank_transactions CASCADE;
DROP TABLE IF EXISTS reconciliations CASCADE;
DROP TABLE IF EXISTS chart_of_accounts CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP TYPE IF EXISTS recurring_frequency;
DROP TYPE IF EXISTS reconciliation_status;
DROP TYPE IF EXISTS journal_entry_type;
DROP TYPE IF EXISTS entry_source;
DROP TYPE IF EXISTS clearing_status;
DROP TYPE IF EXISTS ledger_status;
DROP TYPE IF EXISTS account_type;
";
