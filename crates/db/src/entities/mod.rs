//! `SeaORM` entity definitions.

pub mod prelude;

pub mod bank_accounts;
pub mod bank_transactions;
pub mod chart_of_accounts;
pub mod companies;
pub mod journal_entries;
pub mod journal_lines;
pub mod reconciliations;
pub mod recurring_entries;
pub mod sea_orm_active_enums;
