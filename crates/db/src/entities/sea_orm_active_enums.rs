//! `SeaORM` active enums mapped to Postgres enum types.
//!
//! Each enum converts to and from its domain counterpart in `tally-core`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::coa;
use tally_core::ledger;
use tally_core::reconciliation;
use tally_core::recurring;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_status")]
pub enum LedgerStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "excluded")]
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "clearing_status")]
pub enum ClearingStatus {
    #[sea_orm(string_value = "uncleared")]
    Uncleared,
    #[sea_orm(string_value = "cleared")]
    Cleared,
    #[sea_orm(string_value = "reconciled")]
    Reconciled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_source")]
pub enum EntrySource {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "auto")]
    Auto,
    #[sea_orm(string_value = "plaid")]
    Plaid,
    #[sea_orm(string_value = "recurring")]
    Recurring,
    #[sea_orm(string_value = "ai")]
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_entry_type")]
pub enum JournalEntryType {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "adjusting")]
    Adjusting,
    #[sea_orm(string_value = "reversing")]
    Reversing,
    #[sea_orm(string_value = "opening")]
    Opening,
    #[sea_orm(string_value = "closing")]
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reconciliation_status")]
pub enum ReconciliationStatus {
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "recurring_frequency")]
pub enum RecurringFrequency {
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "biweekly")]
    Biweekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "annually")]
    Annually,
}

macro_rules! map_enum {
    ($db:ident, $module:ident :: $domain:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $module::$domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$module::$domain> for $db {
            fn from(value: $module::$domain) -> Self {
                match value {
                    $($module::$domain::$variant => Self::$variant,)+
                }
            }
        }
    };
}

map_enum!(AccountType, coa::AccountType { Asset, Liability, Equity, Income, Expense });
map_enum!(LedgerStatus, ledger::LedgerStatus { Pending, Posted, Excluded });
map_enum!(ClearingStatus, ledger::ClearingStatus { Uncleared, Cleared, Reconciled });
map_enum!(EntrySource, ledger::EntrySource { Manual, Auto, Plaid, Recurring, Ai });
map_enum!(JournalEntryType, ledger::JournalEntryType {
    Standard, Adjusting, Reversing, Opening, Closing
});
map_enum!(ReconciliationStatus, reconciliation::ReconciliationStatus { InProgress, Completed });
map_enum!(RecurringFrequency, recurring::Frequency {
    Weekly, Biweekly, Monthly, Quarterly, Annually
});
