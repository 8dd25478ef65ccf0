//! Entity prelude.

pub use super::bank_accounts::Entity as BankAccounts;
pub use super::bank_transactions::Entity as BankTransactions;
pub use super::chart_of_accounts::Entity as ChartOfAccounts;
pub use super::companies::Entity as Companies;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_lines::Entity as JournalLines;
pub use super::reconciliations::Entity as Reconciliations;
pub use super::recurring_entries::Entity as RecurringEntries;
