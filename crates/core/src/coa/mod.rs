//! Chart of accounts.
//!
//! Account classification and the mapping from bank accounts to the ledger
//! account that represents them.

pub mod mapper;
pub mod types;

pub use mapper::{BankAccountInfo, BankAccountKind, BankAccountMapper, BankLedgerAccount};
pub use types::{AccountType, NormalBalance};
