//! Core ledger logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; the `db`
//! crate wraps them in database transactions.
//!
//! # Modules
//!
//! - `coa` - Chart-of-account mapping for bank accounts
//! - `ledger` - Journal entries, balance invariant, transaction sync, reversals
//! - `reconciliation` - Statement reconciliation and match suggestions
//! - `recurring` - Recurring journal templates and their schedule
//! - `audit` - Structured "what changed" facts

pub mod audit;
pub mod coa;
pub mod ledger;
pub mod reconciliation;
pub mod recurring;
