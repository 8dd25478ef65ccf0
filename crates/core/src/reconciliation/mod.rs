//! Bank-statement reconciliation.
//!
//! - Session lifecycle: start, toggle cleared, finish, delete
//! - Book balance and difference recomputation
//! - Deterministic match suggestions

pub mod engine;
pub mod error;
pub mod matching;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::ReconciliationEngine;
pub use error::ReconciliationError;
pub use matching::{MatchConfidence, MatchSuggester, MatchSuggestion};
pub use types::{
    FinishOutcome, Reconciliation, ReconciliationStatus, ReconciliationSummary, ToggleOutcome,
};
