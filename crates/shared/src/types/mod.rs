//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{BALANCE_TOLERANCE, is_settled, round_money, within_tolerance};
