//! Shared types used across the back-office crates.

pub mod money;
pub mod types;

pub use money::{Money, parse_amount};
pub use types::CustomerId;
