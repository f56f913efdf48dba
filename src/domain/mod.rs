//! Domain module
//!
//! Core domain types for taxed payments.

pub mod amount;
pub mod error;
pub mod player;
pub mod rank;

pub use amount::{Amount, AmountError, Balance};
pub use error::{DomainError, RejectionReason, SettlementError};
pub use player::{Player, PlayerId};
pub use rank::DonorRank;
