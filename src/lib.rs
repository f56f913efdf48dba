//! economy_pay Library
//!
//! Taxed player-to-player payments: donor-rank discounts, a lottery share
//! of the tax, a confirmation step and two-leg settlement against the
//! host economy service.

pub mod confirmation;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod ledger;
pub mod permissions;
pub mod policy;
pub mod pot;

mod error;

pub use config::{Config, ConfigError};
pub use confirmation::{ConfirmationGate, ConfirmationStatus, Decision};
pub use domain::{Amount, AmountError, Balance, DomainError, DonorRank, Player, PlayerId};
pub use domain::{RejectionReason, SettlementError};
pub use error::{AppError, AppResult};
pub use handlers::{ConfirmationPrompt, PayCommand, PayHandler, PayReceipt, PaymentQuote};
pub use ledger::{InMemoryLedger, Ledger, LedgerError};
pub use permissions::{PermissionSource, StaticPermissions};
pub use policy::{ApprovedTransfer, SettlementResult, TransferOutcome, TransferPolicy, TransferRequest};
pub use pot::{LotteryPot, PotSink};
