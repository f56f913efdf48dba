//! Domain Error Types
//!
//! Pure domain errors that don't depend on the host server.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AmountError;
use crate::ledger::LedgerError;

/// Why a payment was refused during validation.
///
/// Every reason is recoverable: it is reported back to the sender and
/// nothing has touched the ledger.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Below the configured minimum transfer amount
    #[error("Amount is below the minimum transfer amount")]
    AmountTooSmall,

    /// Zero or negative amount
    #[error("Amount must be positive")]
    InvalidAmount,

    /// Tax rate outside 0..=1
    #[error("Tax rate must be between 0 and 1")]
    InvalidTaxRate,

    /// Sender and recipient are the same player
    #[error("Cannot pay yourself")]
    SelfTransfer,

    /// Recipient is blocked from receiving payments
    #[error("Recipient is blocked from receiving payments")]
    RecipientBlocked,

    /// Sender is blocked from sending payments
    #[error("Sender is blocked from sending payments")]
    SenderBlocked,

    /// Sender cannot cover amount plus tax
    #[error("Insufficient funds to cover the payment and the tax")]
    InsufficientFunds,

    /// The ledger has no account for one of the players
    #[error("Account unavailable")]
    AccountUnavailable,
}

impl RejectionReason {
    /// Stable code for host-side messaging
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::AmountTooSmall => "amount_too_small",
            RejectionReason::InvalidAmount => "invalid_amount",
            RejectionReason::InvalidTaxRate => "invalid_tax_rate",
            RejectionReason::SelfTransfer => "self_transfer",
            RejectionReason::RecipientBlocked => "recipient_blocked",
            RejectionReason::SenderBlocked => "sender_blocked",
            RejectionReason::InsufficientFunds => "insufficient_funds",
            RejectionReason::AccountUnavailable => "account_unavailable",
        }
    }
}

/// Errors raised while executing an approved payment against the ledger
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettlementError {
    /// The tax debit leg failed; nothing was moved
    #[error("Tax debit failed: {0}")]
    LedgerDebitFailed(#[source] LedgerError),

    /// The principal transfer leg failed
    #[error("Transfer failed: {0}")]
    LedgerTransferFailed(#[source] LedgerError),
}

impl SettlementError {
    pub fn ledger_error(&self) -> &LedgerError {
        match self {
            SettlementError::LedgerDebitFailed(e) | SettlementError::LedgerTransferFailed(e) => e,
        }
    }
}

/// Programming and input errors in the domain layer
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Rank name outside the known tiers
    #[error("Invalid donor rank: {0}")]
    InvalidRank(String),

    /// Amount could not be represented on the ledger
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Policy configuration out of range
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),
}
