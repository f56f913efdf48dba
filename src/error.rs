//! Error handling module
//!
//! Centralized error type for the pay flow, with a stable code per variant
//! so the host can pick a message for each case.

use rust_decimal::Decimal;

use crate::confirmation::ConfirmationError;
use crate::domain::{DomainError, RejectionReason, SettlementError};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Sender-facing outcomes
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payment rejected: {0}")]
    Rejected(#[from] RejectionReason),

    #[error("Payment declined by sender")]
    Declined,

    #[error("Payment confirmation expired")]
    ConfirmationExpired,

    // Settlement faults
    #[error("Tax of {tax_debited} debited but the transfer failed: {source}")]
    PartialSettlement {
        tax_debited: Decimal,
        #[source]
        source: SettlementError,
    },

    #[error("Payment failed: {0}")]
    SettlementFailed(#[source] SettlementError),

    // Infrastructure
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable snake_case code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Rejected(reason) => reason.code(),
            AppError::Declined => "declined",
            AppError::ConfirmationExpired => "confirmation_expired",
            AppError::PartialSettlement { .. } => "partial_settlement",
            AppError::SettlementFailed(SettlementError::LedgerDebitFailed(_)) => {
                "ledger_debit_failed"
            }
            AppError::SettlementFailed(SettlementError::LedgerTransferFailed(_)) => {
                "ledger_transfer_failed"
            }
            AppError::Confirmation(ConfirmationError::UnknownToken(_)) => "unknown_token",
            AppError::Confirmation(ConfirmationError::Unavailable) => "confirmation_unavailable",
            AppError::Confirmation(ConfirmationError::TimeoutOutOfRange(_)) => {
                "confirmation_timeout_out_of_range"
            }
            AppError::Domain(DomainError::InvalidRank(_)) => "invalid_rank",
            AppError::Domain(DomainError::InvalidAmount(_)) => "invalid_amount",
            AppError::Domain(DomainError::InvalidPolicy(_)) => "invalid_policy",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Check if this was caused by the sender (nothing to compensate)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidRequest(_)
                | AppError::Rejected(_)
                | AppError::Declined
                | AppError::ConfirmationExpired
        )
    }

    /// Check if money left the sender without reaching the recipient
    pub fn needs_compensation(&self) -> bool {
        matches!(self, AppError::PartialSettlement { .. })
    }
}
