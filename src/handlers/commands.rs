//! Command definitions
//!
//! Commands represent a player's intention; quotes and receipts are what
//! the host gets back to show them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DonorRank, Player};
use crate::policy::ApprovedTransfer;

// =========================================================================
// PayCommand
// =========================================================================

/// `/pay <player> <amount>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayCommand {
    pub sender: Player,
    pub recipient: Player,
    /// Amount as typed (string for precise decimal)
    pub amount: String,
}

impl PayCommand {
    pub fn new(sender: Player, recipient: Player, amount: impl Into<String>) -> Self {
        Self {
            sender,
            recipient,
            amount: amount.into(),
        }
    }
}

// =========================================================================
// PaymentQuote
// =========================================================================

/// What the sender is asked to confirm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentQuote {
    /// Single-use confirmation token
    pub token: Uuid,
    pub sender: Player,
    pub recipient: Player,
    pub amount: Decimal,
    pub tax: Decimal,
    pub rank: DonorRank,
    pub percent_off: u32,
    pub discount_saved: Decimal,
    pub lottery_contribution: u64,
    pub total_debit: Decimal,
    pub currency: String,
    pub expires_at: DateTime<Utc>,
}

impl PaymentQuote {
    pub fn new(
        command: &PayCommand,
        approved: &ApprovedTransfer,
        currency: &str,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            sender: command.sender.clone(),
            recipient: command.recipient.clone(),
            amount: approved.amount.value(),
            tax: approved.tax,
            rank: approved.sender_rank,
            percent_off: approved.sender_rank.percent_off(),
            discount_saved: approved.discount_saved,
            lottery_contribution: approved.lottery_contribution,
            total_debit: approved.total_debit,
            currency: currency.to_string(),
            expires_at,
        }
    }
}

// =========================================================================
// PayReceipt
// =========================================================================

/// Result of a settled payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayReceipt {
    pub payment_id: Uuid,
    pub sender: Player,
    pub recipient: Player,
    pub amount: Decimal,
    pub tax: Decimal,
    pub rank: DonorRank,
    pub lottery_contribution: u64,
    pub currency: String,
    pub settled_at: DateTime<Utc>,
}

impl PayReceipt {
    pub fn from_quote(quote: &PaymentQuote) -> Self {
        Self {
            payment_id: quote.token,
            sender: quote.sender.clone(),
            recipient: quote.recipient.clone(),
            amount: quote.amount,
            tax: quote.tax,
            rank: quote.rank,
            lottery_contribution: quote.lottery_contribution,
            currency: quote.currency.clone(),
            settled_at: Utc::now(),
        }
    }
}
