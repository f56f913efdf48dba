//! Pay Handler
//!
//! Runs a `/pay` command end to end: quote, confirmation, re-check and
//! settlement.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::config::Config;
use crate::confirmation::{ConfirmationGate, ConfirmationStatus};
use crate::domain::DonorRank;
use crate::error::AppError;
use crate::ledger::Ledger;
use crate::permissions::PermissionSource;
use crate::policy::{SettlementResult, TransferOutcome, TransferPolicy, TransferRequest};
use crate::pot::PotSink;

use super::{PayCommand, PayReceipt, PaymentQuote};

/// Shows a quote to the sender and wires their yes/no answer to the gate
pub trait ConfirmationPrompt: Send + Sync {
    fn prompt(&self, quote: &PaymentQuote, gate: &ConfirmationGate);
}

// =========================================================================
// PayHandler
// =========================================================================

/// Handler for player payments
pub struct PayHandler {
    policy: TransferPolicy,
    permissions: Arc<dyn PermissionSource>,
    ledger: Arc<dyn Ledger>,
    pot: Arc<dyn PotSink>,
    prompt: Arc<dyn ConfirmationPrompt>,
    gate: ConfirmationGate,
    confirmation_timeout: Duration,
}

impl PayHandler {
    pub fn new(
        config: &Config,
        permissions: Arc<dyn PermissionSource>,
        ledger: Arc<dyn Ledger>,
        pot: Arc<dyn PotSink>,
        prompt: Arc<dyn ConfirmationPrompt>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            policy: TransferPolicy::from_config(config)?,
            permissions,
            ledger,
            pot,
            prompt,
            gate: ConfirmationGate::new(),
            confirmation_timeout: config.confirmation_timeout,
        })
    }

    /// Gate that answers for this handler's prompts
    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn policy(&self) -> &TransferPolicy {
        &self.policy
    }

    /// Parse the command and build the request the policy checks
    pub fn request(&self, command: &PayCommand) -> Result<TransferRequest, AppError> {
        let amount = Decimal::from_str(command.amount.trim())
            .map_err(|e| AppError::InvalidRequest(format!("Invalid amount: {}", e)))?;

        let rank = DonorRank::resolve(self.permissions.as_ref(), &command.sender.id);

        Ok(self
            .policy
            .request(command.sender.id, command.recipient.id, amount, rank))
    }

    fn validate(&self, request: &TransferRequest) -> TransferOutcome {
        self.policy
            .validate_transfer(request, self.permissions.as_ref(), self.ledger.as_ref())
    }

    /// Execute the pay command
    pub async fn execute(&self, command: PayCommand) -> Result<PayReceipt, AppError> {
        let request = self.request(&command)?;

        let approved = self.validate(&request).into_result().map_err(|reason| {
            tracing::warn!(
                sender = %command.sender.name,
                recipient = %command.recipient.name,
                amount = %request.amount,
                reason = reason.code(),
                "Payment rejected"
            );
            AppError::Rejected(reason)
        })?;

        let pending = self.gate.open(self.confirmation_timeout)?;
        let quote = PaymentQuote::new(
            &command,
            &approved,
            self.policy.currency(),
            pending.token(),
            pending.expires_at(),
        );
        self.prompt.prompt(&quote, &self.gate);

        match pending.wait().await {
            ConfirmationStatus::Accepted => {}
            ConfirmationStatus::Declined => {
                tracing::info!(
                    sender = %command.sender.name,
                    recipient = %command.recipient.name,
                    "Payment declined"
                );
                return Err(AppError::Declined);
            }
            ConfirmationStatus::Expired => {
                tracing::info!(
                    sender = %command.sender.name,
                    recipient = %command.recipient.name,
                    "Payment confirmation expired"
                );
                return Err(AppError::ConfirmationExpired);
            }
        }

        // Balances and blocks may have changed while the prompt was open
        let approved = self.validate(&request).into_result().map_err(|reason| {
            tracing::warn!(
                sender = %command.sender.name,
                reason = reason.code(),
                "Payment no longer valid after confirmation"
            );
            AppError::Rejected(reason)
        })?;

        match self
            .policy
            .authorize_and_settle(&approved, self.ledger.as_ref(), self.pot.as_ref())
        {
            SettlementResult::Success => {
                tracing::info!(
                    sender = %command.sender.name,
                    recipient = %command.recipient.name,
                    amount = %approved.amount.value(),
                    "{} has paid {} {} to {}",
                    command.sender.name,
                    approved.amount,
                    self.policy.currency(),
                    command.recipient.name
                );
                Ok(PayReceipt::from_quote(&quote))
            }
            SettlementResult::PartialFailure { tax_debited, error } => {
                Err(AppError::PartialSettlement {
                    tax_debited: tax_debited.value(),
                    source: error,
                })
            }
            SettlementResult::CompleteFailure { error } => Err(AppError::SettlementFailed(error)),
        }
    }
}
