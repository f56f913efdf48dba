//! Transfer Policy
//!
//! Tax, donor discount and lottery arithmetic for player payments, the
//! validation that decides whether a payment may go ahead, and the two-leg
//! settlement against the ledger.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::Config;
use crate::domain::amount::MAX_SCALE;
use crate::domain::{Amount, DomainError, DonorRank, PlayerId, RejectionReason, SettlementError};
use crate::ledger::Ledger;
use crate::permissions::PermissionSource;
use crate::pot::PotSink;

/// Ledger reason attached to the tax debit
pub const TAX_REASON: &str = "pay tax";
/// Ledger reason attached to the principal transfer
pub const TRANSFER_REASON: &str = "pay";

/// A payment as asked for, before any checks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub sender: PlayerId,
    pub recipient: PlayerId,
    /// Base amount the recipient should receive
    pub amount: Decimal,
    /// Configured tax rate as a fraction
    pub tax_rate: Decimal,
    pub sender_rank: DonorRank,
}

/// A payment that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovedTransfer {
    pub sender: PlayerId,
    pub recipient: PlayerId,
    pub amount: Amount,
    pub sender_rank: DonorRank,
    /// Tax after the donor discount
    pub tax: Decimal,
    /// Tax the donor discount waived
    pub discount_saved: Decimal,
    pub lottery_contribution: u64,
    /// amount + tax
    pub total_debit: Decimal,
}

/// Validation verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferOutcome {
    Approved(ApprovedTransfer),
    Rejected { reason: RejectionReason },
}

impl TransferOutcome {
    fn rejected(reason: RejectionReason) -> Self {
        TransferOutcome::Rejected { reason }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, TransferOutcome::Approved(_))
    }

    pub fn approved(&self) -> Option<&ApprovedTransfer> {
        match self {
            TransferOutcome::Approved(approved) => Some(approved),
            TransferOutcome::Rejected { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            TransferOutcome::Approved(_) => None,
            TransferOutcome::Rejected { reason } => Some(*reason),
        }
    }

    pub fn into_result(self) -> Result<ApprovedTransfer, RejectionReason> {
        match self {
            TransferOutcome::Approved(approved) => Ok(approved),
            TransferOutcome::Rejected { reason } => Err(reason),
        }
    }
}

/// Result of executing an approved payment
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementResult {
    /// Tax debited and principal transferred
    Success,
    /// Tax was debited but the principal transfer failed; the sender is out
    /// of pocket by `tax_debited` until the caller compensates
    PartialFailure {
        tax_debited: Amount,
        error: SettlementError,
    },
    /// Nothing was moved
    CompleteFailure { error: SettlementError },
}

impl SettlementResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SettlementResult::Success)
    }
}

/// Payment rules
#[derive(Debug, Clone)]
pub struct TransferPolicy {
    tax_rate: Decimal,
    min_transfer_amount: Decimal,
    lottery_share: Decimal,
    currency: String,
    block_permission: String,
    override_permission: String,
}

impl TransferPolicy {
    /// Build the policy from configuration.
    ///
    /// # Errors
    /// `DomainError::InvalidPolicy` if a rate is outside 0..=1 or the
    /// minimum is negative.
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        let unit = Decimal::ZERO..=Decimal::ONE;

        let tax_rate = config.tax_rate();
        if !unit.contains(&tax_rate) {
            return Err(DomainError::InvalidPolicy(format!(
                "tax rate {} outside 0..=1",
                tax_rate
            )));
        }

        let lottery_share = config.lottery_share();
        if !unit.contains(&lottery_share) {
            return Err(DomainError::InvalidPolicy(format!(
                "lottery share {} outside 0..=1",
                lottery_share
            )));
        }

        if config.min_transfer_amount < Decimal::ZERO {
            return Err(DomainError::InvalidPolicy(
                "minimum transfer amount is negative".to_string(),
            ));
        }

        Ok(Self {
            tax_rate,
            min_transfer_amount: config.min_transfer_amount,
            lottery_share,
            currency: config.currency.clone(),
            block_permission: config.block_payments_permission.clone(),
            override_permission: config.override_permission.clone(),
        })
    }

    /// Configured tax rate as a fraction
    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Build a request carrying this policy's tax rate
    pub fn request(
        &self,
        sender: PlayerId,
        recipient: PlayerId,
        amount: Decimal,
        sender_rank: DonorRank,
    ) -> TransferRequest {
        TransferRequest {
            sender,
            recipient,
            amount,
            tax_rate: self.tax_rate,
            sender_rank,
        }
    }

    /// Tax owed on `amount`: amount × rate × (1 − discount).
    ///
    /// Full precision; callers round when presenting or debiting.
    pub fn compute_tax(amount: Decimal, tax_rate: Decimal, rank: DonorRank) -> Decimal {
        amount * tax_rate * (Decimal::ONE - rank.discount_fraction())
    }

    /// Whole units of `tax` sent to the lottery pot, truncated
    pub fn compute_lottery_contribution(&self, tax: Decimal) -> u64 {
        (tax * self.lottery_share)
            .floor()
            .to_u64()
            .unwrap_or_default()
    }

    /// Decide whether `request` may be settled.
    ///
    /// Checks run in a fixed order and stop at the first failure, so the
    /// sender always sees the same reason for the same situation.
    pub fn validate_transfer<P, L>(
        &self,
        request: &TransferRequest,
        permissions: &P,
        ledger: &L,
    ) -> TransferOutcome
    where
        P: PermissionSource + ?Sized,
        L: Ledger + ?Sized,
    {
        // Only whole units count towards the minimum
        if request.amount.trunc() < self.min_transfer_amount {
            return TransferOutcome::rejected(RejectionReason::AmountTooSmall);
        }

        if request.amount <= Decimal::ZERO {
            return TransferOutcome::rejected(RejectionReason::InvalidAmount);
        }
        let amount = match Amount::new(request.amount) {
            Ok(amount) => amount,
            Err(_) => return TransferOutcome::rejected(RejectionReason::InvalidAmount),
        };

        // Keeps the effective tax between zero and the amount itself
        if request.tax_rate < Decimal::ZERO || request.tax_rate > Decimal::ONE {
            return TransferOutcome::rejected(RejectionReason::InvalidTaxRate);
        }

        if request.sender == request.recipient {
            return TransferOutcome::rejected(RejectionReason::SelfTransfer);
        }

        if self.is_payment_blocked(permissions, &request.recipient) {
            return TransferOutcome::rejected(RejectionReason::RecipientBlocked);
        }

        if self.is_payment_blocked(permissions, &request.sender) {
            return TransferOutcome::rejected(RejectionReason::SenderBlocked);
        }

        let balance = match ledger.balance(&request.sender, &self.currency) {
            Ok(balance) => balance,
            Err(_) => return TransferOutcome::rejected(RejectionReason::AccountUnavailable),
        };
        if ledger.balance(&request.recipient, &self.currency).is_err() {
            return TransferOutcome::rejected(RejectionReason::AccountUnavailable);
        }

        let tax = to_ledger_scale(Self::compute_tax(
            amount.value(),
            request.tax_rate,
            request.sender_rank,
        ));
        let total_debit = amount.value() + tax;

        if balance.value() < total_debit {
            return TransferOutcome::rejected(RejectionReason::InsufficientFunds);
        }

        let undiscounted = to_ledger_scale(Self::compute_tax(
            amount.value(),
            request.tax_rate,
            DonorRank::None,
        ));

        TransferOutcome::Approved(ApprovedTransfer {
            sender: request.sender,
            recipient: request.recipient,
            amount,
            sender_rank: request.sender_rank,
            tax,
            discount_saved: undiscounted - tax,
            lottery_contribution: self.compute_lottery_contribution(tax),
            total_debit,
        })
    }

    /// Execute an approved payment: debit the tax, then transfer the amount.
    ///
    /// The two ledger calls are not atomic together. A failure between
    /// them is reported as `PartialFailure` and left to the caller.
    pub fn authorize_and_settle<L, S>(
        &self,
        approved: &ApprovedTransfer,
        ledger: &L,
        pot: &S,
    ) -> SettlementResult
    where
        L: Ledger + ?Sized,
        S: PotSink + ?Sized,
    {
        // Tax is sunk: debited with no matching credit
        let tax_debited = if approved.tax > Decimal::ZERO {
            let tax = match Amount::rounded(approved.tax) {
                Ok(tax) => tax,
                Err(e) => {
                    return SettlementResult::CompleteFailure {
                        error: SettlementError::LedgerDebitFailed(e.into()),
                    }
                }
            };
            if let Err(e) = ledger.debit(&approved.sender, &self.currency, &tax, TAX_REASON) {
                tracing::warn!(
                    sender = %approved.sender,
                    tax = %tax.value(),
                    error = %e,
                    "Tax debit failed, nothing settled"
                );
                return SettlementResult::CompleteFailure {
                    error: SettlementError::LedgerDebitFailed(e),
                };
            }
            Some(tax)
        } else {
            None
        };

        if let Err(e) = ledger.transfer(
            &approved.sender,
            &approved.recipient,
            &self.currency,
            &approved.amount,
            TRANSFER_REASON,
        ) {
            let error = SettlementError::LedgerTransferFailed(e);
            return match tax_debited {
                Some(tax_debited) => {
                    tracing::error!(
                        sender = %approved.sender,
                        recipient = %approved.recipient,
                        amount = %approved.amount.value(),
                        tax = %tax_debited.value(),
                        error = %error,
                        "Tax debited but transfer failed"
                    );
                    SettlementResult::PartialFailure { tax_debited, error }
                }
                None => SettlementResult::CompleteFailure { error },
            };
        }

        if approved.lottery_contribution > 0 {
            pot.add_to_pot(approved.lottery_contribution);
        }

        tracing::info!(
            sender = %approved.sender,
            recipient = %approved.recipient,
            amount = %approved.amount.value(),
            tax = %approved.tax,
            lottery = approved.lottery_contribution,
            "Payment settled"
        );

        SettlementResult::Success
    }

    fn is_payment_blocked<P>(&self, permissions: &P, player: &PlayerId) -> bool
    where
        P: PermissionSource + ?Sized,
    {
        permissions.has_capability(player, &self.block_permission)
            && !permissions.has_capability(player, &self.override_permission)
    }
}

fn to_ledger_scale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MAX_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
