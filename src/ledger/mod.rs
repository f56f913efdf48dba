//! Ledger module
//!
//! Account balances live in the host economy service. The [`Ledger`] trait
//! is the narrow surface the payment flow needs; each call is expected to
//! be atomic on its own, nothing more.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;

use crate::domain::{Amount, AmountError, Balance, PlayerId};

/// Ledger operation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(PlayerId),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Cannot transfer from an account to itself: {0}")]
    SameAccount(PlayerId),
}

/// Economy account service
pub trait Ledger: Send + Sync {
    /// Current balance of `account` in `currency`
    fn balance(&self, account: &PlayerId, currency: &str) -> Result<Balance, LedgerError>;

    /// Remove `amount` from `account` without crediting anyone
    fn debit(
        &self,
        account: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to`
    fn transfer(
        &self,
        from: &PlayerId,
        to: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError>;
}

impl<T: Ledger + ?Sized> Ledger for std::sync::Arc<T> {
    fn balance(&self, account: &PlayerId, currency: &str) -> Result<Balance, LedgerError> {
        (**self).balance(account, currency)
    }

    fn debit(
        &self,
        account: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError> {
        (**self).debit(account, currency, amount, reason)
    }

    fn transfer(
        &self,
        from: &PlayerId,
        to: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError> {
        (**self).transfer(from, to, currency, amount, reason)
    }
}

type AccountKey = (PlayerId, String);

/// In-process ledger keyed by player and currency
///
/// Accounts must be opened before use, mirroring an economy service that
/// only knows players it has seen.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: Mutex<HashMap<AccountKey, Balance>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or reset) an account with the given starting balance
    pub fn open_account(
        &self,
        account: PlayerId,
        currency: &str,
        initial: Decimal,
    ) -> Result<(), LedgerError> {
        let balance = Balance::new(initial)?;
        self.lock()?.insert((account, currency.to_string()), balance);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<AccountKey, Balance>>, LedgerError> {
        self.accounts
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))
    }
}

fn withdraw(
    accounts: &HashMap<AccountKey, Balance>,
    key: &AccountKey,
    amount: &Amount,
) -> Result<Balance, LedgerError> {
    let balance = accounts
        .get(key)
        .ok_or(LedgerError::AccountNotFound(key.0))?;

    if !balance.is_sufficient_for(amount) {
        return Err(LedgerError::InsufficientBalance {
            required: amount.value(),
            available: balance.value(),
        });
    }

    Ok(balance.debit(amount)?)
}

impl Ledger for InMemoryLedger {
    fn balance(&self, account: &PlayerId, currency: &str) -> Result<Balance, LedgerError> {
        self.lock()?
            .get(&(*account, currency.to_string()))
            .copied()
            .ok_or(LedgerError::AccountNotFound(*account))
    }

    fn debit(
        &self,
        account: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError> {
        let mut accounts = self.lock()?;
        let key = (*account, currency.to_string());
        let updated = withdraw(&accounts, &key, amount)?;
        accounts.insert(key, updated);

        tracing::debug!(account = %account, amount = %amount.value(), reason, "Ledger debit");
        Ok(())
    }

    fn transfer(
        &self,
        from: &PlayerId,
        to: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError> {
        if from == to {
            return Err(LedgerError::SameAccount(*from));
        }

        let mut accounts = self.lock()?;
        let from_key = (*from, currency.to_string());
        let to_key = (*to, currency.to_string());

        // Both sides are checked before either is written
        let debited = withdraw(&accounts, &from_key, amount)?;
        let credited = accounts
            .get(&to_key)
            .ok_or(LedgerError::AccountNotFound(*to))?
            .credit(amount)?;

        accounts.insert(from_key, debited);
        accounts.insert(to_key, credited);

        tracing::debug!(from = %from, to = %to, amount = %amount.value(), reason, "Ledger transfer");
        Ok(())
    }
}
