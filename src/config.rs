//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::permissions;

/// Longest confirmation wait accepted from the environment (one day)
pub const MAX_CONFIRMATION_TIMEOUT_SECS: u64 = 86_400;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Tax charged on payments, in percent
    pub tax_percentage: Decimal,

    /// Smallest payment accepted, in whole currency units
    pub min_transfer_amount: Decimal,

    /// Share of the collected tax sent to the lottery pot, in percent
    pub lottery_share_percentage: Decimal,

    /// How long a payment quote waits for the sender's answer
    pub confirmation_timeout: Duration,

    /// Ledger currency id
    pub currency: String,

    /// Permission node that blocks payments
    pub block_payments_permission: String,

    /// Permission node that overrides the block
    pub override_permission: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tax_percentage: Decimal::from(15),
            min_transfer_amount: Decimal::from(100),
            lottery_share_percentage: Decimal::from(10),
            confirmation_timeout: Duration::from_secs(60),
            currency: "BacoBits".to_string(),
            block_payments_permission: permissions::BLOCK_PAYMENTS.to_string(),
            override_permission: permissions::WILDCARD.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let tax_percentage = percentage("TAX_PERCENTAGE", defaults.tax_percentage)?;

        let min_transfer_amount =
            decimal_var("MIN_TRANSFER_AMOUNT", defaults.min_transfer_amount)?;
        if min_transfer_amount < Decimal::ZERO {
            return Err(ConfigError::InvalidValue("MIN_TRANSFER_AMOUNT"));
        }

        let lottery_share_percentage =
            percentage("LOTTERY_SHARE_PERCENTAGE", defaults.lottery_share_percentage)?;

        let confirmation_timeout = match env::var("CONFIRMATION_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("CONFIRMATION_TIMEOUT_SECS"))?;
                if secs > MAX_CONFIRMATION_TIMEOUT_SECS {
                    return Err(ConfigError::InvalidValue("CONFIRMATION_TIMEOUT_SECS"));
                }
                Duration::from_secs(secs)
            }
            Err(_) => defaults.confirmation_timeout,
        };

        let currency = env::var("CURRENCY").unwrap_or(defaults.currency);

        let block_payments_permission =
            env::var("BLOCK_PAYMENTS_PERMISSION").unwrap_or(defaults.block_payments_permission);

        let override_permission =
            env::var("OVERRIDE_PERMISSION").unwrap_or(defaults.override_permission);

        Ok(Self {
            tax_percentage,
            min_transfer_amount,
            lottery_share_percentage,
            confirmation_timeout,
            currency,
            block_payments_permission,
            override_permission,
        })
    }

    /// Configured tax as a fraction (15% -> 0.15)
    pub fn tax_rate(&self) -> Decimal {
        self.tax_percentage / Decimal::ONE_HUNDRED
    }

    /// Lottery share as a fraction (10% -> 0.10)
    pub fn lottery_share(&self) -> Decimal {
        self.lottery_share_percentage / Decimal::ONE_HUNDRED
    }
}

fn decimal_var(name: &'static str, default: Decimal) -> Result<Decimal, ConfigError> {
    match env::var(name) {
        Ok(raw) => Decimal::from_str(raw.trim()).map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(default),
    }
}

fn percentage(name: &'static str, default: Decimal) -> Result<Decimal, ConfigError> {
    let value = decimal_var(name, default)?;
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ConfigError::InvalidValue(name));
    }
    Ok(value)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
