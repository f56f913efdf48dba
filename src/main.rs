//! pay_sim - run one taxed payment against in-memory collaborators
//!
//! Run with: cargo run -- <amount> [rank] [sender-balance] [--decline]
//!
//! Tax, minimum and lottery settings come from the environment (see
//! `Config::from_env`).

use std::sync::Arc;

use anyhow::Context;
use economy_pay::confirmation::{ConfirmationGate, Decision};
use economy_pay::pot::{CommandPotSink, ConsoleDispatcher};
use economy_pay::{
    AppError, Config, ConfirmationPrompt, DonorRank, InMemoryLedger, Ledger,
    PayCommand, PayHandler, PaymentQuote, Player, PlayerId, StaticPermissions,
};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "economy_pay=debug,pay_sim=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Console that only logs what it would run
struct LoggingConsole;

impl ConsoleDispatcher for LoggingConsole {
    fn dispatch(&self, command_line: &str) {
        tracing::info!(command = %command_line, "Console command");
    }
}

/// Prints the quote as JSON and answers straight away
struct AutoPrompt(Decision);

impl ConfirmationPrompt for AutoPrompt {
    fn prompt(&self, quote: &PaymentQuote, gate: &ConfirmationGate) {
        match serde_json::to_string_pretty(quote) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(error = %e, "Could not render quote"),
        }
        if let Err(e) = gate.respond(quote.token, self.0) {
            tracing::warn!(error = %e, "Could not answer prompt");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let decision = if args.iter().any(|a| a == "--decline") {
        Decision::Decline
    } else {
        Decision::Accept
    };
    let mut positional = args.iter().filter(|a| !a.starts_with("--"));

    let amount = positional.next().cloned().unwrap_or_else(|| "1000".to_string());
    let rank: DonorRank = positional
        .next()
        .map(|r| r.parse())
        .transpose()?
        .unwrap_or_default();
    let sender_balance: Decimal = positional
        .next()
        .map(|b| b.parse())
        .transpose()
        .context("sender balance must be a decimal")?
        .unwrap_or_else(|| Decimal::from(5000));

    let config = Config::from_env()?;
    tracing::info!(
        tax_rate = %config.tax_rate(),
        minimum = %config.min_transfer_amount,
        currency = %config.currency,
        "Loaded configuration"
    );

    let sender = Player::new(PlayerId::random(), "sender");
    let recipient = Player::new(PlayerId::random(), "recipient");

    let mut grants = StaticPermissions::new();
    if let Some(node) = rank.permission() {
        grants.grant(sender.id, node);
    }

    let ledger = Arc::new(InMemoryLedger::new());
    ledger.open_account(sender.id, &config.currency, sender_balance)?;
    ledger.open_account(recipient.id, &config.currency, Decimal::ZERO)?;

    let handler = PayHandler::new(
        &config,
        Arc::new(grants),
        ledger.clone(),
        Arc::new(CommandPotSink::new(LoggingConsole)),
        Arc::new(AutoPrompt(decision)),
    )?;

    match handler
        .execute(PayCommand::new(sender.clone(), recipient.clone(), amount))
        .await
    {
        Ok(receipt) => println!("{}", serde_json::to_string_pretty(&receipt)?),
        Err(e) if e.is_client_error() => {
            tracing::warn!(code = e.error_code(), "{}", e);
        }
        Err(e @ AppError::PartialSettlement { .. }) => {
            tracing::error!(code = e.error_code(), "{}", e);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }

    for player in [&sender, &recipient] {
        let balance = ledger.balance(&player.id, &config.currency)?;
        tracing::info!(player = %player.name, balance = %balance, "Final balance");
    }

    Ok(())
}
