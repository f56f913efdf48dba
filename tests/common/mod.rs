//! Common test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use economy_pay::confirmation::{ConfirmationGate, Decision};
use economy_pay::{
    Amount, Balance, Config, ConfirmationPrompt, InMemoryLedger, Ledger, LedgerError, LotteryPot,
    PayHandler, PaymentQuote, Player, PlayerId, StaticPermissions,
};
use rust_decimal::Decimal;

pub const CURRENCY: &str = "BacoBits";

/// How the test prompt answers
#[derive(Clone, Copy)]
pub enum Reply {
    Accept,
    Decline,
    Ignore,
}

/// Prompt that records every quote and answers immediately
pub struct ScriptedPrompt {
    reply: Reply,
    pub quotes: Mutex<Vec<PaymentQuote>>,
}

impl ScriptedPrompt {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            quotes: Mutex::new(Vec::new()),
        }
    }

    pub fn last_quote(&self) -> Option<PaymentQuote> {
        self.quotes.lock().unwrap().last().cloned()
    }
}

impl ConfirmationPrompt for ScriptedPrompt {
    fn prompt(&self, quote: &PaymentQuote, gate: &ConfirmationGate) {
        self.quotes.lock().unwrap().push(quote.clone());
        let decision = match self.reply {
            Reply::Accept => Decision::Accept,
            Reply::Decline => Decision::Decline,
            Reply::Ignore => return,
        };
        gate.respond(quote.token, decision).unwrap();
    }
}

/// Ledger wrapper that can be told to fail transfers
pub struct FlakyLedger {
    pub inner: InMemoryLedger,
    pub fail_transfers: Mutex<bool>,
}

impl FlakyLedger {
    pub fn new(inner: InMemoryLedger) -> Self {
        Self {
            inner,
            fail_transfers: Mutex::new(false),
        }
    }

    pub fn fail_transfers(&self) {
        *self.fail_transfers.lock().unwrap() = true;
    }
}

impl Ledger for FlakyLedger {
    fn balance(&self, account: &PlayerId, currency: &str) -> Result<Balance, LedgerError> {
        self.inner.balance(account, currency)
    }

    fn debit(
        &self,
        account: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError> {
        self.inner.debit(account, currency, amount, reason)
    }

    fn transfer(
        &self,
        from: &PlayerId,
        to: &PlayerId,
        currency: &str,
        amount: &Amount,
        reason: &str,
    ) -> Result<(), LedgerError> {
        if *self.fail_transfers.lock().unwrap() {
            return Err(LedgerError::Unavailable("economy service offline".to_string()));
        }
        self.inner.transfer(from, to, currency, amount, reason)
    }
}

/// Everything a pay flow test needs
pub struct World {
    pub alice: Player,
    pub bob: Player,
    pub permissions: StaticPermissions,
    pub ledger: Arc<FlakyLedger>,
    pub pot: Arc<LotteryPot>,
    pub prompt: Arc<ScriptedPrompt>,
}

impl World {
    /// Alice starts with `alice_balance`, Bob with nothing
    pub fn new(alice_balance: Decimal, reply: Reply) -> Self {
        let alice = Player::new(PlayerId::random(), "alice");
        let bob = Player::new(PlayerId::random(), "bob");

        let ledger = InMemoryLedger::new();
        ledger.open_account(alice.id, CURRENCY, alice_balance).unwrap();
        ledger.open_account(bob.id, CURRENCY, Decimal::ZERO).unwrap();

        Self {
            alice,
            bob,
            permissions: StaticPermissions::new(),
            ledger: Arc::new(FlakyLedger::new(ledger)),
            pot: Arc::new(LotteryPot::new()),
            prompt: Arc::new(ScriptedPrompt::new(reply)),
        }
    }

    pub fn handler(&self) -> PayHandler {
        self.handler_with(Config::default())
    }

    pub fn handler_with(&self, config: Config) -> PayHandler {
        PayHandler::new(
            &config,
            Arc::new(self.permissions.clone()),
            self.ledger.clone(),
            self.pot.clone(),
            self.prompt.clone(),
        )
        .unwrap()
    }

    pub fn balance(&self, player: &Player) -> Decimal {
        self.ledger.balance(&player.id, CURRENCY).unwrap().value()
    }
}
