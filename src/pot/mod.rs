//! Lottery pot
//!
//! A share of every collected tax is handed to the server lottery. The pot
//! belongs to another plugin, so contributions are fire-and-forget.

use std::sync::atomic::{AtomicU64, Ordering};

/// Receives lottery contributions
pub trait PotSink: Send + Sync {
    fn add_to_pot(&self, amount: u64);
}

impl<T: PotSink + ?Sized> PotSink for std::sync::Arc<T> {
    fn add_to_pot(&self, amount: u64) {
        (**self).add_to_pot(amount)
    }
}

/// In-process pot accumulator
#[derive(Debug, Default)]
pub struct LotteryPot {
    total: AtomicU64,
    contributions: AtomicU64,
}

impl LotteryPot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of everything added so far
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of contributions received
    pub fn contributions(&self) -> u64 {
        self.contributions.load(Ordering::SeqCst)
    }
}

impl PotSink for LotteryPot {
    fn add_to_pot(&self, amount: u64) {
        self.total.fetch_add(amount, Ordering::SeqCst);
        self.contributions.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runs a command line on the server console
pub trait ConsoleDispatcher: Send + Sync {
    fn dispatch(&self, command_line: &str);
}

/// Pot sink that drives the lottery plugin through its console command
#[derive(Debug)]
pub struct CommandPotSink<D> {
    dispatcher: D,
}

impl<D: ConsoleDispatcher> CommandPotSink<D> {
    pub fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }

    /// Console command for a contribution
    pub fn command_line(amount: u64) -> String {
        format!("lot addpot {}", amount)
    }
}

impl<D: ConsoleDispatcher> PotSink for CommandPotSink<D> {
    fn add_to_pot(&self, amount: u64) {
        let command_line = Self::command_line(amount);
        tracing::debug!(command = %command_line, "Dispatching lottery contribution");
        self.dispatcher.dispatch(&command_line);
    }
}
