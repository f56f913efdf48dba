//! Command Handlers module
//!
//! Handlers coordinate the policy, the confirmation gate and the host
//! collaborators for one player command.

mod commands;
mod pay_handler;

pub use commands::*;
pub use pay_handler::{ConfirmationPrompt, PayHandler};
