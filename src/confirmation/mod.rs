//! Confirmation gate
//!
//! A payment is only settled after the sender answers a yes/no prompt.
//! Each prompt gets a single-use token; the first answer wins and any
//! later answer for the same token is refused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Sender's answer to a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Decline,
}

/// How a pending confirmation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Accepted,
    Declined,
    Expired,
}

/// Confirmation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfirmationError {
    #[error("Unknown or already used confirmation token: {0}")]
    UnknownToken(Uuid),

    #[error("Confirmation gate unavailable")]
    Unavailable,

    #[error("Confirmation timeout out of range: {0:?}")]
    TimeoutOutOfRange(Duration),
}

type Waiters = Arc<Mutex<HashMap<Uuid, oneshot::Sender<Decision>>>>;

/// Issues tokens and routes answers to whoever is waiting on them
#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    waiters: Waiters,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a prompt that expires after `timeout`
    pub fn open(&self, timeout: Duration) -> Result<PendingConfirmation, ConfirmationError> {
        let expires_at = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|timeout| Utc::now().checked_add_signed(timeout))
            .ok_or(ConfirmationError::TimeoutOutOfRange(timeout))?;

        let token = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        self.waiters
            .lock()
            .map_err(|_| ConfirmationError::Unavailable)?
            .insert(token, tx);

        Ok(PendingConfirmation {
            token,
            expires_at,
            timeout,
            receiver: Some(rx),
            waiters: Arc::clone(&self.waiters),
        })
    }

    /// Answer a prompt. Each token accepts exactly one answer.
    pub fn respond(&self, token: Uuid, decision: Decision) -> Result<(), ConfirmationError> {
        let sender = self
            .waiters
            .lock()
            .map_err(|_| ConfirmationError::Unavailable)?
            .remove(&token)
            .ok_or(ConfirmationError::UnknownToken(token))?;

        // The waiter may have timed out between removal and send
        sender
            .send(decision)
            .map_err(|_| ConfirmationError::UnknownToken(token))
    }

    /// Number of prompts still waiting for an answer
    pub fn pending(&self) -> usize {
        self.waiters.lock().map(|w| w.len()).unwrap_or(0)
    }
}

/// An open prompt.
///
/// Dropping it without waiting withdraws the token from the gate.
#[derive(Debug)]
pub struct PendingConfirmation {
    token: Uuid,
    expires_at: DateTime<Utc>,
    timeout: Duration,
    receiver: Option<oneshot::Receiver<Decision>>,
    waiters: Waiters,
}

impl PendingConfirmation {
    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Wait for the answer or the timeout, whichever comes first
    pub async fn wait(mut self) -> ConfirmationStatus {
        let Some(receiver) = self.receiver.take() else {
            return ConfirmationStatus::Expired;
        };

        let status = match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(Decision::Accept)) => ConfirmationStatus::Accepted,
            Ok(Ok(Decision::Decline)) => ConfirmationStatus::Declined,
            // Sender side dropped without answering
            Ok(Err(_)) => ConfirmationStatus::Expired,
            Err(_) => ConfirmationStatus::Expired,
        };

        if status == ConfirmationStatus::Expired {
            tracing::debug!(token = %self.token, "Confirmation expired");
        }

        status
    }

    fn withdraw(&self) {
        if let Ok(mut waiters) = self.waiters.lock() {
            waiters.remove(&self.token);
        }
    }
}

impl Drop for PendingConfirmation {
    fn drop(&mut self) {
        self.withdraw();
    }
}
