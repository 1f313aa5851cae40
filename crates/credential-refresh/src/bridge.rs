//! Handoff from the refresh actor to the monitor loop
//!
//! The bridge task is the only reader of the actor's channel and the only
//! writer of the credential slot. It turns the message stream into:
//! - a `BootstrapHandle` that resolves once, with the first credential
//! - a `CredentialSlot` that always holds the latest credential
//!
//! The channel is FIFO, so the credential the bootstrap handle observes is
//! the first one the actor published. Later credentials only overwrite the
//! slot. The handle never fails: if the actor stops before publishing
//! anything, `wait` stays pending forever.

use marketplace::Credential;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::actor::RefreshMessage;

/// Spawns the task that forwards actor messages into the slot.
pub struct CredentialBridge;

impl CredentialBridge {
    /// Start forwarding on the current runtime.
    pub fn spawn(inbox: mpsc::UnboundedReceiver<RefreshMessage>) -> BootstrapHandle {
        let (first_tx, first_rx) = oneshot::channel();
        let (latest_tx, latest_rx) = watch::channel(None);
        tokio::spawn(forward(inbox, first_tx, latest_tx));
        BootstrapHandle {
            first: first_rx,
            latest: latest_rx,
        }
    }
}

async fn forward(
    mut inbox: mpsc::UnboundedReceiver<RefreshMessage>,
    first_tx: oneshot::Sender<Credential>,
    latest_tx: watch::Sender<Option<Credential>>,
) {
    let mut first_tx = Some(first_tx);

    while let Some(message) = inbox.recv().await {
        match message {
            RefreshMessage::Credential(credential) => {
                info!("received credential from refresh actor");
                latest_tx.send_replace(Some(credential.clone()));
                if let Some(tx) = first_tx.take() {
                    if tx.send(credential).is_err() {
                        debug!("bootstrap handle dropped before first credential");
                    }
                }
            }
            RefreshMessage::Shutdown => {
                info!("refresh actor shut down, bridge closing");
                break;
            }
        }
    }
}

/// One-shot bootstrap signal. Consumed by `wait`, so it resolves at most once.
#[derive(Debug)]
pub struct BootstrapHandle {
    first: oneshot::Receiver<Credential>,
    latest: watch::Receiver<Option<Credential>>,
}

impl BootstrapHandle {
    /// Wait for the first published credential and return the live slot.
    ///
    /// Never returns an error and has no timeout.
    pub async fn wait(self) -> CredentialSlot {
        let current = match self.first.await {
            Ok(credential) => credential,
            Err(_) => {
                warn!("refresh actor stopped before publishing, bootstrap will never resolve");
                std::future::pending::<Credential>().await
            }
        };
        CredentialSlot {
            current,
            latest: self.latest,
        }
    }
}

/// Latest credential, read by the monitor loop at point of use.
///
/// Only obtainable from a resolved bootstrap, so it is never empty.
#[derive(Debug)]
pub struct CredentialSlot {
    current: Credential,
    latest: watch::Receiver<Option<Credential>>,
}

impl CredentialSlot {
    /// A slot pinned to one credential, with no refresh behind it.
    pub fn fixed(credential: Credential) -> Self {
        let (_tx, latest) = watch::channel(None);
        Self {
            current: credential,
            latest,
        }
    }

    /// The most recently published credential.
    pub fn current(&mut self) -> &Credential {
        if let Some(latest) = self.latest.borrow_and_update().as_ref() {
            if *latest != self.current {
                debug!(age_ms = latest.age().as_millis() as u64, "credential rotated");
                self.current = latest.clone();
            }
        }
        &self.current
    }
}
