//! Where the refresh actor runs
//!
//! Both runners drive the same `RefreshActor`; they only differ in execution
//! context:
//! - `InlineRefresh` spawns the schedule on the caller's tokio runtime
//! - `BackgroundRefresh` gives it a dedicated OS thread with its own
//!   single-threaded runtime, so refresh work never competes with polling
//!
//! Shutting down stops new cycles. In background mode the actor's runtime is
//! dropped afterwards, which abandons any cycle still retrying.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::actor::{Control, RefreshActor};
use crate::error::Result;

/// Thread name for the background refresh context
const BACKGROUND_THREAD_NAME: &str = "credential-refresh";

/// Execution strategy for the refresh actor, chosen from configuration.
pub trait RefreshRunner: Send {
    /// Identifier for logging (e.g. "inline", "background")
    fn id(&self) -> &'static str;

    /// Start the actor's schedule. The first cycle begins immediately.
    fn launch(self: Box<Self>, actor: RefreshActor) -> Result<RefreshHandle>;
}

/// Runs the actor as a task on the current runtime.
#[derive(Debug, Default)]
pub struct InlineRefresh;

impl RefreshRunner for InlineRefresh {
    fn id(&self) -> &'static str {
        "inline"
    }

    fn launch(self: Box<Self>, actor: RefreshActor) -> Result<RefreshHandle> {
        let (control, inbox) = mpsc::unbounded_channel();
        tokio::spawn(Arc::new(actor).run(inbox));
        info!(mode = self.id(), "credential refresh started");
        Ok(RefreshHandle {
            control,
            mode: self.id(),
        })
    }
}

/// Runs the actor on its own thread and runtime.
#[derive(Debug, Default)]
pub struct BackgroundRefresh;

impl RefreshRunner for BackgroundRefresh {
    fn id(&self) -> &'static str {
        "background"
    }

    fn launch(self: Box<Self>, actor: RefreshActor) -> Result<RefreshHandle> {
        let (control, inbox) = mpsc::unbounded_channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        std::thread::Builder::new()
            .name(BACKGROUND_THREAD_NAME.into())
            .spawn(move || {
                runtime.block_on(Arc::new(actor).run(inbox));
                debug!("background refresh runtime exiting");
            })?;

        info!(mode = self.id(), "credential refresh started");
        Ok(RefreshHandle {
            control,
            mode: self.id(),
        })
    }
}

/// Handle to a running refresh actor.
///
/// Dropping the handle leaves the actor running until process exit.
#[derive(Debug)]
pub struct RefreshHandle {
    control: mpsc::UnboundedSender<Control>,
    mode: &'static str,
}

impl RefreshHandle {
    /// Stop scheduling new cycles and tell the bridge the actor is gone.
    pub fn shutdown(&self) {
        if self.control.send(Control::Shutdown).is_err() {
            debug!(mode = self.mode, "refresh actor already stopped");
        }
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::RefreshMessage;
    use crate::actor::tests::{FakePool, ScriptedSource};
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    fn actor(tokens: &[&str]) -> (RefreshActor, mpsc::UnboundedReceiver<RefreshMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = RefreshActor::new(
            Arc::new(FakePool::default()),
            Arc::new(ScriptedSource::new(2, tokens)),
            tx,
        )
        .with_retry(RetryPolicy::immediate());
        (actor, rx)
    }

    #[tokio::test]
    async fn inline_runner_publishes_first_credential() {
        let (actor, mut rx) = actor(&["inline-tok"]);
        let handle = Box::new(InlineRefresh).launch(actor).unwrap();
        assert_eq!(handle.mode(), "inline");

        match rx.recv().await {
            Some(RefreshMessage::Credential(c)) => assert_eq!(c.expose(), "inline-tok"),
            other => panic!("expected credential, got {other:?}"),
        }

        handle.shutdown();
        assert!(matches!(rx.recv().await, Some(RefreshMessage::Shutdown)));
    }

    #[tokio::test]
    async fn background_runner_publishes_across_threads() {
        let (actor, mut rx) = actor(&["bg-tok"]);
        let handle = Box::new(BackgroundRefresh).launch(actor).unwrap();
        assert_eq!(handle.mode(), "background");

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("background actor should publish");
        match first {
            Some(RefreshMessage::Credential(c)) => assert_eq!(c.expose(), "bg-tok"),
            other => panic!("expected credential, got {other:?}"),
        }

        handle.shutdown();
        let last = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("background actor should acknowledge shutdown");
        assert!(matches!(last, Some(RefreshMessage::Shutdown)));
    }

    #[test]
    fn shutdown_after_stop_is_harmless() {
        let (control, inbox) = mpsc::unbounded_channel();
        drop(inbox);
        let handle = RefreshHandle {
            control,
            mode: "inline",
        };
        handle.shutdown();
        handle.shutdown();
    }
}
