//! Monitor loop
//!
//! Drives the state machine in `state.rs`: waits for the first credential,
//! establishes the watermark, then runs poll passes forever. Everything here
//! runs sequentially on the main task, so at most one pass is in flight.
//!
//! The credential is read from the slot at the start of each catalog call,
//! so rotations published by the refresh actor apply to the next call.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use credential_refresh::{BootstrapHandle, CredentialSlot, RetryPolicy};
use marketplace::{CatalogSource, Credential, Item, RawItem};
use tracing::{debug, info, warn};

use crate::display::{Delivery, ItemPrinter};
use crate::metrics;
use crate::state::{MonitorAction, MonitorEvent, MonitorState, Watermark, handle_event};

/// Delay before a failed pass or watermark lookup is re-attempted
pub const POLL_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Wall-clock source for relative-time formatting
pub type Clock = fn() -> DateTime<Utc>;

pub struct MonitorLoop<W> {
    catalog: Arc<dyn CatalogSource>,
    printer: ItemPrinter<W>,
    retry: RetryPolicy,
    clock: Clock,
    state: MonitorState,
    action: MonitorAction,
}

impl<W: Write + Send> MonitorLoop<W> {
    pub fn new(catalog: Arc<dyn CatalogSource>, printer: ItemPrinter<W>) -> Self {
        Self {
            catalog,
            printer,
            retry: RetryPolicy::fixed(POLL_RETRY_DELAY),
            clock: Utc::now,
            state: MonitorState::AwaitingCredential,
            action: MonitorAction::None,
        }
    }

    #[cfg(test)]
    fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Wait for the bootstrap credential, then poll until the process exits.
    pub async fn run(mut self, bootstrap: BootstrapHandle) {
        info!("waiting for first credential");
        let mut slot = bootstrap.wait().await;
        self.credential_ready();
        loop {
            self.step(&mut slot).await;
        }
    }

    fn credential_ready(&mut self) {
        info!("credential acquired, establishing watermark");
        self.transition(MonitorEvent::CredentialReady);
    }

    /// Execute the pending action and feed its outcome back into the state machine.
    async fn step(&mut self, slot: &mut CredentialSlot) {
        let event = match (&self.state, self.action) {
            (_, MonitorAction::ScheduleRetry) => {
                self.retry.wait().await;
                MonitorEvent::RetryTimer
            }

            (MonitorState::EstablishingWatermark { attempts }, MonitorAction::EstablishWatermark) => {
                match self.catalog.highest_id(slot.current()).await {
                    Ok(id) => {
                        info!(watermark = id, "watermark established");
                        metrics::set_watermark(id);
                        MonitorEvent::HighestIdFound(id)
                    }
                    Err(e) => {
                        warn!(error = %e, attempts, "failed to read newest catalog id");
                        metrics::record_poll_failure("watermark");
                        MonitorEvent::HighestIdFailed
                    }
                }
            }

            (
                MonitorState::Polling {
                    watermark,
                    consecutive_failures,
                },
                MonitorAction::StartPass,
            ) => {
                let mut watermark = *watermark;
                let consecutive_failures = *consecutive_failures;
                let since = watermark.get();
                let result = run_pass(
                    self.catalog.as_ref(),
                    &mut self.printer,
                    self.clock,
                    slot.current(),
                    &mut watermark,
                )
                .await;

                match result {
                    Ok(()) => {
                        if watermark.get() != since {
                            debug!(from = since, to = watermark.get(), "poll pass completed");
                        }
                        MonitorEvent::PassCompleted(watermark)
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            since,
                            watermark = watermark.get(),
                            consecutive_failures,
                            "poll pass failed"
                        );
                        metrics::record_poll_failure("pass");
                        MonitorEvent::PassFailed(watermark)
                    }
                }
            }

            (state, action) => {
                warn!(?state, ?action, "no work for current state");
                self.retry.wait().await;
                MonitorEvent::RetryTimer
            }
        };

        self.transition(event);
    }

    fn transition(&mut self, event: MonitorEvent) {
        let state = std::mem::replace(&mut self.state, MonitorState::AwaitingCredential);
        let (state, action) = handle_event(state, event);
        self.state = state;
        self.action = action;
    }
}

/// One pass over the catalog past `watermark`.
///
/// The watermark advances after each item is handled, filtered or printed, so
/// on error it still covers everything consumed before the failure.
async fn run_pass<W: Write + Send>(
    catalog: &dyn CatalogSource,
    printer: &mut ItemPrinter<W>,
    clock: Clock,
    credential: &Credential,
    watermark: &mut Watermark,
) -> marketplace::Result<()> {
    let since = watermark.get();
    let mut on_item = |raw: RawItem| -> marketplace::Result<()> {
        let item = Item::from(raw);
        match printer.handle(&item, clock())? {
            Delivery::Printed => metrics::record_item_surfaced(),
            Delivery::Filtered => {
                debug!(id = item.id, "dropped item from unrated seller");
                metrics::record_item_filtered("zero_stars");
            }
        }
        watermark.advance(item.id);
        metrics::set_watermark(watermark.get());
        Ok(())
    };
    catalog.fetch_since(credential, since, &mut on_item).await
}
