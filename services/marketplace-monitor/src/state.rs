//! Monitor state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! `MonitorLoop` executes the I/O implied by each action.
//!
//! ```text
//! AwaitingCredential -> EstablishingWatermark -> Polling <-> PollRecovering
//! ```
//!
//! There is no terminal state. The watermark is carried by `Polling` and
//! `PollRecovering`, so a pass cannot start before it exists.

/// Highest item id already consumed. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark(u64);

impl Watermark {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Record that `id` has been handled.
    pub fn advance(&mut self, id: u64) {
        self.0 = self.0.max(id);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum MonitorState {
    /// Waiting for the first credential
    AwaitingCredential,
    /// Asking the catalog for its newest id
    EstablishingWatermark { attempts: u32 },
    /// Running poll passes back to back
    Polling {
        watermark: Watermark,
        consecutive_failures: u32,
    },
    /// Last pass failed; waiting before the next one
    PollRecovering {
        watermark: Watermark,
        consecutive_failures: u32,
    },
}

#[derive(Debug)]
pub enum MonitorEvent {
    /// Bootstrap handle resolved
    CredentialReady,
    HighestIdFound(u64),
    HighestIdFailed,
    /// A pass ended normally; carries the watermark after the pass
    PassCompleted(Watermark),
    /// A pass raised; carries the watermark up to the last handled item
    PassFailed(Watermark),
    /// Fixed retry delay expired
    RetryTimer,
}

/// Actions the caller should execute after a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    EstablishWatermark,
    StartPass,
    ScheduleRetry,
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: MonitorState, event: MonitorEvent) -> (MonitorState, MonitorAction) {
    match (state, event) {
        // --- AwaitingCredential ---
        (MonitorState::AwaitingCredential, MonitorEvent::CredentialReady) => (
            MonitorState::EstablishingWatermark { attempts: 0 },
            MonitorAction::EstablishWatermark,
        ),

        // --- EstablishingWatermark ---
        (MonitorState::EstablishingWatermark { .. }, MonitorEvent::HighestIdFound(id)) => (
            MonitorState::Polling {
                watermark: Watermark::new(id),
                consecutive_failures: 0,
            },
            MonitorAction::StartPass,
        ),

        (MonitorState::EstablishingWatermark { attempts }, MonitorEvent::HighestIdFailed) => (
            MonitorState::EstablishingWatermark {
                attempts: attempts + 1,
            },
            MonitorAction::ScheduleRetry,
        ),

        (state @ MonitorState::EstablishingWatermark { .. }, MonitorEvent::RetryTimer) => {
            (state, MonitorAction::EstablishWatermark)
        }

        // --- Polling ---
        (MonitorState::Polling { .. }, MonitorEvent::PassCompleted(watermark)) => (
            MonitorState::Polling {
                watermark,
                consecutive_failures: 0,
            },
            MonitorAction::StartPass,
        ),

        (
            MonitorState::Polling {
                consecutive_failures,
                ..
            },
            MonitorEvent::PassFailed(watermark),
        ) => (
            MonitorState::PollRecovering {
                watermark,
                consecutive_failures: consecutive_failures + 1,
            },
            MonitorAction::ScheduleRetry,
        ),

        // --- PollRecovering ---
        (
            MonitorState::PollRecovering {
                watermark,
                consecutive_failures,
            },
            MonitorEvent::RetryTimer,
        ) => (
            MonitorState::Polling {
                watermark,
                consecutive_failures,
            },
            MonitorAction::StartPass,
        ),

        // --- Catch-all: invalid transitions stay in current state ---
        (state, _event) => (state, MonitorAction::None),
    }
}
