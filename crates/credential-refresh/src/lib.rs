//! Background session credential refresh
//!
//! A refresh actor keeps a session credential fresh independently of the
//! monitor loop, and a bridge hands its output to the loop:
//!
//! 1. `RefreshActor` runs a cycle at startup and every `REFRESH_PERIOD`:
//!    initialize the proxy pool if empty, then retry the credential source
//!    until it succeeds and publish the result
//! 2. A `RefreshRunner` decides where the actor runs: `InlineRefresh` on the
//!    caller's runtime, `BackgroundRefresh` on its own thread and runtime
//! 3. Published credentials travel over a FIFO channel as `RefreshMessage`s
//! 4. `CredentialBridge` resolves a one-shot `BootstrapHandle` with the first
//!    credential and keeps a `CredentialSlot` current with every later one
//!
//! Cycles are not mutually exclusive: a retry storm longer than the period
//! overlaps with the next cycle. Nothing here has a timeout; a credential
//! source that never succeeds leaves the bootstrap handle pending forever.

pub mod actor;
pub mod bridge;
pub mod error;
pub mod retry;
pub mod runner;

pub use actor::{REFRESH_PERIOD, RefreshActor, RefreshMessage};
pub use bridge::{BootstrapHandle, CredentialBridge, CredentialSlot};
pub use error::{Error, Result};
pub use retry::{CREDENTIAL_RETRY_DELAY, RetryPolicy};
pub use runner::{BackgroundRefresh, InlineRefresh, RefreshHandle, RefreshRunner};
