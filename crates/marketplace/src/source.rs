//! Collaborator capabilities consumed by the refresh actor and monitor loop
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn CatalogSource>`), so tests can swap in hand-written fakes.

use std::future::Future;
use std::pin::Pin;

use crate::credential::Credential;
use crate::error::Result;
use crate::item::RawItem;

/// Boxed, sendable future returned by the capability traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-item callback handed to `CatalogSource::fetch_since`.
///
/// An error returned here aborts the pass and is propagated by the source.
pub type OnItem<'a> = dyn FnMut(RawItem) -> Result<()> + Send + 'a;

/// Supplies egress proxies.
pub trait ProxyPool: Send + Sync {
    /// Load proxies. Safe to call again; callers normally guard with `is_ready`.
    fn init(&self) -> BoxFuture<'_, Result<()>>;

    /// Whether at least one proxy is loaded.
    fn is_ready(&self) -> bool;
}

/// Fetches a session credential.
pub trait CredentialSource: Send + Sync {
    /// One attempt. Succeeds with a non-empty credential or fails.
    fn fetch(&self) -> BoxFuture<'_, Result<Credential>>;
}

/// Marketplace item feed.
pub trait CatalogSource: Send + Sync {
    /// Highest item id currently listed.
    fn highest_id<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<u64>>;

    /// One poll pass: deliver every item with id greater than `since`, in
    /// server order, through `on_item`. Parallelism is internal to the source.
    fn fetch_since<'a>(
        &'a self,
        credential: &'a Credential,
        since: u64,
        on_item: &'a mut OnItem<'a>,
    ) -> BoxFuture<'a, Result<()>>;
}
