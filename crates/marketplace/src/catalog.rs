//! HTTP catalog source
//!
//! `highest_id` reads the newest-first listing. `fetch_since` reads it too,
//! then walks item ids upward from the watermark to that newest id in windows
//! of `concurrency` ids, with up to `concurrency` lookups in flight,
//! delivering results in id order. A 404 is a gap, never the end of a pass.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use reqwest::StatusCode;
use reqwest::header::COOKIE;
use tracing::{debug, trace};

use crate::constants::{CATALOG_ITEMS_PATH, CATALOG_PAGE_SIZE, ITEM_PATH};
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::item::{CatalogPage, ItemEnvelope, RawItem};
use crate::proxies::ProxyList;
use crate::source::{BoxFuture, CatalogSource, OnItem};

/// Catalog backed by the marketplace JSON API.
pub struct HttpCatalog {
    base_url: String,
    cookie_name: String,
    concurrency: usize,
    proxies: Arc<ProxyList>,
}

impl HttpCatalog {
    /// `concurrency` is clamped to at least 1 and fixed for the pool's lifetime.
    pub fn new(
        base_url: impl Into<String>,
        cookie_name: impl Into<String>,
        concurrency: usize,
        proxies: Arc<ProxyList>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            cookie_name: cookie_name.into(),
            concurrency: concurrency.max(1),
            proxies,
        }
    }

    #[cfg(test)]
    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn cookie(&self, credential: &Credential) -> String {
        format!("{}={}", self.cookie_name, credential.expose())
    }

    async fn newest_id(&self, credential: &Credential) -> Result<u64> {
        let url = format!(
            "{}{CATALOG_ITEMS_PATH}?order=newest_first&page=1&per_page={CATALOG_PAGE_SIZE}",
            self.base_url
        );
        let response = self
            .proxies
            .client()
            .get(&url)
            .header(COOKIE, self.cookie(credential))
            .send()
            .await
            .map_err(|e| Error::Http(format!("catalog request failed: {e}")))?;

        check_status(response.status(), "catalog listing")?;

        let page = response
            .json::<CatalogPage>()
            .await
            .map_err(|e| Error::Parse(format!("invalid catalog page: {e}")))?;

        page.items
            .iter()
            .map(|item| item.id)
            .max()
            .ok_or_else(|| Error::Parse("catalog page contained no items".into()))
    }

    /// Look up one id. `Ok(None)` means the id is not (or no longer) live.
    async fn item(&self, credential: &Credential, id: u64) -> Result<Option<RawItem>> {
        let url = format!("{}{ITEM_PATH}/{id}", self.base_url);
        let response = self
            .proxies
            .client()
            .get(&url)
            .header(COOKIE, self.cookie(credential))
            .send()
            .await
            .map_err(|e| Error::Http(format!("item {id} request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            trace!(id, "item id not live");
            return Ok(None);
        }
        check_status(response.status(), "item lookup")?;

        let envelope = response
            .json::<ItemEnvelope>()
            .await
            .map_err(|e| Error::Parse(format!("invalid item {id}: {e}")))?;
        Ok(Some(envelope.item))
    }

    /// Look up every id in `since+1 ..= newest` in windows of `concurrency`.
    ///
    /// The newest listed id bounds the pass, so a run of dead ids of any
    /// length is crossed rather than mistaken for the head of the catalog.
    async fn walk(&self, credential: &Credential, since: u64, on_item: &mut OnItem<'_>) -> Result<()> {
        let ceiling = self.newest_id(credential).await?;
        if ceiling <= since {
            trace!(since, ceiling, "catalog has nothing past watermark");
            return Ok(());
        }

        let mut next = since + 1;
        while next <= ceiling {
            let window_end = next.saturating_add(self.concurrency as u64).min(ceiling.saturating_add(1));
            let mut lookups = stream::iter(next..window_end)
                .map(|id| self.item(credential, id))
                .buffered(self.concurrency);

            let mut delivered = 0usize;
            while let Some(result) = lookups.next().await {
                if let Some(raw) = result? {
                    on_item(raw)?;
                    delivered += 1;
                }
            }

            if delivered == 0 {
                debug!(from = next, to = window_end - 1, "no live items in window");
            } else {
                debug!(from = next, to = window_end - 1, delivered, "catalog window delivered items");
            }
            next = window_end;
        }
        Ok(())
    }
}

impl CatalogSource for HttpCatalog {
    fn highest_id<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<u64>> {
        Box::pin(self.newest_id(credential))
    }

    fn fetch_since<'a>(
        &'a self,
        credential: &'a Credential,
        since: u64,
        on_item: &'a mut OnItem<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.walk(credential, since, on_item))
    }
}

fn check_status(status: StatusCode, what: &str) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited);
    }
    if !status.is_success() {
        return Err(Error::UnexpectedStatus(format!("{what} returned {status}")));
    }
    Ok(())
}
