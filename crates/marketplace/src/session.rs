//! Session cookie acquisition
//!
//! The storefront hands out an anonymous session token as a cookie on its
//! landing page. One `fetch` is one GET through the proxy pool; retrying is
//! the refresh actor's job.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::SET_COOKIE;
use tracing::debug;

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::proxies::ProxyList;
use crate::source::{BoxFuture, CredentialSource};

/// Fetches the session cookie from the storefront landing page.
pub struct SessionCookieSource {
    base_url: String,
    cookie_name: String,
    proxies: Arc<ProxyList>,
}

impl SessionCookieSource {
    pub fn new(base_url: impl Into<String>, cookie_name: impl Into<String>, proxies: Arc<ProxyList>) -> Self {
        Self {
            base_url: base_url.into(),
            cookie_name: cookie_name.into(),
            proxies,
        }
    }

    async fn fetch_cookie(&self) -> Result<Credential> {
        let response = self
            .proxies
            .client()
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("session request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            return Err(Error::UnexpectedStatus(format!(
                "landing page returned {status}"
            )));
        }

        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|header| cookie_value(header, &self.cookie_name))
            .ok_or_else(|| {
                Error::MissingCredential(format!("no {} cookie in response", self.cookie_name))
            })?;

        debug!(cookie = %self.cookie_name, "session cookie received");
        Credential::new(token)
    }
}

impl CredentialSource for SessionCookieSource {
    fn fetch(&self) -> BoxFuture<'_, Result<Credential>> {
        Box::pin(self.fetch_cookie())
    }
}

/// Extract `name`'s value from a single `Set-Cookie` header.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    let pair = header.split(';').next()?;
    let (key, value) = pair.split_once('=')?;
    if key.trim() != name {
        return None;
    }
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
