//! Session credential
//!
//! An opaque, non-empty token plus the instant it was acquired. There is no
//! tracked expiry: the refresh actor simply replaces it on a fixed period.
//! The token is redacted in Debug/Display and zeroed on drop.

use std::fmt;
use std::time::{Duration, Instant};

use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Session token required to authenticate catalog requests.
pub struct Credential {
    token: String,
    acquired_at: Instant,
}

impl Credential {
    /// Wrap a freshly fetched token. Empty or whitespace-only tokens are rejected.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::MissingCredential("token is empty".into()));
        }
        Ok(Self {
            token,
            acquired_at: Instant::now(),
        })
    }

    /// Expose the raw token (use sparingly, e.g. building a Cookie header)
    pub fn expose(&self) -> &str {
        &self.token
    }

    /// Time since this credential was fetched.
    pub fn age(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            acquired_at: self.acquired_at,
        }
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("age", &self.age())
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}
