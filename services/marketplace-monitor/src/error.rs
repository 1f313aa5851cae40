//! Startup errors for the monitor binary
//!
//! Only configuration loading can fail before polling starts. Runtime
//! failures never surface here: the refresh actor and the monitor loop log
//! and retry everything they encounter.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A key parsed but its value is out of range
    #[error("invalid [{section}].{key}: {reason}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        reason: String,
    },

    #[error("cannot read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn invalid(section: &'static str, key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            section,
            key,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
