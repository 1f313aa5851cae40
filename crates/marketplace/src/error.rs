//! Error types for marketplace operations

/// Errors from credential, catalog and proxy operations.
///
/// The monitor does not distinguish these at its retry boundaries; the
/// variants exist for logging and for callers that want to classify.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("rate limited by marketplace")]
    RateLimited,

    #[error("unexpected status: {0}")]
    UnexpectedStatus(String),

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("session credential missing: {0}")]
    MissingCredential(String),

    #[error("proxy pool error: {0}")]
    Proxy(String),

    #[error("item handler failed: {0}")]
    Handler(String),
}

/// Result alias for marketplace operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        assert_eq!(
            Error::RateLimited.to_string(),
            "rate limited by marketplace"
        );
        assert!(
            Error::Handler("broken pipe".into())
                .to_string()
                .contains("broken pipe")
        );
        assert!(
            Error::MissingCredential("no cookie".into())
                .to_string()
                .starts_with("session credential missing:")
        );
    }
}
