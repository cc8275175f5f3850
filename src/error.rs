//! Error types for Net Explorer

use thiserror::Error;

/// Result type alias using Net Explorer's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Net Explorer
#[derive(Error, Debug)]
pub enum Error {
    /// The sandbox runtime refused or failed to launch a sandbox.
    /// The payload is the runtime's own diagnostic text.
    #[error("Sandbox create failed: {0}")]
    SandboxCreateFailed(String),

    /// The sandbox runtime failed to remove a sandbox
    #[error("Sandbox destroy failed for {container}: {message}")]
    SandboxDestroyFailed {
        /// Container that could not be removed
        container: String,
        /// Runtime diagnostic
        message: String,
    },

    /// Object store write or list failure
    #[error("Object store unavailable: {0}")]
    StoreUnavailable(String),

    /// No valid session for the caller
    #[error("Authentication required")]
    Unauthenticated,

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is retryable
    ///
    /// Nothing in this crate retries on its own; this only tells callers
    /// whether re-invoking the same operation can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable(_)
                | Error::Timeout(_)
                | Error::SandboxCreateFailed(_)
                | Error::SandboxDestroyFailed { .. }
        )
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Unauthenticated)
    }

    /// HTTP status code used when this error reaches the web layer
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Unauthenticated => 401,
            Error::InvalidInput(_) => 400,
            Error::SandboxCreateFailed(_) | Error::SandboxDestroyFailed { .. } => 502,
            Error::StoreUnavailable(_) => 503,
            Error::Timeout(_) => 504,
            Error::Config(_) | Error::Json(_) | Error::Io(_) | Error::Internal(_) => 500,
        }
    }
}

/// Run `fut` under a deadline, mapping expiry to [`Error::Timeout`].
pub(crate) async fn with_timeout<T, F>(
    limit: std::time::Duration,
    what: &str,
    fut: F,
) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "{} did not finish within {:?}",
            what, limit
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Unauthenticated.status_code(), 401);
        assert_eq!(Error::StoreUnavailable("down".into()).status_code(), 503);
        assert_eq!(Error::SandboxCreateFailed("no image".into()).status_code(), 502);
        assert_eq!(Error::Timeout("slow".into()).status_code(), 504);
    }

    #[test]
    fn test_classification() {
        assert!(Error::Unauthenticated.is_client_error());
        assert!(!Error::Unauthenticated.is_retryable());
        assert!(Error::StoreUnavailable("down".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), "sleep", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(Error::Timeout(msg)) if msg.contains("sleep")));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout(Duration::from_secs(1), "quick", async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
