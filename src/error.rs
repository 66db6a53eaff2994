//! Error types for the trawl CLI and coordination core.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for trawl operations.
///
/// Most coordination failures are deliberately *not* errors: contention and
/// stale state become boolean returns and logged warnings. The variants here
/// cover the paths that must surface to the caller.
#[derive(Error, Debug)]
pub enum TrawlError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// Filesystem or OS-level lock operation failed unexpectedly.
    #[error("Lock operation failed: {0}")]
    LockError(String),

    /// The lock record could not be persisted and verified.
    ///
    /// The one fatal coordination error: if the record cannot be round-tripped
    /// to storage the cross-process guarantee cannot be trusted, so it
    /// propagates instead of degrading to `false`.
    #[error("Lock record persistence failed: {0}")]
    LockPersist(String),

    /// Crawl dispatch failed outside of individual task failures.
    #[error("Crawl failed: {0}")]
    CrawlError(String),
}

impl TrawlError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            TrawlError::UserError(_) => exit_codes::USER_ERROR,
            TrawlError::LockError(_) => exit_codes::LOCK_FAILURE,
            TrawlError::LockPersist(_) => exit_codes::LOCK_FAILURE,
            TrawlError::CrawlError(_) => exit_codes::CRAWL_FAILURE,
        }
    }
}

/// Result type alias for trawl operations.
pub type Result<T> = std::result::Result<T, TrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = TrawlError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn lock_errors_have_correct_exit_code() {
        let err = TrawlError::LockError("flock failed".to_string());
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);

        let err = TrawlError::LockPersist("verification exhausted".to_string());
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
    }

    #[test]
    fn crawl_error_has_correct_exit_code() {
        let err = TrawlError::CrawlError("dispatch failed".to_string());
        assert_eq!(err.exit_code(), exit_codes::CRAWL_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = TrawlError::LockPersist("3 attempts".to_string());
        assert_eq!(err.to_string(), "Lock record persistence failed: 3 attempts");
    }
}
