//! Store-layer error classification.
//!
//! The retry envelope around every write needs to know whether a failure is
//! worth retrying at all: a dropped connection probably isn't there anymore
//! in 500ms, a unique constraint violation never will be.

use thiserror::Error;

/// A store-layer failure, already classified as transient or permanent so
/// callers can decide whether to retry without inspecting driver internals.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The failure is likely to clear itself: connection reset, broker
    /// timeout, pool exhaustion. Safe to retry with backoff.
    #[error("transient store error: {0}")]
    Transient(#[source] sqlx::Error),

    /// The failure will recur on retry: constraint violation, malformed
    /// SQL, bad credentials.
    #[error("permanent store error: {0}")]
    Permanent(#[source] sqlx::Error),

    /// No connection could be borrowed from the pool within its timeout.
    #[error("pool exhausted: no connection available within the borrow timeout")]
    PoolExhausted,
}

impl StoreError {
    /// Whether a retry envelope should attempt this operation again.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::PoolExhausted)
    }

    /// Classify a driver error as transient or permanent.
    ///
    /// Connection-level faults (broken pipe, timed out, pool timed out) are
    /// transient; everything sqlx reports as a structured database error
    /// (constraint violation, syntax error, bad auth) is permanent.
    #[must_use]
    pub fn classify(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                Self::Transient(error)
            }
            sqlx::Error::Database(_) => Self::Permanent(error),
            other => Self::Transient(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_transient() {
        let err = StoreError::classify(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
    }

    #[test]
    fn pool_exhausted_constructs_directly() {
        assert!(StoreError::PoolExhausted.is_transient());
    }
}
