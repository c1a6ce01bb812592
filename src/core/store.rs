use crate::domain::submission::{SubmissionId, SubmissionRecord};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Store unreachable: {0}")]
    Unavailable(String),
    #[error("Store rejected the write: {0}")]
    Rejected(String),
    #[error("Store did not respond within {0} ms")]
    Timeout(u64),
    #[error("Internal store error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PersistenceError {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Rejected(_) => "rejected",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

pub type StoreResult = Result<SubmissionId, PersistenceError>;

/// Append-only sink for submission records.
#[async_trait]
pub trait SubmissionStore: Send + Sync + std::fmt::Debug {
    /// Writes one record and returns the identifier the store assigned to it.
    ///
    /// Called once per submission; implementations must not retry.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] if the record could not be durably written.
    async fn persist(&self, record: &SubmissionRecord) -> StoreResult;

    /// Connectivity probe used by the readiness endpoint.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] if the store cannot be reached.
    async fn check(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}
