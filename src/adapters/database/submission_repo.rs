use crate::adapters::database::DbPool;
use crate::core::store::{PersistenceError, StoreResult, SubmissionStore};
use crate::domain::submission::{SubmissionId, SubmissionRecord};
use async_trait::async_trait;
use sqlx::types::Json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Window in which an identical submission is reported as a likely resubmission.
const DUPLICATE_WINDOW: Duration = Duration::hours(1);

#[derive(Clone, Debug)]
pub struct PgSubmissionStore {
    pool: DbPool,
}

impl PgSubmissionStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Whether a submission with this fingerprint was stored in the hour before `at`.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the lookup fails.
    pub async fn seen_recently(&self, fingerprint: &str, at: OffsetDateTime) -> Result<bool, PersistenceError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM contact_submissions
                WHERE fingerprint = $1 AND created_at > $2
            )
            "#,
        )
        .bind(fingerprint)
        .bind(at - DUPLICATE_WINDOW)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> PersistenceError {
    match err {
        sqlx::Error::Database(e) => PersistenceError::Rejected(e.to_string()),
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            PersistenceError::Unavailable(err.to_string())
        }
        other => PersistenceError::Internal(other.into()),
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    #[tracing::instrument(level = "debug", skip_all, err)]
    async fn persist(&self, record: &SubmissionRecord) -> StoreResult {
        if self.seen_recently(&record.fingerprint, record.created_at).await? {
            tracing::warn!(fingerprint = %record.fingerprint, "Identical submission stored within the last hour");
        }

        let doc = record.document();
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO contact_submissions
                (id, name, email, message, created_at, email_status, browser_info, source, fingerprint)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(doc.name)
        .bind(doc.email)
        .bind(doc.message)
        .bind(record.created_at)
        .bind(doc.email_status.as_str())
        .bind(Json(&doc.browser_info))
        .bind(doc.source)
        .bind(doc.fingerprint)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(SubmissionId::new(id.to_string()))
    }

    async fn check(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ()).map_err(map_sqlx_error)
    }
}
