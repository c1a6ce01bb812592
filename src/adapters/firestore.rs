use crate::config::StoreConfig;
use crate::core::store::{PersistenceError, StoreResult, SubmissionStore};
use crate::domain::submission::{SubmissionId, SubmissionRecord};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

pub const COLLECTION: &str = "contact_submissions";

/// Writes submissions as documents through the Firestore REST API.
#[derive(Clone, Debug)]
pub struct FirestoreSubmissionStore {
    client: reqwest::Client,
    collection_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    name: String,
}

impl FirestoreSubmissionStore {
    /// # Errors
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, project_id: &str, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(concat!("portfolio-contact/", env!("CARGO_PKG_VERSION"))).build()?;
        Ok(Self {
            client,
            collection_url: format!(
                "{}/v1/projects/{project_id}/databases/(default)/documents/{COLLECTION}",
                base_url.trim_end_matches('/')
            ),
            api_key: api_key.into(),
        })
    }

    /// # Errors
    /// Returns `PersistenceError::Internal` if the project id or API key is missing.
    pub fn from_config(config: &StoreConfig) -> Result<Self, PersistenceError> {
        let project_id = config
            .firestore_project_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("CONTACT_FIRESTORE_PROJECT_ID is required for the firestore backend"))?;
        let api_key = config
            .firestore_api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("CONTACT_FIRESTORE_API_KEY is required for the firestore backend"))?;
        Self::new(&config.firestore_base_url, project_id, api_key).map_err(|e| PersistenceError::Internal(e.into()))
    }
}

fn string(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn timestamp(value: &str) -> Value {
    json!({ "timestampValue": value })
}

/// The request URL carries the API key, so it is stripped before the error is kept.
fn transport_error(e: reqwest::Error) -> PersistenceError {
    PersistenceError::Unavailable(e.without_url().to_string())
}

/// Firestore's typed-value encoding of a record.
fn encode(record: &SubmissionRecord) -> Value {
    let doc = record.document();
    json!({
        "fields": {
            "name": string(doc.name),
            "email": string(doc.email),
            "message": string(doc.message),
            "timestamp": timestamp(&doc.timestamp),
            "createdAt": string(&doc.created_at),
            "emailStatus": string(doc.email_status.as_str()),
            "browserInfo": {
                "mapValue": {
                    "fields": {
                        "userAgent": string(doc.browser_info.user_agent),
                        "language": string(doc.browser_info.language),
                        "platform": string(doc.browser_info.platform),
                        "timestamp": timestamp(&doc.browser_info.timestamp),
                    }
                }
            },
            "source": string(doc.source),
            "fingerprint": string(doc.fingerprint),
        }
    })
}

#[async_trait]
impl SubmissionStore for FirestoreSubmissionStore {
    #[tracing::instrument(level = "debug", skip_all, fields(collection = COLLECTION))]
    async fn persist(&self, record: &SubmissionRecord) -> StoreResult {
        let response = self
            .client
            .post(&self.collection_url)
            .query(&[("key", &self.api_key)])
            .json(&encode(record))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(PersistenceError::Unavailable(format!("Firestore returned {status}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Rejected(format!("{status}: {detail}")));
        }

        let created: CreatedDocument =
            response.json().await.map_err(|e| PersistenceError::Internal(anyhow::anyhow!("Malformed response: {e}")))?;

        created
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(SubmissionId::new)
            .ok_or_else(|| PersistenceError::Internal(anyhow::anyhow!("Document name has no id: {}", created.name)))
    }

    async fn check(&self) -> Result<(), PersistenceError> {
        // Listing may be denied by security rules, so a 4xx still counts as reachable.
        let response = self
            .client
            .get(&self.collection_url)
            .query(&[("key", self.api_key.as_str()), ("pageSize", "1")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(PersistenceError::Unavailable(format!("Firestore returned {status}")));
        }
        Ok(())
    }
}
