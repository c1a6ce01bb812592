use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use time::OffsetDateTime;

/// Raw contact-form fields as typed by the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmissionInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl SubmissionInput {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into(), message: message.into() }
    }
}

/// Input that passed validation. Fields are trimmed.
///
/// Only the validator constructs this, so holding one proves the invariants hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    name: String,
    email: String,
    message: String,
}

impl ValidSubmission {
    pub(crate) const fn new_unchecked(name: String, email: String, message: String) -> Self {
        Self { name, email, message }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// SHA-256 over the normalised triple. Identical resubmissions share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.email.to_lowercase().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.message.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

impl EmailStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// What the visitor's browser told us about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub user_agent: String,
    pub locale: String,
    pub platform_hint: String,
}

impl ClientContext {
    /// Builds the context from request headers.
    ///
    /// The locale is the first tag of `Accept-Language`; the platform comes from the
    /// `Sec-CH-UA-Platform` client hint, which browsers send quoted.
    #[must_use]
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default();

        let locale = header("accept-language")
            .split(',')
            .next()
            .and_then(|tag| tag.split(';').next())
            .unwrap_or_default()
            .trim()
            .to_string();

        Self {
            user_agent: header("user-agent").to_string(),
            locale,
            platform_hint: header("sec-ch-ua-platform").trim_matches('"').to_string(),
        }
    }
}

/// Durable representation of one submission. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: OffsetDateTime,
    pub email_status: EmailStatus,
    pub client_context: ClientContext,
    pub source: String,
    pub fingerprint: String,
}

impl SubmissionRecord {
    #[must_use]
    pub fn new(submission: ValidSubmission, client_context: ClientContext, source: &str) -> Self {
        Self::at(submission, client_context, source, OffsetDateTime::now_utc())
    }

    #[must_use]
    pub fn at(
        submission: ValidSubmission,
        client_context: ClientContext,
        source: &str,
        created_at: OffsetDateTime,
    ) -> Self {
        let fingerprint = submission.fingerprint();
        let ValidSubmission { name, email, message } = submission;
        Self {
            name,
            email,
            message,
            created_at,
            email_status: EmailStatus::Pending,
            client_context,
            source: source.to_string(),
            fingerprint,
        }
    }

    /// ISO-8601 rendering of `created_at`, as stored in the `createdAt` field.
    #[must_use]
    pub fn created_at_iso(&self) -> String {
        self.created_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| self.created_at.unix_timestamp().to_string())
    }

    /// The persisted document shape shared by every store.
    #[must_use]
    pub fn document(&self) -> SubmissionDocument<'_> {
        let timestamp = self.created_at_iso();
        SubmissionDocument {
            name: &self.name,
            email: &self.email,
            message: &self.message,
            timestamp: timestamp.clone(),
            created_at: timestamp.clone(),
            email_status: self.email_status,
            browser_info: BrowserInfo {
                user_agent: &self.client_context.user_agent,
                language: &self.client_context.locale,
                platform: &self.client_context.platform_hint,
                timestamp,
            },
            source: &self.source,
            fingerprint: &self.fingerprint,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDocument<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
    pub timestamp: String,
    pub created_at: String,
    pub email_status: EmailStatus,
    pub browser_info: BrowserInfo<'a>,
    pub source: &'a str,
    pub fingerprint: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo<'a> {
    pub user_agent: &'a str,
    pub language: &'a str,
    pub platform: &'a str,
    pub timestamp: String,
}

/// Identifier assigned by the store to a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
