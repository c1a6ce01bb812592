use crate::domain::outcome::Channel;
use crate::domain::submission::SubmissionRecord;
use async_trait::async_trait;
use futures::FutureExt;
use opentelemetry::{KeyValue, global, metrics::Counter};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Provider unreachable: {0}")]
    Unavailable(String),
    #[error("Provider rejected the message ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("Provider quota exceeded")]
    QuotaExceeded,
    #[error("Provider did not respond within {0} ms")]
    Timeout(u64),
    #[error("Internal dispatch error: {0}")]
    Internal(String),
}

impl DispatchError {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Rejected { .. } => "rejected",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

/// Template parameters handed to the provider.
///
/// The operator gets the whole form; the visitor's acknowledgment only needs who to greet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    OperatorAlert { from_name: String, from_email: String, reply_to: String, message: String, submitted_at: String },
    SubmitterAck { to_name: String, to_email: String },
}

impl NotificationPayload {
    #[must_use]
    pub fn for_channel(channel: Channel, record: &SubmissionRecord) -> Self {
        match channel {
            Channel::OperatorAlert => Self::OperatorAlert {
                from_name: record.name.clone(),
                from_email: record.email.clone(),
                reply_to: record.email.clone(),
                message: record.message.clone(),
                submitted_at: record.created_at_iso(),
            },
            Channel::SubmitterAck => Self::SubmitterAck { to_name: record.name.clone(), to_email: record.email.clone() },
        }
    }
}

#[async_trait]
pub trait NotificationProvider: Send + Sync + std::fmt::Debug {
    /// Sends a single notification. One attempt, no retry.
    ///
    /// # Errors
    /// Returns a [`DispatchError`] describing why the provider did not accept the message.
    async fn send(&self, channel: Channel, payload: &NotificationPayload) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub channel: Channel,
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub operator_alert: DispatchResult,
    pub submitter_ack: DispatchResult,
}

impl DispatchReport {
    #[must_use]
    pub const fn all_ok(&self) -> bool {
        self.operator_alert.ok() && self.submitter_ack.ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DispatchResult> {
        [&self.operator_alert, &self.submitter_ack].into_iter()
    }
}

#[derive(Clone, Debug)]
struct Metrics {
    dispatch_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("portfolio-contact");
        Self {
            dispatch_total: meter
                .u64_counter("contact_dispatch_total")
                .with_description("Notification send attempts by channel and result")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NotificationDispatcher {
    provider: Arc<dyn NotificationProvider>,
    send_timeout: Duration,
    metrics: Metrics,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(provider: Arc<dyn NotificationProvider>, send_timeout: Duration) -> Self {
        Self { provider, send_timeout, metrics: Metrics::new() }
    }

    /// Attempts both notifications for a persisted record.
    ///
    /// The sends run concurrently and neither outcome affects the other. Both are awaited
    /// before this returns, so each channel has been tried exactly once.
    #[tracing::instrument(level = "debug", skip_all, fields(fingerprint = %record.fingerprint))]
    pub async fn dispatch_all(&self, record: &SubmissionRecord) -> DispatchReport {
        let (operator_alert, submitter_ack) =
            tokio::join!(self.dispatch(Channel::OperatorAlert, record), self.dispatch(Channel::SubmitterAck, record));

        DispatchReport { operator_alert, submitter_ack }
    }

    async fn dispatch(&self, channel: Channel, record: &SubmissionRecord) -> DispatchResult {
        let payload = NotificationPayload::for_channel(channel, record);
        let send = AssertUnwindSafe(self.provider.send(channel, &payload)).catch_unwind();

        let result = match tokio::time::timeout(self.send_timeout, send).await {
            Ok(Ok(res)) => res,
            Ok(Err(_panic)) => Err(DispatchError::Internal("provider panicked during send".into())),
            Err(_) => Err(DispatchError::Timeout(u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX))),
        };

        match &result {
            Ok(()) => {
                tracing::info!(%channel, "Notification sent");
                self.metrics.dispatch_total.add(1, &[
                    KeyValue::new("channel", channel.as_str()),
                    KeyValue::new("status", "sent"),
                ]);
            }
            Err(e) => {
                tracing::warn!(%channel, error = %e, "Notification failed");
                self.metrics.dispatch_total.add(1, &[
                    KeyValue::new("channel", channel.as_str()),
                    KeyValue::new("status", e.label()),
                ]);
            }
        }

        DispatchResult { channel, error: result.err() }
    }
}
