use crate::config::EmailConfig;
use crate::core::dispatcher::{DispatchError, NotificationPayload, NotificationProvider};
use crate::domain::outcome::Channel;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

/// Sends template emails through the EmailJS REST API.
///
/// The account must allow API calls from non-browser applications; when it also enforces
/// private keys, set `access_token`.
#[derive(Clone, Debug)]
pub struct EmailJsProvider {
    client: reqwest::Client,
    send_url: String,
    service_id: String,
    operator_template_id: String,
    ack_template_id: String,
    public_key: String,
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a NotificationPayload,
}

impl EmailJsProvider {
    /// # Errors
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(config: &EmailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(concat!("portfolio-contact/", env!("CARGO_PKG_VERSION"))).build()?;
        Ok(Self {
            client,
            send_url: format!("{}/api/v1.0/email/send", config.base_url.trim_end_matches('/')),
            service_id: config.service_id.clone(),
            operator_template_id: config.operator_template_id.clone(),
            ack_template_id: config.ack_template_id.clone(),
            public_key: config.public_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn template_for(&self, channel: Channel) -> &str {
        match channel {
            Channel::OperatorAlert => &self.operator_template_id,
            Channel::SubmitterAck => &self.ack_template_id,
        }
    }
}

#[async_trait]
impl NotificationProvider for EmailJsProvider {
    #[tracing::instrument(level = "debug", skip(self, payload))]
    async fn send(&self, channel: Channel, payload: &NotificationPayload) -> Result<(), DispatchError> {
        let request = SendRequest {
            service_id: &self.service_id,
            template_id: self.template_for(channel),
            user_id: &self.public_key,
            access_token: self.access_token.as_deref(),
            template_params: payload,
        };

        let response = self
            .client
            .post(&self.send_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DispatchError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), %detail, "EmailJS refused the message");
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => DispatchError::QuotaExceeded,
            s if s.is_client_error() => DispatchError::Rejected { status: s.as_u16(), detail },
            s => DispatchError::Unavailable(format!("EmailJS returned {s}")),
        })
    }
}
