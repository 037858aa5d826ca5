use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{application::services::provider::ProviderClient, domain::errors::SendError};

#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub base_url: String,
    pub status_callback_url: Option<String>,
    pub send_timeout: Duration,
}

/// Twilio Messages API adapter for the WhatsApp channel.
pub struct TwilioClient {
    http: Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> anyhow::Result<Arc<dyn ProviderClient>> {
        let http = Client::builder()
            .user_agent("sendhub/twilio")
            .timeout(config.send_timeout)
            .build()?;
        Ok(Arc::new(Self { http, config }) as Arc<dyn ProviderClient>)
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url, self.config.account_sid
        )
    }
}

#[async_trait]
impl ProviderClient for TwilioClient {
    async fn send(&self, recipient: &str, body: &str) -> Result<String, SendError> {
        let mut form = vec![
            ("From", format!("whatsapp:{}", self.config.from_number)),
            ("To", format!("whatsapp:{recipient}")),
            ("Body", body.to_string()),
        ];
        if let Some(callback) = &self.config.status_callback_url {
            form.push(("StatusCallback", callback.clone()));
        }

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SendError::Timeout
                } else {
                    SendError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let created: MessageResource = response
                .json()
                .await
                .map_err(|err| SendError::Transport(err.to_string()))?;
            return Ok(created.sid);
        }

        let failure: ApiFailure = response.json().await.unwrap_or_default();
        Err(SendError::Rejected {
            code: failure
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| status.as_u16().to_string()),
            message: failure
                .message
                .unwrap_or_else(|| format!("provider returned http {status}")),
            permanent: is_permanent(status),
        })
    }
}

// 5xx and throttling-style statuses are worth another attempt; the rest of
// the 4xx family (invalid recipient, blocked sender, suspended account) is
// not going to change between retries.
fn is_permanent(status: StatusCode) -> bool {
    !(status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT)
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiFailure {
    code: Option<i64>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        assert!(!is_permanent(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_permanent(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_permanent(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_permanent(StatusCode::BAD_REQUEST));
        assert!(is_permanent(StatusCode::UNAUTHORIZED));
    }
}
