use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    application::services::provider::{ApprovalRequest, ContentApi, ContentDraft},
    domain::models::TemplateCategory,
};

#[derive(Clone)]
pub struct ContentApiConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub base_url: String,
}

/// Twilio Content API client: template drafts and WhatsApp approval flow.
pub struct TwilioContentClient {
    http: Client,
    config: ContentApiConfig,
}

impl TwilioContentClient {
    pub fn new(config: ContentApiConfig) -> anyhow::Result<Arc<dyn ContentApi>> {
        let http = Client::builder()
            .user_agent("sendhub/content")
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Arc::new(Self { http, config }) as Arc<dyn ContentApi>)
    }
}

#[async_trait]
impl ContentApi for TwilioContentClient {
    async fn create_draft(
        &self,
        name: &str,
        body: &str,
        variables: &serde_json::Value,
    ) -> anyhow::Result<ContentDraft> {
        let payload = serde_json::json!({
            "friendly_name": name,
            "language": "en",
            "variables": variables,
            "types": { "twilio/text": { "body": body } },
        });

        let response = self
            .http
            .post(&self.config.base_url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("content api draft creation failed: http {status}");
        }

        let created: ContentResource = response.json().await?;
        Ok(ContentDraft { sid: created.sid })
    }

    async fn submit_for_approval(
        &self,
        content_sid: &str,
        name: &str,
        category: TemplateCategory,
    ) -> anyhow::Result<()> {
        let url = format!(
            "{}/{}/ApprovalRequests/whatsapp",
            self.config.base_url, content_sid
        );
        let payload = serde_json::json!({
            "name": name,
            "category": category.as_str(),
        });

        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("content api approval submission failed: http {status}");
        }
        Ok(())
    }

    async fn approval_requests(&self, content_sid: &str) -> anyhow::Result<Vec<ApprovalRequest>> {
        let url = format!("{}/{}/ApprovalRequests", self.config.base_url, content_sid);

        let response = self
            .http
            .get(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("content api approval fetch failed: http {status}");
        }

        let payload: ApprovalRequestsResponse = response.json().await?;
        Ok(payload
            .approval_requests
            .into_iter()
            .map(|entry| ApprovalRequest {
                channel: entry.channel,
                status: entry.status,
                rejection_reason: entry.rejection_reason,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ContentResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ApprovalRequestsResponse {
    #[serde(default)]
    approval_requests: Vec<ApprovalRequestEntry>,
}

#[derive(Debug, Deserialize)]
struct ApprovalRequestEntry {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    status: String,
    rejection_reason: Option<String>,
}
