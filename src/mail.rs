//! Mailbox access

use crate::decoder::MessagePart;
use crate::error::Result;
use crate::types::MessageId;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Source of notification emails
#[async_trait]
pub trait MailSource: Send + Sync {
    /// IDs of messages matching a provider search query
    async fn list_matching_message_ids(&self, query: &str) -> Result<Vec<MessageId>>;

    /// Payload of one message
    async fn get_message(&self, id: &MessageId) -> Result<MessagePart>;

    /// Name used in logs
    fn source_name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: MessageId,
}

/// `users.messages.get` response, reduced to what the pipeline reads
#[derive(Debug, Deserialize)]
pub struct GmailMessage {
    pub id: MessageId,
    #[serde(default)]
    pub payload: MessagePart,
}

/// Gmail REST client scoped to the inbox
pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: SecretString,
    max_results: u32,
}

impl std::fmt::Debug for GmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

impl GmailClient {
    pub fn new(access_token: SecretString, max_results: u32) -> Result<Self> {
        Self::with_base_url(GMAIL_API_BASE, access_token, max_results)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: SecretString,
        max_results: u32,
    ) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
            max_results,
        })
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn list_matching_message_ids(&self, query: &str) -> Result<Vec<MessageId>> {
        let params = [
            ("q", query.to_string()),
            ("labelIds", "INBOX".to_string()),
            ("maxResults", self.max_results.to_string()),
        ];

        let list: ListResponse = self
            .http
            .get(format!("{}/messages", self.base_url))
            .bearer_auth(self.access_token.expose_secret())
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(query, count = list.messages.len(), "Listed matching messages");
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get_message(&self, id: &MessageId) -> Result<MessagePart> {
        let message: GmailMessage = self
            .http
            .get(format!("{}/messages/{}", self.base_url, id))
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("format", "full")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(message_id = %message.id, mime_type = %message.payload.mime_type, "Fetched message");
        Ok(message.payload)
    }

    fn source_name(&self) -> &'static str {
        "gmail"
    }
}
