//! Slack incoming-webhook notifier.
//!
//! The message title goes into `username`, so each post shows up in the
//! channel as coming from "<project> pending merge requests". Links in the
//! body use Slack's mrkdwn `<url|text>` form.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error};

use super::Notifier;
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    channel: &'a str,
    username: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_emoji: Option<&'a str>,
}

pub struct SlackWebhook {
    http: reqwest::Client,
    webhook_url: SecretString,
    icon_emoji: Option<String>,
}

impl SlackWebhook {
    pub fn new(webhook_url: SecretString, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("failed to build Slack HTTP client: {e}")))?;
        Ok(Self {
            http,
            webhook_url,
            icon_emoji: None,
        })
    }

    /// Emoji shown as the poster's avatar, e.g. `:robot_face:`.
    pub fn icon_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.icon_emoji = Some(emoji.into());
        self
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn publish(&self, destination: &str, title: &str, body: &str) -> Result<()> {
        let payload = WebhookPayload {
            channel: destination,
            username: title,
            text: body,
            icon_emoji: self.icon_emoji.as_deref(),
        };

        // .json() also sets Content-Type: application/json
        let response = self
            .http
            .post(self.webhook_url.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which is the secret here
                let e = e.without_url();
                error!(channel = destination, "Slack webhook request failed: {e}");
                Error::Notify {
                    status: None,
                    details: e.to_string(),
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                channel = destination,
                status = status.as_u16(),
                response = %body,
                "error response from Slack webhook"
            );
            return Err(Error::Notify {
                status: Some(status.as_u16()),
                details: body,
            });
        }

        debug!(channel = destination, "posted to Slack");
        Ok(())
    }
}
