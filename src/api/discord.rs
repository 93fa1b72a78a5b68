//! Implements the `Webhook` trait by executing a Discord webhook.

use crate::api::{http_client, Webhook};
use crate::config::WebhookConfig;
use crate::error::Res;
use anyhow::{bail, ensure, Context};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

/// Discord rejects messages whose content is longer than this many characters.
const MAX_CONTENT_CHARS: usize = 2000;

/// Posts messages to a Discord webhook URL.
pub(crate) struct DiscordWebhook {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl DiscordWebhook {
    pub(crate) fn new(config: WebhookConfig) -> Res<Self> {
        Ok(Self {
            client: http_client()?,
            config,
        })
    }
}

#[async_trait::async_trait]
impl Webhook for DiscordWebhook {
    async fn send(&mut self, content: &str) -> Res<()> {
        let payload = Payload::new(&self.config, content)?;
        let started = Instant::now();

        let response = self
            .client
            .post(self.config.url().clone())
            .json(&payload)
            .send()
            .await
            // Without the URL, which carries the webhook token.
            .map_err(|e| e.without_url())
            .context("Failed to send the webhook request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("The webhook returned status {status}: {body}");
        }

        debug!("Took {:?} to send the webhook message", started.elapsed());
        Ok(())
    }
}

/// The body of an "Execute Webhook" request.
#[derive(Debug, Serialize)]
struct Payload<'a> {
    content: &'a str,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
    allowed_mentions: AllowedMentions,
}

/// Donor names are user input, so no mention in a message is allowed to ping anyone.
#[derive(Debug, Default, Serialize)]
struct AllowedMentions {
    parse: Vec<&'static str>,
}

impl<'a> Payload<'a> {
    fn new(config: &'a WebhookConfig, content: &'a str) -> Res<Self> {
        ensure!(!content.trim().is_empty(), "Refusing to send an empty message");
        let chars = content.chars().count();
        ensure!(
            chars <= MAX_CONTENT_CHARS,
            "The message is {chars} characters long, the limit is {MAX_CONTENT_CHARS}"
        );
        Ok(Self {
            content,
            username: config.username(),
            avatar_url: config.avatar_url().map(|u| u.as_str()),
            allowed_mentions: AllowedMentions::default(),
        })
    }
}
