//! Clients for the two external services: the fundraising platform's transactions API, which we
//! read from, and the chat webhook, which we post to.
//!
//! Both are behind traits so that the pipeline can run against in-memory implementations, either
//! in unit tests or in the binary when `COLLECTIVE_NOTIFY_IN_TEST_MODE` is set.

mod discord;
mod open_collective;
mod test_client;

use crate::error::Res;
use crate::model::Transaction;
use crate::Config;
use anyhow::Context;
use chrono::{DateTime, Utc};

pub(crate) use discord::DiscordWebhook;
pub(crate) use open_collective::OpenCollective;
pub(crate) use test_client::{TestCollective, TestWebhook};

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Test`.
pub const TEST_MODE_ENV: &str = "COLLECTIVE_NOTIFY_IN_TEST_MODE";

/// Selects which implementations of `Collective` and `Webhook` are used.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Talk to the real services over HTTP.
    #[default]
    Live,
    /// Use seeded in-memory data and log messages instead of delivering them.
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// The source of transactions.
#[async_trait::async_trait]
pub(crate) trait Collective {
    /// Returns the transactions of `account_slug` created at or after `since`, oldest first.
    async fn transactions(
        &mut self,
        account_slug: &str,
        since: DateTime<Utc>,
    ) -> Res<Vec<Transaction>>;
}

/// The destination of messages.
#[async_trait::async_trait]
pub(crate) trait Webhook {
    /// Delivers one message. Each call is independent of the others.
    async fn send(&mut self, content: &str) -> Res<()>;
}

/// Creates the `Collective` implementation for `mode`.
pub(crate) fn collective(config: &Config, mode: Mode) -> Res<Box<dyn Collective + Send>> {
    Ok(match mode {
        Mode::Live => Box::new(OpenCollective::new(config)?),
        Mode::Test => Box::new(TestCollective::default()),
    })
}

/// Creates the `Webhook` implementation for `mode`.
///
/// # Errors
/// - Returns an error if `config` was loaded without webhook settings.
pub(crate) fn webhook(config: &Config, mode: Mode) -> Res<Box<dyn Webhook + Send>> {
    let settings = config
        .webhook()
        .context("The configuration has no webhook settings")?;
    Ok(match mode {
        Mode::Live => Box::new(DiscordWebhook::new(settings.clone())?),
        Mode::Test => Box::new(TestWebhook::default()),
    })
}

/// Builds the HTTP client shared by the live implementations.
fn http_client() -> Res<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Unable to create the HTTP client")
}
