//! Run configuration.
//!
//! The configuration is assembled once at startup from the parsed command line (which clap fills
//! from the environment and `.env`) and is then passed by reference into the pipeline. Nothing
//! else in the crate reads the environment.

use crate::args::{SourceArgs, WebhookArgs};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::TransactionType;
use crate::Result;
use anyhow::{bail, ensure, Context};
use chrono::Duration;
use std::convert::Infallible;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use url::Url;

/// The Open Collective GraphQL v2 endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.opencollective.com/graphql/v2";

/// The display name the webhook posts under unless configured otherwise.
pub const DEFAULT_WEBHOOK_USERNAME: &str = "Open Collective";

/// The default lookback window. Should be at least the interval of the scheduler that invokes us.
pub const DEFAULT_LOOKBACK_HOURS: u32 = 12;

/// The `Config` object holds everything a run needs. It is immutable once created.
#[derive(Debug, Clone)]
pub struct Config {
    api_key: Secret,
    api_endpoint: Url,
    account_slug: String,
    lookback: Duration,
    transaction_type: TransactionType,
    webhook: Option<WebhookConfig>,
}

impl Config {
    /// Validates `source` and, if given, `webhook`, and returns the resulting configuration.
    ///
    /// `webhook` is optional because `preview` does not deliver anything.
    ///
    /// # Errors
    /// - Returns an `ErrorType::Config` error if any setting is missing or malformed.
    pub fn load(source: &SourceArgs, webhook: Option<&WebhookArgs>) -> Result<Self> {
        Self::load_inner(source, webhook).pub_result(ErrorType::Config)
    }

    fn load_inner(source: &SourceArgs, webhook: Option<&WebhookArgs>) -> Res<Self> {
        ensure!(
            !source.api_key().is_empty(),
            "An API key is required, set OC_API_KEY or pass --api-key"
        );

        let account_slug = source.account_slug().trim().to_string();
        ensure!(
            !account_slug.is_empty(),
            "An account slug is required, set OC_ACCOUNT_SLUG or pass --account-slug"
        );
        ensure!(
            !account_slug.contains(char::is_whitespace),
            "The account slug '{account_slug}' must not contain whitespace"
        );

        ensure!(
            source.lookback_hours() > 0,
            "The lookback window must be at least one hour"
        );

        let api_endpoint =
            parse_http_url(source.api_endpoint()).context("Invalid API endpoint")?;

        let webhook = match webhook {
            Some(args) => Some(WebhookConfig::new(args)?),
            None => None,
        };

        Ok(Self {
            api_key: source.api_key().clone(),
            api_endpoint,
            account_slug,
            lookback: Duration::hours(i64::from(source.lookback_hours())),
            transaction_type: source.transaction_type(),
            webhook,
        })
    }

    pub fn api_key(&self) -> &Secret {
        &self.api_key
    }

    pub fn api_endpoint(&self) -> &Url {
        &self.api_endpoint
    }

    pub fn account_slug(&self) -> &str {
        &self.account_slug
    }

    pub fn lookback(&self) -> Duration {
        self.lookback
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Returns the webhook settings, which are absent when loaded for `preview`.
    pub fn webhook(&self) -> Option<&WebhookConfig> {
        self.webhook.as_ref()
    }
}

/// Where and how messages are delivered.
#[derive(Clone)]
pub struct WebhookConfig {
    /// The webhook URL embeds its own credential, so it is treated as a secret.
    url: Url,
    username: String,
    avatar_url: Option<Url>,
}

impl WebhookConfig {
    fn new(args: &WebhookArgs) -> Res<Self> {
        let url = parse_http_url(args.webhook_url().expose()).context("Invalid webhook URL")?;
        let username = args.webhook_username().trim().to_string();
        ensure!(!username.is_empty(), "The webhook username must not be blank");
        let avatar_url = args
            .webhook_avatar_url()
            .map(|s| parse_http_url(s).context("Invalid webhook avatar URL"))
            .transpose()?;
        Ok(Self {
            url,
            username,
            avatar_url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn avatar_url(&self) -> Option<&Url> {
        self.avatar_url.as_ref()
    }
}

impl Debug for WebhookConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &Secret::REDACTED)
            .field("username", &self.username)
            .field("avatar_url", &self.avatar_url)
            .finish()
    }
}

/// A string that must never show up in logs. Both `Debug` and `Display` are redacted; use
/// `expose` to get the value.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Secret(String);

impl Secret {
    const REDACTED: &'static str = "********";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret({})", Self::REDACTED)
    }
}

impl Display for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

fn parse_http_url(s: &str) -> Res<Url> {
    let url = Url::parse(s.trim()).context("Unable to parse URL")?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Unsupported URL scheme '{other}', expected http or https"),
    }
}
