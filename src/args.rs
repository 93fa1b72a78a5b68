//! These structs provide the CLI interface for the collective-notify CLI.

use crate::config::{
    Secret, DEFAULT_API_ENDPOINT, DEFAULT_LOOKBACK_HOURS, DEFAULT_WEBHOOK_USERNAME,
};
use crate::model::TransactionType;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

/// collective-notify: Announce new Open Collective contributions in a Discord channel.
///
/// Each invocation fetches the transactions of an Open Collective account from the last
/// `--lookback-hours`, keeps those of the configured type (CREDIT by default) and posts one
/// message per transaction to a Discord webhook. It is meant to be run by a scheduler such as
/// cron. The scheduling interval should be no longer than the lookback window, and runs must not
/// overlap.
///
/// Every option can also be given as an environment variable, or in a `.env` file in the
/// working directory.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch recent transactions and post a message for each matching one to the webhook.
    ///
    /// A failed delivery is logged and the remaining messages are still sent. The exit code is
    /// non-zero only if the configuration is invalid or the transactions cannot be fetched.
    ///
    /// Messages are sent back to back and are not retried. Discord rate limits webhooks, so a
    /// window holding a burst of contributions can see some of them rejected with status 429.
    Run(RunArgs),
    /// Fetch recent transactions and print the messages that `run` would post, without posting.
    Preview(PreviewArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }
}

/// Where the transactions come from and which ones are of interest.
#[derive(Debug, Parser, Clone)]
pub struct SourceArgs {
    /// Your Open Collective personal token.
    #[arg(long, env = "OC_API_KEY", hide_env_values = true)]
    api_key: Secret,

    /// The slug of the Open Collective account to watch, as it appears in the account's URL,
    /// e.g. `twohoursonelife` for https://opencollective.com/twohoursonelife
    #[arg(long, env = "OC_ACCOUNT_SLUG")]
    account_slug: String,

    /// How many hours back to look for transactions. Should be no shorter than the interval at
    /// which this program is scheduled, or contributions will be missed, and no longer, or they
    /// will be announced twice.
    #[arg(
        long,
        env = "LOOKBACK_HOURS",
        default_value_t = DEFAULT_LOOKBACK_HOURS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    lookback_hours: u32,

    /// The type of transaction to announce: CREDIT or DEBIT.
    #[arg(long, env = "TRANSACTION_TYPE", default_value_t = TransactionType::Credit)]
    transaction_type: TransactionType,

    /// The Open Collective GraphQL endpoint.
    #[arg(long, env = "OC_API_ENDPOINT", default_value = DEFAULT_API_ENDPOINT)]
    api_endpoint: String,
}

impl SourceArgs {
    pub fn new(
        api_key: Secret,
        account_slug: impl Into<String>,
        lookback_hours: u32,
        transaction_type: TransactionType,
        api_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            account_slug: account_slug.into(),
            lookback_hours,
            transaction_type,
            api_endpoint: api_endpoint.into(),
        }
    }

    pub fn api_key(&self) -> &Secret {
        &self.api_key
    }

    pub fn set_api_key(&mut self, api_key: Secret) {
        self.api_key = api_key;
    }

    pub fn account_slug(&self) -> &str {
        &self.account_slug
    }

    pub fn lookback_hours(&self) -> u32 {
        self.lookback_hours
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }
}

/// Where the messages go.
#[derive(Debug, Parser, Clone)]
pub struct WebhookArgs {
    /// The Discord webhook URL. It contains a credential, so keep it out of shell history by
    /// using WEBHOOK_URL or a `.env` file.
    #[arg(long, env = "WEBHOOK_URL", hide_env_values = true)]
    webhook_url: Secret,

    /// The name the messages are posted under.
    #[arg(long, env = "WEBHOOK_USERNAME", default_value = DEFAULT_WEBHOOK_USERNAME)]
    webhook_username: String,

    /// An image URL to use as the avatar of the messages.
    #[arg(long, env = "WEBHOOK_AVATAR_URL")]
    webhook_avatar_url: Option<String>,
}

impl WebhookArgs {
    pub fn new(
        webhook_url: Secret,
        webhook_username: impl Into<String>,
        webhook_avatar_url: Option<String>,
    ) -> Self {
        Self {
            webhook_url,
            webhook_username: webhook_username.into(),
            webhook_avatar_url,
        }
    }

    pub fn webhook_url(&self) -> &Secret {
        &self.webhook_url
    }

    pub fn webhook_username(&self) -> &str {
        &self.webhook_username
    }

    pub fn webhook_avatar_url(&self) -> Option<&str> {
        self.webhook_avatar_url.as_deref()
    }
}

/// (Not shown): Args for the `collective-notify run` command.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[clap(flatten)]
    source: SourceArgs,

    #[clap(flatten)]
    webhook: WebhookArgs,
}

impl RunArgs {
    pub fn new(source: SourceArgs, webhook: WebhookArgs) -> Self {
        Self { source, webhook }
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }

    pub fn webhook(&self) -> &WebhookArgs {
        &self.webhook
    }
}

/// (Not shown): Args for the `collective-notify preview` command.
#[derive(Debug, Parser, Clone)]
pub struct PreviewArgs {
    #[clap(flatten)]
    source: SourceArgs,
}

impl PreviewArgs {
    pub fn source(&self) -> &SourceArgs {
        &self.source
    }
}
