//! Command handlers for the collective-notify CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod preview;
mod run;

use crate::api::Collective;
use crate::error::{ErrorType, IntoResult};
use crate::model::Transaction;
use crate::{select, Config, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use preview::preview;
pub use run::{run, FailedDelivery, Report};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// The transactions a run is about: those from within the lookback window that match the
/// configured type.
#[derive(Debug)]
struct Selection {
    /// How many transactions the upstream API returned.
    fetched: usize,
    /// The matching transactions, in the order the API returned them.
    matching: Vec<Transaction>,
}

/// Fetches the transactions of the configured account created since `now - lookback` and
/// selects those of the configured type.
///
/// # Errors
/// - Returns an `ErrorType::Api` error if the transactions cannot be fetched.
async fn select_new(
    config: &Config,
    collective: &mut (dyn Collective + Send),
    now: DateTime<Utc>,
) -> Result<Selection> {
    let since = now - config.lookback();
    let fetched = collective
        .transactions(config.account_slug(), since)
        .await
        .with_context(|| {
            format!(
                "Unable to fetch the transactions of '{}'",
                config.account_slug()
            )
        })
        .pub_result(ErrorType::Api)?;
    let count = fetched.len();

    // The API already applies the window, but the pipeline does not rely on it.
    let recent = select::since(fetched, since);
    let matching = select::by_type(recent, config.transaction_type());
    debug!(
        "{} of {count} transactions since {since} are of type {}",
        matching.len(),
        config.transaction_type()
    );

    Ok(Selection {
        fetched: count,
        matching,
    })
}
