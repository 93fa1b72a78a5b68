use crate::api::{self, Collective, Mode, Webhook};
use crate::commands::{select_new, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{format, Config, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

/// The outcome of a `run`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Report {
    /// Transactions returned by the upstream API.
    pub fetched: usize,
    /// Transactions that matched the lookback window and type filter.
    pub matched: usize,
    /// Messages that were delivered.
    pub delivered: usize,
    /// Messages that could not be delivered.
    pub failed: Vec<FailedDelivery>,
}

/// A message that could not be delivered, and why.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FailedDelivery {
    pub transaction_id: String,
    pub error: String,
}

/// Fetches the recent transactions of the configured account and posts one message per matching
/// transaction to the webhook, oldest first.
///
/// Delivery is best-effort: a message that fails to deliver is logged and recorded in the
/// `Report`, and the remaining messages are still attempted.
///
/// # Errors
/// - `ErrorType::Config` if `config` has no webhook settings.
/// - `ErrorType::Api` if the transactions cannot be fetched. Nothing is delivered in that case.
pub async fn run(config: Config, mode: Mode) -> Result<Out<Report>> {
    let mut webhook = api::webhook(&config, mode).pub_result(ErrorType::Config)?;
    let mut collective = api::collective(&config, mode).pub_result(ErrorType::Api)?;
    notify(&config, collective.as_mut(), webhook.as_mut(), Utc::now()).await
}

pub(crate) async fn notify(
    config: &Config,
    collective: &mut (dyn Collective + Send),
    webhook: &mut (dyn Webhook + Send),
    now: DateTime<Utc>,
) -> Result<Out<Report>> {
    let selection = select_new(config, collective, now).await?;
    let mut report = Report {
        fetched: selection.fetched,
        matched: selection.matching.len(),
        ..Report::default()
    };

    for transaction in &selection.matching {
        let content = format::message(transaction);
        match webhook.send(&content).await.pub_result(ErrorType::Delivery) {
            Ok(()) => {
                info!("Sent the message for transaction {}", transaction.id());
                report.delivered += 1;
            }
            Err(e) => {
                error!(
                    "Unable to send the message for transaction {}: {e}",
                    transaction.id()
                );
                report.failed.push(FailedDelivery {
                    transaction_id: transaction.id().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    let message = match (report.matched, report.failed.len()) {
        (0, _) => "No new transactions to send.".to_string(),
        (matched, 0) => format!("Sent {matched} new transaction(s)."),
        (matched, failed) => format!(
            "Sent {} of {matched} new transaction(s), {failed} failed.",
            report.delivered
        ),
    };
    Ok(Out::new(message, report))
}
