//! Implements the `Collective` and `Webhook` traits in memory for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without touching Open Collective or Discord.

use crate::api::{Collective, Webhook};
use crate::error::Res;
use crate::model::{Amount, Transaction, TransactionType};
use anyhow::bail;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

/// An implementation of the `Collective` trait that serves transactions from memory. By default,
/// it is seeded with a few transactions relative to the current time.
pub(crate) struct TestCollective {
    data: Vec<Transaction>,
    failure: Option<String>,
    requests: Vec<(String, DateTime<Utc>)>,
}

impl TestCollective {
    /// Create a new `TestCollective` that serves `data`, which should be oldest first.
    pub(crate) fn new(data: Vec<Transaction>) -> Self {
        Self {
            data,
            failure: None,
            requests: Vec::new(),
        }
    }

    /// Create a `TestCollective` whose every request fails with `message`.
    pub(crate) fn failing(message: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            failure: Some(message.into()),
            requests: Vec::new(),
        }
    }

    /// The `(account_slug, since)` pairs of all requests received so far.
    pub(crate) fn requests(&self) -> &[(String, DateTime<Utc>)] {
        &self.requests
    }
}

#[async_trait::async_trait]
impl Collective for TestCollective {
    async fn transactions(
        &mut self,
        account_slug: &str,
        since: DateTime<Utc>,
    ) -> Res<Vec<Transaction>> {
        self.requests.push((account_slug.to_string(), since));
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        Ok(self
            .data
            .iter()
            .filter(|t| t.created_at() >= since)
            .cloned()
            .collect())
    }
}

impl Default for TestCollective {
    /// Loads seed data from this module.
    fn default() -> Self {
        Self::new(default_data(Utc::now()))
    }
}

/// Seed data: two donations and an expense inside a 12 hour window, and one donation outside it.
fn default_data(now: DateTime<Utc>) -> Vec<Transaction> {
    let seed = [
        (TransactionType::Credit, 2000, Some("Hope"), Duration::hours(30)),
        (TransactionType::Credit, 1000, Some("Alice"), Duration::hours(6)),
        (TransactionType::Debit, -5000, Some("Web Hosting Inc"), Duration::hours(4)),
        (TransactionType::Credit, 2500, None, Duration::minutes(45)),
    ];
    seed.into_iter()
        .filter_map(|(kind, cents, donor, age)| {
            let amount = Amount::from_minor_units(cents, "USD").ok()?;
            Some(Transaction::new(
                Uuid::new_v4().to_string(),
                kind,
                amount,
                now - age,
                donor.map(str::to_string),
            ))
        })
        .collect()
}

/// An implementation of the `Webhook` trait that records every message it is asked to send
/// instead of sending it. It can be told to fail on specific calls.
#[derive(Debug, Default)]
pub(crate) struct TestWebhook {
    attempts: Vec<String>,
    delivered: Vec<String>,
    fail_on: BTreeSet<usize>,
}

impl TestWebhook {
    /// Create a `TestWebhook` that fails the calls whose zero-based positions are in `fail_on`.
    pub(crate) fn failing_on(fail_on: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_on: fail_on.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Every message passed to `send`, in order, whether or not it was delivered.
    pub(crate) fn attempts(&self) -> &[String] {
        &self.attempts
    }

    /// The messages that were delivered, in order.
    pub(crate) fn delivered(&self) -> &[String] {
        &self.delivered
    }
}

#[async_trait::async_trait]
impl Webhook for TestWebhook {
    async fn send(&mut self, content: &str) -> Res<()> {
        let call = self.attempts.len();
        self.attempts.push(content.to_string());
        if self.fail_on.contains(&call) {
            bail!("Simulated webhook failure on call {call}");
        }
        info!("(test mode) {content}");
        self.delivered.push(content.to_string());
        Ok(())
    }
}
