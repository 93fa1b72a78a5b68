use crate::model::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The direction of a transaction as reported by the fundraising platform.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Incoming funds, e.g. a donation.
    #[default]
    #[serde(alias = "credit")]
    Credit,
    /// Outgoing funds, e.g. an expense payout.
    #[serde(alias = "debit")]
    Debit,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A single transaction record from the upstream API. These are never persisted.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    id: String,
    kind: TransactionType,
    amount: Amount,
    created_at: DateTime<Utc>,
    /// The name of the account the money came from. The platform omits it for some
    /// contributions, e.g. guest or incognito donations.
    donor: Option<String>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        kind: TransactionType,
        amount: Amount,
        created_at: DateTime<Utc>,
        donor: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            amount,
            created_at,
            donor,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The donor name, or `None` if it is missing or blank.
    pub fn donor(&self) -> Option<&str> {
        self.donor
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
