//! Implements the `Collective` trait with the Open Collective GraphQL v2 API.

use crate::api::{http_client, Collective};
use crate::config::Secret;
use crate::error::Res;
use crate::model::{Amount, Transaction, TransactionType};
use crate::Config;
use anyhow::{bail, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, trace, warn};
use url::Url;

/// The largest page the API will return.
const PAGE_SIZE: u64 = 1000;

const TRANSACTIONS_QUERY: &str = r#"
query transactions($account: String, $dateFrom: DateTime, $limit: Int, $offset: Int) {
    account(slug: $account) {
        slug
        transactions(
            limit: $limit
            offset: $offset
            dateFrom: $dateFrom
            orderBy: { field: CREATED_AT, direction: ASC }
        ) {
            totalCount
            nodes {
                id
                type
                createdAt
                amount {
                    valueInCents
                    currency
                }
                fromAccount {
                    name
                }
            }
        }
    }
}
"#;

/// Queries the transactions of an account from the Open Collective GraphQL API.
pub(crate) struct OpenCollective {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Secret,
}

impl OpenCollective {
    pub(crate) fn new(config: &Config) -> Res<Self> {
        Ok(Self {
            client: http_client()?,
            endpoint: config.api_endpoint().clone(),
            api_key: config.api_key().clone(),
        })
    }

    /// Fetches one page of transactions starting at `offset`.
    async fn page(&self, account_slug: &str, date_from: &str, offset: u64) -> Res<Page> {
        trace!("Requesting transactions of {account_slug} from {date_from}, offset {offset}");
        let request = GraphQlRequest {
            query: TRANSACTIONS_QUERY,
            variables: Variables {
                account: account_slug,
                date_from,
                limit: PAGE_SIZE,
                offset,
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Api-Key", self.api_key.expose())
            .json(&request)
            .send()
            .await
            .context("Failed to send the transactions query")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read the transactions query response")?;

        if !status.is_success() {
            bail!("The transactions query failed with status {status}: {body}");
        }

        parse_page(account_slug, &body)
    }
}

#[async_trait::async_trait]
impl Collective for OpenCollective {
    async fn transactions(
        &mut self,
        account_slug: &str,
        since: DateTime<Utc>,
    ) -> Res<Vec<Transaction>> {
        let date_from = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let this = &*self;
        let nodes = collect_pages(|offset| this.page(account_slug, &date_from, offset)).await?;
        let transactions = into_transactions(nodes);
        debug!(
            "Fetched {} transactions of {account_slug} since {date_from}",
            transactions.len()
        );
        Ok(transactions)
    }
}

/// Requests pages by offset until `totalCount` nodes have been received or a page comes back
/// empty. The first failed page fails the whole fetch.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Res<Vec<Node>>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Res<Page>>,
{
    let mut nodes = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch_page(offset).await?;
        let received = page.nodes.len() as u64;
        nodes.extend(page.nodes);
        offset += received;
        if received == 0 || offset >= page.total_count {
            break;
        }
    }
    Ok(nodes)
}

/// Converts nodes into transactions, skipping any that cannot be represented.
fn into_transactions(nodes: Vec<Node>) -> Vec<Transaction> {
    nodes
        .into_iter()
        .filter_map(|node| match node.into_transaction() {
            Ok(transaction) => Some(transaction),
            Err(e) => {
                warn!("Skipping a transaction: {e:#}");
                None
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Variables<'a> {
    account: &'a str,
    date_from: &'a str,
    limit: u64,
    offset: u64,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    account: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    transactions: Page,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    total_count: u64,
    nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Node {
    id: String,
    #[serde(rename = "type")]
    kind: TransactionType,
    created_at: DateTime<Utc>,
    amount: AmountNode,
    from_account: Option<FromAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmountNode {
    /// The API declares this as a float even though it always holds whole cents.
    value_in_cents: f64,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FromAccount {
    name: Option<String>,
}

impl Node {
    fn into_transaction(self) -> Res<Transaction> {
        let currency = self
            .amount
            .currency
            .with_context(|| format!("Transaction {} has no currency", self.id))?;
        let amount = Amount::from_minor_units(self.amount.value_in_cents.round() as i64, currency)
            .with_context(|| format!("Transaction {} has an invalid amount", self.id))?;
        Ok(Transaction::new(
            self.id,
            self.kind,
            amount,
            self.created_at,
            self.from_account.and_then(|a| a.name),
        ))
    }
}

/// Parses a GraphQL response body into a page of transaction nodes.
fn parse_page(account_slug: &str, body: &str) -> Res<Page> {
    let response: GraphQlResponse =
        serde_json::from_str(body).context("Unable to parse the transactions query response")?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        bail!("The transactions query returned errors: {}", messages.join("; "));
    }

    match response.data.and_then(|d| d.account) {
        Some(account) => Ok(account.transactions),
        None => bail!("The account '{account_slug}' was not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"{
        "data": {
            "account": {
                "slug": "twohoursonelife",
                "transactions": {
                    "totalCount": 3,
                    "nodes": [
                        {
                            "id": "b6c1d908-caf5-4f56-89b1-814b4f1f7d46",
                            "type": "CREDIT",
                            "createdAt": "2025-01-28T13:06:38.414Z",
                            "amount": { "valueInCents": 2000, "currency": "USD" },
                            "fromAccount": { "name": "Hope" }
                        },
                        {
                            "id": "0f7e3c55-7d7b-4c61-9f0e-3a2d8f1b9c20",
                            "type": "DEBIT",
                            "createdAt": "2025-01-28T14:00:00Z",
                            "amount": { "valueInCents": -450.0, "currency": "USD" },
                            "fromAccount": { "name": "twohoursonelife" }
                        },
                        {
                            "id": "5a1c2b3d-0000-4e4e-8f8f-123456789abc",
                            "type": "CREDIT",
                            "createdAt": "2025-01-28T15:30:00Z",
                            "amount": { "valueInCents": 500, "currency": "EUR" },
                            "fromAccount": null
                        }
                    ]
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_page() {
        let page = parse_page("twohoursonelife", PAGE).unwrap();
        assert_eq!(page.total_count, 3);
        let transactions: Vec<Transaction> = page
            .nodes
            .into_iter()
            .map(|n| n.into_transaction().unwrap())
            .collect();
        assert_eq!(transactions.len(), 3);

        let first = &transactions[0];
        assert_eq!(first.id(), "b6c1d908-caf5-4f56-89b1-814b4f1f7d46");
        assert_eq!(first.kind(), TransactionType::Credit);
        assert_eq!(first.amount().to_string(), "20.00 USD");
        assert_eq!(first.donor(), Some("Hope"));
        assert_eq!(
            first.created_at().timestamp(),
            Utc.with_ymd_and_hms(2025, 1, 28, 13, 6, 38)
                .unwrap()
                .timestamp()
        );

        assert_eq!(transactions[1].kind(), TransactionType::Debit);
        assert!(transactions[1].amount().is_negative());

        assert_eq!(transactions[2].donor(), None);
        assert_eq!(transactions[2].amount().currency(), "EUR");
    }

    #[test]
    fn test_parse_page_with_errors() {
        let body = r#"{
            "data": null,
            "errors": [{ "message": "Invalid personal token" }]
        }"#;
        let err = parse_page("twohoursonelife", body).unwrap_err();
        assert!(err.to_string().contains("Invalid personal token"));
    }

    #[test]
    fn test_parse_page_unknown_account() {
        let body = r#"{ "data": { "account": null } }"#;
        let err = parse_page("nobody", body).unwrap_err();
        assert!(err.to_string().contains("'nobody' was not found"));
    }

    #[test]
    fn test_parse_page_malformed() {
        assert!(parse_page("twohoursonelife", "<html>Bad Gateway</html>").is_err());
    }

    fn node(id: &str, currency: Option<&str>) -> Node {
        Node {
            id: id.to_string(),
            kind: TransactionType::Credit,
            created_at: Utc.with_ymd_and_hms(2025, 1, 28, 15, 30, 0).unwrap(),
            amount: AmountNode {
                value_in_cents: 500.0,
                currency: currency.map(str::to_string),
            },
            from_account: None,
        }
    }

    fn page(total_count: u64, start: u64, len: u64) -> Page {
        Page {
            total_count,
            nodes: (start..start + len)
                .map(|i| node(&i.to_string(), Some("USD")))
                .collect(),
        }
    }

    #[test]
    fn test_node_without_currency() {
        let body = r#"{
            "data": { "account": { "transactions": { "totalCount": 1, "nodes": [{
                "id": "x",
                "type": "CREDIT",
                "createdAt": "2025-01-28T15:30:00Z",
                "amount": { "valueInCents": 500, "currency": null },
                "fromAccount": { "name": "Hope" }
            }]}}}
        }"#;
        let mut page = parse_page("twohoursonelife", body).unwrap();
        let node = page.nodes.pop().unwrap();
        assert!(node.into_transaction().is_err());
    }

    #[test]
    fn test_nodes_without_currency_are_skipped() {
        let transactions =
            into_transactions(vec![node("a", Some("USD")), node("b", None), node("c", Some("EUR"))]);
        let ids: Vec<&str> = transactions.iter().map(|t| t.id()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test]
    async fn test_collect_pages_until_total_count() {
        let mut offsets = Vec::new();
        let nodes = collect_pages(|offset| {
            offsets.push(offset);
            let page = page(1500, offset, (1500 - offset).min(PAGE_SIZE));
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(offsets, [0, 1000]);
        assert_eq!(nodes.len(), 1500);
        assert_eq!(nodes[0].id, "0");
        assert_eq!(nodes[1499].id, "1499");
    }

    #[tokio::test]
    async fn test_collect_pages_stops_on_empty_page() {
        let mut offsets = Vec::new();
        let nodes = collect_pages(|offset| {
            offsets.push(offset);
            // The count claims more than the API actually serves.
            let len = if offset == 0 { PAGE_SIZE } else { 0 };
            let page = page(5000, offset, len);
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(offsets, [0, 1000]);
        assert_eq!(nodes.len(), 1000);
    }

    #[tokio::test]
    async fn test_collect_pages_fails_on_page_error() {
        let result = collect_pages(|offset| async move {
            if offset == 0 {
                Ok(page(1500, 0, PAGE_SIZE))
            } else {
                bail!("The transactions query failed with status 502 Bad Gateway")
            }
        })
        .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("502 Bad Gateway"));
    }

    #[test]
    fn test_request_serialization() {
        let request = GraphQlRequest {
            query: TRANSACTIONS_QUERY,
            variables: Variables {
                account: "twohoursonelife",
                date_from: "2025-01-28T00:00:00Z",
                limit: PAGE_SIZE,
                offset: 0,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["variables"]["account"], "twohoursonelife");
        assert_eq!(json["variables"]["dateFrom"], "2025-01-28T00:00:00Z");
        assert_eq!(json["variables"]["limit"], 1000);
        assert!(json["query"].as_str().unwrap().contains("totalCount"));
    }
}
