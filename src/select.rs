//! Pure selection over fetched transactions. Every function here preserves input order.

use crate::model::{Transaction, TransactionType};
use chrono::{DateTime, Utc};

/// Keeps the transactions whose type is `kind`.
pub fn by_type(
    transactions: impl IntoIterator<Item = Transaction>,
    kind: TransactionType,
) -> Vec<Transaction> {
    transactions
        .into_iter()
        .filter(|t| t.kind() == kind)
        .collect()
}

/// Keeps the transactions created at or after `since`.
pub fn since(
    transactions: impl IntoIterator<Item = Transaction>,
    since: DateTime<Utc>,
) -> Vec<Transaction> {
    transactions
        .into_iter()
        .filter(|t| t.created_at() >= since)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use chrono::{Duration, TimeZone};

    fn t(id: &str, kind: TransactionType, minutes: i64) -> Transaction {
        let base = Utc.with_ymd_and_hms(2025, 1, 28, 12, 0, 0).unwrap();
        Transaction::new(
            id,
            kind,
            Amount::from_minor_units(1000, "USD").unwrap(),
            base + Duration::minutes(minutes),
            Some("Hope".to_string()),
        )
    }

    fn ids(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(|t| t.id()).collect()
    }

    #[test]
    fn test_by_type_keeps_matching_in_order() {
        let input = vec![
            t("a", TransactionType::Credit, 0),
            t("b", TransactionType::Debit, 1),
            t("c", TransactionType::Credit, 2),
            t("d", TransactionType::Debit, 3),
            t("e", TransactionType::Credit, 4),
        ];
        let credits = by_type(input.clone(), TransactionType::Credit);
        assert_eq!(ids(&credits), vec!["a", "c", "e"]);
        assert!(credits.iter().all(|t| t.kind() == TransactionType::Credit));

        let debits = by_type(input, TransactionType::Debit);
        assert_eq!(ids(&debits), vec!["b", "d"]);
    }

    #[test]
    fn test_by_type_empty_and_no_match() {
        assert!(by_type(Vec::new(), TransactionType::Credit).is_empty());
        let input = vec![t("a", TransactionType::Debit, 0)];
        assert!(by_type(input, TransactionType::Credit).is_empty());
    }

    #[test]
    fn test_since_is_inclusive() {
        let input = vec![
            t("old", TransactionType::Credit, -1),
            t("edge", TransactionType::Credit, 0),
            t("new", TransactionType::Credit, 1),
        ];
        let start = Utc.with_ymd_and_hms(2025, 1, 28, 12, 0, 0).unwrap();
        let selected = since(input, start);
        assert_eq!(ids(&selected), vec!["edge", "new"]);
    }
}
