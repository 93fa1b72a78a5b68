//! Turns transactions into chat messages.

use crate::model::Transaction;

/// Used in place of the donor name when the platform does not report one.
pub const ANONYMOUS: &str = "Anonymous";

/// Produces the message announcing `transaction`. The donor and amount are bold in Discord
/// markdown, and the time is a Discord relative timestamp tag, e.g. `<t:1738069598:R>`, which
/// each reader's client renders as "3 hours ago".
///
/// # Examples
///
/// ```
/// # use collective_notify::format::message;
/// # use collective_notify::model::{Amount, Transaction, TransactionType};
/// # use chrono::{TimeZone, Utc};
/// let t = Transaction::new(
///     "b6c1d908",
///     TransactionType::Credit,
///     Amount::from_minor_units(2000, "USD").unwrap(),
///     Utc.timestamp_opt(1738069598, 0).unwrap(),
///     Some("Hope".to_string()),
/// );
/// assert_eq!(
///     message(&t),
///     "Thank you **Hope** for your contribution of **20.00 USD**, <t:1738069598:R>!"
/// );
/// ```
pub fn message(transaction: &Transaction) -> String {
    let donor = transaction.donor().unwrap_or(ANONYMOUS);
    format!(
        "Thank you **{donor}** for your contribution of **{}**, <t:{}:R>!",
        transaction.amount(),
        transaction.created_at().timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TransactionType};
    use chrono::{TimeZone, Utc};

    fn donation(donor: Option<&str>, minor_units: i64, currency: &str) -> Transaction {
        Transaction::new(
            "tx",
            TransactionType::Credit,
            Amount::from_minor_units(minor_units, currency).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 28, 13, 6, 38).unwrap(),
            donor.map(str::to_string),
        )
    }

    #[test]
    fn test_message_has_donor_amount_and_currency() {
        let m = message(&donation(Some("Alice"), 2500, "USD"));
        assert!(m.contains("Alice"));
        assert!(m.contains("25.00"));
        assert!(m.contains("USD"));
    }

    #[test]
    fn test_message_missing_donor() {
        let m = message(&donation(None, 500, "EUR"));
        assert!(m.contains("**Anonymous**"));
        assert!(m.contains("5.00 EUR"));
    }

    #[test]
    fn test_message_blank_donor() {
        let m = message(&donation(Some(""), 500, "EUR"));
        assert!(m.contains(ANONYMOUS));
    }

    #[test]
    fn test_message_timestamp_tag() {
        let t = donation(Some("Hope"), 2000, "USD");
        let m = message(&t);
        assert!(m.contains(&format!("<t:{}:R>", t.created_at().timestamp())));
    }

    #[test]
    fn test_message_large_amount() {
        let m = message(&donation(Some("Patron"), 123_456_789, "USD"));
        assert!(m.contains("**1,234,567.89 USD**"));
    }
}
