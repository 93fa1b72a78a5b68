//! Types that represent the core data model, such as `Transaction` and `Amount`.
mod amount;
mod transaction;

pub use amount::Amount;
pub use transaction::{Transaction, TransactionType};
