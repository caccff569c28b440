//! Document schemas

pub mod economy;
pub mod metadata;

pub use economy::{EconomyDoc, TransactionEntry, ECONOMY_COLLECTION, TRANSACTION_LOG_CAP};
pub use metadata::Metadata;
