mod chat;
mod catalog;

pub use chat::{ChatSession, ExchangeHandle, ExchangeOutcome};
pub use catalog::{CatalogRefresher, CatalogUpdate};
