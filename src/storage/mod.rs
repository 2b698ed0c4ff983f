mod memory;
mod repository;

pub use memory::*;
pub use repository::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{LedgerEntry, StockConsumption, StockItem, StockReceipt, TransactionLog};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Persistence for the four stock collections.
///
/// Implementations only store and fetch; quantities and values are computed by the
/// caller and arrive fully formed inside a [`LedgerEntry`].
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Look up an item by its business code.
    async fn get_item(&self, item_code: &str) -> Result<Option<StockItem>>;

    /// All items, most recently created first.
    async fn list_items(&self) -> Result<Vec<StockItem>>;

    /// All receipts, most recently created first.
    async fn list_receipts(&self) -> Result<Vec<StockReceipt>>;

    /// All consumptions, most recently created first.
    async fn list_consumptions(&self) -> Result<Vec<StockConsumption>>;

    /// All log entries, newest first.
    async fn list_logs(&self) -> Result<Vec<TransactionLog>>;

    /// Write the movement, the item and the log row of an entry.
    /// Either all three land or none do.
    async fn commit(&self, entry: &LedgerEntry) -> Result<()>;
}
