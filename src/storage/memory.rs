use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::{
    ActivityCode, ItemWrite, LedgerEntry, LogAction, LogType, Movement, Quantity,
    StockConsumption, StockItem, StockReceipt, TransactionLog, Unit,
};

use super::StockStore;

#[derive(Debug, Default)]
struct Tables {
    items: Vec<StockItem>,
    receipts: Vec<StockReceipt>,
    consumptions: Vec<StockConsumption>,
    logs: Vec<TransactionLog>,
}

/// In-memory store, for tests and demos. Nothing survives the process.
///
/// Clones share the same tables. An entry is checked and applied under one write lock,
/// so readers never see half of it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with a small construction-site inventory: four items,
    /// two receipts, two consumptions and their log entries.
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        *store.tables.write() = sample_tables();
        store
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn get_item(&self, item_code: &str) -> Result<Option<StockItem>> {
        let tables = self.tables.read();
        Ok(tables
            .items
            .iter()
            .find(|item| item.item_code == item_code)
            .cloned())
    }

    async fn list_items(&self) -> Result<Vec<StockItem>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.items, |item| item.created_at))
    }

    async fn list_receipts(&self) -> Result<Vec<StockReceipt>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.receipts, |r| r.created_at))
    }

    async fn list_consumptions(&self) -> Result<Vec<StockConsumption>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.consumptions, |c| c.created_at))
    }

    async fn list_logs(&self) -> Result<Vec<TransactionLog>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.logs, |log| log.timestamp))
    }

    async fn commit(&self, entry: &LedgerEntry) -> Result<()> {
        let mut tables = self.tables.write();

        // Check everything before touching anything.
        let position = tables
            .items
            .iter()
            .position(|item| item.item_code == entry.item.item().item_code);
        match (&entry.item, position) {
            (ItemWrite::Insert(item), Some(_)) => {
                bail!("Stock item already exists: {}", item.item_code)
            }
            (ItemWrite::Update(item), None) => {
                bail!("Stock item not found: {}", item.item_code)
            }
            _ => {}
        }

        match &entry.movement {
            Movement::Receipt(receipt) => tables.receipts.push(receipt.clone()),
            Movement::Consumption(consumption) => tables.consumptions.push(consumption.clone()),
        }

        match (&entry.item, position) {
            (ItemWrite::Update(item), Some(index)) => tables.items[index] = item.clone(),
            (write, _) => tables.items.push(write.item().clone()),
        }

        tables.logs.push(entry.log.clone());

        tracing::debug!(
            item_code = %entry.item.item().item_code,
            log_id = %entry.log.id,
            "Committed ledger entry to memory store"
        );
        Ok(())
    }
}

/// Newest first. Rows sharing a timestamp come back in reverse insertion order.
fn newest_first<T: Clone>(rows: &[T], key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = rows.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));
    sorted
}

fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).expect("sample dates are valid")
}

fn at(year: i32, month: u32, dom: u32) -> DateTime<Utc> {
    day(year, month, dom)
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc()
}

/// Sample items are created and last touched on days of January 2024.
fn sample_item(
    name: &str,
    code: &str,
    quantity: i64,
    unit: Unit,
    rate: i64,
    created_day: u32,
    updated_day: u32,
) -> StockItem {
    let mut item = StockItem::new(
        name,
        code,
        unit,
        Quantity::from(quantity),
        Quantity::from(rate),
        at(2024, 1, created_day),
    );
    item.updated_at = at(2024, 1, updated_day);
    item
}

fn sample_tables() -> Tables {
    let items = vec![
        sample_item("Portland Cement", "CEM001", 150, Unit::Bag, 850, 15, 20),
        sample_item("Steel Rebar 12mm", "STL012", 2500, Unit::Kg, 65, 15, 18),
        sample_item("Ready Mix Concrete M25", "RMC025", 45, Unit::M3, 4500, 16, 19),
        sample_item("Brick (Common)", "BRK001", 15000, Unit::Pcs, 8, 14, 17),
    ];

    let cement_receipt = StockReceipt {
        id: Uuid::new_v4(),
        item_name: "Portland Cement".into(),
        item_code: "CEM001".into(),
        quantity_received: Quantity::from(100),
        rate_per_unit: Quantity::from(850),
        unit: Unit::Bag,
        total_value: Quantity::from(85000),
        supplier_name: "ABC Cement Co.".into(),
        delivery_date: day(2024, 1, 20),
        received_by: "John Supervisor".into(),
        created_at: at(2024, 1, 20),
        created_by: "John Supervisor".into(),
    };
    let steel_receipt = StockReceipt {
        id: Uuid::new_v4(),
        item_name: "Steel Rebar 12mm".into(),
        item_code: "STL012".into(),
        quantity_received: Quantity::from(1000),
        rate_per_unit: Quantity::from(65),
        unit: Unit::Kg,
        total_value: Quantity::from(65000),
        supplier_name: "XYZ Steel Industries".into(),
        delivery_date: day(2024, 1, 18),
        received_by: "Mike Foreman".into(),
        created_at: at(2024, 1, 18),
        created_by: "Mike Foreman".into(),
    };

    let cement_use = StockConsumption {
        id: Uuid::new_v4(),
        item_name: "Portland Cement".into(),
        item_code: "CEM001".into(),
        quantity_used: Quantity::from(25),
        unit: Unit::Bag,
        purpose_activity_code: ActivityCode::Constr,
        used_by: "Construction Team A".into(),
        date: day(2024, 1, 21),
        remarks: Some("Foundation work - Block A".into()),
        created_at: at(2024, 1, 21),
        created_by: "John Supervisor".into(),
    };
    let steel_use = StockConsumption {
        id: Uuid::new_v4(),
        item_name: "Steel Rebar 12mm".into(),
        item_code: "STL012".into(),
        quantity_used: Quantity::from(500),
        unit: Unit::Kg,
        purpose_activity_code: ActivityCode::Constr,
        used_by: "Construction Team B".into(),
        date: day(2024, 1, 19),
        remarks: Some("Column reinforcement".into()),
        created_at: at(2024, 1, 19),
        created_by: "Mike Foreman".into(),
    };

    let logs = vec![
        TransactionLog {
            id: Uuid::new_v4(),
            log_type: LogType::Receipt,
            reference_id: cement_receipt.id,
            action: LogAction::Created,
            performed_by: "John Supervisor".into(),
            timestamp: at(2024, 1, 20),
            details: "Added 100 bag of Portland Cement from ABC Cement Co.".into(),
        },
        TransactionLog {
            id: Uuid::new_v4(),
            log_type: LogType::Consumption,
            reference_id: cement_use.id,
            action: LogAction::Created,
            performed_by: "John Supervisor".into(),
            timestamp: at(2024, 1, 21),
            details: "Used 25 bag of Portland Cement for CONSTR".into(),
        },
    ];

    Tables {
        items,
        receipts: vec![cement_receipt, steel_receipt],
        consumptions: vec![cement_use, steel_use],
        logs,
    }
}
