use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use crate::config::Settings;
use crate::domain::{
    ItemWrite, Movement, NewConsumption, NewReceipt, StockConsumption, StockError, StockItem,
    StockReceipt, TransactionLog, plan_consumption, plan_receipt,
};
use crate::storage::{MemoryStore, SqliteStore, StockStore};

use super::reporting::{
    ConsumptionReport, DashboardStats, ReceiptReport, ValuationReport, build_consumption_report,
    build_dashboard, build_receipt_report, build_valuation_report,
};
use super::AppError;

/// Application service for the stock ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct InventoryService {
    store: Arc<dyn StockStore>,
    settings: Settings,
}

/// Result of recording a receipt
#[derive(Debug)]
pub struct ReceiptResult {
    pub receipt: StockReceipt,
    /// Item state after the receipt
    pub item: StockItem,
    pub log: TransactionLog,
    /// True when this receipt introduced a new item code
    pub created_item: bool,
}

/// Result of recording a consumption
#[derive(Debug)]
pub struct ConsumptionResult {
    pub consumption: StockConsumption,
    /// Item state after the consumption
    pub item: StockItem,
    pub log: TransactionLog,
}

impl InventoryService {
    /// Create a service over the given store.
    pub fn new(store: Arc<dyn StockStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Service over an empty in-memory store.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(Arc::new(MemoryStore::new()), settings)
    }

    /// Service over an in-memory store seeded with sample site inventory.
    pub fn with_sample_data(settings: Settings) -> Self {
        Self::new(Arc::new(MemoryStore::with_sample_data()), settings)
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, settings: Settings) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteStore::init(&db_url).await?;
        tracing::info!(database = database_path, "Database initialized");
        Ok(Self::new(Arc::new(store), settings))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, settings: Settings) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteStore::connect(&db_url).await?;
        Ok(Self::new(Arc::new(store), settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ========================
    // Movements
    // ========================

    /// Record incoming goods, creating the item on first receipt of its code.
    pub async fn add_receipt(&self, form: NewReceipt) -> Result<ReceiptResult, AppError> {
        form.validate()?;

        let existing = self.store.get_item(form.item_code.trim()).await?;
        if let Some(item) = &existing {
            if item.unit != form.unit {
                tracing::warn!(
                    item_code = %item.item_code,
                    item_unit = %item.unit,
                    receipt_unit = %form.unit,
                    "Receipt unit differs from item unit; item keeps its unit"
                );
            }
        }

        let entry = plan_receipt(existing, form, now())?;
        self.store.commit(&entry).await?;

        let created_item = matches!(entry.item, ItemWrite::Insert(_));
        let item = entry.item.item().clone();
        let Movement::Receipt(receipt) = entry.movement else {
            unreachable!("plan_receipt always produces a receipt");
        };

        tracing::info!(
            item_code = %item.item_code,
            quantity = %receipt.quantity_received,
            new_quantity = %item.current_quantity,
            created_item,
            "Recorded stock receipt"
        );

        Ok(ReceiptResult {
            receipt,
            item,
            log: entry.log,
            created_item,
        })
    }

    /// Record usage. Unknown items and requests above the available quantity are
    /// rejected before anything is written.
    pub async fn add_consumption(
        &self,
        form: NewConsumption,
    ) -> Result<ConsumptionResult, AppError> {
        form.validate()?;

        let item_code = form.item_code.trim().to_string();
        let item = self
            .store
            .get_item(&item_code)
            .await?
            .ok_or_else(|| AppError::ItemNotFound(item_code.clone()))?;

        let entry = plan_consumption(item, form, now()).map_err(|err| match err {
            StockError::InsufficientStock {
                available,
                requested,
            } => {
                tracing::warn!(
                    item_code = %item_code,
                    available = %available,
                    requested = %requested,
                    "Rejected consumption: insufficient stock"
                );
                AppError::InsufficientStock {
                    item_code: item_code.clone(),
                    available,
                    requested,
                }
            }
        })?;

        self.store.commit(&entry).await?;

        let item = entry.item.item().clone();
        let Movement::Consumption(consumption) = entry.movement else {
            unreachable!("plan_consumption always produces a consumption");
        };

        tracing::info!(
            item_code = %item.item_code,
            quantity = %consumption.quantity_used,
            new_quantity = %item.current_quantity,
            "Recorded stock consumption"
        );

        Ok(ConsumptionResult {
            consumption,
            item,
            log: entry.log,
        })
    }

    // ========================
    // Reads
    // ========================

    /// Get a stock item by code.
    pub async fn get_stock_item(&self, item_code: &str) -> Result<StockItem, AppError> {
        self.store
            .get_item(item_code)
            .await?
            .ok_or_else(|| AppError::ItemNotFound(item_code.to_string()))
    }

    /// All stock items, most recently created first.
    pub async fn get_stock_items(&self) -> Result<Vec<StockItem>, AppError> {
        Ok(self.store.list_items().await?)
    }

    /// All receipts, most recent first.
    pub async fn get_receipts(&self) -> Result<Vec<StockReceipt>, AppError> {
        Ok(self.store.list_receipts().await?)
    }

    /// All consumptions, most recent first.
    pub async fn get_consumptions(&self) -> Result<Vec<StockConsumption>, AppError> {
        Ok(self.store.list_consumptions().await?)
    }

    /// The activity log, newest first.
    pub async fn get_logs(&self) -> Result<Vec<TransactionLog>, AppError> {
        Ok(self.store.list_logs().await?)
    }

    /// Items below the configured low-stock threshold.
    pub async fn get_low_stock_items(&self) -> Result<Vec<StockItem>, AppError> {
        let threshold = self.settings.low_stock_threshold;
        Ok(self
            .store
            .list_items()
            .await?
            .into_iter()
            .filter(|item| item.is_low_stock(threshold))
            .collect())
    }

    // ========================
    // Reports
    // ========================

    /// Headline numbers for the dashboard as of `now`.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let items = self.store.list_items().await?;
        let receipts = self.store.list_receipts().await?;
        let consumptions = self.store.list_consumptions().await?;
        Ok(build_dashboard(
            &items,
            &receipts,
            &consumptions,
            self.settings.low_stock_threshold,
            now,
        ))
    }

    pub async fn receipt_report(&self, now: DateTime<Utc>) -> Result<ReceiptReport, AppError> {
        let receipts = self.store.list_receipts().await?;
        Ok(build_receipt_report(&receipts, now))
    }

    pub async fn consumption_report(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionReport, AppError> {
        let consumptions = self.store.list_consumptions().await?;
        Ok(build_consumption_report(&consumptions, now))
    }

    pub async fn valuation_report(&self) -> Result<ValuationReport, AppError> {
        let items = self.store.list_items().await?;
        Ok(build_valuation_report(
            items,
            self.settings.low_stock_threshold,
        ))
    }
}

/// Current time at the precision the database keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
