use std::str::FromStr;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{
    ActivityCode, ItemWrite, LedgerEntry, LogAction, LogType, Movement, Quantity,
    StockConsumption, StockItem, StockReceipt, TransactionLog, Unit,
};

use super::{MIGRATION_001_INITIAL, StockStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store. Quantities are kept as TEXT so they stay exact.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        tracing::debug!("Applied migration 001_initial");
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    async fn insert_receipt(
        tx: &mut Transaction<'_, Sqlite>,
        receipt: &StockReceipt,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_receipts (id, item_name, item_code, quantity_received, rate_per_unit, unit, total_value, supplier_name, delivery_date, received_by, created_at, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(receipt.id.to_string())
        .bind(&receipt.item_name)
        .bind(&receipt.item_code)
        .bind(receipt.quantity_received.to_string())
        .bind(receipt.rate_per_unit.to_string())
        .bind(receipt.unit.as_str())
        .bind(receipt.total_value.to_string())
        .bind(&receipt.supplier_name)
        .bind(receipt.delivery_date.format(DATE_FORMAT).to_string())
        .bind(&receipt.received_by)
        .bind(timestamp(receipt.created_at))
        .bind(&receipt.created_by)
        .execute(&mut **tx)
        .await
        .context("Failed to save receipt")?;
        Ok(())
    }

    async fn insert_consumption(
        tx: &mut Transaction<'_, Sqlite>,
        consumption: &StockConsumption,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_consumptions (id, item_name, item_code, quantity_used, unit, purpose_activity_code, used_by, date, remarks, created_at, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(consumption.id.to_string())
        .bind(&consumption.item_name)
        .bind(&consumption.item_code)
        .bind(consumption.quantity_used.to_string())
        .bind(consumption.unit.as_str())
        .bind(consumption.purpose_activity_code.as_str())
        .bind(&consumption.used_by)
        .bind(consumption.date.format(DATE_FORMAT).to_string())
        .bind(&consumption.remarks)
        .bind(timestamp(consumption.created_at))
        .bind(&consumption.created_by)
        .execute(&mut **tx)
        .await
        .context("Failed to save consumption")?;
        Ok(())
    }

    async fn insert_item(tx: &mut Transaction<'_, Sqlite>, item: &StockItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_items (id, item_name, item_code, current_quantity, unit, last_rate, total_value, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(&item.item_name)
        .bind(&item.item_code)
        .bind(item.current_quantity.to_string())
        .bind(item.unit.as_str())
        .bind(item.last_rate.to_string())
        .bind(item.total_value.to_string())
        .bind(timestamp(item.created_at))
        .bind(timestamp(item.updated_at))
        .execute(&mut **tx)
        .await
        .context("Failed to create stock item")?;
        Ok(())
    }

    async fn update_item(tx: &mut Transaction<'_, Sqlite>, item: &StockItem) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE stock_items
            SET current_quantity = ?, last_rate = ?, total_value = ?, updated_at = ?
            WHERE item_code = ?
            "#,
        )
        .bind(item.current_quantity.to_string())
        .bind(item.last_rate.to_string())
        .bind(item.total_value.to_string())
        .bind(timestamp(item.updated_at))
        .bind(&item.item_code)
        .execute(&mut **tx)
        .await
        .context("Failed to update stock item")?;

        if result.rows_affected() != 1 {
            bail!("Stock item not found: {}", item.item_code);
        }
        Ok(())
    }

    async fn insert_log(tx: &mut Transaction<'_, Sqlite>, log: &TransactionLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transaction_logs (id, type, reference_id, action, performed_by, timestamp, details)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.id.to_string())
        .bind(log.log_type.as_str())
        .bind(log.reference_id.to_string())
        .bind(log.action.as_str())
        .bind(&log.performed_by)
        .bind(timestamp(log.timestamp))
        .bind(&log.details)
        .execute(&mut **tx)
        .await
        .context("Failed to append transaction log")?;
        Ok(())
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<StockItem> {
        let id_str: String = row.get("id");
        let unit_str: String = row.get("unit");

        Ok(StockItem {
            id: Uuid::parse_str(&id_str).context("Invalid item ID")?,
            item_name: row.get("item_name"),
            item_code: row.get("item_code"),
            current_quantity: decimal(row, "current_quantity")?,
            unit: parse_unit(&unit_str)?,
            last_rate: decimal(row, "last_rate")?,
            total_value: decimal(row, "total_value")?,
            created_at: parse_timestamp(row.get("created_at")).context("Invalid created_at")?,
            updated_at: parse_timestamp(row.get("updated_at")).context("Invalid updated_at")?,
        })
    }

    fn row_to_receipt(row: &sqlx::sqlite::SqliteRow) -> Result<StockReceipt> {
        let id_str: String = row.get("id");
        let unit_str: String = row.get("unit");
        let delivery_date_str: String = row.get("delivery_date");

        Ok(StockReceipt {
            id: Uuid::parse_str(&id_str).context("Invalid receipt ID")?,
            item_name: row.get("item_name"),
            item_code: row.get("item_code"),
            quantity_received: decimal(row, "quantity_received")?,
            rate_per_unit: decimal(row, "rate_per_unit")?,
            unit: parse_unit(&unit_str)?,
            total_value: decimal(row, "total_value")?,
            supplier_name: row.get("supplier_name"),
            delivery_date: NaiveDate::parse_from_str(&delivery_date_str, DATE_FORMAT)
                .context("Invalid delivery_date")?,
            received_by: row.get("received_by"),
            created_at: parse_timestamp(row.get("created_at")).context("Invalid created_at")?,
            created_by: row.get("created_by"),
        })
    }

    fn row_to_consumption(row: &sqlx::sqlite::SqliteRow) -> Result<StockConsumption> {
        let id_str: String = row.get("id");
        let unit_str: String = row.get("unit");
        let code_str: String = row.get("purpose_activity_code");
        let date_str: String = row.get("date");

        Ok(StockConsumption {
            id: Uuid::parse_str(&id_str).context("Invalid consumption ID")?,
            item_name: row.get("item_name"),
            item_code: row.get("item_code"),
            quantity_used: decimal(row, "quantity_used")?,
            unit: parse_unit(&unit_str)?,
            purpose_activity_code: ActivityCode::from_str(&code_str)
                .map_err(|e| anyhow::anyhow!("Invalid activity code: {}", e))?,
            used_by: row.get("used_by"),
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT).context("Invalid date")?,
            remarks: row.get("remarks"),
            created_at: parse_timestamp(row.get("created_at")).context("Invalid created_at")?,
            created_by: row.get("created_by"),
        })
    }

    fn row_to_log(row: &sqlx::sqlite::SqliteRow) -> Result<TransactionLog> {
        let id_str: String = row.get("id");
        let type_str: String = row.get("type");
        let reference_str: String = row.get("reference_id");
        let action_str: String = row.get("action");

        Ok(TransactionLog {
            id: Uuid::parse_str(&id_str).context("Invalid log ID")?,
            log_type: LogType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid log type: {}", type_str))?,
            reference_id: Uuid::parse_str(&reference_str).context("Invalid reference ID")?,
            action: LogAction::from_str(&action_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid log action: {}", action_str))?,
            performed_by: row.get("performed_by"),
            timestamp: parse_timestamp(row.get("timestamp")).context("Invalid timestamp")?,
            details: row.get("details"),
        })
    }
}

#[async_trait]
impl StockStore for SqliteStore {
    async fn get_item(&self, item_code: &str) -> Result<Option<StockItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, item_name, item_code, current_quantity, unit, last_rate, total_value, created_at, updated_at
            FROM stock_items
            WHERE item_code = ?
            "#,
        )
        .bind(item_code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch stock item")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_items(&self) -> Result<Vec<StockItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_name, item_code, current_quantity, unit, last_rate, total_value, created_at, updated_at
            FROM stock_items
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list stock items")?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn list_receipts(&self) -> Result<Vec<StockReceipt>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_name, item_code, quantity_received, rate_per_unit, unit, total_value, supplier_name, delivery_date, received_by, created_at, created_by
            FROM stock_receipts
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list receipts")?;

        rows.iter().map(Self::row_to_receipt).collect()
    }

    async fn list_consumptions(&self) -> Result<Vec<StockConsumption>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_name, item_code, quantity_used, unit, purpose_activity_code, used_by, date, remarks, created_at, created_by
            FROM stock_consumptions
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list consumptions")?;

        rows.iter().map(Self::row_to_consumption).collect()
    }

    async fn list_logs(&self) -> Result<Vec<TransactionLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, type, reference_id, action, performed_by, timestamp, details
            FROM transaction_logs
            ORDER BY timestamp DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transaction logs")?;

        rows.iter().map(Self::row_to_log).collect()
    }

    async fn commit(&self, entry: &LedgerEntry) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        match &entry.movement {
            Movement::Receipt(receipt) => Self::insert_receipt(&mut tx, receipt).await?,
            Movement::Consumption(consumption) => {
                Self::insert_consumption(&mut tx, consumption).await?
            }
        }

        match &entry.item {
            ItemWrite::Insert(item) => Self::insert_item(&mut tx, item).await?,
            ItemWrite::Update(item) => Self::update_item(&mut tx, item).await?,
        }

        Self::insert_log(&mut tx, &entry.log).await?;

        // Dropping `tx` on any early return above rolls everything back.
        tx.commit().await.context("Failed to commit transaction")?;

        tracing::debug!(
            item_code = %entry.item.item().item_code,
            log_id = %entry.log.id,
            "Committed ledger entry to database"
        );
        Ok(())
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: String) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc))
}

fn decimal(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Quantity> {
    let text: String = row.get(column);
    Quantity::from_str(&text).with_context(|| format!("Invalid decimal in {}: {}", column, text))
}

fn parse_unit(s: &str) -> Result<Unit> {
    Unit::from_str(s).map_err(|e| anyhow::anyhow!("Invalid unit: {}", e))
}
