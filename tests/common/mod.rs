// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use sitestock::application::InventoryService;
use sitestock::config::Settings;
use sitestock::domain::{ActivityCode, NewConsumption, NewReceipt, Quantity, Unit};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(InventoryService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = InventoryService::init(db_path.to_str().unwrap(), Settings::default()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn qty(value: i64) -> Quantity {
    Quantity::from(value)
}

/// A filled-in receipt form
pub fn receipt_form(code: &str, quantity: i64, rate: i64) -> NewReceipt {
    let (name, unit) = match code {
        "CEM001" => ("Portland Cement", Unit::Bag),
        "STL012" => ("Steel Rebar 12mm", Unit::Kg),
        "RMC025" => ("Ready Mix Concrete M25", Unit::M3),
        "BRK001" => ("Brick (Common)", Unit::Pcs),
        _ => ("Site Material", Unit::Pcs),
    };
    NewReceipt {
        item_name: name.into(),
        item_code: code.into(),
        quantity_received: qty(quantity),
        rate_per_unit: qty(rate),
        unit,
        supplier_name: "ABC Cement Co.".into(),
        delivery_date: parse_date("2024-01-22"),
        received_by: "John Supervisor".into(),
        created_by: "John Supervisor".into(),
    }
}

/// A filled-in consumption form
pub fn consumption_form(code: &str, quantity: i64) -> NewConsumption {
    NewConsumption {
        item_code: code.into(),
        quantity_used: qty(quantity),
        purpose_activity_code: ActivityCode::Constr,
        used_by: "Construction Team A".into(),
        date: parse_date("2024-01-23"),
        remarks: Some("Foundation work - Block A".into()),
        created_by: "Mike Foreman".into(),
    }
}

/// Seed a database with the four standard site items
pub async fn stock_site(service: &InventoryService) -> Result<()> {
    service.add_receipt(receipt_form("BRK001", 15000, 8)).await?;
    service.add_receipt(receipt_form("CEM001", 150, 850)).await?;
    service.add_receipt(receipt_form("STL012", 2500, 65)).await?;
    service.add_receipt(receipt_form("RMC025", 45, 4500)).await?;
    Ok(())
}
