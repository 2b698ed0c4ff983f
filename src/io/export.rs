use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;

use crate::application::InventoryService;
use crate::domain::{StockConsumption, StockItem, StockReceipt, TransactionLog, format_quantity};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A record that renders as one CSV row under a fixed header.
pub trait CsvRecord {
    /// Human-readable column names, in field order.
    const HEADERS: &'static [&'static str];

    /// Field values, one per header.
    fn fields(&self) -> Vec<String>;
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl CsvRecord for StockReceipt {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Item Name",
        "Item Code",
        "Quantity Received",
        "Rate Per Unit",
        "Unit",
        "Total Value",
        "Supplier Name",
        "Delivery Date",
        "Received By",
        "Created At",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.item_name.clone(),
            self.item_code.clone(),
            format_quantity(self.quantity_received),
            format_quantity(self.rate_per_unit),
            self.unit.to_string(),
            format_quantity(self.total_value),
            self.supplier_name.clone(),
            self.delivery_date.format(DATE_FORMAT).to_string(),
            self.received_by.clone(),
            timestamp(self.created_at),
        ]
    }
}

impl CsvRecord for StockConsumption {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Item Name",
        "Item Code",
        "Quantity Used",
        "Unit",
        "Purpose/Activity Code",
        "Used By",
        "Date",
        "Remarks",
        "Created At",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.item_name.clone(),
            self.item_code.clone(),
            format_quantity(self.quantity_used),
            self.unit.to_string(),
            self.purpose_activity_code.to_string(),
            self.used_by.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            self.remarks.clone().unwrap_or_default(),
            timestamp(self.created_at),
        ]
    }
}

/// Stock items export as the valuation sheet.
impl CsvRecord for StockItem {
    const HEADERS: &'static [&'static str] = &[
        "Item Name",
        "Item Code",
        "Current Quantity",
        "Unit",
        "Last Rate",
        "Total Value",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.item_name.clone(),
            self.item_code.clone(),
            format_quantity(self.current_quantity),
            self.unit.to_string(),
            format_quantity(self.last_rate),
            format_quantity(self.total_value),
        ]
    }
}

impl CsvRecord for TransactionLog {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Type",
        "Reference ID",
        "Action",
        "Performed By",
        "Timestamp",
        "Details",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.log_type.to_string(),
            self.reference_id.to_string(),
            self.action.to_string(),
            self.performed_by.clone(),
            timestamp(self.timestamp),
            self.details.clone(),
        ]
    }
}

/// Write a header row plus one row per record. Returns the number of data rows.
///
/// Fields containing the delimiter or quotes are quoted; plain business strings come out
/// exactly as a comma join would produce them.
pub fn write_csv<T: CsvRecord, W: Write>(records: &[T], writer: W) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(T::HEADERS)?;

    let mut count = 0;
    for record in records {
        csv_writer.write_record(record.fields())?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}

/// Render records to an in-memory CSV string.
pub fn to_csv_string<T: CsvRecord>(records: &[T]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Exporter for turning ledger collections into CSV
pub struct Exporter<'a> {
    service: &'a InventoryService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a InventoryService) -> Self {
        Self { service }
    }

    /// Export receipts to CSV format, most recent first
    pub async fn export_receipts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let receipts = self.service.get_receipts().await?;
        write_csv(&receipts, writer)
    }

    /// Export consumptions to CSV format, most recent first
    pub async fn export_consumptions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let consumptions = self.service.get_consumptions().await?;
        write_csv(&consumptions, writer)
    }

    /// Export the stock valuation sheet
    pub async fn export_valuation_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let items = self.service.get_stock_items().await?;
        write_csv(&items, writer)
    }

    /// Export the activity log
    pub async fn export_logs_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let logs = self.service.get_logs().await?;
        write_csv(&logs, writer)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{ActivityCode, Quantity, Unit};

    fn steel_use(remarks: Option<&str>) -> StockConsumption {
        StockConsumption {
            id: Uuid::new_v4(),
            item_name: "Steel Rebar 12mm".into(),
            item_code: "STL012".into(),
            quantity_used: Quantity::from(500),
            unit: Unit::Kg,
            purpose_activity_code: ActivityCode::Constr,
            used_by: "Construction Team B".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
            remarks: remarks.map(String::from),
            created_at: Utc::now(),
            created_by: "Mike Foreman".into(),
        }
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let csv = to_csv_string::<StockReceipt>(&[]).unwrap();
        assert_eq!(
            csv,
            "ID,Item Name,Item Code,Quantity Received,Rate Per Unit,Unit,Total Value,Supplier Name,Delivery Date,Received By,Created At\n"
        );
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_valuation_row() {
        let item = StockItem::new(
            "Portland Cement",
            "CEM001",
            Unit::Bag,
            Quantity::from(250),
            Quantity::from(900),
            Utc::now(),
        );
        let csv = to_csv_string(&[item]).unwrap();
        let rows: Vec<&str> = csv.lines().collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], "Portland Cement,CEM001,250,bag,900,225000");
    }

    #[test]
    fn test_missing_remarks_keep_column_count() {
        let csv = to_csv_string(&[steel_use(None), steel_use(Some("Column reinforcement"))])
            .unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().len();
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), headers);
        }
        assert_eq!(headers, StockConsumption::HEADERS.len());
    }

    #[test]
    fn test_embedded_comma_is_quoted() {
        let csv = to_csv_string(&[steel_use(Some("Block A, level 2"))]).unwrap();
        assert!(csv.contains("\"Block A, level 2\""));

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[8], "Block A, level 2");
    }

    #[test]
    fn test_row_count_matches_records() {
        let records: Vec<_> = (0..3).map(|_| steel_use(None)).collect();
        let mut buffer = Vec::new();
        let count = write_csv(&records, &mut buffer).unwrap();

        assert_eq!(count, 3);
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 4);
    }
}
