use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{AppError, ErrorKind, InventoryService};
use crate::config::{DEFAULT_DATABASE, Settings};
use crate::domain::{
    ActivityCode, NewConsumption, NewReceipt, Quantity, StockItem, Unit, format_quantity,
    parse_quantity,
};
use crate::io::Exporter;

/// Sitestock - construction site inventory
#[derive(Parser)]
#[command(name = "sitestock")]
#[command(about = "Track stock receipts, consumptions and valuation for a construction site")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "SITESTOCK_DATABASE", default_value = DEFAULT_DATABASE, global = true)]
    pub database: String,

    /// Work against the in-memory sample inventory instead of a database
    #[arg(long, global = true)]
    pub memory: bool,

    /// Items below this quantity are reported as low stock
    #[arg(
        long,
        env = "SITESTOCK_LOW_STOCK_THRESHOLD",
        default_value = "50",
        value_parser = parse_quantity,
        global = true
    )]
    pub low_stock_threshold: Quantity,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record incoming material
    Receive {
        /// Quantity received (e.g., "100" or "12.5")
        #[arg(value_parser = parse_quantity)]
        quantity: Quantity,

        /// Item code (e.g., CEM001); a new code creates the item
        #[arg(long)]
        code: String,

        /// Item name
        #[arg(long)]
        name: String,

        /// Rate per unit
        #[arg(long, value_parser = parse_quantity)]
        rate: Quantity,

        /// Unit: pcs, kg, m, m2, m3, ltr, box, bag, roll, ton
        #[arg(long)]
        unit: Unit,

        /// Supplier name
        #[arg(long)]
        supplier: String,

        /// Delivery date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Person who received the goods
        #[arg(long, env = "SITESTOCK_USER")]
        received_by: String,
    },

    /// Record material taken out of stock
    Consume {
        /// Quantity used
        #[arg(value_parser = parse_quantity)]
        quantity: Quantity,

        /// Item code
        #[arg(long)]
        code: String,

        /// Activity code: CONSTR, MAINT, SETUP, DEMO, INSTALL, REPAIR, TEST, OTHER
        #[arg(short, long)]
        activity: ActivityCode,

        /// Team or person using the material
        #[arg(long)]
        used_by: String,

        /// Date of use (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Free-form remarks
        #[arg(short, long)]
        remarks: Option<String>,

        /// Person recording the entry
        #[arg(long, env = "SITESTOCK_USER")]
        recorded_by: String,
    },

    /// List stock items
    Items,

    /// Show one stock item
    Item {
        /// Item code
        code: String,
    },

    /// List items below the low-stock threshold
    LowStock,

    /// List receipts, most recent first
    Receipts,

    /// List consumptions, most recent first
    Consumptions,

    /// Show the activity log, newest first
    Logs,

    /// Inventory dashboard
    Dashboard {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Generate reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export data to CSV
    Export {
        /// What to export
        #[arg(value_enum)]
        export_type: ExportType,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List units of measurement
    Units,

    /// List activity codes
    Activities,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Stock receipt report
    Receipts {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Stock consumption report
    Consumptions {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Stock valuation report
    Valuation {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportType {
    Receipts,
    Consumptions,
    Valuation,
    Logs,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings::default().with_low_stock_threshold(self.low_stock_threshold)
    }

    async fn service(&self) -> Result<InventoryService> {
        if self.memory {
            return Ok(InventoryService::with_sample_data(self.settings()));
        }
        InventoryService::connect(&self.database, self.settings())
            .await
            .map_err(|err| {
                let message = format!(
                    "Failed to open database '{}'. Run `init` first",
                    self.database
                );
                user_facing(err, &message)
            })
    }

    pub async fn run(self) -> Result<()> {
        if let Commands::Init = self.command {
            if self.memory {
                bail!("--memory uses the sample inventory; there is no database to initialize");
            }
            InventoryService::init(&self.database, self.settings())
                .await
                .map_err(|err| user_facing(err, "Failed to initialize database"))?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = self.service().await?;

        match self.command {
            Commands::Init => unreachable!("handled above"),

            Commands::Receive {
                quantity,
                code,
                name,
                rate,
                unit,
                supplier,
                date,
                received_by,
            } => {
                let form = NewReceipt {
                    item_name: name,
                    item_code: code,
                    quantity_received: quantity,
                    rate_per_unit: rate,
                    unit,
                    supplier_name: supplier,
                    delivery_date: date.unwrap_or_else(|| Utc::now().date_naive()),
                    created_by: received_by.clone(),
                    received_by,
                };

                let result = service
                    .add_receipt(form)
                    .await
                    .map_err(|err| user_facing(err, "Failed to add stock receipt"))?;

                println!(
                    "Received {} {} of {} ({})",
                    format_quantity(result.receipt.quantity_received),
                    result.receipt.unit,
                    result.receipt.item_name,
                    result.receipt.id
                );
                if result.created_item {
                    println!("New stock item: {}", result.item.item_code);
                }
                println!(
                    "Stock now {} {}, value {}",
                    format_quantity(result.item.current_quantity),
                    result.item.unit,
                    format_quantity(result.item.total_value)
                );
            }

            Commands::Consume {
                quantity,
                code,
                activity,
                used_by,
                date,
                remarks,
                recorded_by,
            } => {
                let form = NewConsumption {
                    item_code: code,
                    quantity_used: quantity,
                    purpose_activity_code: activity,
                    used_by,
                    date: date.unwrap_or_else(|| Utc::now().date_naive()),
                    remarks,
                    created_by: recorded_by,
                };

                let result = service
                    .add_consumption(form)
                    .await
                    .map_err(|err| user_facing(err, "Failed to record consumption"))?;

                println!(
                    "Used {} {} of {} for {} ({})",
                    format_quantity(result.consumption.quantity_used),
                    result.consumption.unit,
                    result.consumption.item_name,
                    result.consumption.purpose_activity_code,
                    result.consumption.id
                );
                println!(
                    "Stock now {} {}, value {}",
                    format_quantity(result.item.current_quantity),
                    result.item.unit,
                    format_quantity(result.item.total_value)
                );
            }

            Commands::Items => {
                let items = service
                    .get_stock_items()
                    .await
                    .map_err(|err| user_facing(err, "Failed to load stock items"))?;
                print_items(&items, service.settings().low_stock_threshold);
            }

            Commands::Item { code } => {
                let item = service
                    .get_stock_item(&code)
                    .await
                    .map_err(|err| user_facing(err, "Failed to load stock item"))?;
                println!("Item: {} ({})", item.item_name, item.item_code);
                println!("  ID:             {}", item.id);
                println!(
                    "  Quantity:       {} {}",
                    format_quantity(item.current_quantity),
                    item.unit
                );
                println!("  Last rate:      {}", format_quantity(item.last_rate));
                println!("  Total value:    {}", format_quantity(item.total_value));
                println!("  Created:        {}", item.created_at.format("%Y-%m-%d %H:%M:%S"));
                println!("  Updated:        {}", item.updated_at.format("%Y-%m-%d %H:%M:%S"));
                if item.is_low_stock(service.settings().low_stock_threshold) {
                    println!("  Status:         LOW STOCK");
                }
            }

            Commands::LowStock => {
                let items = service
                    .get_low_stock_items()
                    .await
                    .map_err(|err| user_facing(err, "Failed to load stock items"))?;
                if items.is_empty() {
                    println!("No items below the low-stock threshold.");
                } else {
                    print_items(&items, service.settings().low_stock_threshold);
                }
            }

            Commands::Receipts => run_receipts_command(&service).await?,

            Commands::Consumptions => run_consumptions_command(&service).await?,

            Commands::Logs => run_logs_command(&service).await?,

            Commands::Dashboard { format } => run_dashboard_command(&service, format).await?,

            Commands::Report(report_cmd) => run_report_command(&service, report_cmd).await?,

            Commands::Export {
                export_type,
                output,
            } => run_export_command(&service, export_type, output.as_deref()).await?,

            Commands::Units => {
                for unit in Unit::ALL {
                    println!("{}", unit);
                }
            }

            Commands::Activities => {
                for code in ActivityCode::ALL {
                    println!("{:<8} {}", code.as_str(), code.label());
                }
            }
        }

        Ok(())
    }
}

/// Rejections and validation errors are specific; storage failures become one generic line
/// and the details go to the log.
fn user_facing(err: impl Into<anyhow::Error>, generic: &str) -> anyhow::Error {
    let err = err.into();
    match err.downcast_ref::<AppError>().map(AppError::kind) {
        Some(ErrorKind::Infrastructure) => {
            tracing::error!(error = ?err, "{}", generic);
            anyhow::anyhow!("{}", generic)
        }
        _ => err,
    }
}

fn print_items(items: &[StockItem], threshold: Quantity) {
    if items.is_empty() {
        println!("No stock items found.");
        return;
    }

    println!(
        "{:<10} {:<25} {:>12} {:<5} {:>10} {:>14}",
        "CODE", "NAME", "QUANTITY", "UNIT", "RATE", "VALUE"
    );
    println!("{}", "-".repeat(81));
    for item in items {
        let flag = if item.is_low_stock(threshold) { " !" } else { "" };
        println!(
            "{:<10} {:<25} {:>12} {:<5} {:>10} {:>14}{}",
            truncate(&item.item_code, 10),
            truncate(&item.item_name, 25),
            format_quantity(item.current_quantity),
            item.unit,
            format_quantity(item.last_rate),
            format_quantity(item.total_value),
            flag
        );
    }
}

async fn run_receipts_command(service: &InventoryService) -> Result<()> {
    let receipts = service
        .get_receipts()
        .await
        .map_err(|err| user_facing(err, "Failed to load receipts"))?;
    if receipts.is_empty() {
        println!("No receipts found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<10} {:>10} {:<5} {:>10} {:>12} {:<20} RECEIVED BY",
        "DATE", "CODE", "QUANTITY", "UNIT", "RATE", "VALUE", "SUPPLIER"
    );
    println!("{}", "-".repeat(100));
    for receipt in &receipts {
        println!(
            "{:<12} {:<10} {:>10} {:<5} {:>10} {:>12} {:<20} {}",
            receipt.delivery_date.format("%Y-%m-%d"),
            truncate(&receipt.item_code, 10),
            format_quantity(receipt.quantity_received),
            receipt.unit,
            format_quantity(receipt.rate_per_unit),
            format_quantity(receipt.total_value),
            truncate(&receipt.supplier_name, 20),
            receipt.received_by
        );
    }
    Ok(())
}

async fn run_consumptions_command(service: &InventoryService) -> Result<()> {
    let consumptions = service
        .get_consumptions()
        .await
        .map_err(|err| user_facing(err, "Failed to load consumptions"))?;
    if consumptions.is_empty() {
        println!("No consumptions found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<10} {:>10} {:<5} {:<8} {:<20} REMARKS",
        "DATE", "CODE", "QUANTITY", "UNIT", "ACTIVITY", "USED BY"
    );
    println!("{}", "-".repeat(90));
    for consumption in &consumptions {
        println!(
            "{:<12} {:<10} {:>10} {:<5} {:<8} {:<20} {}",
            consumption.date.format("%Y-%m-%d"),
            truncate(&consumption.item_code, 10),
            format_quantity(consumption.quantity_used),
            consumption.unit,
            consumption.purpose_activity_code,
            truncate(&consumption.used_by, 20),
            truncate(consumption.remarks.as_deref().unwrap_or(""), 30)
        );
    }
    Ok(())
}

async fn run_logs_command(service: &InventoryService) -> Result<()> {
    let logs = service
        .get_logs()
        .await
        .map_err(|err| user_facing(err, "Failed to load activity log"))?;
    if logs.is_empty() {
        println!("No activity recorded.");
        return Ok(());
    }

    println!("{:<20} {:<22} {:<20} DETAILS", "TIMESTAMP", "EVENT", "BY");
    println!("{}", "-".repeat(90));
    for log in &logs {
        println!(
            "{:<20} {:<22} {:<20} {}",
            log.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format!("{} {}", log.log_type, log.action),
            truncate(&log.performed_by, 20),
            log.details
        );
    }
    Ok(())
}

async fn run_dashboard_command(service: &InventoryService, format: OutputFormat) -> Result<()> {
    let stats = service
        .dashboard(Utc::now())
        .await
        .map_err(|err| user_facing(err, "Failed to load dashboard"))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Inventory Dashboard");
    println!("{}", "=".repeat(44));
    println!("Total items:          {:>15}", stats.total_items);
    println!("Total value:          {:>15}", format_quantity(stats.total_value));
    println!("Low stock items:      {:>15}", stats.low_stock_count);
    println!("Today's transactions: {:>15}", stats.today_transactions);

    if !stats.low_stock_items.is_empty() {
        println!();
        println!("Low Stock Alerts:");
        for item in &stats.low_stock_items {
            println!(
                "  {:<25} {:>10} {}",
                truncate(&item.item_name, 25),
                format_quantity(item.current_quantity),
                item.unit
            );
        }
    }

    if !stats.recent_items.is_empty() {
        println!();
        println!("Recent Items:");
        for item in &stats.recent_items {
            println!(
                "  {:<25} {:>10} {:<5} {:>14}",
                truncate(&item.item_name, 25),
                format_quantity(item.current_quantity),
                item.unit,
                format_quantity(item.total_value)
            );
        }
    }
    Ok(())
}

async fn run_report_command(service: &InventoryService, cmd: ReportCommands) -> Result<()> {
    let now = Utc::now();

    match cmd {
        ReportCommands::Receipts { format } => {
            let report = service
                .receipt_report(now)
                .await
                .map_err(|err| user_facing(err, "Failed to build receipt report"))?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("Stock Receipt Report");
            println!("{}", "-".repeat(44));
            println!("Total receipts:   {:>15}", report.total_receipts);
            println!("Total value:      {:>15}", format_quantity(report.total_value));
            println!("Suppliers:        {:>15}", report.supplier_count);
            println!("This week:        {:>15}", report.this_week);
            println!();
            println!("Recent Receipts:");
            for receipt in &report.recent {
                println!(
                    "  {:<25} {:>10} {:<5} {}",
                    truncate(&receipt.item_name, 25),
                    format_quantity(receipt.quantity_received),
                    receipt.unit,
                    receipt.supplier_name
                );
            }
        }

        ReportCommands::Consumptions { format } => {
            let report = service
                .consumption_report(now)
                .await
                .map_err(|err| user_facing(err, "Failed to build consumption report"))?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("Stock Consumption Report");
            println!("{}", "-".repeat(44));
            println!("Total consumptions: {:>13}", report.total_consumptions);
            println!("Items consumed:     {:>13}", report.items_consumed);
            println!("Activities:         {:>13}", report.activity_count);
            println!("This week:          {:>13}", report.this_week);
            println!();
            println!("Recent Consumptions:");
            for consumption in &report.recent {
                println!(
                    "  {:<25} {:>10} {:<5} {}",
                    truncate(&consumption.item_name, 25),
                    format_quantity(consumption.quantity_used),
                    consumption.unit,
                    consumption.purpose_activity_code.label()
                );
            }
        }

        ReportCommands::Valuation { format } => {
            let report = service
                .valuation_report()
                .await
                .map_err(|err| user_facing(err, "Failed to build valuation report"))?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("Stock Valuation Report");
            println!("{}", "-".repeat(44));
            println!("Total items:      {:>15}", report.total_items);
            println!("Total value:      {:>15}", format_quantity(report.total_value));
            println!("Low stock items:  {:>15}", report.low_stock_count);
            println!("Average value:    {:>15}", format_quantity(report.average_value));
            println!();
            print_items(&report.items, service.settings().low_stock_threshold);
        }
    }

    Ok(())
}

async fn run_export_command(
    service: &InventoryService,
    export_type: ExportType,
    output: Option<&str>,
) -> Result<()> {
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let (result, what) = match export_type {
        ExportType::Receipts => (exporter.export_receipts_csv(writer).await, "receipts"),
        ExportType::Consumptions => (
            exporter.export_consumptions_csv(writer).await,
            "consumptions",
        ),
        ExportType::Valuation => (exporter.export_valuation_csv(writer).await, "stock items"),
        ExportType::Logs => (exporter.export_logs_csv(writer).await, "log entries"),
    };
    let count = result.map_err(|err| user_facing(err, &format!("Failed to export {}", what)))?;

    if let Some(path) = output {
        eprintln!("Exported {} {} to {}", count, what, path);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Portland Cement", 25), "Portland Cement");
        assert_eq!(truncate("Ready Mix Concrete M25", 10), "Ready M...");
        assert_eq!(truncate("Ünïcödé ïtém", 8), "Ünïcö...");
    }

    #[test]
    fn test_parse_receive_command() {
        let cli = Cli::try_parse_from([
            "sitestock",
            "--memory",
            "receive",
            "100",
            "--code",
            "CEM001",
            "--name",
            "Portland Cement",
            "--rate",
            "900",
            "--unit",
            "bag",
            "--supplier",
            "ABC Cement Co.",
            "--date",
            "2024-01-20",
            "--received-by",
            "John Supervisor",
        ])
        .unwrap();

        assert!(cli.memory);
        match cli.command {
            Commands::Receive {
                quantity,
                unit,
                date,
                ..
            } => {
                assert_eq!(quantity, Quantity::from(100));
                assert_eq!(unit, Unit::Bag);
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 20));
            }
            _ => panic!("expected receive"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_activity() {
        let result = Cli::try_parse_from([
            "sitestock",
            "consume",
            "10",
            "--code",
            "CEM001",
            "--activity",
            "PAINT",
            "--used-by",
            "Team A",
            "--recorded-by",
            "John Supervisor",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_threshold_flag_feeds_settings() {
        let cli =
            Cli::try_parse_from(["sitestock", "--low-stock-threshold", "10", "low-stock"]).unwrap();
        assert_eq!(cli.settings().low_stock_threshold, Quantity::from(10));
    }

    #[test]
    fn test_user_facing_hides_storage_details() {
        let err = user_facing(
            AppError::Storage(anyhow::anyhow!("database is locked")),
            "Failed to add stock receipt",
        );
        assert_eq!(err.to_string(), "Failed to add stock receipt");

        let err = user_facing(
            AppError::ItemNotFound("XYZ999".into()),
            "Failed to record consumption",
        );
        assert_eq!(err.to_string(), "Stock item not found: XYZ999");
    }

    #[test]
    fn test_user_facing_sees_through_anyhow() {
        let wrapped = anyhow::Error::from(AppError::Storage(anyhow::anyhow!("disk I/O error")));
        let err = user_facing(wrapped, "Failed to export receipts");
        assert_eq!(err.to_string(), "Failed to export receipts");

        let plain = user_facing(anyhow::anyhow!("Broken pipe"), "Failed to export receipts");
        assert_eq!(plain.to_string(), "Broken pipe");
    }

    #[tokio::test]
    async fn test_memory_init_is_refused() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("never.db");
        let cli = Cli::try_parse_from([
            "sitestock",
            "--memory",
            "--database",
            db_path.to_str().unwrap(),
            "init",
        ])
        .unwrap();

        assert!(cli.run().await.is_err());
        assert!(!db_path.exists());
    }
}
