use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::domain::{Quantity, StockConsumption, StockItem, StockReceipt};

/// How many rows the "recent" lists show.
pub const RECENT_LIMIT: usize = 5;

/// Window for the "this week" counters.
pub const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_items: usize,
    pub total_value: Quantity,
    pub low_stock_count: usize,
    /// Receipts plus consumptions created on the current UTC date
    pub today_transactions: usize,
    pub low_stock_items: Vec<StockItem>,
    pub recent_items: Vec<StockItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptReport {
    pub total_receipts: usize,
    pub total_value: Quantity,
    pub supplier_count: usize,
    pub this_week: usize,
    pub recent: Vec<StockReceipt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionReport {
    pub total_consumptions: usize,
    pub items_consumed: usize,
    pub activity_count: usize,
    pub this_week: usize,
    pub recent: Vec<StockConsumption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    pub total_items: usize,
    pub total_value: Quantity,
    pub low_stock_count: usize,
    /// Rounded to whole currency units; zero without items
    pub average_value: Quantity,
    pub items: Vec<StockItem>,
}

/// Totals saturate instead of overflowing.
fn saturating_total(values: impl Iterator<Item = Quantity>) -> Quantity {
    values.fold(Quantity::ZERO, |total, value| total.saturating_add(value))
}

fn total_item_value(items: &[StockItem]) -> Quantity {
    saturating_total(items.iter().map(|item| item.total_value))
}

/// Inputs are expected newest first, as the store returns them.
pub fn build_dashboard(
    items: &[StockItem],
    receipts: &[StockReceipt],
    consumptions: &[StockConsumption],
    low_stock_threshold: Quantity,
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = now.date_naive();
    let low_stock_items: Vec<StockItem> = items
        .iter()
        .filter(|item| item.is_low_stock(low_stock_threshold))
        .cloned()
        .collect();

    let today_transactions = receipts
        .iter()
        .filter(|r| r.created_at.date_naive() == today)
        .count()
        + consumptions
            .iter()
            .filter(|c| c.created_at.date_naive() == today)
            .count();

    DashboardStats {
        total_items: items.len(),
        total_value: total_item_value(items),
        low_stock_count: low_stock_items.len(),
        today_transactions,
        low_stock_items,
        recent_items: items.iter().take(RECENT_LIMIT).cloned().collect(),
    }
}

pub fn build_receipt_report(receipts: &[StockReceipt], now: DateTime<Utc>) -> ReceiptReport {
    let week_start = now - Duration::days(RECENT_WINDOW_DAYS);
    let suppliers: HashSet<&str> = receipts.iter().map(|r| r.supplier_name.as_str()).collect();

    ReceiptReport {
        total_receipts: receipts.len(),
        total_value: saturating_total(receipts.iter().map(|r| r.total_value)),
        supplier_count: suppliers.len(),
        this_week: receipts.iter().filter(|r| r.created_at >= week_start).count(),
        recent: receipts.iter().take(RECENT_LIMIT).cloned().collect(),
    }
}

pub fn build_consumption_report(
    consumptions: &[StockConsumption],
    now: DateTime<Utc>,
) -> ConsumptionReport {
    let week_start = now - Duration::days(RECENT_WINDOW_DAYS);
    let items: HashSet<&str> = consumptions.iter().map(|c| c.item_code.as_str()).collect();
    let activities: HashSet<_> = consumptions.iter().map(|c| c.purpose_activity_code).collect();

    ConsumptionReport {
        total_consumptions: consumptions.len(),
        items_consumed: items.len(),
        activity_count: activities.len(),
        this_week: consumptions
            .iter()
            .filter(|c| c.created_at >= week_start)
            .count(),
        recent: consumptions.iter().take(RECENT_LIMIT).cloned().collect(),
    }
}

pub fn build_valuation_report(
    items: Vec<StockItem>,
    low_stock_threshold: Quantity,
) -> ValuationReport {
    let total_value = total_item_value(&items);
    let average_value = if items.is_empty() {
        Quantity::ZERO
    } else {
        (total_value / Quantity::from(items.len() as u64))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    };

    ValuationReport {
        total_items: items.len(),
        total_value,
        low_stock_count: items
            .iter()
            .filter(|item| item.is_low_stock(low_stock_threshold))
            .count(),
        average_value,
        items,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{ActivityCode, Unit};

    fn item(code: &str, quantity: i64, rate: i64) -> StockItem {
        StockItem::new(
            code,
            code,
            Unit::Pcs,
            Quantity::from(quantity),
            Quantity::from(rate),
            Utc::now(),
        )
    }

    fn receipt(supplier: &str, value: i64, created_at: DateTime<Utc>) -> StockReceipt {
        StockReceipt {
            id: Uuid::new_v4(),
            item_name: "Brick (Common)".into(),
            item_code: "BRK001".into(),
            quantity_received: Quantity::from(value),
            rate_per_unit: Quantity::ONE,
            unit: Unit::Pcs,
            total_value: Quantity::from(value),
            supplier_name: supplier.into(),
            delivery_date: created_at.date_naive(),
            received_by: "Site Store".into(),
            created_at,
            created_by: "Site Store".into(),
        }
    }

    fn consumption(
        code: &str,
        activity: ActivityCode,
        created_at: DateTime<Utc>,
    ) -> StockConsumption {
        StockConsumption {
            id: Uuid::new_v4(),
            item_name: code.into(),
            item_code: code.into(),
            quantity_used: Quantity::ONE,
            unit: Unit::Pcs,
            purpose_activity_code: activity,
            used_by: "Team A".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            remarks: None,
            created_at,
            created_by: "Team A".into(),
        }
    }

    #[test]
    fn test_dashboard_counts() {
        let now = Utc::now();
        let items = vec![item("A", 10, 5), item("B", 100, 2), item("C", 49, 1)];
        let receipts = vec![
            receipt("ABC", 1, now),
            receipt("ABC", 1, now - Duration::days(3)),
        ];
        let consumptions = vec![consumption("A", ActivityCode::Constr, now)];

        let stats = build_dashboard(&items, &receipts, &consumptions, Quantity::from(50), now);

        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.total_value, Quantity::from(299));
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.today_transactions, 2);
        assert_eq!(stats.recent_items.len(), 3);
    }

    #[test]
    fn test_receipt_report() {
        let now = Utc::now();
        let receipts = vec![
            receipt("ABC Cement Co.", 85000, now),
            receipt("XYZ Steel Industries", 65000, now - Duration::days(2)),
            receipt("ABC Cement Co.", 1000, now - Duration::days(30)),
        ];

        let report = build_receipt_report(&receipts, now);

        assert_eq!(report.total_receipts, 3);
        assert_eq!(report.total_value, Quantity::from(151000));
        assert_eq!(report.supplier_count, 2);
        assert_eq!(report.this_week, 2);
    }

    #[test]
    fn test_recent_lists_are_capped() {
        let now = Utc::now();
        let receipts: Vec<_> = (0..8).map(|i| receipt("S", i + 1, now)).collect();
        let report = build_receipt_report(&receipts, now);
        assert_eq!(report.recent.len(), RECENT_LIMIT);
    }

    #[test]
    fn test_consumption_report() {
        let now = Utc::now();
        let consumptions = vec![
            consumption("CEM001", ActivityCode::Constr, now),
            consumption("STL012", ActivityCode::Constr, now),
            consumption("CEM001", ActivityCode::Repair, now - Duration::days(10)),
        ];

        let report = build_consumption_report(&consumptions, now);

        assert_eq!(report.total_consumptions, 3);
        assert_eq!(report.items_consumed, 2);
        assert_eq!(report.activity_count, 2);
        assert_eq!(report.this_week, 2);
    }

    #[test]
    fn test_valuation_average_is_rounded() {
        let items = vec![item("A", 1, 10), item("B", 1, 11)];
        let report = build_valuation_report(items, Quantity::from(50));

        assert_eq!(report.total_value, Quantity::from(21));
        assert_eq!(report.average_value, Quantity::from(11));
        assert_eq!(report.low_stock_count, 2);
    }

    #[test]
    fn test_totals_near_the_limit_do_not_overflow() {
        let mut big = item("A", 1, 1);
        big.total_value = Quantity::MAX;
        let report = build_valuation_report(vec![big.clone(), big], Quantity::from(50));

        assert_eq!(report.total_value, Quantity::MAX);
    }

    #[test]
    fn test_valuation_of_nothing() {
        let report = build_valuation_report(Vec::new(), Quantity::from(50));
        assert_eq!(report.total_items, 0);
        assert!(report.average_value.is_zero());
    }
}
