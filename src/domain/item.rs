use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Quantity, Unit, ValidationError};

pub type ItemId = Uuid;

/// Items whose quantity falls strictly below this are flagged on the dashboard.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 50;

/// A trackable material with its running quantity and valuation.
/// Created on the first receipt of a new item code and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: ItemId,
    pub item_name: String,
    /// Stable business key
    pub item_code: String,
    pub current_quantity: Quantity,
    pub unit: Unit,
    /// Rate of the most recent receipt
    pub last_rate: Quantity,
    /// Derived: quantity x rate after a receipt, prorated after a consumption
    pub total_value: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Create an item holding `quantity` at `rate`. The value saturates at the largest
    /// storable amount; receipts go through [`StockItem::apply_receipt`], which rejects that.
    pub fn new(
        item_name: impl Into<String>,
        item_code: impl Into<String>,
        unit: Unit,
        quantity: Quantity,
        rate: Quantity,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_name: item_name.into(),
            item_code: item_code.into(),
            current_quantity: quantity,
            unit,
            last_rate: rate,
            total_value: quantity.saturating_mul(rate),
            created_at: now,
            updated_at: now,
        }
    }

    /// Book incoming goods. The whole stock is revalued at the new rate.
    /// Leaves the item untouched when the new quantity or value would not fit.
    pub fn apply_receipt(
        &mut self,
        quantity: Quantity,
        rate: Quantity,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let new_quantity = self.current_quantity.checked_add(quantity).ok_or_else(|| {
            ValidationError::new(
                "quantity_received",
                "Quantity exceeds what the stock can hold",
            )
        })?;
        let new_value = new_quantity.checked_mul(rate).ok_or_else(|| {
            ValidationError::new(
                "rate_per_unit",
                "Stock value exceeds the largest storable amount",
            )
        })?;

        self.current_quantity = new_quantity;
        self.last_rate = rate;
        self.total_value = new_value;
        self.updated_at = now;
        Ok(())
    }

    /// Book usage. The remaining stock keeps the unit value it had before.
    pub fn apply_consumption(
        &mut self,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        if self.current_quantity < quantity {
            return Err(StockError::InsufficientStock {
                available: self.current_quantity,
                requested: quantity,
            });
        }

        let unit_value = self.unit_value();
        self.current_quantity -= quantity;
        self.total_value = self.current_quantity.saturating_mul(unit_value);
        self.updated_at = now;
        Ok(())
    }

    /// Value of a single unit. Zero for an empty item.
    pub fn unit_value(&self) -> Quantity {
        if self.current_quantity.is_zero() {
            Quantity::ZERO
        } else {
            self.total_value / self.current_quantity
        }
    }

    pub fn is_low_stock(&self, threshold: Quantity) -> bool {
        self.current_quantity < threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    InsufficientStock {
        available: Quantity,
        requested: Quantity,
    },
}

impl std::fmt::Display for StockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockError::InsufficientStock {
                available,
                requested,
            } => write!(
                f,
                "Cannot take {} from stock of {}",
                requested.normalize(),
                available.normalize()
            ),
        }
    }
}

impl std::error::Error for StockError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cement() -> StockItem {
        StockItem::new(
            "Portland Cement",
            "CEM001",
            Unit::Bag,
            Quantity::from(150),
            Quantity::from(850),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_item_is_valued_at_first_rate() {
        let item = cement();
        assert_eq!(item.total_value, Quantity::from(127500));
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn test_receipt_revalues_at_new_rate() {
        let mut item = cement();
        item.apply_receipt(Quantity::from(100), Quantity::from(900), Utc::now())
            .unwrap();

        assert_eq!(item.current_quantity, Quantity::from(250));
        assert_eq!(item.last_rate, Quantity::from(900));
        assert_eq!(item.total_value, Quantity::from(225000));
    }

    #[test]
    fn test_receipt_past_largest_quantity_is_rejected_without_change() {
        let mut item = cement();
        item.current_quantity = Quantity::MAX;
        let before = item.clone();

        let err = item
            .apply_receipt(Quantity::ONE, Quantity::from(850), Utc::now())
            .unwrap_err();

        assert_eq!(err.field, "quantity_received");
        assert_eq!(item, before);
    }

    #[test]
    fn test_receipt_past_largest_value_is_rejected_without_change() {
        let mut item = cement();
        let before = item.clone();
        let huge = Quantity::from(1_000_000_000_000_000_i64);

        let err = item.apply_receipt(huge, huge, Utc::now()).unwrap_err();

        assert_eq!(err.field, "rate_per_unit");
        assert_eq!(item, before);
    }

    #[test]
    fn test_consumption_prorates_value() {
        let mut item = cement();
        item.apply_consumption(Quantity::from(50), Utc::now()).unwrap();

        assert_eq!(item.current_quantity, Quantity::from(100));
        assert_eq!(item.total_value, Quantity::from(85000));
        // Rate is untouched by usage
        assert_eq!(item.last_rate, Quantity::from(850));
    }

    #[test]
    fn test_consumption_of_everything_leaves_zero_value() {
        let mut item = cement();
        item.apply_consumption(Quantity::from(150), Utc::now()).unwrap();

        assert!(item.current_quantity.is_zero());
        assert!(item.total_value.is_zero());
        assert!(item.unit_value().is_zero());
    }

    #[test]
    fn test_consumption_over_stock_is_rejected_without_change() {
        let mut item = cement();
        let before = item.clone();

        let result = item.apply_consumption(Quantity::from(151), Utc::now());

        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                available: Quantity::from(150),
                requested: Quantity::from(151),
            })
        );
        assert_eq!(item, before);
    }

    #[test]
    fn test_low_stock_is_strictly_below_threshold() {
        let mut item = cement();
        let threshold = Quantity::from(DEFAULT_LOW_STOCK_THRESHOLD);
        assert!(!item.is_low_stock(threshold));

        item.apply_consumption(Quantity::from(100), Utc::now()).unwrap();
        assert!(!item.is_low_stock(threshold), "exactly 50 is not low");

        item.apply_consumption(Quantity::from(1), Utc::now()).unwrap();
        assert!(item.is_low_stock(threshold));
    }
}
