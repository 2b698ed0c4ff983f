use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{require_positive, require_text};
use super::{Quantity, Unit, ValidationError};

pub type ReceiptId = Uuid;

/// Incoming goods. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReceipt {
    pub id: ReceiptId,
    pub item_name: String,
    pub item_code: String,
    pub quantity_received: Quantity,
    pub rate_per_unit: Quantity,
    pub unit: Unit,
    /// quantity_received x rate_per_unit
    pub total_value: Quantity,
    pub supplier_name: String,
    pub delivery_date: NaiveDate,
    pub received_by: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Receipt entry form as submitted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReceipt {
    pub item_name: String,
    pub item_code: String,
    pub quantity_received: Quantity,
    pub rate_per_unit: Quantity,
    pub unit: Unit,
    pub supplier_name: String,
    pub delivery_date: NaiveDate,
    pub received_by: String,
    /// Falls back to `received_by` when blank
    pub created_by: String,
}

impl NewReceipt {
    /// Check the form the way the entry screen does: every text field filled, amounts positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("item_name", "Item name", &self.item_name)?;
        require_text("item_code", "Item code", &self.item_code)?;
        require_positive("quantity_received", "Quantity", self.quantity_received)?;
        require_positive("rate_per_unit", "Rate", self.rate_per_unit)?;
        require_text("supplier_name", "Supplier name", &self.supplier_name)?;
        require_text("received_by", "Received by", &self.received_by)?;
        self.total_value()?;
        Ok(())
    }

    /// quantity x rate, rejected on the rate when the product does not fit.
    pub fn total_value(&self) -> Result<Quantity, ValidationError> {
        self.quantity_received
            .checked_mul(self.rate_per_unit)
            .ok_or_else(|| {
                ValidationError::new(
                    "rate_per_unit",
                    "Receipt value exceeds the largest storable amount",
                )
            })
    }

    /// Turn the form into a receipt record.
    pub fn into_receipt(self, now: DateTime<Utc>) -> Result<StockReceipt, ValidationError> {
        let total_value = self.total_value()?;
        let created_by = if self.created_by.trim().is_empty() {
            self.received_by.clone()
        } else {
            self.created_by
        };

        Ok(StockReceipt {
            id: Uuid::new_v4(),
            item_name: self.item_name.trim().to_string(),
            item_code: self.item_code.trim().to_string(),
            quantity_received: self.quantity_received,
            rate_per_unit: self.rate_per_unit,
            unit: self.unit,
            total_value,
            supplier_name: self.supplier_name,
            delivery_date: self.delivery_date,
            received_by: self.received_by,
            created_at: now,
            created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewReceipt {
        NewReceipt {
            item_name: "Portland Cement".into(),
            item_code: "CEM001".into(),
            quantity_received: Quantity::from(100),
            rate_per_unit: Quantity::from(900),
            unit: Unit::Bag,
            supplier_name: "ABC Cement Co.".into(),
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            received_by: "John Supervisor".into(),
            created_by: String::new(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_missing_supplier_is_reported_on_field() {
        let mut f = form();
        f.supplier_name = String::new();
        let err = f.validate().unwrap_err();
        assert_eq!(err.field, "supplier_name");
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let mut f = form();
        f.rate_per_unit = Quantity::ZERO;
        assert_eq!(f.validate().unwrap_err().field, "rate_per_unit");
    }

    #[test]
    fn test_into_receipt_computes_value_and_defaults_creator() {
        let receipt = form().into_receipt(Utc::now()).unwrap();
        assert_eq!(receipt.total_value, Quantity::from(90000));
        assert_eq!(receipt.created_by, "John Supervisor");
    }

    #[test]
    fn test_item_code_is_trimmed() {
        let mut f = form();
        f.item_code = "  CEM001 ".into();
        assert_eq!(f.into_receipt(Utc::now()).unwrap().item_code, "CEM001");
    }

    #[test]
    fn test_value_too_large_to_store_is_rejected() {
        let mut f = form();
        f.quantity_received = Quantity::from(1_000_000_000_000_000_i64);
        f.rate_per_unit = Quantity::from(1_000_000_000_000_000_i64);

        assert_eq!(f.validate().unwrap_err().field, "rate_per_unit");
        assert!(f.into_receipt(Utc::now()).is_err());
    }
}
