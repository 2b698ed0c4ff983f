use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::log::actor_or_system;
use super::validation::{require_positive, require_text};
use super::{ActivityCode, Quantity, StockItem, Unit, ValidationError};

pub type ConsumptionId = Uuid;

/// Material taken out of stock. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockConsumption {
    pub id: ConsumptionId,
    pub item_name: String,
    pub item_code: String,
    pub quantity_used: Quantity,
    pub unit: Unit,
    pub purpose_activity_code: ActivityCode,
    pub used_by: String,
    pub date: NaiveDate,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Consumption form. Name and unit come from the selected item, not from the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConsumption {
    pub item_code: String,
    pub quantity_used: Quantity,
    pub purpose_activity_code: ActivityCode,
    pub used_by: String,
    pub date: NaiveDate,
    pub remarks: Option<String>,
    pub created_by: String,
}

impl NewConsumption {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("item_code", "Item code", &self.item_code)?;
        require_positive("quantity_used", "Quantity", self.quantity_used)?;
        require_text("used_by", "Used by", &self.used_by)?;
        Ok(())
    }

    /// Build the record against the item it draws from. A blank actor is recorded as `system`.
    pub fn into_consumption(self, item: &StockItem, now: DateTime<Utc>) -> StockConsumption {
        StockConsumption {
            id: Uuid::new_v4(),
            item_name: item.item_name.clone(),
            item_code: item.item_code.clone(),
            quantity_used: self.quantity_used,
            unit: item.unit,
            purpose_activity_code: self.purpose_activity_code,
            used_by: self.used_by,
            date: self.date,
            remarks: self.remarks.filter(|r| !r.trim().is_empty()),
            created_at: now,
            created_by: actor_or_system(&self.created_by),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewConsumption {
        NewConsumption {
            item_code: "STL012".into(),
            quantity_used: Quantity::from(500),
            purpose_activity_code: ActivityCode::Constr,
            used_by: "Construction Team B".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
            remarks: Some("Column reinforcement".into()),
            created_by: "Mike Foreman".into(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_blank_used_by_is_rejected() {
        let mut f = form();
        f.used_by = " ".into();
        assert_eq!(f.validate().unwrap_err().field, "used_by");
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let mut f = form();
        f.quantity_used = Quantity::from(-1);
        assert_eq!(f.validate().unwrap_err().field, "quantity_used");
    }

    #[test]
    fn test_record_takes_name_and_unit_from_item() {
        let item = StockItem::new(
            "Steel Rebar 12mm",
            "STL012",
            Unit::Kg,
            Quantity::from(2500),
            Quantity::from(65),
            Utc::now(),
        );
        let mut f = form();
        f.remarks = Some(String::new());

        let consumption = f.into_consumption(&item, Utc::now());
        assert_eq!(consumption.item_name, "Steel Rebar 12mm");
        assert_eq!(consumption.unit, Unit::Kg);
        assert_eq!(consumption.remarks, None, "blank remarks are dropped");
    }

    #[test]
    fn test_blank_actor_is_recorded_as_system() {
        let item = StockItem::new(
            "Steel Rebar 12mm",
            "STL012",
            Unit::Kg,
            Quantity::from(2500),
            Quantity::from(65),
            Utc::now(),
        );
        let mut f = form();
        f.created_by = "  ".into();

        let consumption = f.into_consumption(&item, Utc::now());
        assert_eq!(consumption.created_by, crate::domain::SYSTEM_ACTOR);
    }
}
