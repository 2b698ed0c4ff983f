use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StockConsumption, StockReceipt, format_quantity};

pub type LogId = Uuid;

/// Actor recorded when a movement carries no creator.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Receipt,
    Consumption,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Receipt => "receipt",
            LogType::Consumption => "consumption",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "receipt" => Some(LogType::Receipt),
            "consumption" => Some(LogType::Consumption),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Only `Created` is ever written; the others exist so stored rows always parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Created,
    Updated,
    Deleted,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Created => "created",
            LogAction::Updated => "updated",
            LogAction::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(LogAction::Created),
            "updated" => Some(LogAction::Updated),
            "deleted" => Some(LogAction::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only audit entry, one per recorded receipt or consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLog {
    pub id: LogId,
    pub log_type: LogType,
    /// Id of the receipt or consumption this entry describes
    pub reference_id: Uuid,
    pub action: LogAction,
    pub performed_by: String,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

impl TransactionLog {
    pub fn for_receipt(receipt: &StockReceipt, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            log_type: LogType::Receipt,
            reference_id: receipt.id,
            action: LogAction::Created,
            performed_by: actor_or_system(&receipt.created_by),
            timestamp: now,
            details: format!(
                "Added {} {} of {} from {}",
                format_quantity(receipt.quantity_received),
                receipt.unit,
                receipt.item_name,
                receipt.supplier_name
            ),
        }
    }

    pub fn for_consumption(consumption: &StockConsumption, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            log_type: LogType::Consumption,
            reference_id: consumption.id,
            action: LogAction::Created,
            performed_by: actor_or_system(&consumption.created_by),
            timestamp: now,
            details: format!(
                "Used {} {} of {} for {}",
                format_quantity(consumption.quantity_used),
                consumption.unit,
                consumption.item_name,
                consumption.purpose_activity_code
            ),
        }
    }
}

pub(crate) fn actor_or_system(actor: &str) -> String {
    let actor = actor.trim();
    if actor.is_empty() {
        SYSTEM_ACTOR.to_string()
    } else {
        actor.to_string()
    }
}
