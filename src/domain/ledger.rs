use chrono::{DateTime, Utc};

use super::{
    NewConsumption, NewReceipt, StockConsumption, StockError, StockItem, StockReceipt,
    TransactionLog, ValidationError,
};

/// The movement record a ledger entry writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Movement {
    Receipt(StockReceipt),
    Consumption(StockConsumption),
}

/// How the item row changes: first receipt of a code inserts, everything else updates.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemWrite {
    Insert(StockItem),
    Update(StockItem),
}

impl ItemWrite {
    pub fn item(&self) -> &StockItem {
        match self {
            ItemWrite::Insert(item) | ItemWrite::Update(item) => item,
        }
    }
}

/// Everything one receipt or consumption writes: the movement, the item and the log row.
/// Stores commit an entry as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub movement: Movement,
    pub item: ItemWrite,
    pub log: TransactionLog,
}

/// Plan a receipt against the current state of its item (if any).
/// Quantity grows, the rate becomes the receipt's rate, and value = quantity x rate.
/// Amounts whose result would not fit are rejected on the offending field.
pub fn plan_receipt(
    existing: Option<StockItem>,
    form: NewReceipt,
    now: DateTime<Utc>,
) -> Result<LedgerEntry, ValidationError> {
    let receipt = form.into_receipt(now)?;

    let item = match existing {
        Some(mut item) => {
            item.apply_receipt(receipt.quantity_received, receipt.rate_per_unit, now)?;
            ItemWrite::Update(item)
        }
        None => ItemWrite::Insert(StockItem::new(
            receipt.item_name.clone(),
            receipt.item_code.clone(),
            receipt.unit,
            receipt.quantity_received,
            receipt.rate_per_unit,
            now,
        )),
    };

    let log = TransactionLog::for_receipt(&receipt, now);

    Ok(LedgerEntry {
        movement: Movement::Receipt(receipt),
        item,
        log,
    })
}

/// Plan a consumption. Fails, producing nothing, when the item holds less than requested.
pub fn plan_consumption(
    mut item: StockItem,
    form: NewConsumption,
    now: DateTime<Utc>,
) -> Result<LedgerEntry, StockError> {
    item.apply_consumption(form.quantity_used, now)?;

    let consumption = form.into_consumption(&item, now);
    let log = TransactionLog::for_consumption(&consumption, now);

    Ok(LedgerEntry {
        movement: Movement::Consumption(consumption),
        item: ItemWrite::Update(item),
        log,
    })
}
