use crate::domain::{DEFAULT_LOW_STOCK_THRESHOLD, Quantity};

/// Default SQLite file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "sitestock.db";

/// Runtime settings for the inventory service.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Items strictly below this quantity count as low stock
    pub low_stock_threshold: Quantity,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            low_stock_threshold: Quantity::from(DEFAULT_LOW_STOCK_THRESHOLD),
        }
    }
}

impl Settings {
    pub fn with_low_stock_threshold(mut self, threshold: Quantity) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}
