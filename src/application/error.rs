use thiserror::Error;

use crate::domain::{Quantity, ValidationError};

/// Broad class of a failure, for deciding how to show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, reported on the offending field
    Validation,
    /// A business rule said no (unknown item, not enough stock)
    Rejected,
    /// Persistence failed; shown as a generic failure
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Stock item not found: {0}")]
    ItemNotFound(String),

    #[error("Insufficient stock for {item_code}: available {available}, requested {requested}")]
    InsufficientStock {
        item_code: String,
        available: Quantity,
        requested: Quantity,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::ItemNotFound(_) | AppError::InsufficientStock { .. } => ErrorKind::Rejected,
            AppError::Storage(_) => ErrorKind::Infrastructure,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.kind() == ErrorKind::Rejected
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}
