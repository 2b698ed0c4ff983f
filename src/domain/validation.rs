use super::Quantity;

/// A rejected input field, reported next to the field it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn require_text(
    field: &'static str,
    label: &str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{} is required", label)));
    }
    Ok(())
}

pub(crate) fn require_positive(
    field: &'static str,
    label: &str,
    value: Quantity,
) -> Result<(), ValidationError> {
    if value <= Quantity::ZERO {
        return Err(ValidationError::new(
            field,
            format!("{} must be greater than 0", label),
        ));
    }
    Ok(())
}
