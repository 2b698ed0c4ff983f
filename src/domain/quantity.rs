use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Quantities, rates and values are exact decimals. Floating point never touches the ledger.
/// Example: 12.5 kg at 65.20 per kg = 815.000
pub type Quantity = Decimal;

/// Format a decimal for display and export, dropping trailing zeros.
/// Example: 225000.00 -> "225000", 12.50 -> "12.5", 0.000 -> "0"
pub fn format_quantity(value: Quantity) -> String {
    value.normalize().to_string()
}

/// Parse a user-supplied quantity, rate or amount.
/// Example: "100" -> 100, "12.5" -> 12.5, "0.01" -> 0.01
pub fn parse_quantity(input: &str) -> Result<Quantity, ParseQuantityError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseQuantityError::Empty);
    }

    // Thousands separators are common in hand-typed rates ("4,500").
    let cleaned: String = input.chars().filter(|c| *c != '_' && *c != ',').collect();

    Decimal::from_str(&cleaned).map_err(|_| ParseQuantityError::InvalidFormat(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseQuantityError {
    Empty,
    InvalidFormat(String),
}

impl fmt::Display for ParseQuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseQuantityError::Empty => write!(f, "empty quantity"),
            ParseQuantityError::InvalidFormat(s) => write!(f, "invalid quantity format: '{}'", s),
        }
    }
}

impl std::error::Error for ParseQuantityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(Decimal::new(22500000, 2)), "225000");
        assert_eq!(format_quantity(Decimal::new(1250, 2)), "12.5");
        assert_eq!(format_quantity(Decimal::new(1, 2)), "0.01");
        assert_eq!(format_quantity(Decimal::new(0, 3)), "0");
        assert_eq!(format_quantity(Decimal::from(850)), "850");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("100"), Ok(Decimal::from(100)));
        assert_eq!(parse_quantity("12.5"), Ok(Decimal::new(125, 1)));
        assert_eq!(parse_quantity(" 0.01 "), Ok(Decimal::new(1, 2)));
        assert_eq!(parse_quantity("4,500"), Ok(Decimal::from(4500)));
        assert_eq!(parse_quantity("-3"), Ok(Decimal::from(-3)));
    }

    #[test]
    fn test_parse_quantity_invalid() {
        assert_eq!(parse_quantity(""), Err(ParseQuantityError::Empty));
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("12.34.56").is_err());
    }
}
