//! Money Conversion
//!
//! The payment API speaks integer minor units (cents) everywhere. These
//! helpers convert to decimal major units for display only - the conversion
//! is one-directional and nothing parsed back from a display string is ever
//! sent to the API.

use rust_decimal::Decimal;

/// Convert an integer minor-unit amount to major units (e.g. 1234 -> 12.34).
///
/// Exact by construction: the minor amount becomes a `Decimal` with scale 2,
/// so repeated formatting of the result is stable.
pub fn cents_to_units(amount_minor: i64) -> Decimal {
    Decimal::new(amount_minor, 2)
}

/// Format a major-unit amount with two decimal places.
pub fn format_major(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cents_to_units() {
        assert_eq!(cents_to_units(1234), dec!(12.34));
        assert_eq!(cents_to_units(0), dec!(0.00));
        assert_eq!(cents_to_units(-550), dec!(-5.50));
        assert_eq!(cents_to_units(5), dec!(0.05));
    }

    #[test]
    fn test_formatting_is_stable() {
        let major = cents_to_units(1234);
        let first = format_major(major);
        let second = format_major(major);
        assert_eq!(first, "12.34");
        assert_eq!(first, second);
    }
}
