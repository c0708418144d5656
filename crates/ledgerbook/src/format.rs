//! Plain-text formatting helpers shared by the report commands.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round `amount` half away from zero and pad it to `dp` places.
///
/// ```
/// use ledgerbook::format::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(1200.5), 2), "1200.50");
/// assert_eq!(format_amount(dec!(-0.125), 2), "-0.13");
/// assert_eq!(format_amount(dec!(99.5), 0), "100");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal, dp: u32) -> String {
    let mut rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// ISO month label, e.g. `2024-03`.
#[must_use]
pub fn month_label(start: NaiveDate) -> String {
    start.format("%Y-%m").to_string()
}

/// Two spaces per tree level.
#[must_use]
pub fn indent(level: usize) -> String {
    "  ".repeat(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount_pads_and_rounds() {
        assert_eq!(format_amount(dec!(5), 2), "5.00");
        assert_eq!(format_amount(dec!(149.905), 2), "149.91");
        assert_eq!(format_amount(dec!(-3.14159), 3), "-3.142");
    }

    #[test]
    fn test_negative_zero_prints_as_zero() {
        assert_eq!(format_amount(dec!(-0.001), 2), "0.00");
    }

    #[test]
    fn test_month_label() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(month_label(start), "2024-03");
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "    ");
    }
}
