//! Canonical string formatting shared by hashing, XML, and the QR URL.
//!
//! The external spec mandates two distinct amount forms: a stripped form
//! that feeds the hash input and a padded 2-decimal form for everything a
//! human or the XSD sees. They are deliberately separate functions so call
//! sites cannot swap them — feeding the display form into the hash silently
//! produces a wrong-but-plausible huella.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// `DD-MM-YYYY`, zero-padded, no locale variance.
pub fn format_date(d: NaiveDate) -> String {
    d.format("%d-%m-%Y").to_string()
}

/// Minimal decimal representation with trailing zeros stripped.
///
/// This exact form is mandated for hash-input canonicalization:
/// `1210.00 → "1210"`, `42.50 → "42.5"`, `0 → "0"`.
pub fn format_amount_for_hash(n: Decimal) -> String {
    n.normalize().to_string()
}

/// Always exactly two decimals, half-up rounding: `1210 → "1210.00"`.
///
/// Used in XML, the REST payload, and the QR URL — never in hash input.
pub fn format_amount_for_display(n: Decimal) -> String {
    let s = n
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string();
    match s.find('.') {
        Some(dot) => {
            let decimals = s.len() - dot - 1;
            format!("{s}{}", "0".repeat(2 - decimals))
        }
        None => format!("{s}.00"),
    }
}

/// ISO-8601 local civil time with an explicit numeric UTC offset,
/// `YYYY-MM-DDTHH:MM:SS±HH:MM`. No `Z` shortcut — the offset digits are
/// part of the hashed record.
pub fn format_timestamp(t: DateTime<FixedOffset>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn date_is_day_month_year() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(format_date(d), "05-06-2024");
    }

    #[test]
    fn hash_amount_strips_trailing_zeros() {
        assert_eq!(format_amount_for_hash(dec!(1210.00)), "1210");
        assert_eq!(format_amount_for_hash(dec!(42.50)), "42.5");
        assert_eq!(format_amount_for_hash(dec!(100.00)), "100");
        assert_eq!(format_amount_for_hash(dec!(123.10)), "123.1");
        assert_eq!(format_amount_for_hash(dec!(0)), "0");
        assert_eq!(format_amount_for_hash(dec!(0.00)), "0");
    }

    #[test]
    fn display_amount_is_always_two_decimals() {
        assert_eq!(format_amount_for_display(dec!(1210)), "1210.00");
        assert_eq!(format_amount_for_display(dec!(100.00)), "100.00");
        assert_eq!(format_amount_for_display(dec!(42.5)), "42.50");
        assert_eq!(format_amount_for_display(dec!(19.999)), "20.00");
        assert_eq!(format_amount_for_display(dec!(0)), "0.00");
    }

    #[test]
    fn the_two_amount_forms_differ() {
        let n = dec!(1210.00);
        assert_ne!(format_amount_for_hash(n), format_amount_for_display(n));
    }

    #[test]
    fn timestamp_carries_numeric_offset() {
        let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
        let t = madrid.with_ymd_and_hms(2024, 6, 15, 10, 30, 5).unwrap();
        assert_eq!(format_timestamp(t), "2024-06-15T10:30:05+02:00");
    }

    #[test]
    fn zero_offset_is_numeric_not_z() {
        let utc0 = FixedOffset::east_opt(0).unwrap();
        let t = utc0.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(t), "2024-01-01T00:00:00+00:00");
    }
}
