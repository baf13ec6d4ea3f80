//! Column encodings shared by the repositories.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that text
//! ordering in SQL matches chronological ordering. Decimals are stored as
//! their exact string form.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use papertrade_core::Result;
use rust_decimal::Decimal;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value, DATE_FORMAT)?)
}

pub fn parse_decimal(value: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_as_text() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap();
        let fractional = whole + chrono::Duration::milliseconds(250);

        let (a, b) = (format_timestamp(whole), format_timestamp(fractional));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&b).unwrap(), fractional);
    }

    #[test]
    fn test_date_and_decimal_parsing() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_date(&format_date(date)).unwrap(), date);
        assert_eq!(parse_decimal("1234.5600").unwrap(), Decimal::new(123456, 2));
        assert!(parse_decimal("abc").is_err());
        assert!(parse_date("07/03/2024").is_err());
    }
}
