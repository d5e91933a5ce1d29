// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::DAY_FORMAT;

/// Largest amount accepted on input.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x38D7E, 0, false, 0);
/// Largest ROI magnitude accepted on input, in percent.
pub const MAX_ROI: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
        .map_err(|e| Error::invalid("date", s, format!("{}, expected YYYY-MM-DD", e)))
}

/// Parses a user-supplied amount. Must be a positive decimal.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let t = s.trim();
    let d = t
        .parse::<Decimal>()
        .map_err(|e| Error::invalid("amount", s, e.to_string()))?;
    if d <= Decimal::ZERO {
        return Err(Error::invalid("amount", s, "must be greater than zero"));
    }
    if d > MAX_AMOUNT {
        return Err(Error::invalid("amount", s, format!("must not exceed {}", MAX_AMOUNT)));
    }
    Ok(d)
}

/// Parses an ROI percentage such as `7.5%` or `7.5` into `7.5`.
pub fn parse_roi(s: &str) -> Result<Decimal> {
    let t = s.trim();
    let t = t.strip_suffix('%').unwrap_or(t).trim_end();
    let roi = t
        .parse::<Decimal>()
        .map_err(|e| Error::invalid("roi", s, e.to_string()))?;
    if roi.abs() > MAX_ROI {
        return Err(Error::invalid("roi", s, format!("must be within ±{}%", MAX_ROI)));
    }
    Ok(roi)
}

/// Adds decimals without panicking; overflow becomes [`Error::Overflow`].
pub fn checked_sum<I>(what: &'static str, values: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).ok_or(Error::Overflow { what })
    })
}

pub fn required_text(field: &'static str, s: &str) -> Result<String> {
    let t = s.trim();
    if t.is_empty() {
        return Err(Error::invalid(field, s, "must not be empty"));
    }
    Ok(t.to_string())
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> anyhow::Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roi_percent_sign_is_stripped() {
        assert_eq!(parse_roi("7.5%").unwrap().to_string(), "7.5");
        assert_eq!(parse_roi(" 10 ").unwrap().to_string(), "10");
        assert_eq!(parse_roi("-3 %").unwrap().to_string(), "-3");
        assert!(parse_roi("abc").is_err());
        assert!(parse_roi("%").is_err());
    }

    #[test]
    fn amount_must_be_positive_number() {
        assert_eq!(parse_amount("42.50").unwrap().to_string(), "42.50");
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("12abc").is_err());
        assert_eq!(parse_amount("1000000000000000").unwrap(), MAX_AMOUNT);
        assert!(parse_amount("1000000000000000.01").is_err());
        assert!(parse_amount("79228162514264337593543950335").is_err());
    }

    #[test]
    fn roi_is_bounded() {
        assert_eq!(parse_roi("-1000000%").unwrap(), -MAX_ROI);
        assert!(parse_roi("100000000000%").is_err());
        assert!(parse_roi("-1000001").is_err());
    }

    #[test]
    fn checked_sum_reports_overflow() {
        let two = [Decimal::MAX, Decimal::MAX];
        assert!(matches!(
            checked_sum("test", two),
            Err(Error::Overflow { what: "test" })
        ));
        let small = [Decimal::from(2), Decimal::from(3)];
        assert_eq!(checked_sum("test", small).unwrap(), Decimal::from(5));
        assert_eq!(checked_sum("test", []).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn money_rounds_to_cents() {
        let d: Decimal = "10.005".parse().unwrap();
        assert_eq!(fmt_money(&d), "10.00");
        assert_eq!(fmt_money(&Decimal::from(3)), "3.00");
    }
}
