//! Timestamp and duration parsing and range checks.
//!
//! CEL limits timestamps to years 0001 through 9999 and durations to roughly
//! ten thousand years in either direction. Fractional duration components
//! (`"1.5h"`, `"0.001ms"`) are parsed as exact decimals so they never pick up
//! binary floating-point error.

use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Largest duration magnitude, in seconds.
pub const MAX_DURATION_SECONDS: i64 = 315_576_000_000;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

pub fn timestamp_in_range(t: &DateTime<Utc>) -> bool {
    (1..=9999).contains(&t.year())
}

pub fn duration_in_range(d: &TimeDelta) -> bool {
    d.num_seconds().abs() <= MAX_DURATION_SECONDS
}

/// Parses an RFC 3339 timestamp such as `2024-05-01T12:00:00.5+02:00`.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|e| format!("invalid timestamp `{}`: {}", text, e))?
        .with_timezone(&Utc);

    if !timestamp_in_range(&parsed) {
        return Err(format!("timestamp `{}` is outside years 0001 to 9999", text));
    }
    Ok(parsed)
}

fn unit_nanos(unit: &str) -> Option<i64> {
    match unit {
        "h" => Some(3_600_000_000_000),
        "m" => Some(60_000_000_000),
        "s" => Some(1_000_000_000),
        "ms" => Some(1_000_000),
        "us" | "\u{00b5}s" => Some(1_000),
        "ns" => Some(1),
        _ => None,
    }
}

/// Parses a duration such as `1h30m`, `-1.5s` or `250ms`.
pub fn parse_duration(text: &str) -> Result<TimeDelta, String> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if body.is_empty() {
        return Err(format!("invalid duration `{}`: no value", text));
    }

    // "0" alone is the one unit-less duration CEL accepts
    if body == "0" {
        return Ok(TimeDelta::zero());
    }

    let mut total: i128 = 0;
    let mut rest = body;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration `{}`: expected a number at `{}`", text, rest));
        }
        let (number, after) = rest.split_at(number_len);

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);

        let scale = unit_nanos(unit)
            .ok_or_else(|| format!("invalid duration `{}`: unknown unit `{}`", text, unit))?;

        let amount = Decimal::from_str(number)
            .map_err(|_| format!("invalid duration `{}`: bad number `{}`", text, number))?;
        let nanos = amount
            .checked_mul(Decimal::from(scale))
            .and_then(|n| n.trunc().to_i128())
            .ok_or_else(|| format!("duration `{}` is out of range", text))?;

        total = total
            .checked_add(nanos)
            .ok_or_else(|| format!("duration `{}` is out of range", text))?;
        rest = after;
    }

    if negative {
        total = -total;
    }

    let seconds = i64::try_from(total.div_euclid(NANOS_PER_SECOND))
        .map_err(|_| format!("duration `{}` is out of range", text))?;
    let nanos = total.rem_euclid(NANOS_PER_SECOND) as u32;

    TimeDelta::new(seconds, nanos)
        .filter(duration_in_range)
        .ok_or_else(|| format!("duration `{}` is out of range", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("1h30m"), Ok(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("250ms"), Ok(TimeDelta::milliseconds(250)));
        assert_eq!(parse_duration("-1.5s"), Ok(TimeDelta::milliseconds(-1500)));
        assert_eq!(parse_duration("0"), Ok(TimeDelta::zero()));
        assert_eq!(parse_duration("3us"), Ok(TimeDelta::microseconds(3)));
    }

    #[test]
    fn test_fractional_durations_are_exact() {
        assert_eq!(parse_duration("0.001ms"), Ok(TimeDelta::nanoseconds(1_000)));
        assert_eq!(parse_duration("0.1s"), Ok(TimeDelta::milliseconds(100)));
    }

    #[test]
    fn test_parse_duration_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("400000000000s").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let t = parse_timestamp("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert!(parse_timestamp("2024-05-01").is_err());
    }
}
