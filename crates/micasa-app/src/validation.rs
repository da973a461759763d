// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Parsing and formatting for the text a user types into form fields.

use time::macros::format_description;
use time::{Date, Month};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid money value -- use a number like 1250.00")]
    InvalidMoney,
    #[error("negative money value")]
    NegativeMoney,
    #[error("invalid date value -- use YYYY-MM-DD")]
    InvalidDate,
    #[error("invalid integer value")]
    InvalidInt,
    #[error("invalid interval -- use months (6), or a form like 1y 6m")]
    InvalidInterval,
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn parse_required_cents(input: &str) -> ValidationResult<i64> {
    parse_cents(input.trim())
}

pub fn parse_optional_cents(input: &str) -> ValidationResult<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_cents(trimmed).map(Some)
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!(
        "{sign}${}.{:02}",
        group_thousands(magnitude / 100),
        magnitude % 100
    )
}

pub fn format_optional_cents(cents: Option<i64>) -> String {
    cents.map_or_else(String::new, format_cents)
}

pub fn parse_optional_date(input: &str) -> ValidationResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Date::parse(trimmed, &format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate)
}

pub fn format_date(value: Option<Date>) -> String {
    value
        .and_then(|date| {
            date.format(&format_description!("[year]-[month]-[day]"))
                .ok()
        })
        .unwrap_or_default()
}

pub fn parse_required_id(input: &str) -> ValidationResult<i64> {
    let value = input
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidInt)?;
    if value <= 0 {
        return Err(ValidationError::InvalidInt);
    }
    Ok(value)
}

pub fn parse_optional_id(input: &str) -> ValidationResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_required_id(input).map(Some)
}

/// Blank is `None`. Accepts `1,860` style grouping.
pub fn parse_optional_int(input: &str) -> ValidationResult<Option<i32>> {
    let cleaned = input.trim().replace(',', "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<i32>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidInt)
}

/// Accepts a bare month count (`18`) or a year/month form (`1y 6m`, `2y`,
/// `6m`). Years must precede months.
pub fn parse_interval_months(input: &str) -> ValidationResult<i32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(months) = trimmed.parse::<i32>() {
        return if months < 0 {
            Err(ValidationError::InvalidInterval)
        } else {
            Ok(months)
        };
    }

    let compact = trimmed
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let (years, rest) = match compact.split_once('y') {
        Some((years, rest)) => (Some(years), rest),
        None => (None, compact.as_str()),
    };
    let months = match rest {
        "" => None,
        rest => Some(
            rest.strip_suffix('m')
                .ok_or(ValidationError::InvalidInterval)?,
        ),
    };
    if years.is_none() && months.is_none() {
        return Err(ValidationError::InvalidInterval);
    }

    let years = years.map(parse_unit).transpose()?.unwrap_or(0);
    let months = months.map(parse_unit).transpose()?.unwrap_or(0);
    years
        .checked_mul(12)
        .and_then(|total| total.checked_add(months))
        .ok_or(ValidationError::InvalidInterval)
}

pub fn format_interval_months(months: i32) -> String {
    match (months / 12, months % 12) {
        (0, m) => format!("{m}m"),
        (y, 0) => format!("{y}y"),
        (y, m) => format!("{y}y {m}m"),
    }
}

pub fn compute_next_due(last: Option<Date>, interval_months: i32) -> Option<Date> {
    let last = last?;
    if interval_months <= 0 {
        return None;
    }
    add_months(last, interval_months)
}

pub fn add_months(date: Date, months: i32) -> Option<Date> {
    let zero_based = i32::from(u8::from(date.month())) - 1 + months;
    let year = date.year() + zero_based.div_euclid(12);
    let month = Month::try_from(u8::try_from(zero_based.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(time::util::days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).ok()
}

fn parse_unit(digits: &str) -> ValidationResult<i32> {
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidInterval);
    }
    digits
        .parse::<i32>()
        .map_err(|_| ValidationError::InvalidInterval)
}

fn parse_cents(input: &str) -> ValidationResult<i64> {
    if input.starts_with('-') {
        return Err(ValidationError::NegativeMoney);
    }
    let clean = input.replace(',', "");
    let clean = clean.strip_prefix('$').unwrap_or(&clean);
    if clean.is_empty() {
        return Err(ValidationError::InvalidMoney);
    }

    let (whole, frac) = clean.split_once('.').unwrap_or((clean, ""));
    if frac.len() > 2 || frac.contains('.') || (whole.is_empty() && frac.is_empty()) {
        return Err(ValidationError::InvalidMoney);
    }
    let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(ValidationError::InvalidMoney);
    }

    let whole = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidMoney)?
    };
    let frac = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| ValidationError::InvalidMoney)? * 10,
        _ => frac.parse::<i64>().map_err(|_| ValidationError::InvalidMoney)?,
    };
    whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(frac))
        .ok_or(ValidationError::InvalidMoney)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, ch) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, add_months, compute_next_due, format_cents, format_date,
        format_interval_months, parse_interval_months, parse_optional_cents,
        parse_optional_date, parse_optional_id, parse_optional_int, parse_required_cents,
    };
    use time::{Date, Month};

    #[test]
    fn money_parses_common_shapes() {
        let cases = [
            ("100", 10_000),
            ("100.5", 10_050),
            ("100.05", 10_005),
            ("$1,234.56", 123_456),
            (".75", 75),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_required_cents(input), Ok(expected), "input {input}");
        }
    }

    #[test]
    fn money_rejects_garbage_and_negatives() {
        for input in ["", "12.345", "abc", "1.2.3", "$", "."] {
            assert!(parse_required_cents(input).is_err(), "input {input}");
        }
        assert_eq!(
            parse_required_cents("-5.00"),
            Err(ValidationError::NegativeMoney)
        );
        assert_eq!(parse_optional_cents("  "), Ok(None));
    }

    #[test]
    fn money_formats_with_grouping() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(123_456_789), "$1,234,567.89");
        assert_eq!(format_cents(-500), "-$5.00");
        assert!(format_cents(i64::MIN).starts_with("-$92,233,720"));
    }

    #[test]
    fn formatted_money_parses_back() {
        for cents in [1_i64, 99, 100, 4_500_000] {
            assert_eq!(parse_required_cents(&format_cents(cents)), Ok(cents));
        }
    }

    #[test]
    fn dates_use_iso_layout() {
        let parsed = parse_optional_date("2025-06-11").expect("iso date parses");
        assert_eq!(format_date(parsed), "2025-06-11");
        assert!(parse_optional_date("06/11/2025").is_err());
        assert_eq!(parse_optional_date(""), Ok(None));
    }

    #[test]
    fn optional_ints_allow_blank_and_grouping() {
        assert_eq!(parse_optional_int("  "), Ok(None));
        assert_eq!(parse_optional_int("1,860"), Ok(Some(1_860)));
        assert_eq!(parse_optional_int("-3"), Ok(Some(-3)));
        assert_eq!(parse_optional_int("3.5"), Err(ValidationError::InvalidInt));
    }

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(parse_optional_id(""), Ok(None));
        assert_eq!(parse_optional_id(" 7 "), Ok(Some(7)));
        assert!(parse_optional_id("0").is_err());
        assert!(parse_optional_id("x").is_err());
    }

    #[test]
    fn interval_accepts_months_and_year_forms() {
        let cases = [
            ("12", 12),
            ("6m", 6),
            ("6M", 6),
            ("1y", 12),
            ("2y 6m", 30),
            ("1y6m", 18),
            ("  ", 0),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_interval_months(input), Ok(expected), "input {input}");
        }
        for input in ["abc", "-1", "1.5m", "m", "y", "6m 1y"] {
            assert!(parse_interval_months(input).is_err(), "input {input}");
        }
    }

    #[test]
    fn interval_formats_compactly() {
        assert_eq!(format_interval_months(6), "6m");
        assert_eq!(format_interval_months(24), "2y");
        assert_eq!(format_interval_months(18), "1y 6m");
    }

    #[test]
    fn next_due_clamps_to_month_end() {
        let last = Date::from_calendar_date(2025, Month::January, 31).expect("valid date");
        let next = compute_next_due(Some(last), 1).expect("next due exists");
        assert_eq!(next.to_string(), "2025-02-28");
        assert_eq!(compute_next_due(None, 6), None);
        assert_eq!(compute_next_due(Some(last), 0), None);

        let leap = Date::from_calendar_date(2024, Month::November, 30).expect("valid date");
        assert_eq!(
            add_months(leap, 3).map(|date| date.to_string()),
            Some("2025-02-28".to_owned())
        );
    }
}
