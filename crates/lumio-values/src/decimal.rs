//! Exact decimal helpers.
//!
//! Every numeric kind (number, percentage, duration) goes through
//! [`BigDecimal`]; floating point is only used when handing a finished result
//! back as a JSON number.

use bigdecimal::{BigDecimal, RoundingMode};
use serde_json::Value;
use std::str::FromStr;

pub fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

pub fn one() -> BigDecimal {
    BigDecimal::from(1)
}

/// Strict decimal grammar: `[+-]digits[.digits][e[+-]digits]`.
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let text = text.trim();
    if !is_decimal_literal(text) {
        return None;
    }
    let text = text.strip_prefix('+').unwrap_or(text);
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let mut body = if body.starts_with('.') {
        format!("0{}", body)
    } else {
        body.to_string()
    };
    if let Some(dot) = body.find('.') {
        let after = &body[dot + 1..];
        if after.is_empty() || after.starts_with(['e', 'E']) {
            body.insert(dot + 1, '0');
        }
    }
    BigDecimal::from_str(&format!("{}{}", sign, body)).ok()
}

fn is_decimal_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start || !exponent_in_range(&text[exp_start..i]) {
            return false;
        }
    }
    i == bytes.len()
}

/// Largest accepted exponent magnitude; plain rendering expands it digit by digit.
const MAX_EXPONENT: u32 = 1000;

fn exponent_in_range(digits: &str) -> bool {
    digits
        .trim_start_matches('0')
        .parse::<u32>()
        .map_or(digits.bytes().all(|b| b == b'0'), |exp| exp <= MAX_EXPONENT)
}

/// Normalizes a user-typed decimal: whitespace is dropped, and a comma is the
/// decimal separator unless a dot is already present.
pub fn decimal_user_to_store(text: &str) -> String {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if compact.contains('.') {
        compact.replace(',', "")
    } else {
        compact.replace(',', ".")
    }
}

/// Replaces the decimal dot with a locale separator.
pub fn decimal_store_to_user(text: &str, separator: &str) -> String {
    text.replace('.', separator)
}

/// Parses a stored value: JSON numbers directly, strings through
/// [`decimal_user_to_store`].
pub fn decimal_from_json(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(&decimal_user_to_store(s)),
        _ => None,
    }
}

pub fn is_numeric(value: &Value) -> bool {
    decimal_from_json(value).is_some()
}

pub fn round_half_up(value: &BigDecimal, decimals: u32) -> BigDecimal {
    value.with_scale_round(i64::from(decimals), RoundingMode::HalfUp)
}

pub fn round_down(value: &BigDecimal, decimals: u32) -> BigDecimal {
    value.with_scale_round(i64::from(decimals), RoundingMode::Down)
}

pub fn round_up(value: &BigDecimal, decimals: u32) -> BigDecimal {
    value.with_scale_round(i64::from(decimals), RoundingMode::Up)
}

/// Plain notation without exponent and without trailing fractional zeros.
pub fn plain_string(value: &BigDecimal) -> String {
    let (int, scale) = value.as_bigint_and_exponent();
    render(&int.to_string(), scale, true)
}

/// Fixed notation with exactly `decimals` fractional digits, rounded half up.
pub fn fixed_string(value: &BigDecimal, decimals: u32) -> String {
    let rounded = round_half_up(value, decimals);
    let (int, scale) = rounded.as_bigint_and_exponent();
    render(&int.to_string(), scale, false)
}

fn render(int: &str, scale: i64, strip_zeros: bool) -> String {
    let (negative, digits) = match int.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, int),
    };
    let mut text = if scale <= 0 {
        if digits == "0" {
            "0".to_string()
        } else {
            let mut s = digits.to_string();
            s.extend(std::iter::repeat('0').take((-scale) as usize));
            s
        }
    } else {
        let scale = scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits.to_string()
        };
        let split = padded.len() - scale;
        format!("{}.{}", &padded[..split], &padded[split..])
    };
    if strip_zeros {
        text = remove_trailing_zeroes(&text);
    }
    if negative && text.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", text)
    } else {
        text
    }
}

/// `"10.500"` → `"10.5"`, `"10.0"` → `"10"`.
pub fn remove_trailing_zeroes(text: &str) -> String {
    match text.split_once('.') {
        None => text.to_string(),
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                int.to_string()
            } else {
                format!("{}.{}", int, frac)
            }
        }
    }
}

/// JSON number when the value fits, plain string otherwise.
pub fn decimal_to_json(value: &BigDecimal) -> Value {
    let text = plain_string(value);
    if !text.contains('.') {
        if let Ok(int) = text.parse::<i64>() {
            return Value::from(int);
        }
    }
    match text.parse::<f64>() {
        Ok(float) if float.is_finite() && plain_float(float) == text => Value::from(float),
        _ => Value::String(text),
    }
}

fn plain_float(value: f64) -> String {
    remove_trailing_zeroes(&format!("{}", value))
}

/// Keeps digits, separators and signs of a live-typed number.
pub fn remove_non_number_characters(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | ' '))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> BigDecimal {
        parse_decimal(s).unwrap()
    }

    #[test]
    fn parses_strict_literals() {
        assert!(parse_decimal("10.5").is_some());
        assert!(parse_decimal("-.5").is_some());
        assert!(parse_decimal("+7").is_some());
        assert!(parse_decimal("1e3").is_some());
        assert!(parse_decimal("1e").is_none());
        assert!(parse_decimal("abc").is_none());
        assert!(parse_decimal(".").is_none());
        assert!(parse_decimal("").is_none());
    }

    #[test]
    fn exponent_is_bounded() {
        assert_eq!(plain_string(&parse_decimal("1e1000").unwrap()).len(), 1001);
        assert!(parse_decimal("1E-1000").is_some());
        assert!(parse_decimal("2e0000").is_some());
        assert!(parse_decimal("1e1001").is_none());
        assert!(parse_decimal("1e50000000").is_none());
        assert!(parse_decimal("-1e-99999999999999999999").is_none());
        assert!(!is_numeric(&json!("1e999999999")));
    }

    #[test]
    fn user_to_store_handles_separators() {
        assert_eq!(decimal_user_to_store("10,11"), "10.11");
        assert_eq!(decimal_user_to_store("10,000.5"), "10000.5");
        assert_eq!(decimal_user_to_store(" 2,3.77777 "), "23.77777");
        assert_eq!(decimal_user_to_store("1 000"), "1000");
    }

    #[test]
    fn plain_and_fixed_rendering() {
        assert_eq!(plain_string(&dec("10.000")), "10");
        assert_eq!(plain_string(&dec("1e3")), "1000");
        assert_eq!(plain_string(&dec("-0.0500")), "-0.05");
        assert_eq!(plain_string(&dec("0")), "0");
        assert_eq!(fixed_string(&dec("23.77777"), 3), "23.778");
        assert_eq!(fixed_string(&dec("10"), 2), "10.00");
        assert_eq!(fixed_string(&dec("0.5"), 0), "1");
        assert_eq!(fixed_string(&dec("-0.004"), 2), "0.00");
    }

    #[test]
    fn json_conversion() {
        assert_eq!(decimal_from_json(&json!(20)), Some(dec("20")));
        assert_eq!(decimal_from_json(&json!("20,5")), Some(dec("20.5")));
        assert_eq!(decimal_from_json(&json!(null)), None);
        assert_eq!(decimal_to_json(&dec("9.22")), json!(9.22));
        assert_eq!(decimal_to_json(&dec("10.00")), json!(10));
    }
}
