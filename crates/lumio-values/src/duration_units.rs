//! Duration unit arithmetic: parsing `1w3d4h` style strings into milliseconds
//! and breaking milliseconds back down into unit counts.

use crate::decimal::{parse_decimal, plain_string, round_down, round_half_up, zero};
use ahash::AHashMap;
use bigdecimal::BigDecimal;
use lumio_model::{DurationConstraintConfig, DurationType, DurationUnit};
use std::collections::BTreeMap;

/// Translation of native unit letters (`w`, `d`, ...) to display letters.
pub type DurationUnitsMap = AHashMap<String, String>;

pub fn default_conversion(kind: DurationType, unit: DurationUnit) -> u32 {
    match unit {
        DurationUnit::Weeks if kind == DurationType::Work => 5,
        DurationUnit::Weeks => 7,
        DurationUnit::Days if kind == DurationType::Work => 8,
        DurationUnit::Days => 24,
        DurationUnit::Hours | DurationUnit::Minutes => 60,
        DurationUnit::Seconds => 1000,
    }
}

fn conversion(config: &DurationConstraintConfig, unit: DurationUnit) -> BigDecimal {
    let configured = config
        .conversions
        .as_ref()
        .and_then(|c| c.get(&unit.letter().to_string()))
        .filter(|v| **v > 0.0)
        .and_then(|v| parse_decimal(&v.to_string()));
    configured.unwrap_or_else(|| {
        BigDecimal::from(default_conversion(config.kind.unwrap_or_default(), unit))
    })
}

/// Milliseconds in one `unit`.
pub fn unit_to_millis(config: &DurationConstraintConfig, unit: DurationUnit) -> BigDecimal {
    let own = conversion(config, unit);
    match unit.smaller() {
        Some(next) => own * unit_to_millis(config, next),
        None => own,
    }
}

/// Unit letter → milliseconds, keyed by translated letters when a map is given.
pub fn unit_to_millis_map(
    config: &DurationConstraintConfig,
    units_map: Option<&DurationUnitsMap>,
) -> BTreeMap<char, BigDecimal> {
    DurationUnit::ALL
        .iter()
        .map(|unit| {
            let native = unit.letter().to_string();
            let key = units_map
                .and_then(|m| m.get(&native))
                .and_then(|s| s.chars().next())
                .unwrap_or_else(|| unit.letter());
            (key, unit_to_millis(config, *unit))
        })
        .collect()
}

fn prepare(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn only_letters_and_digits(value: &str, letters: &[char]) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit() || letters.contains(&c))
}

fn native_letters() -> Vec<char> {
    DurationUnit::ALL.iter().map(|u| u.letter()).collect()
}

fn translated_letters(units_map: Option<&DurationUnitsMap>) -> Vec<char> {
    units_map
        .map(|m| m.values().filter_map(|s| s.chars().next()).collect())
        .unwrap_or_default()
}

pub fn is_valid_by_native_letters(value: &str) -> bool {
    only_letters_and_digits(&prepare(value), &native_letters())
}

pub fn is_valid_by_translated_letters(value: &str, units_map: Option<&DurationUnitsMap>) -> bool {
    only_letters_and_digits(&prepare(value), &translated_letters(units_map))
}

/// The raw text form of a stored duration (numbers as plain decimals).
pub fn duration_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Milliseconds for a valid duration string; `None` when it is not a duration.
pub fn duration_millis(
    value: &str,
    config: &DurationConstraintConfig,
    units_map: Option<&DurationUnitsMap>,
) -> Option<BigDecimal> {
    if let Some(number) = parse_decimal(value) {
        return Some(round_half_up(&number, 0));
    }
    if is_valid_by_translated_letters(value, units_map) {
        return Some(parse_letters(value, &unit_to_millis_map(config, units_map)));
    }
    if is_valid_by_native_letters(value) {
        return Some(parse_letters(value, &unit_to_millis_map(config, None)));
    }
    None
}

/// Sums `\d*<letter>` groups; a group without digits counts once.
fn parse_letters(value: &str, millis_map: &BTreeMap<char, BigDecimal>) -> BigDecimal {
    let mut total = zero();
    let mut digits = String::new();
    for c in prepare(value).chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if let Some(millis) = millis_map.get(&c) {
            let count = parse_decimal(&digits).unwrap_or_else(|| BigDecimal::from(1));
            total += millis * count;
        }
        digits.clear();
    }
    round_half_up(&total, 0)
}

/// Counts per unit for `millis`, honoring `maxUnit`, `maxUnits` and
/// `decimalPlaces`. Counts carry the sign of `millis`.
pub fn units_counts(
    millis: &BigDecimal,
    config: &DurationConstraintConfig,
) -> BTreeMap<DurationUnit, BigDecimal> {
    let negative = millis < &zero();
    let mut current = millis.abs();
    let max_units = config.max_units.filter(|m| *m > 0).unwrap_or(u32::MAX);
    let decimal_places = config.decimal_places.unwrap_or(0);
    let units: Vec<DurationUnit> = match config.max_unit {
        Some(max_unit) => DurationUnit::ALL
            .iter()
            .copied()
            .skip_while(|u| *u != max_unit)
            .collect(),
        None => DurationUnit::ALL.to_vec(),
    };

    let one = BigDecimal::from(1);
    let two = BigDecimal::from(2);
    let signed = |v: BigDecimal| if negative { -v } else { v };

    let mut used = 0u32;
    let mut counts = BTreeMap::new();
    for unit in units {
        if used >= max_units {
            break;
        }
        let unit_millis = unit_to_millis(config, unit);
        let is_last = (used > 0 && used + 1 == max_units) || unit == DurationUnit::Seconds;
        let num_units = &current / &unit_millis;
        if num_units < one {
            let count = if is_last && num_units > zero() {
                one.clone()
            } else {
                zero()
            };
            counts.insert(unit, signed(count));
            continue;
        }

        let mut rounded = round_down(&num_units, decimal_places);
        current -= &rounded * &unit_millis;
        if used + 1 == max_units && current > &unit_millis / &two {
            rounded += &one;
        }
        counts.insert(unit, signed(rounded));
        used += 1;
    }
    counts
}

/// `3t4d5h` style rendering; only the first negative unit carries the sign.
pub fn counts_to_string(
    counts: &BTreeMap<DurationUnit, BigDecimal>,
    units_map: Option<&DurationUnitsMap>,
) -> String {
    let mut out = String::new();
    let mut minus_added = false;
    for unit in DurationUnit::ALL {
        let Some(count) = counts.get(&unit) else {
            continue;
        };
        if count == &zero() {
            continue;
        }
        let letter = units_map
            .and_then(|m| m.get(&unit.letter().to_string()))
            .cloned()
            .unwrap_or_else(|| unit.letter().to_string());
        let shown = if count < &zero() && minus_added {
            count.abs()
        } else {
            count.clone()
        };
        if count < &zero() {
            minus_added = true;
        }
        out.push_str(&plain_string(&shown));
        out.push_str(&letter);
    }
    out
}

/// Full display form for a millisecond value.
pub fn format_millis(
    millis: &BigDecimal,
    config: &DurationConstraintConfig,
    units_map: Option<&DurationUnitsMap>,
) -> String {
    let counts = units_counts(millis, config);
    let text = counts_to_string(&counts, units_map);
    if text.is_empty() && millis >= &zero() {
        "0".to_string()
    } else {
        text
    }
}
