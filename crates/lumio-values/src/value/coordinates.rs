use super::{
    format_unknown, meets_condition_by_text, meets_fulltexts, normalize_text, raw_text,
    TypedValue,
};
use crate::text::unescape_html;
use lumio_model::{ConditionType, ConditionValue, CoordinatesConstraintConfig, CoordinatesFormat};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

const DEFAULT_PRECISION: u32 = 6;
const EXAMPLE_COORDINATES: &str = "49.2019854,16.4378783";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCoordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A map position. Stored as decimal degrees with six decimals.
#[derive(Debug, Clone)]
pub struct CoordinatesDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a CoordinatesConstraintConfig,
    coordinates: Option<MapCoordinates>,
}

/// Reads `lat,lng` (also `;` or whitespace separated, a lone number is the
/// latitude) or degrees-minutes-seconds such as `49°12'7.1"N 16°26'16.4"E`.
pub fn parse_coordinates(value: &str) -> Option<MapCoordinates> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_decimal_degrees(value)
        .or_else(|| parse_dms(value))
        .filter(|c| c.lat.abs() <= 90.0 && c.lng.abs() <= 180.0)
}

fn parse_decimal_degrees(value: &str) -> Option<MapCoordinates> {
    let separator = |c: char| c == ',' || c == ';';
    let parts: Vec<&str> = if value.contains(separator) {
        value.split(separator).map(str::trim).collect()
    } else {
        value.split_whitespace().collect()
    };
    let number = |text: &str| text.parse::<f64>().ok().filter(|n| n.is_finite());
    match parts.as_slice() {
        [lat] => Some(MapCoordinates {
            lat: number(lat)?,
            lng: 0.0,
        }),
        [lat, lng] => Some(MapCoordinates {
            lat: number(lat)?,
            lng: number(lng)?,
        }),
        _ => None,
    }
}

fn parse_dms(value: &str) -> Option<MapCoordinates> {
    let pattern = Regex::new(
        r#"(\d{1,3})\s*°\s*(?:(\d{1,2})\s*['′]\s*)?(?:(\d{1,2}(?:\.\d+)?)\s*(?:"|″|'')\s*)?([NSEWnsew])"#,
    )
    .ok()?;
    let parts: Vec<(f64, char)> = pattern
        .captures_iter(value)
        .filter_map(|caps| {
            let part = |i: usize| caps.get(i).map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok());
            let degrees = part(1)? + part(2)? / 60.0 + part(3)? / 3600.0;
            let hemisphere = caps.get(4)?.as_str().chars().next()?.to_ascii_uppercase();
            Some((degrees, hemisphere))
        })
        .collect();
    let signed = |(degrees, hemisphere): (f64, char)| match hemisphere {
        'S' | 'W' => -degrees,
        _ => degrees,
    };
    match parts.as_slice() {
        [first, second] if matches!(first.1, 'N' | 'S') && matches!(second.1, 'E' | 'W') => {
            Some(MapCoordinates {
                lat: signed(*first),
                lng: signed(*second),
            })
        }
        [first, second] if matches!(first.1, 'E' | 'W') && matches!(second.1, 'N' | 'S') => {
            Some(MapCoordinates {
                lat: signed(*second),
                lng: signed(*first),
            })
        }
        _ => None,
    }
}

pub fn format_coordinates(
    coordinates: &MapCoordinates,
    format: CoordinatesFormat,
    precision: u32,
) -> String {
    let p = precision as usize;
    match format {
        CoordinatesFormat::DecimalDegrees => {
            format!("{:.p$}, {:.p$}", coordinates.lat, coordinates.lng)
        }
        CoordinatesFormat::DegreesMinutesSeconds => {
            let seconds_precision = precision.saturating_sub(4) as usize;
            let lat = dms(coordinates.lat, seconds_precision, if coordinates.lat < 0.0 { 'S' } else { 'N' });
            let lng = dms(coordinates.lng, seconds_precision, if coordinates.lng < 0.0 { 'W' } else { 'E' });
            format!("{lat}, {lng}")
        }
    }
}

fn dms(value: f64, precision: usize, hemisphere: char) -> String {
    let value = value.abs();
    let degrees = value.trunc();
    let minutes_full = (value - degrees) * 60.0;
    let minutes = minutes_full.trunc();
    let seconds = (minutes_full - minutes) * 60.0;
    format!("{}°{}'{:.precision$}\"{}", degrees as u32, minutes as u32, seconds, hemisphere)
}

impl<'a> CoordinatesDataValue<'a> {
    pub fn new(raw: Value, config: &'a CoordinatesConstraintConfig, input: Option<&str>) -> Self {
        let coordinates = parse_coordinates(&raw_text(&raw));
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            coordinates,
        }
    }

    pub fn coordinates(&self) -> Option<&MapCoordinates> {
        self.coordinates.as_ref()
    }
}

impl<'a> TypedValue for CoordinatesDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        match &self.coordinates {
            Some(coordinates) => format_coordinates(
                coordinates,
                self.config.format.unwrap_or_default(),
                self.config.precision.unwrap_or(DEFAULT_PRECISION),
            ),
            None => format_unknown(&self.raw),
        }
    }

    fn edit_value(&self) -> String {
        unescape_html(&self.format())
    }

    fn serialize(&self) -> Value {
        Value::String(self.coordinates.as_ref().map_or_else(String::new, |c| {
            format_coordinates(c, CoordinatesFormat::DecimalDegrees, DEFAULT_PRECISION)
        }))
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        self.input.is_some() || self.coordinates.is_some()
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        if self.coordinates.is_some() && self.coordinates == other.coordinates {
            return Ordering::Equal;
        }
        self.format().cmp(&other.format())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<String> = values
            .iter()
            .map(|v| normalize_text(&self.copy_with(v.raw().clone()).format()))
            .collect();
        meets_condition_by_text(condition, &normalize_text(&self.format()), &others)
    }

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        meets_fulltexts(&self.format(), fulltexts)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let first = values.first().map_or(Value::Null, |v| v.raw().clone());
        let example = || Value::String(EXAMPLE_COORDINATES.to_string());
        match condition {
            ConditionType::Equals => first,
            ConditionType::NotEquals if raw_text(&first).is_empty() => example(),
            ConditionType::NotEmpty => example(),
            _ => Value::String(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> CoordinatesConstraintConfig {
        CoordinatesConstraintConfig {
            precision: Some(3),
            ..Default::default()
        }
    }

    fn meets(raw: &str, condition: ConditionType, other: &str) -> bool {
        let config = config();
        CoordinatesDataValue::new(json!(raw), &config, None)
            .meet_condition(condition, &[ConditionValue::literal(other)])
    }

    #[test]
    fn equality_at_configured_precision() {
        assert!(meets("10", ConditionType::Equals, "10,0"));
        assert!(!meets("10,1", ConditionType::Equals, "1"));
        assert!(meets("10.12345", ConditionType::Equals, "10.123"));
        assert!(meets("20.99999,30.88888", ConditionType::Equals, "21,30.889"));
        assert!(!meets("20,30", ConditionType::Equals, "20,30.1"));
        assert!(meets("20,155", ConditionType::NotEquals, "20.000,155.0006"));
        assert!(!meets("20,155", ConditionType::NotEquals, "20.000,155.0004"));
    }

    #[test]
    fn emptiness() {
        let config = config();
        let empty = |raw: Value| CoordinatesDataValue::new(raw, &config, None).meet_condition(ConditionType::IsEmpty, &[]);
        assert!(!empty(json!("0")));
        assert!(empty(json!("  ")));
        assert!(empty(Value::Null));
    }

    #[test]
    fn fulltexts_use_formatted_text() {
        let config = config();
        assert!(CoordinatesDataValue::new(json!("10"), &config, None).meet_full_texts(&["10.000".to_string()]));
        let v = CoordinatesDataValue::new(json!("10.123,40.234"), &config, None);
        assert!(v.meet_full_texts(&["123".to_string()]));
        assert!(!v.meet_full_texts(&["101".to_string()]));
    }

    #[test]
    fn reads_degrees_minutes_seconds() {
        let parsed = parse_coordinates("49°12'7.1\"N 16°26'16.4\"E");
        let coordinates = parsed.map(|c| (format!("{:.3}", c.lat), format!("{:.3}", c.lng)));
        assert_eq!(coordinates, Some(("49.202".to_string(), "16.438".to_string())));
        assert_eq!(parse_coordinates("95,10"), None);
    }

    #[test]
    fn serializes_six_decimals() {
        let config = config();
        let v = CoordinatesDataValue::new(json!("49.2019854;16.4378783"), &config, None);
        assert_eq!(v.serialize(), json!("49.201985, 16.437878"));
        assert_eq!(v.format(), "49.202, 16.438");
    }
}
