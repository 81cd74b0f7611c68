use super::{
    format_unknown, is_truthy, meets_condition_by_text, meets_fulltexts, normalize_text,
    raw_text, TypedValue,
};
use crate::text::escape_html;
use lumio_model::{ConditionType, ConditionValue};
use serde_json::Value;
use std::cmp::Ordering;

/// Named colors understood on input, with their canonical hex codes.
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("silver", "#c0c0c0"),
    ("gray", "#808080"),
    ("white", "#ffffff"),
    ("maroon", "#800000"),
    ("red", "#ff0000"),
    ("purple", "#800080"),
    ("fuchsia", "#ff00ff"),
    ("green", "#008000"),
    ("lime", "#00ff00"),
    ("olive", "#808000"),
    ("yellow", "#ffff00"),
    ("navy", "#000080"),
    ("blue", "#0000ff"),
    ("teal", "#008080"),
    ("aqua", "#00ffff"),
    ("orange", "#ffa500"),
    ("brown", "#a52a2a"),
    ("pink", "#ffc0cb"),
    ("violet", "#ee82ee"),
];

/// A color normalized to a lowercase `#rrggbb` code.
#[derive(Debug, Clone)]
pub struct ColorDataValue {
    raw: Value,
    input: Option<String>,
    hex: Option<String>,
}

impl ColorDataValue {
    pub fn new(raw: Value, input: Option<&str>) -> Self {
        let hex = parse_color(&raw_text(&raw));
        Self {
            raw,
            input: input.map(str::to_string),
            hex,
        }
    }

    pub fn hex(&self) -> Option<&str> {
        self.hex.as_deref()
    }

    fn number(&self) -> Option<u32> {
        self.hex
            .as_deref()
            .and_then(|hex| u32::from_str_radix(&hex[1..], 16).ok())
    }

    fn from_number(number: u32) -> Self {
        Self::new(Value::String(format!("#{:06x}", number & 0xff_ffff)), None)
    }

    /// The color's name when it has one, else its formatted text.
    pub fn readable(&self) -> String {
        NAMED_COLORS
            .iter()
            .find(|(_, hex)| Some(*hex) == self.hex.as_deref())
            .map_or_else(|| self.format(), |(name, _)| name.to_string())
    }
}

/// Named colors, `#rgb`, `#rrggbb` (hash optional), `rgb(r, g, b)` and
/// `hsl(h, s%, l%)`.
pub fn parse_color(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == value) {
        return Some(hex.to_string());
    }
    let digits = value.strip_prefix('#').unwrap_or(&value);
    if digits.chars().all(|c| c.is_ascii_hexdigit()) {
        match digits.len() {
            6 => return Some(format!("#{digits}")),
            3 => return Some(digits.chars().fold(String::from("#"), |mut out, c| {
                out.push(c);
                out.push(c);
                out
            })),
            _ => {}
        }
    }
    if let Some(args) = function_args(&value, "rgb") {
        let [r, g, b] = args;
        if r.ends_with('%') || g.ends_with('%') || b.ends_with('%') {
            return None;
        }
        let channel = |c: &str| c.parse::<u32>().ok().filter(|v| *v <= 255);
        return Some(format!("#{:02x}{:02x}{:02x}", channel(r)?, channel(g)?, channel(b)?));
    }
    if let Some([h, s, l]) = function_args(&value, "hsl") {
        let h = h.parse::<u32>().ok().filter(|v| *v <= 360)?;
        let s = s.strip_suffix('%').unwrap_or(s).parse::<u32>().ok().filter(|v| *v <= 100)?;
        let l = l.strip_suffix('%')?.parse::<u32>().ok().filter(|v| *v <= 100)?;
        let (r, g, b) = hsl_to_rgb(h as f64, s as f64 / 100.0, l as f64 / 100.0);
        return Some(format!("#{r:02x}{g:02x}{b:02x}"));
    }
    None
}

fn function_args<'v>(value: &'v str, name: &str) -> Option<[&'v str; 3]> {
    let inner = value.strip_prefix(name)?.trim_start().strip_prefix('(')?.strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [a, b, c] if !a.is_empty() && !b.is_empty() && !c.is_empty() => Some([*a, *b, *c]),
        _ => None,
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r), channel(g), channel(b))
}

impl TypedValue for ColorDataValue {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        self.hex.clone().unwrap_or_else(|| format_unknown(&self.raw))
    }

    fn edit_value(&self) -> String {
        self.format()
    }

    fn serialize(&self) -> Value {
        match &self.hex {
            Some(hex) => Value::String(hex.clone()),
            None if is_truthy(&self.raw) => Value::String(escape_html(&format_unknown(&self.raw))),
            None => Value::String(String::new()),
        }
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        self.input.is_some() || !is_truthy(&self.raw) || self.hex.is_some()
    }

    /// Steps one code up; white wraps to black.
    fn increment(&self) -> Option<Self> {
        self.number().map(|n| match n {
            0xff_ffff => Self::from_number(0),
            n => Self::from_number(n + 1),
        })
    }

    fn decrement(&self) -> Option<Self> {
        self.number().map(|n| match n {
            0 => Self::from_number(0xff_ffff),
            n => Self::from_number(n - 1),
        })
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.number().cmp(&other.number())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<String> = values
            .iter()
            .map(|v| normalize_text(&self.copy_with(v.raw().clone()).format()))
            .collect();
        meets_condition_by_text(condition, &normalize_text(&self.format()), &others)
    }

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        let as_colors: Vec<String> = fulltexts
            .iter()
            .map(|f| self.copy_with(Value::String(f.clone())).format())
            .collect();
        meets_fulltexts(&self.format(), &as_colors) || meets_fulltexts(&self.readable(), fulltexts)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let first = values.first().map_or(Value::Null, |v| v.raw().clone());
        match condition {
            ConditionType::Equals => first,
            ConditionType::NotEquals => {
                let other = parse_color(&raw_text(&first));
                NAMED_COLORS
                    .iter()
                    .map(|(_, hex)| *hex)
                    .find(|hex| Some(*hex) != other.as_deref())
                    .map_or(Value::Null, |hex| Value::String(hex.to_string()))
            }
            ConditionType::NotEmpty => Value::String("#00b388".to_string()),
            _ => Value::String(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_color_notations() {
        assert_eq!(parse_color("Red").as_deref(), Some("#ff0000"));
        assert_eq!(parse_color("#ABC").as_deref(), Some("#aabbcc"));
        assert_eq!(parse_color("00b388").as_deref(), Some("#00b388"));
        assert_eq!(parse_color("rgb(0, 128, 255)").as_deref(), Some("#0080ff"));
        assert_eq!(parse_color("hsl(0, 100%, 50%)").as_deref(), Some("#ff0000"));
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn increment_wraps_white_to_black() {
        let white = ColorDataValue::new(json!("#ffffff"), None);
        assert_eq!(white.increment().and_then(|c| c.hex().map(str::to_string)).as_deref(), Some("#000000"));
        let black = ColorDataValue::new(json!("black"), None);
        assert_eq!(black.decrement().map(|c| c.serialize()), Some(json!("#ffffff")));
        assert_eq!(black.increment().map(|c| c.serialize()), Some(json!("#000001")));
    }

    #[test]
    fn invalid_color_keeps_text() {
        let v = ColorDataValue::new(json!("<nope>"), None);
        assert!(!v.is_valid(false));
        assert_eq!(v.format(), "<nope>");
        assert_eq!(v.serialize(), json!("&lt;nope&gt;"));
    }

    #[test]
    fn fulltext_matches_color_names() {
        let v = ColorDataValue::new(json!("#ff0000"), None);
        assert!(v.meet_full_texts(&["red".to_string()]));
        assert!(v.meet_condition(ConditionType::Equals, &[ConditionValue::literal("red")]));
    }
}
