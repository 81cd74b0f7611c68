//! Compiled-in currency and number-format tables, plus the number formatter
//! that reads them.
//!
//! The active formatting language is always passed in explicitly; there is no
//! process-wide "current language".

use crate::decimal::{fixed_string, parse_decimal, plain_string, round_half_up};
use bigdecimal::BigDecimal;
use lumio_model::{CurrencyData, LanguageTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyPlacement {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub symbol: &'static str,
    pub code: &'static str,
    pub placement: CurrencyPlacement,
    pub space_separated: bool,
    pub decimal_separator: &'static str,
    pub thousand_separator: &'static str,
}

const NBSP: &str = "\u{a0}";

const fn currency(
    symbol: &'static str,
    code: &'static str,
    placement: CurrencyPlacement,
    space_separated: bool,
    decimal_separator: &'static str,
    thousand_separator: &'static str,
) -> Currency {
    Currency {
        symbol,
        code,
        placement,
        space_separated,
        decimal_separator,
        thousand_separator,
    }
}

pub fn currency_for(tag: LanguageTag) -> Currency {
    use CurrencyPlacement::{Prefix, Suffix};
    match tag {
        LanguageTag::Denmark => currency("kr", "DKK", Suffix, true, ",", "."),
        LanguageTag::Switzerland => currency("CHF", "CHF", Suffix, true, ",", "’"),
        LanguageTag::NewZealand => currency("$", "NZD", Prefix, true, ".", ","),
        LanguageTag::FrenchCanada => currency("$", "CAD", Suffix, true, ".", NBSP),
        LanguageTag::Canada => currency("$", "CAD", Prefix, false, ".", ","),
        LanguageTag::Sweden => currency("kr", "SEK", Suffix, true, ",", NBSP),
        LanguageTag::Norway => currency("kr", "NOK", Suffix, true, ",", NBSP),
        LanguageTag::Finland => currency("€", "EUR", Suffix, true, ",", NBSP),
        LanguageTag::Israel => currency("₪", "ILS", Prefix, true, ".", ","),
        LanguageTag::Spain => currency("€", "EUR", Suffix, true, ",", "."),
        LanguageTag::France => currency("€", "EUR", Suffix, true, ",", NBSP),
        LanguageTag::Italy => currency("€", "EUR", Suffix, true, ",", "."),
        LanguageTag::England => currency("£", "GBP", Prefix, true, ".", ","),
        LanguageTag::Portugal => currency("€", "EUR", Suffix, true, ",", NBSP),
        LanguageTag::Poland => currency("zł", "PLN", Suffix, true, ",", NBSP),
        LanguageTag::Czech => currency("Kč", "CZK", Suffix, true, ",", NBSP),
        LanguageTag::Slovak => currency("€", "EUR", Suffix, true, ",", NBSP),
        LanguageTag::Hungary => currency("Ft", "HUF", Suffix, true, ",", NBSP),
        LanguageTag::Austria => currency("€", "EUR", Prefix, true, ",", NBSP),
        LanguageTag::Germany => currency("€", "EUR", Suffix, true, ",", "."),
        LanguageTag::USA => currency("$", "USD", Prefix, false, ".", ","),
        LanguageTag::Brazil => currency("R$", "BRL", Prefix, false, ",", "."),
        LanguageTag::Taiwan => currency("NT$", "TWD", Prefix, false, ".", ","),
        LanguageTag::Netherlands => currency("€", "EUR", Prefix, true, ",", "."),
        LanguageTag::China => currency("¥", "CNY", Prefix, false, ".", ","),
        LanguageTag::Russia => currency("₽", "RUB", Suffix, false, ",", NBSP),
        LanguageTag::Japan => currency("¥", "JPY", Prefix, true, ".", ","),
        LanguageTag::Australia => currency("$", "AUD", Prefix, true, ".", ","),
        LanguageTag::Ireland => currency("€", "EUR", Prefix, false, ".", ","),
        LanguageTag::Malta => currency("€", "EUR", Prefix, false, ".", ","),
        LanguageTag::Turkey => currency("₺", "TRY", Suffix, true, ",", "."),
        LanguageTag::Ukraine => currency("₴", "UAH", Suffix, false, ",", NBSP),
        LanguageTag::India => currency("₹", "INR", Prefix, false, ".", ","),
    }
}

/// Ordinal suffix for `num` (`1` → `"st"` with English data).
pub fn ordinal(num: u64, data: Option<&CurrencyData>) -> String {
    let ordinals = data.map(|d| d.ordinals.as_slice()).unwrap_or(&[]);
    let pick = |i: usize| ordinals.get(i).cloned().unwrap_or_default();
    if (num % 100) / 10 == 1 {
        return pick(3);
    }
    match num % 10 {
        1 => pick(0),
        2 => pick(1),
        3 => pick(2),
        _ => pick(3),
    }
}

// ============================================================================
// Number formatting
// ============================================================================

/// Options for [`format_number`]; mirrors the number constraint flags.
#[derive(Debug, Clone, Default)]
pub struct NumberFormat<'a> {
    /// Language whose separators (and, for currency, symbol) are used.
    pub language: LanguageTag,
    pub decimals: Option<u32>,
    pub separated: bool,
    pub currency: bool,
    pub force_sign: bool,
    pub negative_parenthesis: bool,
    pub compact: bool,
    pub currency_data: Option<&'a CurrencyData>,
}

pub fn format_number(value: &BigDecimal, options: &NumberFormat<'_>) -> String {
    let currency = currency_for(options.language);
    let negative = value < &BigDecimal::from(0);
    let magnitude = value.abs();

    let (scaled, abbreviation) = if options.compact {
        compact_scale(&magnitude, options.currency_data)
    } else {
        (magnitude, String::new())
    };

    let body = match options.decimals {
        Some(decimals) => fixed_string(&scaled, decimals),
        None if options.compact => plain_string(&round_half_up(&scaled, 3)),
        None => plain_string(&scaled),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (body.clone(), None),
    };
    let int_part = if options.separated {
        group_thousands(&int_part, currency.thousand_separator)
    } else {
        int_part
    };
    let mut number = int_part;
    if let Some(frac) = frac_part {
        number.push_str(currency.decimal_separator);
        number.push_str(&frac);
    }
    if !abbreviation.is_empty() {
        if options.separated {
            number.push(' ');
        }
        number.push_str(&abbreviation);
    }

    if options.currency {
        let space = if currency.space_separated { " " } else { "" };
        number = match currency.placement {
            CurrencyPlacement::Prefix => format!("{}{}{}", currency.symbol, space, number),
            CurrencyPlacement::Suffix => format!("{}{}{}", number, space, currency.symbol),
        };
    }

    let is_zero = !body.chars().any(|c| c.is_ascii_digit() && c != '0');
    if negative && !is_zero {
        if options.negative_parenthesis {
            format!("({})", number)
        } else {
            format!("-{}", number)
        }
    } else if options.force_sign && !is_zero {
        format!("+{}", number)
    } else {
        number
    }
}

fn group_thousands(int_part: &str, separator: &str) -> String {
    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(*c);
    }
    out
}

fn compact_scale(magnitude: &BigDecimal, data: Option<&CurrencyData>) -> (BigDecimal, String) {
    let abbreviations = data.map(|d| d.abbreviations.as_slice()).unwrap_or(&[]);
    let thousand = BigDecimal::from(1000);
    let mut scaled = magnitude.clone();
    let mut level = 0usize;
    while level < 4 && scaled >= thousand {
        scaled = scaled / thousand.clone();
        level += 1;
    }
    let suffix = if level == 0 {
        String::new()
    } else {
        abbreviations.get(level - 1).cloned().unwrap_or_default()
    };
    (scaled, suffix)
}

/// Reads a number typed in `language` conventions: the currency symbol and
/// thousands separators are dropped and the decimal separator becomes a dot.
pub fn unformat_number(text: &str, language: LanguageTag) -> Option<BigDecimal> {
    let currency = currency_for(language);
    let mut cleaned = text.replace(currency.symbol, "");
    if !currency.thousand_separator.trim().is_empty() {
        cleaned = cleaned.replace(currency.thousand_separator, "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let (negative, cleaned) = match cleaned
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner.to_string()),
        None => (false, cleaned),
    };
    let normalized = cleaned.replace(currency.decimal_separator, ".");
    let value = parse_decimal(&normalized)?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        parse_decimal(s).unwrap()
    }

    fn options(language: LanguageTag) -> NumberFormat<'static> {
        NumberFormat {
            language,
            ..Default::default()
        }
    }

    #[test]
    fn currency_placement_and_separators() {
        let sk = NumberFormat {
            currency: true,
            ..options(LanguageTag::Slovak)
        };
        assert_eq!(format_number(&dec("10.11"), &sk), "10,11 €");
        assert_eq!(format_number(&dec("10"), &sk), "10 €");

        let us = NumberFormat {
            currency: true,
            ..options(LanguageTag::USA)
        };
        assert_eq!(format_number(&dec("10.11"), &us), "$10.11");
        assert_eq!(format_number(&dec("-5"), &us), "-$5");
    }

    #[test]
    fn separated_with_decimals() {
        let opts = NumberFormat {
            separated: true,
            decimals: Some(3),
            ..options(LanguageTag::USA)
        };
        assert_eq!(format_number(&dec("10000.12345"), &opts), "10,000.123");
        assert_eq!(format_number(&dec("23.77777"), &opts), "23.778");
        assert_eq!(format_number(&dec("1234567"), &opts), "1,234,567.000");
    }

    #[test]
    fn sign_flags() {
        let opts = NumberFormat {
            force_sign: true,
            negative_parenthesis: true,
            ..options(LanguageTag::USA)
        };
        assert_eq!(format_number(&dec("350"), &opts), "+350");
        assert_eq!(format_number(&dec("-100"), &opts), "(100)");
        assert_eq!(format_number(&dec("0"), &opts), "0");
    }

    #[test]
    fn compact_uses_abbreviations() {
        let data = CurrencyData {
            abbreviations: vec!["k".into(), "m".into(), "b".into(), "t".into()],
            ordinals: vec![],
        };
        let opts = NumberFormat {
            compact: true,
            currency_data: Some(&data),
            ..options(LanguageTag::USA)
        };
        assert_eq!(format_number(&dec("12000"), &opts), "12k");
        assert_eq!(format_number(&dec("2500000"), &opts), "2.5m");
        assert_eq!(format_number(&dec("999"), &opts), "999");
    }

    #[test]
    fn unformats_by_language() {
        assert_eq!(unformat_number("10,11", LanguageTag::USA), Some(dec("1011")));
        assert_eq!(unformat_number("10.11", LanguageTag::Germany), Some(dec("1011")));
        assert_eq!(unformat_number("10,11", LanguageTag::Germany), Some(dec("10.11")));
        assert_eq!(unformat_number("10.11", LanguageTag::Slovak), Some(dec("10.11")));
        assert_eq!(unformat_number("$1,000.5", LanguageTag::USA), Some(dec("1000.5")));
        assert_eq!(unformat_number("abc", LanguageTag::USA), None);
    }

    #[test]
    fn ordinals() {
        let data = CurrencyData {
            abbreviations: vec![],
            ordinals: vec!["st".into(), "nd".into(), "rd".into(), "th".into()],
        };
        assert_eq!(ordinal(1, Some(&data)), "st");
        assert_eq!(ordinal(12, Some(&data)), "th");
        assert_eq!(ordinal(23, Some(&data)), "rd");
        assert_eq!(ordinal(4, None), "");
    }
}
