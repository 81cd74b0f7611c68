//! String helpers shared by the value kinds.

use lumio_model::CaseStyle;
use unicode_normalization::UnicodeNormalization;

/// Lowercases (optionally) and strips combining diacritics.
pub fn remove_accents(value: &str, lower_case: bool) -> String {
    let source = if lower_case {
        value.to_lowercase()
    } else {
        value.to_string()
    };
    source
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

/// Normalizes a fulltext term or a searched text for containment checks.
pub fn fold_fulltext(value: &str) -> String {
    remove_accents(value, true).trim().to_string()
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn unescape_html(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Drops every `<...>` tag, keeping the text in between.
pub fn strip_html_tags(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for c in value.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Unwraps a value made of exactly one `<p>...</p>` paragraph.
pub fn unwrap_single_paragraph(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") && !inner.contains("</p>") => inner,
        _ => value,
    }
}

pub fn transform_case_style(text: &str, case_style: Option<CaseStyle>) -> String {
    match case_style.unwrap_or_default() {
        CaseStyle::None => text.to_string(),
        CaseStyle::LowerCase => text.to_lowercase(),
        CaseStyle::UpperCase => text.to_uppercase(),
        CaseStyle::TitleCase => title_case(text),
        CaseStyle::SentenceCase => sentence_case(text),
    }
}

/// Capitalizes the first letter of each word.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start && (c.is_alphanumeric() || c == '_') {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = false;
        }
    }
    out
}

/// Capitalizes the first word of each sentence and normalizes the spacing
/// after `.`, `!` and `?`.
pub fn sentence_case(text: &str) -> String {
    let mut out = String::new();
    let mut sentence = String::new();
    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            out.push_str(&capitalize_first_word(&sentence));
            out.push(c);
            out.push(' ');
            sentence.clear();
        } else {
            sentence.push(c);
        }
    }
    out.push_str(&capitalize_first_word(&sentence));
    out.trim().to_string()
}

fn capitalize_first_word(sentence: &str) -> String {
    let trimmed = sentence.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Left-pads `value` with `character` up to `len` characters.
pub fn pad_start(value: &str, len: usize, character: char) -> String {
    let count = value.chars().count();
    if count >= len {
        return value.to_string();
    }
    let mut out: String = std::iter::repeat(character).take(len - count).collect();
    out.push_str(value);
    out
}

/// Loose e-mail shape check: one `@`, a non-empty local part and a dotted
/// domain without whitespace.
pub fn is_email_valid(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_accents() {
        assert_eq!(remove_accents("Košice Čučoriedka", true), "kosice cucoriedka");
        assert_eq!(remove_accents("Žilina", false), "Zilina");
    }

    #[test]
    fn html_helpers() {
        assert_eq!(strip_html_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(unwrap_single_paragraph("<p>abc</p>"), "abc");
        assert_eq!(unwrap_single_paragraph("<p>a</p><p>b</p>"), "<p>a</p><p>b</p>");
        assert_eq!(escape_html("a<b>&"), "a&lt;b&gt;&amp;");
        assert_eq!(unescape_html(&escape_html("\"x\" & 'y'")), "\"x\" & 'y'");
    }

    #[test]
    fn case_styles() {
        assert_eq!(transform_case_style("hello big world", Some(CaseStyle::TitleCase)), "Hello Big World");
        assert_eq!(
            transform_case_style("hello there.how are you?fine", Some(CaseStyle::SentenceCase)),
            "Hello there. How are you? Fine"
        );
        assert_eq!(transform_case_style("MiXed", Some(CaseStyle::LowerCase)), "mixed");
        assert_eq!(transform_case_style("MiXed", None), "MiXed");
    }

    #[test]
    fn pads() {
        assert_eq!(pad_start("7", 2, '0'), "07");
        assert_eq!(pad_start("123", 2, '0'), "123");
    }

    #[test]
    fn email_shapes() {
        assert!(is_email_valid("ann@lumio.io"));
        assert!(!is_email_valid("ann@lumio"));
        assert!(!is_email_valid("ann lumio@x.io"));
        assert!(!is_email_valid("@x.io"));
    }
}
