use super::{meets_fulltexts, normalize_text, raw_text, value_by_condition_text, TypedValue};
use crate::text::is_email_valid;
use lumio_model::{ConditionType, ConditionValue};
use serde_json::Value;
use std::cmp::Ordering;

const PROTOCOLS: &[&str] = &[
    "http://", "https://", "ftp://", "mailto:", "callto:", "spotify:", "bitcoin:", "dns:",
    "facetime:", "file://", "geo:", "git://", "imap://", "lastfm://", "market://", "pop://",
    "s3://", "sftp://", "skype:", "sms:", "ssh://", "svn://", "tag:", "tel:", "slack://",
    "zoommtg://", "app://",
];

/// A hyperlink stored as `url [title]`. Bare e-mails become `mailto:` links.
#[derive(Debug, Clone)]
pub struct LinkDataValue {
    raw: Value,
    input: Option<String>,
    raw_link: String,
    raw_title: String,
    link: String,
    title: String,
}

/// Splits `url [title]` at the last `[`; a value without a title is all link.
pub fn parse_link_value(value: &str) -> (String, String) {
    let trimmed = value.trim();
    if let Some(body) = trimmed.strip_suffix(']') {
        if let Some(start) = body.rfind('[') {
            let title = &body[start + 1..];
            let link = body[..start].trim();
            let link = if link.is_empty() { title } else { link };
            return (link.to_string(), title.to_string());
        }
    }
    (trimmed.to_string(), String::new())
}

pub fn format_link_value(link: &str, title: &str) -> String {
    match (link.is_empty(), title.is_empty()) {
        (false, false) => format!("{link} [{title}]"),
        (false, true) => link.to_string(),
        (true, _) => title.to_string(),
    }
}

pub fn has_valid_protocol(link: &str) -> bool {
    PROTOCOLS.iter().any(|p| link.starts_with(p))
}

/// Prefixes `https://` unless a known scheme is present.
pub fn complete_link_value(link: &str) -> String {
    if link.is_empty() || has_valid_protocol(link) {
        link.to_string()
    } else {
        format!("https://{link}")
    }
}

impl LinkDataValue {
    pub fn new(raw: Value, input: Option<&str>) -> Self {
        let source = match input {
            Some(text) => text.to_string(),
            None => raw_text(&raw),
        };
        let (raw_link, raw_title) = parse_link_value(&source);
        let (link, title) = if is_email_valid(&raw_link) {
            let title = if raw_title.is_empty() { raw_link.clone() } else { raw_title.clone() };
            (format!("mailto:{raw_link}"), title)
        } else {
            (raw_link.clone(), raw_title.clone())
        };
        Self {
            raw,
            input: input.map(str::to_string),
            raw_link,
            raw_title,
            link,
            title,
        }
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.link
        } else {
            &self.title
        }
    }
}

impl TypedValue for LinkDataValue {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if self.link.is_empty() {
            return self.title.clone();
        }
        format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            complete_link_value(&self.link),
            self.label()
        )
    }

    fn title(&self) -> String {
        self.label().to_string()
    }

    fn edit_value(&self) -> String {
        format_link_value(&self.link, &self.title)
    }

    fn serialize(&self) -> Value {
        Value::String(format_link_value(&self.raw_link, &self.raw_title))
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        raw_text(&self.raw).is_empty() || !self.link.is_empty()
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let link = normalize_text(&self.link);
        let title = normalize_text(&self.title);
        let other = values
            .first()
            .map(|v| normalize_text(&raw_text(v.raw())))
            .unwrap_or_default();
        match condition {
            ConditionType::Contains => link.contains(&other) || title.contains(&other),
            ConditionType::NotContains => !link.contains(&other) && !title.contains(&other),
            ConditionType::IsEmpty => link.is_empty() && title.is_empty(),
            ConditionType::NotEmpty => !link.is_empty() || !title.is_empty(),
            _ => false,
        }
    }

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        meets_fulltexts(&self.link, fulltexts) || meets_fulltexts(&self.title, fulltexts)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        value_by_condition_text(condition, values, "a")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_title_at_last_bracket() {
        assert_eq!(
            parse_link_value("lumio.io/a[1] [Docs]"),
            ("lumio.io/a[1]".to_string(), "Docs".to_string())
        );
        assert_eq!(parse_link_value("[Only]"), ("Only".to_string(), "Only".to_string()));
        assert_eq!(parse_link_value(" x.io "), ("x.io".to_string(), String::new()));
    }

    #[test]
    fn formats_anchor_with_completed_protocol() {
        let v = LinkDataValue::new(json!("lumio.io [Home]"), None);
        assert_eq!(v.format(), "<a href=\"https://lumio.io\" target=\"_blank\">Home</a>");
        assert_eq!(v.serialize(), json!("lumio.io [Home]"));
        assert_eq!(v.title(), "Home");
    }

    #[test]
    fn emails_become_mailto() {
        let v = LinkDataValue::new(json!("ann@lumio.io"), None);
        assert_eq!(v.link(), "mailto:ann@lumio.io");
        assert_eq!(v.title(), "ann@lumio.io");
        assert_eq!(v.serialize(), json!("ann@lumio.io"));
    }

    #[test]
    fn contains_checks_link_and_title() {
        let v = LinkDataValue::new(json!("https://lumio.io [Home Page]"), None);
        assert!(v.meet_condition(ConditionType::Contains, &[ConditionValue::literal("page")]));
        assert!(v.meet_condition(ConditionType::Contains, &[ConditionValue::literal("LUMIO")]));
        assert!(v.meet_condition(ConditionType::NotContains, &[ConditionValue::literal("zzz")]));
        assert!(v.meet_full_texts(&["home".to_string()]));
    }

    #[test]
    fn fulltext_searches_url_and_title() {
        let v = LinkDataValue::new(json!("https://lumio.io [Home Page]"), None);
        assert!(v.meet_full_texts(&["page".to_string()]));
        assert!(v.meet_full_texts(&["lumio".to_string()]));
        assert!(!v.meet_full_texts(&["docs".to_string()]));
        let bare = LinkDataValue::new(json!("lumio.io/docs"), None);
        assert!(bare.meet_full_texts(&["docs".to_string()]));
    }
}
