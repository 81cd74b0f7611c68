use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// BCP-47 language tags with compiled-in currency and number formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageTag {
    Denmark,
    Switzerland,
    NewZealand,
    FrenchCanada,
    Canada,
    Sweden,
    Norway,
    Finland,
    Israel,
    Spain,
    France,
    Italy,
    England,
    Portugal,
    Poland,
    Czech,
    Slovak,
    Hungary,
    Austria,
    Germany,
    #[default]
    USA,
    Brazil,
    Taiwan,
    Netherlands,
    China,
    Russia,
    Japan,
    Australia,
    Ireland,
    Malta,
    Turkey,
    Ukraine,
    India,
}

impl LanguageTag {
    pub const ALL: [LanguageTag; 33] = [
        LanguageTag::Denmark,
        LanguageTag::Switzerland,
        LanguageTag::NewZealand,
        LanguageTag::FrenchCanada,
        LanguageTag::Canada,
        LanguageTag::Sweden,
        LanguageTag::Norway,
        LanguageTag::Finland,
        LanguageTag::Israel,
        LanguageTag::Spain,
        LanguageTag::France,
        LanguageTag::Italy,
        LanguageTag::England,
        LanguageTag::Portugal,
        LanguageTag::Poland,
        LanguageTag::Czech,
        LanguageTag::Slovak,
        LanguageTag::Hungary,
        LanguageTag::Austria,
        LanguageTag::Germany,
        LanguageTag::USA,
        LanguageTag::Brazil,
        LanguageTag::Taiwan,
        LanguageTag::Netherlands,
        LanguageTag::China,
        LanguageTag::Russia,
        LanguageTag::Japan,
        LanguageTag::Australia,
        LanguageTag::Ireland,
        LanguageTag::Malta,
        LanguageTag::Turkey,
        LanguageTag::Ukraine,
        LanguageTag::India,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Denmark => "da-DK",
            LanguageTag::Switzerland => "de-CH",
            LanguageTag::NewZealand => "en-NZ",
            LanguageTag::FrenchCanada => "fr-CA",
            LanguageTag::Canada => "en-CA",
            LanguageTag::Sweden => "sv-SE",
            LanguageTag::Norway => "nb-NO",
            LanguageTag::Finland => "fi-FI",
            LanguageTag::Israel => "he-IL",
            LanguageTag::Spain => "es-ES",
            LanguageTag::France => "fr-FR",
            LanguageTag::Italy => "it-IT",
            LanguageTag::England => "en-GB",
            LanguageTag::Portugal => "pt-PT",
            LanguageTag::Poland => "pl-PL",
            LanguageTag::Czech => "cs-CZ",
            LanguageTag::Slovak => "sk-SK",
            LanguageTag::Hungary => "hu-HU",
            LanguageTag::Austria => "de-AT",
            LanguageTag::Germany => "de-DE",
            LanguageTag::USA => "en-US",
            LanguageTag::Brazil => "pt-BR",
            LanguageTag::Taiwan => "zh-TW",
            LanguageTag::Netherlands => "nl-NL",
            LanguageTag::China => "zh-CN",
            LanguageTag::Russia => "ru-RU",
            LanguageTag::Japan => "ja-JP",
            LanguageTag::Australia => "en-AU",
            LanguageTag::Ireland => "en-IE",
            LanguageTag::Malta => "mt-MT",
            LanguageTag::Turkey => "tr-TR",
            LanguageTag::Ukraine => "uk-UA",
            LanguageTag::India => "en-IN",
        }
    }

    /// Exact tag match first, then a language-only match (`"sk"` → `sk-SK`).
    pub fn from_tag(tag: &str) -> Option<LanguageTag> {
        let tag = tag.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
            .or_else(|| {
                let lang = tag.split(['-', '_']).next()?.to_ascii_lowercase();
                match lang.as_str() {
                    "en" => Some(LanguageTag::USA),
                    "de" => Some(LanguageTag::Germany),
                    "fr" => Some(LanguageTag::France),
                    "pt" => Some(LanguageTag::Portugal),
                    "zh" => Some(LanguageTag::China),
                    _ => Self::ALL.iter().copied().find(|t| t.language() == lang),
                }
            })
    }

    /// The two-letter language part, e.g. `"cs"`.
    pub fn language(&self) -> &'static str {
        let tag = self.as_str();
        &tag[..2]
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LanguageTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LanguageTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(LanguageTag::from_tag(&tag).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_full_and_short_tags() {
        assert_eq!(LanguageTag::from_tag("sk-SK"), Some(LanguageTag::Slovak));
        assert_eq!(LanguageTag::from_tag("cs"), Some(LanguageTag::Czech));
        assert_eq!(LanguageTag::from_tag("xx-YY"), None);
    }

    #[test]
    fn unknown_tags_decode_to_default() {
        let tag: LanguageTag = serde_json::from_str("\"tlh\"").unwrap();
        assert_eq!(tag, LanguageTag::USA);
        let tag: LanguageTag = serde_json::from_str("\"de-DE\"").unwrap();
        assert_eq!(tag, LanguageTag::Germany);
    }
}
