use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text keyed by two-letter language code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Exact lookup; blank strings count as missing.
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0
            .get(lang)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// `lang`, then `default_locale`, then any non-blank translation.
    pub fn resolve(&self, lang: &str, default_locale: &str) -> Option<&str> {
        self.get(lang)
            .or_else(|| self.get(default_locale))
            .or_else(|| {
                self.0
                    .values()
                    .map(String::as_str)
                    .find(|s| !s.trim().is_empty())
            })
    }
}

/// Binds a requested language to the knowledge base's fallback locale.
#[derive(Debug, Clone, Copy)]
pub struct Localizer<'a> {
    pub lang: &'a str,
    pub default_locale: &'a str,
}

impl<'a> Localizer<'a> {
    pub fn new(lang: &'a str, default_locale: &'a str) -> Self {
        Self {
            lang,
            default_locale,
        }
    }

    /// Resolved text, or an empty string when no translation exists at all.
    pub fn text(&self, text: &LocalizedText) -> String {
        self.try_text(text).unwrap_or_default()
    }

    pub fn try_text(&self, text: &LocalizedText) -> Option<String> {
        text.resolve(self.lang, self.default_locale)
            .map(str::to_string)
    }
}

/// Reduce `"en-US"`, `"EN_gb"` and friends to a two-letter code.
pub fn normalize_language(raw: &str) -> String {
    raw.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
