use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Locale used when an applicant never chose one.
pub const DEFAULT_LOCALE: &str = "en-US";

/// BCP 47 style language tag such as `en-US` or `es`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().replace('_', "-"))
    }

    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, lower cased.
    pub fn language(&self) -> String {
        self.0
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no translation available for locale {0}")]
pub struct TranslationNotFound(pub Locale);

/// Per-locale text with language-only fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedStrings {
    translations: BTreeMap<Locale, String>,
}

impl LocalizedStrings {
    pub fn of(locale: Locale, text: impl Into<String>) -> Self {
        Self::default().with(locale, text)
    }

    /// Convenience for text authored in the default locale.
    pub fn default_text(text: impl Into<String>) -> Self {
        Self::of(Locale::default(), text)
    }

    pub fn with(mut self, locale: Locale, text: impl Into<String>) -> Self {
        self.translations.insert(locale, text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    pub fn supported_locales(&self) -> impl Iterator<Item = &Locale> {
        self.translations.keys()
    }

    /// Exact match first, then any translation sharing the language subtag.
    pub fn get(&self, locale: &Locale) -> Result<&str, TranslationNotFound> {
        if let Some(text) = self.translations.get(locale) {
            return Ok(text);
        }

        let language = locale.language();
        self.translations
            .iter()
            .find(|(candidate, _)| candidate.language() == language)
            .map(|(_, text)| text.as_str())
            .ok_or_else(|| TranslationNotFound(locale.clone()))
    }

    /// Falls back to the default locale, then to any translation at all.
    pub fn get_or_default(&self, locale: &Locale) -> &str {
        self.get(locale)
            .or_else(|_| self.get(&Locale::default()))
            .ok()
            .or_else(|| self.translations.values().next().map(String::as_str))
            .unwrap_or("")
    }

    pub fn supports(&self, locale: &Locale) -> bool {
        self.get(locale).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_language_only_match() {
        let strings = LocalizedStrings::of(Locale::new("es-MX"), "¿Nombre?")
            .with(Locale::new("en-US"), "Name?");

        assert_eq!(strings.get(&Locale::new("en-US")), Ok("Name?"));
        assert_eq!(strings.get(&Locale::new("es")), Ok("¿Nombre?"));
        assert_eq!(
            strings.get(&Locale::new("fr-FR")),
            Err(TranslationNotFound(Locale::new("fr-FR")))
        );
        assert_eq!(strings.get_or_default(&Locale::new("fr-FR")), "Name?");
    }

    #[test]
    fn normalizes_underscores() {
        assert_eq!(Locale::new("en_US"), Locale::new("en-US"));
        assert_eq!(Locale::new("zh-Hant-TW").language(), "zh");
    }
}
