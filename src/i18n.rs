//! Localization table: language code → display strings.
//!
//! Bundles are JSON documents named `lang_<code>.json` (or `<code>.json`),
//! one per language. Values are either a string or a list of strings; list
//! items are addressed by index through [`TextKey`]. The table is loaded once
//! at start-up and never mutated.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use strum::{EnumIter, IntoEnumIterator};
use unic_langid::LanguageIdentifier;

use crate::core::error::{AppError, AppResult};

/// Every text the bot displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum TextKey {
    TermsMessage,
    AgreeOption,
    DisagreeOption,
    DisagreeMessage,
    HelloMessage,
    LanguageHeader,
    MenuHeader,
    HomeHeader,
    ButtonLanguage,
    ButtonMenu,
    ButtonPhoto,
    ButtonMap,
    ButtonPay,
    ButtonTable,
    ButtonBack,
    PhotoMessage,
    ResultMessage,
    LanguageChanged,
    DateSaved,
    TableError,
    GenericError,
}

impl TextKey {
    /// Bundle entry and list index holding this text.
    pub fn location(self) -> (&'static str, Option<usize>) {
        match self {
            TextKey::TermsMessage => ("terms_message", None),
            TextKey::AgreeOption => ("agree_options", Some(0)),
            TextKey::DisagreeOption => ("agree_options", Some(1)),
            TextKey::DisagreeMessage => ("disagree_message", None),
            TextKey::HelloMessage => ("hello_message", None),
            TextKey::LanguageHeader => ("headers", Some(0)),
            TextKey::MenuHeader => ("headers", Some(1)),
            TextKey::HomeHeader => ("headers", Some(2)),
            TextKey::ButtonLanguage => ("buttons", Some(0)),
            TextKey::ButtonMenu => ("buttons", Some(1)),
            TextKey::ButtonPhoto => ("buttons", Some(2)),
            TextKey::ButtonMap => ("buttons", Some(3)),
            TextKey::ButtonPay => ("buttons", Some(4)),
            TextKey::ButtonTable => ("buttons", Some(5)),
            TextKey::ButtonBack => ("buttons", Some(6)),
            TextKey::PhotoMessage => ("photo_message", None),
            TextKey::ResultMessage => ("result_message", None),
            TextKey::LanguageChanged => ("language_changed", None),
            TextKey::DateSaved => ("date_saved", None),
            TextKey::TableError => ("table_error", None),
            TextKey::GenericError => ("generic_error", None),
        }
    }

    /// Human-readable form used in errors and logs, e.g. `buttons[6]`.
    pub fn path(self) -> String {
        match self.location() {
            (name, Some(index)) => format!("{}[{}]", name, index),
            (name, None) => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Entry {
    Text(String),
    List(Vec<String>),
}

/// Strings of one language.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    entries: HashMap<String, Entry>,
}

impl Bundle {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, key: TextKey) -> Option<&str> {
        let (name, index) = key.location();
        match (self.entries.get(name)?, index) {
            (Entry::Text(text), None) => Some(text.as_str()),
            (Entry::List(items), Some(i)) => items.get(i).map(String::as_str),
            (Entry::Text(text), Some(0)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Keys this bundle cannot resolve.
    pub fn missing_keys(&self) -> Vec<TextKey> {
        TextKey::iter().filter(|key| self.get(*key).is_none()).collect()
    }
}

/// Language code encoded in a bundle file name.
///
/// `lang_en.json` → `en`, `pt-BR.json` → `pt-BR`. Returns `None` for files that
/// are not JSON or whose code is not a valid language identifier.
pub fn language_code_from_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(".json")?;
    let code = match stem.rfind('_') {
        Some(pos) => &stem[pos + 1..],
        None => stem,
    };
    if code.is_empty() {
        return None;
    }
    code.parse::<LanguageIdentifier>().ok()?;
    Some(code.to_string())
}

/// All loaded bundles plus the fallback language.
#[derive(Debug, Clone)]
pub struct Localization {
    bundles: BTreeMap<String, Bundle>,
    fallback: String,
}

impl Localization {
    /// Builds a table from already parsed bundles.
    ///
    /// # Errors
    /// `ConfigInvalid` when there is no bundle for `fallback`.
    pub fn from_bundles(bundles: BTreeMap<String, Bundle>, fallback: &str) -> AppResult<Self> {
        if !bundles.contains_key(fallback) {
            return Err(AppError::ConfigInvalid(format!(
                "no localization bundle for fallback language '{}'",
                fallback
            )));
        }
        Ok(Self {
            bundles,
            fallback: fallback.to_string(),
        })
    }

    /// Loads every `*.json` bundle in `dir`.
    ///
    /// Missing keys are only warned about here; lookups for them fail later.
    pub fn load_dir(dir: impl AsRef<Path>, fallback: &str) -> AppResult<Self> {
        let dir = dir.as_ref();
        log::info!("Loading vocabularies from {}", dir.display());

        let mut bundles = BTreeMap::new();
        for entry in fs_err::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(code) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(language_code_from_file_name)
            else {
                log::debug!("Skipping {}", path.display());
                continue;
            };

            let json = fs_err::read_to_string(&path)?;
            let bundle = Bundle::from_json(&json)
                .map_err(|e| AppError::ConfigInvalid(format!("{}: {}", path.display(), e)))?;

            let missing = bundle.missing_keys();
            if !missing.is_empty() {
                let names: Vec<String> = missing.iter().map(|key| key.path()).collect();
                log::warn!("Language '{}' is missing keys: {}", code, names.join(", "));
            }
            log::info!("Loaded {}", code);
            bundles.insert(code, bundle);
        }

        Self::from_bundles(bundles, fallback)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Loaded language codes, sorted.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn has_language(&self, code: &str) -> bool {
        self.bundles.contains_key(code)
    }

    /// Looks `key` up in exactly `language`.
    pub fn lookup(&self, language: &str, key: TextKey) -> AppResult<&str> {
        self.bundles
            .get(language)
            .and_then(|bundle| bundle.get(key))
            .ok_or_else(|| AppError::LocalizationMissing {
                language: language.to_string(),
                key: key.path(),
            })
    }

    /// Looks `key` up in `language`, then in the fallback language.
    pub fn text(&self, language: &str, key: TextKey) -> AppResult<&str> {
        match self.lookup(language, key) {
            Ok(text) => Ok(text),
            Err(err) if language != self.fallback => {
                log::warn!("{}; using '{}'", err, self.fallback);
                self.lookup(&self.fallback, key)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(json: &str) -> Bundle {
        Bundle::from_json(json).unwrap()
    }

    fn table() -> Localization {
        let mut bundles = BTreeMap::new();
        bundles.insert(
            "ru".to_string(),
            bundle(r#"{"hello_message": "Привет", "buttons": ["Язык", "Меню"], "headers": ["Язык:", "Меню:", "Главная"]}"#),
        );
        bundles.insert("en".to_string(), bundle(r#"{"hello_message": "Hello", "buttons": ["Language"]}"#));
        Localization::from_bundles(bundles, "ru").unwrap()
    }

    #[test]
    fn resolves_strings_and_list_items() {
        let table = table();
        assert_eq!(table.lookup("ru", TextKey::HelloMessage).unwrap(), "Привет");
        assert_eq!(table.lookup("ru", TextKey::ButtonMenu).unwrap(), "Меню");
        assert_eq!(table.lookup("ru", TextKey::HomeHeader).unwrap(), "Главная");
    }

    #[test]
    fn strict_lookup_reports_missing_key() {
        let table = table();
        let err = table.lookup("en", TextKey::ButtonMenu).unwrap_err();
        assert!(matches!(
            err,
            AppError::LocalizationMissing { ref language, ref key } if language == "en" && key == "buttons[1]"
        ));
    }

    #[test]
    fn text_falls_back_to_default_language() {
        let table = table();
        assert_eq!(table.text("en", TextKey::HelloMessage).unwrap(), "Hello");
        assert_eq!(table.text("en", TextKey::ButtonMenu).unwrap(), "Меню");
        assert_eq!(table.text("de", TextKey::HomeHeader).unwrap(), "Главная");
    }

    #[test]
    fn text_fails_when_fallback_lacks_key() {
        let table = table();
        assert!(matches!(
            table.text("en", TextKey::PhotoMessage),
            Err(AppError::LocalizationMissing { .. })
        ));
    }

    #[test]
    fn fallback_bundle_is_required() {
        let mut bundles = BTreeMap::new();
        bundles.insert("en".to_string(), Bundle::default());
        let err = Localization::from_bundles(bundles, "ru").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn parses_language_code_from_file_name() {
        assert_eq!(language_code_from_file_name("lang_en.json").as_deref(), Some("en"));
        assert_eq!(language_code_from_file_name("ru.json").as_deref(), Some("ru"));
        assert_eq!(language_code_from_file_name("lang_pt-BR.json").as_deref(), Some("pt-BR"));
        assert_eq!(language_code_from_file_name("lang_en.txt"), None);
        assert_eq!(language_code_from_file_name("lang_.json"), None);
        assert_eq!(language_code_from_file_name("lang_not a code.json"), None);
    }

    #[test]
    fn reports_missing_keys() {
        let missing = bundle(r#"{"hello_message": "Hi"}"#).missing_keys();
        assert!(missing.contains(&TextKey::TermsMessage));
        assert!(missing.contains(&TextKey::ButtonBack));
        assert!(!missing.contains(&TextKey::HelloMessage));
    }

    #[test]
    fn languages_are_sorted() {
        let table = table();
        assert_eq!(table.languages().collect::<Vec<_>>(), vec!["en", "ru"]);
        assert!(table.has_language("en"));
        assert!(!table.has_language("de"));
    }
}
