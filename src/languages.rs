//! Language registry: single source of truth for the canonical language set.
//!
//! Every language code the bot can resolve, detect or select services for
//! lives here. The registry is initialized once behind a `OnceLock` and is
//! immutable afterwards; list order is fixed and observable (the resolver
//! enumerates it when grounding the model).

use anyhow::{bail, Result};
use std::sync::OnceLock;

/// Metadata for one supported language.
#[derive(Debug, Clone)]
pub struct LanguageInfo {
    /// Canonical language code (e.g. "en", "fr_ca", "zh_cn")
    pub code: &'static str,

    /// English display name (e.g. "French (Canada)")
    pub name: &'static str,
}

pub struct LanguageRegistry {
    languages: Vec<LanguageInfo>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global registry instance, initializing it on first access.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageInfo> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All supported languages, in fixed registry order.
    pub fn list_all(&self) -> &[LanguageInfo] {
        &self.languages
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

/// A validated language.
///
/// Only codes present in the registry can be constructed, so a `Language`
/// value can always be trusted downstream (service selection, prompts,
/// session state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    /// Create a Language from a code string, validating against the registry.
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            // Use the static str owned by the registry
            Some(info) => Ok(Language { code: info.code }),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// English display name, looked up from the registry.
    ///
    /// # Panics
    /// Never panics for a properly constructed `Language` (construction goes
    /// through the registry).
    pub fn name(&self) -> &'static str {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
            .name
    }

    /// Whether this language belongs to the closed set of CJK variants that
    /// get special transliteration/tokenization handling.
    pub fn is_cjk_variant(&self) -> bool {
        CJK_VARIANTS.contains(&self.code)
    }
}

/// Mandarin (simplified and traditional), literary Chinese, Cantonese.
pub const CJK_VARIANTS: [&str; 4] = ["zh_cn", "zh_tw", "lzh", "yue"];

fn default_languages() -> Vec<LanguageInfo> {
    vec![
        LanguageInfo { code: "en", name: "English" },
        LanguageInfo { code: "fr", name: "French" },
        LanguageInfo { code: "fr_ca", name: "French (Canada)" },
        LanguageInfo { code: "es", name: "Spanish" },
        LanguageInfo { code: "de", name: "German" },
        LanguageInfo { code: "it", name: "Italian" },
        LanguageInfo { code: "pt_pt", name: "Portuguese (Portugal)" },
        LanguageInfo { code: "pt_br", name: "Portuguese (Brazil)" },
        LanguageInfo { code: "nl", name: "Dutch" },
        LanguageInfo { code: "sv", name: "Swedish" },
        LanguageInfo { code: "no", name: "Norwegian" },
        LanguageInfo { code: "da", name: "Danish" },
        LanguageInfo { code: "fi", name: "Finnish" },
        LanguageInfo { code: "pl", name: "Polish" },
        LanguageInfo { code: "cs", name: "Czech" },
        LanguageInfo { code: "sk", name: "Slovak" },
        LanguageInfo { code: "hu", name: "Hungarian" },
        LanguageInfo { code: "ro", name: "Romanian" },
        LanguageInfo { code: "bg", name: "Bulgarian" },
        LanguageInfo { code: "uk", name: "Ukrainian" },
        LanguageInfo { code: "ru", name: "Russian" },
        LanguageInfo { code: "el", name: "Greek" },
        LanguageInfo { code: "tr", name: "Turkish" },
        LanguageInfo { code: "he", name: "Hebrew" },
        LanguageInfo { code: "ar", name: "Arabic" },
        LanguageInfo { code: "hi", name: "Hindi" },
        LanguageInfo { code: "th", name: "Thai" },
        LanguageInfo { code: "vi", name: "Vietnamese" },
        LanguageInfo { code: "id", name: "Indonesian" },
        LanguageInfo { code: "ms", name: "Malay" },
        LanguageInfo { code: "ja", name: "Japanese" },
        LanguageInfo { code: "ko", name: "Korean" },
        LanguageInfo { code: "zh_cn", name: "Chinese (Simplified)" },
        LanguageInfo { code: "zh_tw", name: "Chinese (Traditional)" },
        LanguageInfo { code: "lzh", name: "Chinese (Literary)" },
        LanguageInfo { code: "yue", name: "Cantonese" },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_singleton() {
        let registry1 = LanguageRegistry::get();
        let registry2 = LanguageRegistry::get();
        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_get_by_code_known() {
        let registry = LanguageRegistry::get();
        let info = registry.get_by_code("fr_ca").expect("fr_ca should exist");
        assert_eq!(info.code, "fr_ca");
        assert_eq!(info.name, "French (Canada)");
    }

    #[test]
    fn test_get_by_code_unknown() {
        assert!(LanguageRegistry::get().get_by_code("xx").is_none());
        assert!(!LanguageRegistry::get().is_supported("xx"));
    }

    #[test]
    fn test_from_code_valid() {
        let lang = Language::from_code("yue").expect("Should succeed");
        assert_eq!(lang.code(), "yue");
        assert_eq!(lang.name(), "Cantonese");
    }

    #[test]
    fn test_from_code_invalid() {
        let result = Language::from_code("klingon");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn test_from_code_empty() {
        assert!(Language::from_code("").is_err());
    }

    #[test]
    fn test_english_constant() {
        assert_eq!(Language::ENGLISH.code(), "en");
        assert_eq!(Language::ENGLISH.name(), "English");
    }

    #[test]
    fn test_language_equality() {
        let lang = Language::from_code("en").unwrap();
        assert_eq!(lang, Language::ENGLISH);
        assert_ne!(Language::from_code("fr").unwrap(), Language::ENGLISH);
    }

    #[test]
    fn test_cjk_variant_set() {
        for code in ["zh_cn", "zh_tw", "lzh", "yue"] {
            assert!(Language::from_code(code).unwrap().is_cjk_variant());
        }
        assert!(!Language::from_code("ja").unwrap().is_cjk_variant());
        assert!(!Language::ENGLISH.is_cjk_variant());
    }

    #[test]
    fn test_registry_order_is_stable() {
        let all = LanguageRegistry::get().list_all();
        assert_eq!(all[0].code, "en");
        // The resolver prompt and selection tie-breaks rely on this order
        let codes: Vec<_> = all.iter().map(|l| l.code).collect();
        let codes_again: Vec<_> = LanguageRegistry::get().list_all().iter().map(|l| l.code).collect();
        assert_eq!(codes, codes_again);
    }
}
