//! Service Selection Policy: pure functions over the Capability Catalog that
//! pick one concrete service configuration per request.
//!
//! Selection depends only on the catalog and the input languages, never on
//! session history, so the same inputs always yield the same configuration.

use crate::catalog::{Catalog, TokenizationOption, TransliterationOption};
use crate::languages::Language;
use std::collections::HashSet;
use thiserror::Error;

/// Fixed translation-service ranking. The premium provider wins whenever it
/// covers both languages; the general cloud provider is the fallback; any
/// other service is taken in catalog order.
const PREFERRED_SERVICES: [&str; 2] = ["DeepL", "Azure"];

/// The service specialized in Mandarin/Cantonese transliteration.
pub const CJK_TRANSLITERATION_SERVICE: &str = "MandarinCantonese";

/// Segmentation model preferred for CJK tokenization.
const CJK_TOKENIZATION_MODEL: &str = "jieba";

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no translation service covers both {source_lang} and {target}")]
    NoCommonService { source_lang: String, target: String },

    #[error("no transliteration candidate for language {0}")]
    NoTransliteration(String),

    #[error("no tokenization candidate for language {0}")]
    NoTokenization(String),
}

/// A resolved translation configuration: one service plus its per-language
/// identifiers for both ends of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSelection {
    pub service: String,
    pub source_key: String,
    pub target_key: String,
}

/// Pick the translation service for a (source, target) pair.
///
/// Intersects the services covering each language; an empty intersection is
/// a hard failure surfaced to the caller, never silently defaulted.
pub fn select_translation(
    catalog: &Catalog,
    source: Language,
    target: Language,
) -> Result<TranslationSelection, SelectionError> {
    let no_common = || SelectionError::NoCommonService {
        source_lang: source.code().to_string(),
        target: target.code().to_string(),
    };

    let source_options = catalog.translation_for(source.code());
    let target_options = catalog.translation_for(target.code());

    let target_services: HashSet<&str> =
        target_options.iter().map(|o| o.service.as_str()).collect();
    let common: Vec<_> = source_options
        .iter()
        .filter(|o| target_services.contains(o.service.as_str()))
        .collect();

    let chosen = PREFERRED_SERVICES
        .iter()
        .find_map(|preferred| common.iter().find(|o| o.service == *preferred))
        .or_else(|| common.first())
        .ok_or_else(no_common)?;

    // The service came out of the intersection, so a matching target option
    // must exist; keep the lookup fallible anyway.
    let target_option = target_options
        .iter()
        .find(|o| o.service == chosen.service)
        .ok_or_else(no_common)?;

    Ok(TranslationSelection {
        service: chosen.service.clone(),
        source_key: chosen.language_id.clone(),
        target_key: target_option.language_id.clone(),
    })
}

/// Pick the transliteration configuration for a language.
///
/// For the CJK variant set only the specialized service qualifies, and only
/// with space insertion and tone-number rendering both disabled. Elsewhere
/// the first catalog candidate wins.
pub fn select_transliteration<'a>(
    catalog: &'a Catalog,
    language: Language,
) -> Result<&'a TransliterationOption, SelectionError> {
    let mut candidates = catalog.transliteration_for(language.code());

    if language.is_cjk_variant() {
        candidates.retain(|o| {
            o.service == CJK_TRANSLITERATION_SERVICE
                && key_flag_disabled(&o.transliteration_key, "spaces")
                && key_flag_disabled(&o.transliteration_key, "tone_numbers")
        });
    }

    candidates
        .first()
        .copied()
        .ok_or_else(|| SelectionError::NoTransliteration(language.code().to_string()))
}

/// Pick the tokenization configuration for a language.
///
/// For the CJK variant set the jieba segmentation model is preferred when
/// present; otherwise the first catalog candidate wins.
pub fn select_tokenization<'a>(
    catalog: &'a Catalog,
    language: Language,
) -> Result<&'a TokenizationOption, SelectionError> {
    let candidates = catalog.tokenization_for(language.code());

    if language.is_cjk_variant() {
        if let Some(jieba) = candidates
            .iter()
            .find(|o| o.tokenization_name.to_lowercase().contains(CJK_TOKENIZATION_MODEL))
            .copied()
        {
            return Ok(jieba);
        }
    }

    candidates
        .first()
        .copied()
        .ok_or_else(|| SelectionError::NoTokenization(language.code().to_string()))
}

fn key_flag_disabled(key: &serde_json::Value, flag: &str) -> bool {
    key.get(flag).and_then(|v| v.as_bool()) == Some(false)
}
