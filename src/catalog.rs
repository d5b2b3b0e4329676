//! Capability Catalog: which (service, language, configuration) offerings
//! exist for translation, transliteration and tokenization.
//!
//! Loaded once at startup, either from the JSON cache file written on a
//! previous cold run or from the live language-services API. Immutable for
//! the rest of the process lifetime; option list order is preserved exactly
//! as loaded because the selection tie-breaks depend on it.

use crate::config::Config;
use crate::langtools;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOption {
    pub service: String,
    pub language_code: String,
    /// Service-specific language identifier, passed back verbatim on calls
    pub language_id: String,
    #[serde(default)]
    pub language_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransliterationOption {
    pub service: String,
    pub language_code: String,
    #[serde(default)]
    pub transliteration_name: String,
    /// Opaque service-specific configuration; the CJK-specialized service
    /// exposes boolean `spaces` and `tone_numbers` fields inside it
    pub transliteration_key: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizationOption {
    pub service: String,
    pub language_code: String,
    #[serde(default)]
    pub tokenization_name: String,
    pub tokenization_key: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub translation_options: Vec<TranslationOption>,
    pub transliteration_options: Vec<TransliterationOption>,
    pub tokenization_options: Vec<TokenizationOption>,
}

impl Catalog {
    pub fn translation_for(&self, language_code: &str) -> Vec<&TranslationOption> {
        self.translation_options
            .iter()
            .filter(|o| o.language_code == language_code)
            .collect()
    }

    pub fn transliteration_for(&self, language_code: &str) -> Vec<&TransliterationOption> {
        self.transliteration_options
            .iter()
            .filter(|o| o.language_code == language_code)
            .collect()
    }

    pub fn tokenization_for(&self, language_code: &str) -> Vec<&TokenizationOption> {
        self.tokenization_options
            .iter()
            .filter(|o| o.language_code == language_code)
            .collect()
    }
}

/// Load the catalog: cache file if present, otherwise a live fetch that also
/// writes the cache for the next run.
pub async fn load(client: &reqwest::Client, config: &Config) -> Result<Catalog> {
    let path = &config.catalog_cache_path;

    if std::path::Path::new(path).exists() {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read catalog cache at {}", path))?;
        let catalog: Catalog = serde_json::from_str(&raw)
            .context(format!("Failed to parse catalog cache at {}", path))?;
        info!(
            "Loaded capability catalog from cache: {} translation, {} transliteration, {} tokenization options",
            catalog.translation_options.len(),
            catalog.transliteration_options.len(),
            catalog.tokenization_options.len()
        );
        return Ok(catalog);
    }

    info!("No catalog cache at {}, fetching language data", path);
    let raw = langtools::fetch_language_data(client, config).await?;

    // Persist the source's own serialization so warm runs skip the fetch
    std::fs::write(path, &raw).context(format!("Failed to write catalog cache at {}", path))?;

    let catalog: Catalog =
        serde_json::from_str(&raw).context("Failed to parse fetched language data")?;
    info!(
        "Fetched capability catalog: {} translation, {} transliteration, {} tokenization options",
        catalog.translation_options.len(),
        catalog.transliteration_options.len(),
        catalog.tokenization_options.len()
    );
    Ok(catalog)
}
