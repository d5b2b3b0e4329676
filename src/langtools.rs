//! Client for the language-services API: language detection, translation,
//! transliteration, token breakdown and the capability catalog download.
//!
//! Every call carries the `api_key` header; non-success statuses surface the
//! response body in the error so upstream failures are diagnosable from logs.

use crate::catalog::{TokenizationOption, TransliterationOption};
use crate::config::Config;
use crate::selection::TranslationSelection;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    detected_language: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    service: &'a str,
    from_language_key: &'a str,
    to_language_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct TransliterateRequest<'a> {
    text: &'a str,
    service: &'a str,
    transliteration_key: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TransliterateResponse {
    transliterated_text: String,
}

#[derive(Debug, Serialize)]
struct BreakdownRequest<'a> {
    text: &'a str,
    tokenization_option: &'a TokenizationOption,
    translation_option: BreakdownTranslationOption<'a>,
    transliteration_option: &'a TransliterationOption,
}

/// Translation context for the breakdown call: the selected service plus the
/// per-language keys, in the shape the API expects.
#[derive(Debug, Serialize)]
struct BreakdownTranslationOption<'a> {
    service: &'a str,
    from_language_key: &'a str,
    to_language_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct BreakdownResponse {
    breakdown: Vec<BreakdownEntry>,
}

/// One annotated token from the breakdown provider, in sentence order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub token: String,
    pub lemma: String,
    pub translation: Option<String>,
    pub transliteration: Option<String>,
    pub pos_description: Option<String>,
}

/// Detect the language of a text. Single best guess, no confidence score.
pub async fn detect_language(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
) -> Result<String> {
    let response = client
        .post(format!("{}/detect", config.langtools_api_url))
        .header("api_key", &config.langtools_api_key)
        .json(&DetectRequest { text })
        .send()
        .await
        .context("Failed to send detection request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Language detection error ({}): {}", status, body);
    }

    let detect_response: DetectResponse = response
        .json()
        .await
        .context("Failed to parse detection response")?;

    Ok(detect_response.detected_language)
}

pub async fn translate(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
    selection: &TranslationSelection,
) -> Result<String> {
    let request = TranslateRequest {
        text,
        service: &selection.service,
        from_language_key: &selection.source_key,
        to_language_key: &selection.target_key,
    };

    let response = client
        .post(format!("{}/translate", config.langtools_api_url))
        .header("api_key", &config.langtools_api_key)
        .json(&request)
        .send()
        .await
        .context("Failed to send translation request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Translation error ({}): {}", status, body);
    }

    let translate_response: TranslateResponse = response
        .json()
        .await
        .context("Failed to parse translation response")?;

    Ok(translate_response.translated_text)
}

pub async fn transliterate(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
    option: &TransliterationOption,
) -> Result<String> {
    let request = TransliterateRequest {
        text,
        service: &option.service,
        transliteration_key: &option.transliteration_key,
    };

    let response = client
        .post(format!("{}/transliterate", config.langtools_api_url))
        .header("api_key", &config.langtools_api_key)
        .json(&request)
        .send()
        .await
        .context("Failed to send transliteration request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Transliteration error ({}): {}", status, body);
    }

    let transliterate_response: TransliterateResponse = response
        .json()
        .await
        .context("Failed to parse transliteration response")?;

    Ok(transliterate_response.transliterated_text)
}

/// Token-by-token breakdown. Per-token translation and transliteration are
/// derived together with segmentation, so the translation and transliteration
/// configurations ride along as auxiliary context.
pub async fn breakdown(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
    tokenization: &TokenizationOption,
    translation: &TranslationSelection,
    transliteration: &TransliterationOption,
) -> Result<Vec<BreakdownEntry>> {
    let request = BreakdownRequest {
        text,
        tokenization_option: tokenization,
        translation_option: BreakdownTranslationOption {
            service: &translation.service,
            from_language_key: &translation.source_key,
            to_language_key: &translation.target_key,
        },
        transliteration_option: transliteration,
    };

    let response = client
        .post(format!("{}/breakdown", config.langtools_api_url))
        .header("api_key", &config.langtools_api_key)
        .json(&request)
        .send()
        .await
        .context("Failed to send breakdown request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Breakdown error ({}): {}", status, body);
    }

    let breakdown_response: BreakdownResponse = response
        .json()
        .await
        .context("Failed to parse breakdown response")?;

    Ok(breakdown_response.breakdown)
}

/// Download the capability catalog as raw JSON (the caller persists it).
pub async fn fetch_language_data(client: &reqwest::Client, config: &Config) -> Result<String> {
    let response = client
        .get(format!("{}/language_data", config.langtools_api_url))
        .header("api_key", &config.langtools_api_key)
        .send()
        .await
        .context("Failed to fetch language data")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Language data error ({}): {}", status, body);
    }

    response
        .text()
        .await
        .context("Failed to read language data response")
}
