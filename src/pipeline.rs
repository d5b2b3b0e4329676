//! Sentence Transformation Pipeline: translation, transliteration and
//! token-by-token breakdown for one sentence, emitted as separate messages
//! in a fixed order.
//!
//! Each step sends its message as soon as it completes; a later failure
//! aborts the remaining steps but never retracts what was already sent.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::languages::Language;
use crate::langtools::{self, BreakdownEntry};
use crate::selection;
use crate::telegram;
use anyhow::Result;
use tracing::{info, warn};

/// Translation and transliteration of the processed sentence, returned so
/// the session can keep them for follow-ups.
#[derive(Debug)]
pub struct PipelineOutput {
    pub translation: String,
    pub transliteration: String,
}

/// Run the full pipeline for one sentence and emit the reply messages.
pub async fn run(
    client: &reqwest::Client,
    config: &Config,
    catalog: &Catalog,
    chat_id: i64,
    sentence: &str,
    source: Language,
    native: Language,
) -> Result<PipelineOutput> {
    // Step 1: translation
    typing(client, config, chat_id).await;
    let translation_selection = selection::select_translation(catalog, source, native)?;
    info!(
        "Translating {} -> {} via {}",
        source.code(),
        native.code(),
        translation_selection.service
    );
    let translation = langtools::translate(client, config, sentence, &translation_selection).await?;
    telegram::send_message(client, config, chat_id, &translation).await?;

    // Step 2: transliteration
    typing(client, config, chat_id).await;
    let transliteration_option = selection::select_transliteration(catalog, source)?;
    info!(
        "Transliterating {} via {}",
        source.code(),
        transliteration_option.service
    );
    let transliteration =
        langtools::transliterate(client, config, sentence, transliteration_option).await?;
    telegram::send_message(client, config, chat_id, &transliteration).await?;

    // Step 3: breakdown
    typing(client, config, chat_id).await;
    let tokenization_option = selection::select_tokenization(catalog, source)?;
    info!(
        "Breaking down {} via {} ({})",
        source.code(),
        tokenization_option.service,
        tokenization_option.tokenization_name
    );
    let entries = langtools::breakdown(
        client,
        config,
        sentence,
        tokenization_option,
        &translation_selection,
        transliteration_option,
    )
    .await?;

    // Step 4: formatted breakdown, then the closing prompt
    telegram::send_message(client, config, chat_id, &format_breakdown(&entries)).await?;
    let closing = format!(
        "Ask me anything about this sentence in {}, or send me another {} sentence.",
        native.name(),
        source.name()
    );
    telegram::send_message(client, config, chat_id, &closing).await?;

    Ok(PipelineOutput {
        translation,
        transliteration,
    })
}

/// One line per token, in sentence order:
/// `token (lemma): transliteration, translation (pos)`.
/// The lemma appears only when it differs from the surface token
/// case-insensitively; pos only when the provider supplied one.
pub fn format_breakdown(entries: &[BreakdownEntry]) -> String {
    entries
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_entry(entry: &BreakdownEntry) -> String {
    let mut line = entry.token.clone();

    if !entry.lemma.is_empty() && entry.lemma.to_lowercase() != entry.token.to_lowercase() {
        line.push_str(&format!(" ({})", entry.lemma));
    }

    let annotations: Vec<&str> = [
        entry.transliteration.as_deref(),
        entry.translation.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect();
    if !annotations.is_empty() {
        line.push_str(": ");
        line.push_str(&annotations.join(", "));
    }

    if let Some(pos) = entry.pos_description.as_deref() {
        if !pos.is_empty() {
            line.push_str(&format!(" ({})", pos));
        }
    }

    line
}

async fn typing(client: &reqwest::Client, config: &Config, chat_id: i64) {
    if let Err(e) = telegram::send_typing(client, config, chat_id).await {
        warn!("Typing indicator failed for chat {}: {}", chat_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        token: &str,
        lemma: &str,
        transliteration: Option<&str>,
        translation: Option<&str>,
        pos: Option<&str>,
    ) -> BreakdownEntry {
        BreakdownEntry {
            token: token.to_string(),
            lemma: lemma.to_string(),
            transliteration: transliteration.map(str::to_string),
            translation: translation.map(str::to_string),
            pos_description: pos.map(str::to_string),
        }
    }

    #[test]
    fn test_format_full_entry() {
        let line = format_entry(&entry(
            "allés",
            "aller",
            Some("ale"),
            Some("gone"),
            Some("verb"),
        ));
        assert_eq!(line, "allés (aller): ale, gone (verb)");
    }

    #[test]
    fn test_format_hides_lemma_equal_to_token() {
        let line = format_entry(&entry("你好", "你好", Some("nǐhǎo"), Some("hello"), None));
        assert_eq!(line, "你好: nǐhǎo, hello");
    }

    #[test]
    fn test_format_lemma_comparison_is_case_insensitive() {
        let line = format_entry(&entry("Bonjour", "bonjour", None, Some("hello"), None));
        assert_eq!(line, "Bonjour: hello");
    }

    #[test]
    fn test_format_without_annotations() {
        let line = format_entry(&entry("吗", "吗", None, None, Some("particle")));
        assert_eq!(line, "吗 (particle)");
    }

    #[test]
    fn test_format_breakdown_preserves_order() {
        let entries = vec![
            entry("我", "我", Some("wǒ"), Some("I"), Some("pronoun")),
            entry("爱", "爱", Some("ài"), Some("love"), Some("verb")),
            entry("你", "你", Some("nǐ"), Some("you"), Some("pronoun")),
        ];
        let text = format_breakdown(&entries);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("我"));
        assert!(lines[1].starts_with("爱"));
        assert!(lines[2].starts_with("你"));
    }

    #[test]
    fn test_format_breakdown_empty() {
        assert_eq!(format_breakdown(&[]), "");
    }
}
