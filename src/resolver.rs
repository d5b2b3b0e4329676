//! Language-Name Resolver: maps a user-typed language name ("canadian
//! french", "mandarin") to a canonical language code via a few-shot LLM
//! prompt, then validates the answer against the registry.

use crate::config::Config;
use crate::languages::{Language, LanguageRegistry};
use crate::openai::{self, ChatMessage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The model answered with something outside the canonical set.
    #[error("unrecognized language name (model returned '{0}')")]
    UnknownLanguage(String),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// Few-shot examples biasing the model toward short-code answers.
const EXAMPLES: [(&str, &str); 5] = [
    ("cantonese", "yue"),
    ("English", "en"),
    ("mandarin", "zh_cn"),
    ("French", "fr"),
    ("canadian french", "fr_ca"),
];

fn build_system_prompt() -> String {
    let listing = LanguageRegistry::get()
        .list_all()
        .iter()
        .map(|lang| format!("{}: {}", lang.code, lang.name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You map a user's description of a language to one of these language codes:\n\n{}\n\nAnswer with the language code only, nothing else.",
        listing
    )
}

fn build_messages(text: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(build_system_prompt())];
    for (name, code) in EXAMPLES {
        messages.push(ChatMessage::user(name));
        messages.push(ChatMessage::assistant(code));
    }
    messages.push(ChatMessage::user(text));
    messages
}

/// Resolve a free-form language name to a validated `Language`.
///
/// The model's answer is never trusted blindly: a code outside the registry
/// is rejected as `ResolveError::UnknownLanguage`.
pub async fn resolve_language_name(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
) -> Result<Language, ResolveError> {
    let messages = build_messages(text);
    let answer = openai::complete(client, config, &messages).await?;
    let code = answer.trim();

    Language::from_code(code).map_err(|_| ResolveError::UnknownLanguage(code.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_url: &str) -> Config {
        Config {
            telegram_bot_token: "test-token".to_string(),
            telegram_api_url: "http://unused".to_string(),
            langtools_api_url: "http://unused".to_string(),
            langtools_api_key: "test-key".to_string(),
            openai_api_key: "test-openai-key".to_string(),
            openai_api_url: api_url.to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            native_language: "en".to_string(),
            catalog_cache_path: "language_data.json".to_string(),
            poll_timeout_secs: 30,
        }
    }

    fn openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": content}}
            ]
        })
    }

    #[test]
    fn test_system_prompt_enumerates_registry() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("en: English"));
        assert!(prompt.contains("fr_ca: French (Canada)"));
        assert!(prompt.contains("yue: Cantonese"));
        assert!(prompt.contains("language code only"));
    }

    #[test]
    fn test_messages_carry_few_shot_pairs_in_order() {
        let messages = build_messages("português");
        assert_eq!(messages[0].role, "system");
        // Five user/assistant pairs, then the query
        assert_eq!(messages.len(), 1 + EXAMPLES.len() * 2 + 1);
        assert_eq!(messages[1].content, "cantonese");
        assert_eq!(messages[2].content, "yue");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages.last().unwrap().content, "português");
        assert_eq!(messages.last().unwrap().role, "user");
    }

    #[tokio::test]
    async fn test_resolve_valid_code() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_response("fr_ca")))
            .mount(&mock_server)
            .await;

        let config = test_config(&format!("{}/v1/chat/completions", mock_server.uri()));
        let client = reqwest::Client::new();
        let language = resolve_language_name(&client, &config, "canadian french")
            .await
            .expect("Should resolve");
        assert_eq!(language.code(), "fr_ca");
    }

    #[tokio::test]
    async fn test_resolve_trims_whitespace() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_response("  zh_cn\n")))
            .mount(&mock_server)
            .await;

        let config = test_config(&format!("{}/v1/chat/completions", mock_server.uri()));
        let client = reqwest::Client::new();
        let language = resolve_language_name(&client, &config, "mandarin")
            .await
            .expect("Should resolve");
        assert_eq!(language.code(), "zh_cn");
    }

    #[tokio::test]
    async fn test_resolve_rejects_unknown_code() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(openai_response("I think that's Klingon!")),
            )
            .mount(&mock_server)
            .await;

        let config = test_config(&format!("{}/v1/chat/completions", mock_server.uri()));
        let client = reqwest::Client::new();
        let result = resolve_language_name(&client, &config, "klingon").await;
        assert!(matches!(result, Err(ResolveError::UnknownLanguage(_))));
    }

    #[tokio::test]
    async fn test_resolve_propagates_upstream_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let config = test_config(&format!("{}/v1/chat/completions", mock_server.uri()));
        let client = reqwest::Client::new();
        let result = resolve_language_name(&client, &config, "french").await;
        assert!(matches!(result, Err(ResolveError::Upstream(_))));
    }
}
