//! Telegram Bot API client: long-poll update fetching and outbound messages.
//!
//! The bot speaks plain text, so no parse mode (and none of the escaping a
//! markdown mode would require).

use crate::config::Config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// Telegram update types
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[allow(dead_code)]
    pub r#type: String,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SendChatActionRequest {
    chat_id: i64,
    action: &'static str,
}

/// Long-poll for updates past `offset`. Blocks up to the configured poll
/// timeout server-side when no updates are pending.
pub async fn get_updates(
    client: &reqwest::Client,
    config: &Config,
    offset: i64,
) -> Result<Vec<Update>> {
    let url = format!(
        "{}/bot{}/getUpdates",
        config.telegram_api_url, config.telegram_bot_token
    );

    let response = client
        .get(&url)
        .query(&[
            ("offset", offset.to_string()),
            ("timeout", config.poll_timeout_secs.to_string()),
        ])
        .send()
        .await
        .context("Failed to poll Telegram for updates")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Telegram API error ({}): {}", status, body);
    }

    let updates: UpdatesResponse = response
        .json()
        .await
        .context("Failed to parse Telegram updates response")?;

    if !updates.ok {
        anyhow::bail!("Telegram getUpdates returned ok=false");
    }

    Ok(updates.result)
}

/// Send a plain-text message to a chat.
pub async fn send_message(
    client: &reqwest::Client,
    config: &Config,
    chat_id: i64,
    text: &str,
) -> Result<()> {
    let url = format!(
        "{}/bot{}/sendMessage",
        config.telegram_api_url, config.telegram_bot_token
    );

    let request = SendMessageRequest { chat_id, text };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .context("Failed to send request to Telegram API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Telegram API error ({}): {}", status, body);
    }

    Ok(())
}

/// Best-effort typing indicator. Failures are logged by the caller and never
/// affect the turn.
pub async fn send_typing(client: &reqwest::Client, config: &Config, chat_id: i64) -> Result<()> {
    let url = format!(
        "{}/bot{}/sendChatAction",
        config.telegram_api_url, config.telegram_bot_token
    );

    let request = SendChatActionRequest {
        chat_id,
        action: "typing",
    };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .context("Failed to send chat action to Telegram API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Telegram API error ({}): {}", status, body);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_url: &str) -> Config {
        Config {
            telegram_bot_token: "test-token".to_string(),
            telegram_api_url: api_url.to_string(),
            langtools_api_url: "http://unused".to_string(),
            langtools_api_key: "test-key".to_string(),
            openai_api_key: "test-openai-key".to_string(),
            openai_api_url: "http://unused".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            native_language: "en".to_string(),
            catalog_cache_path: "language_data.json".to_string(),
            poll_timeout_secs: 30,
        }
    }

    #[test]
    fn test_update_deserialization_with_message() {
        let json = r#"{
            "update_id": 123456789,
            "message": {
                "message_id": 100,
                "from": {
                    "id": 987654321,
                    "username": "testuser",
                    "first_name": "Test"
                },
                "chat": {
                    "id": 987654321,
                    "type": "private"
                },
                "text": "你好"
            }
        }"#;

        let update: Update = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(update.update_id, 123456789);

        let message = update.message.unwrap();
        assert_eq!(message.message_id, 100);
        assert_eq!(message.chat.id, 987654321);
        assert_eq!(message.text, Some("你好".to_string()));

        let from = message.from.unwrap();
        assert_eq!(from.username, Some("testuser".to_string()));
        assert_eq!(from.first_name, "Test");
    }

    #[test]
    fn test_update_deserialization_without_message() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 1}"#).expect("Should deserialize");
        assert_eq!(update.update_id, 1);
        assert!(update.message.is_none());
    }

    #[test]
    fn test_send_message_request_serialization() {
        let request = SendMessageRequest {
            chat_id: 42,
            text: "hello",
        };
        let value = serde_json::to_value(&request).expect("Should serialize");
        assert_eq!(value["chat_id"], 42);
        assert_eq!(value["text"], "hello");
        assert!(value.get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn test_get_updates_parses_result() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bottest-token/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 10,
                        "message": {
                            "message_id": 1,
                            "chat": {"id": 5, "type": "private"},
                            "text": "bonjour"
                        }
                    }
                ]
            })))
            .mount(&mock_server)
            .await;

        let config = test_config(&mock_server.uri());
        let client = reqwest::Client::new();
        let updates = get_updates(&client, &config, 0).await.expect("Should poll");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 10);
    }

    #[tokio::test]
    async fn test_send_message_posts_to_bot_endpoint() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = test_config(&mock_server.uri());
        let client = reqwest::Client::new();
        send_message(&client, &config, 5, "hello").await.expect("Should send");
    }

    #[tokio::test]
    async fn test_send_typing_failure_is_an_error_for_caller_to_ignore() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottest-token/sendChatAction"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let config = test_config(&mock_server.uri());
        let client = reqwest::Client::new();
        assert!(send_typing(&client, &config, 5).await.is_err());
    }
}
