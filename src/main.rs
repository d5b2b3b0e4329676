use anyhow::{Context, Result};
use lingo_tutor::config::Config;
use lingo_tutor::languages::Language;
use lingo_tutor::session::SessionStore;
use lingo_tutor::{catalog, dialog, telegram};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingo_tutor=info".parse()?),
        )
        .init();

    info!("Starting language tutor bot");

    let config = Arc::new(Config::from_env()?);

    // Fail fast on a bad native-language setting
    Language::from_code(&config.native_language)
        .context("NATIVE_LANGUAGE is not a supported language code")?;

    let client = reqwest::Client::new();

    // Capability catalog: loaded once, immutable for the process lifetime
    let catalog = Arc::new(catalog::load(&client, &config).await?);
    let store = SessionStore::new();

    info!("Polling for messages");
    let mut offset = 0i64;
    loop {
        let updates = match telegram::get_updates(&client, &config, offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Update poll failed: {:#}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else { continue };
            let Some(text) = message.text else { continue };
            let chat_id = message.chat.id;

            let config = Arc::clone(&config);
            let catalog = Arc::clone(&catalog);
            let client = client.clone();
            let session = store.entry(chat_id);

            // One task per turn; the per-session mutex serializes turns
            // within a chat while other chats proceed in parallel
            tokio::spawn(async move {
                let mut session = session.lock().await;
                if let Err(e) = dialog::handle_message(
                    &client,
                    &config,
                    &catalog,
                    &mut session,
                    chat_id,
                    &text,
                )
                .await
                {
                    error!("Turn failed for chat {}: {:#}", chat_id, e);
                }
            });
        }
    }
}
