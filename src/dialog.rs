//! Dialog State Machine: interprets each inbound message against the
//! session, drives service selection and the transformation pipeline, and
//! sends the replies.
//!
//! Intent in the steady state is inferred from language: once a working
//! sentence exists, text detected as the learner's native language is read
//! as a question about that sentence, anything else as a new sentence. This
//! is a heuristic and a known limitation: a native-language sentence meant
//! for translation, or a target-language phrase the detector mis-tags as the
//! native language, will be misclassified. The /changelanguage override is
//! the escape hatch.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::languages::Language;
use crate::langtools;
use crate::openai::{self, ChatMessage};
use crate::pipeline;
use crate::resolver::{self, ResolveError};
use crate::session::{DialogState, Session};
use crate::telegram;
use anyhow::{Context, Result};
use tracing::{info, warn};

const WELCOME: &str = "Hi! Send me a sentence in the language you're studying and I'll translate it, transliterate it and break it down token by token. After that you can ask me questions about the sentence, send a new one, or use /changelanguage if I guessed the language wrong.";

const CANCELED: &str = "Okay, conversation cleared. Send me a sentence whenever you want to start again.";

const PROMPT_LANGUAGE_NAME: &str =
    "Which language is this sentence in? Type its name, for example \"cantonese\" or \"canadian french\".";

const GUARD_CHANGE_NO_SENTENCE: &str =
    "There's no sentence to change the language for yet. Send me a sentence first.";

const GUARD_QUESTION_NO_SENTENCE: &str =
    "Send me a sentence first, then ask your questions about it.";

const UNKNOWN_COMMAND: &str =
    "I don't know that command. Send me a sentence, or use /changelanguage or /cancel.";

const ERR_SENTENCE: &str = "Sorry, I couldn't process this sentence. Please try again.";

const ERR_LANGUAGE_NAME: &str =
    "Sorry, I didn't understand that language. Try typing its name differently.";

const ERR_QUESTION: &str = "Sorry, I couldn't answer that question. Please try again.";

/// What a plain-text message in the steady state means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnKind {
    NewSentence,
    FollowUpQuestion,
}

/// The disambiguation heuristic: a question iff a working sentence exists
/// and the text arrived in the native language.
fn classify(has_working_sentence: bool, detected_code: &str, native_code: &str) -> TurnKind {
    if has_working_sentence && detected_code == native_code {
        TurnKind::FollowUpQuestion
    } else {
        TurnKind::NewSentence
    }
}

/// Handle one inbound message for one chat. The caller holds the session
/// lock for the duration, so turns within a chat never interleave.
///
/// User-visible failures (coverage gaps, upstream errors, unresolvable
/// language names) are reported as replies and return `Ok`; only transport
/// failures propagate.
pub async fn handle_message(
    client: &reqwest::Client,
    config: &Config,
    catalog: &Catalog,
    session: &mut Session,
    chat_id: i64,
    text: &str,
) -> Result<()> {
    let text = text.trim();
    info!("Chat {} ({:?}): {}", chat_id, session.state, text);

    match text {
        "/start" => {
            session.clear();
            telegram::send_message(client, config, chat_id, WELCOME).await
        }
        "/cancel" => {
            // Conversation ends here; the next message starts fresh
            session.clear();
            telegram::send_message(client, config, chat_id, CANCELED).await
        }
        "/changelanguage" => {
            if !session.has_working_sentence() {
                return telegram::send_message(client, config, chat_id, GUARD_CHANGE_NO_SENTENCE)
                    .await;
            }
            session.state = DialogState::AwaitingLanguageName;
            telegram::send_message(client, config, chat_id, PROMPT_LANGUAGE_NAME).await
        }
        t if t.starts_with('/') => {
            telegram::send_message(client, config, chat_id, UNKNOWN_COMMAND).await
        }
        t => match session.state {
            DialogState::AwaitingLanguageName => {
                handle_language_name(client, config, catalog, session, chat_id, t).await
            }
            DialogState::AwaitingInput => {
                handle_text(client, config, catalog, session, chat_id, t).await
            }
        },
    }
}

/// The user typed a language name after /changelanguage.
async fn handle_language_name(
    client: &reqwest::Client,
    config: &Config,
    catalog: &Catalog,
    session: &mut Session,
    chat_id: i64,
    text: &str,
) -> Result<()> {
    typing(client, config, chat_id).await;

    match resolver::resolve_language_name(client, config, text).await {
        Ok(language) => {
            info!("Chat {}: language override set to {}", chat_id, language.code());
            session.override_language = Some(language);
            session.resolved_language = Some(language);
            session.state = DialogState::AwaitingInput;

            // Guarded before entering AwaitingLanguageName
            let sentence = session
                .working_sentence
                .clone()
                .context("no working sentence after language change")?;
            run_pipeline(client, config, catalog, session, chat_id, &sentence, language).await
        }
        Err(ResolveError::UnknownLanguage(answer)) => {
            // Stay in AwaitingLanguageName: the next message is the retry
            warn!("Chat {}: could not resolve language name '{}' (got '{}')", chat_id, text, answer);
            telegram::send_message(client, config, chat_id, ERR_LANGUAGE_NAME).await
        }
        Err(ResolveError::Upstream(e)) => {
            warn!("Chat {}: language resolution failed: {:#}", chat_id, e);
            telegram::send_message(client, config, chat_id, ERR_LANGUAGE_NAME).await
        }
    }
}

/// Plain text in the steady state: a new sentence or a follow-up question.
async fn handle_text(
    client: &reqwest::Client,
    config: &Config,
    catalog: &Catalog,
    session: &mut Session,
    chat_id: i64,
    text: &str,
) -> Result<()> {
    let native = native_language(config)?;

    typing(client, config, chat_id).await;
    let detected = match langtools::detect_language(client, config, text).await {
        Ok(code) => code,
        Err(e) => {
            warn!("Chat {}: language detection failed: {:#}", chat_id, e);
            return telegram::send_message(client, config, chat_id, ERR_SENTENCE).await;
        }
    };
    info!("Chat {}: detected language {}", chat_id, detected);

    match classify(session.has_working_sentence(), &detected, native.code()) {
        TurnKind::FollowUpQuestion => {
            answer_question(client, config, session, chat_id, text, native).await
        }
        TurnKind::NewSentence => {
            let resolved = match session.override_language {
                Some(language) => language,
                None => match Language::from_code(&detected) {
                    Ok(language) => language,
                    Err(e) => {
                        warn!("Chat {}: detector returned unsupported code '{}': {}", chat_id, detected, e);
                        return telegram::send_message(client, config, chat_id, ERR_SENTENCE)
                            .await;
                    }
                },
            };

            session.working_sentence = Some(text.to_string());
            session.resolved_language = Some(resolved);
            run_pipeline(client, config, catalog, session, chat_id, text, resolved).await
        }
    }
}

/// Run the transformation pipeline, cache its outputs on the session and
/// map failures to the generic sentence error.
async fn run_pipeline(
    client: &reqwest::Client,
    config: &Config,
    catalog: &Catalog,
    session: &mut Session,
    chat_id: i64,
    sentence: &str,
    source: Language,
) -> Result<()> {
    let native = native_language(config)?;

    match pipeline::run(client, config, catalog, chat_id, sentence, source, native).await {
        Ok(output) => {
            session.last_translation = Some(output.translation);
            session.last_transliteration = Some(output.transliteration);
            Ok(())
        }
        Err(e) => {
            warn!("Chat {}: pipeline failed for {}: {:#}", chat_id, source.code(), e);
            telegram::send_message(client, config, chat_id, ERR_SENTENCE).await
        }
    }
}

/// Follow-up Question Handler: ground the model in the working sentence and
/// relay the answer.
async fn answer_question(
    client: &reqwest::Client,
    config: &Config,
    session: &Session,
    chat_id: i64,
    question: &str,
    native: Language,
) -> Result<()> {
    let (sentence, language) = match (&session.working_sentence, session.resolved_language) {
        (Some(sentence), Some(language)) => (sentence.clone(), language),
        _ => {
            return telegram::send_message(client, config, chat_id, GUARD_QUESTION_NO_SENTENCE)
                .await;
        }
    };

    typing(client, config, chat_id).await;
    let messages = build_question_messages(&sentence, language, native, question);
    match openai::complete(client, config, &messages).await {
        Ok(answer) => telegram::send_message(client, config, chat_id, &answer).await,
        Err(e) => {
            warn!("Chat {}: question answering failed: {:#}", chat_id, e);
            telegram::send_message(client, config, chat_id, ERR_QUESTION).await
        }
    }
}

fn build_question_messages(
    sentence: &str,
    language: Language,
    native: Language,
    question: &str,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are a language tutor. The student is studying this {} sentence: \"{}\". Answer the student's questions about it in {}.",
            language.name(),
            sentence,
            native.name()
        )),
        ChatMessage::user(question),
    ]
}

fn native_language(config: &Config) -> Result<Language> {
    Language::from_code(&config.native_language)
        .context("NATIVE_LANGUAGE is not a supported language code")
}

async fn typing(client: &reqwest::Client, config: &Config, chat_id: i64) {
    if let Err(e) = telegram::send_typing(client, config, chat_id).await {
        warn!("Typing indicator failed for chat {}: {}", chat_id, e);
    }
}
