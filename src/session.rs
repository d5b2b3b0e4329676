//! Per-conversation session state.
//!
//! One `Session` per Telegram chat, held in memory for the process lifetime.
//! Losing sessions on restart is accepted: the user just sends the sentence
//! again.

use crate::languages::Language;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Where the conversation stands between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Steady state: the next plain-text message is a new sentence or a
    /// follow-up question, disambiguated by detected language.
    #[default]
    AwaitingInput,

    /// The user asked to change the language; the next plain-text message is
    /// read as a language name.
    AwaitingLanguageName,
}

#[derive(Debug, Default)]
pub struct Session {
    pub state: DialogState,

    /// The sentence currently under study, if any.
    pub working_sentence: Option<String>,

    /// The language the working sentence is believed to be in.
    pub resolved_language: Option<Language>,

    /// Sticky user-confirmed language; suppresses auto-detection for the
    /// rest of the conversation once set.
    pub override_language: Option<Language>,

    // Cached pipeline outputs, kept for possible reuse by follow-ups
    pub last_translation: Option<String>,
    pub last_transliteration: Option<String>,
}

impl Session {
    pub fn clear(&mut self) {
        *self = Session::default();
    }

    pub fn has_working_sentence(&self) -> bool {
        self.working_sentence.is_some()
    }
}

/// Session store keyed by chat id.
///
/// The outer map lock is held only to fetch a handle; the per-session async
/// mutex is held for the whole turn, which serializes turns within one chat
/// while leaving different chats free to run in parallel.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the session handle for a chat.
    pub fn entry(&self, chat_id: i64) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.entry(chat_id).or_default().clone()
    }
}
